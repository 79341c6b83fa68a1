//! Local archive of rendered articles.
//!
//! Every publish attempt leaves one standalone HTML file under the output
//! directory, named `<YYYY-MM-DD>-<sanitized title>.html`. Files are
//! overwritten when the name repeats and never deleted here.
//!
//! Title and digest are HTML-escaped before they are embedded; the body is
//! trusted markup and goes in verbatim.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::PublishError;

/// Upper bound on the title part of an archive file name, in characters.
pub const MAX_TITLE_CHARS: usize = 50;

// Characters rejected by common host filesystems.
static FORBIDDEN_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\/:*?"<>|]"#).unwrap());

/// Replaces forbidden characters with `_` and truncates to
/// [`MAX_TITLE_CHARS`]. Applying it twice changes nothing.
pub fn sanitize_title(title: &str) -> String {
    FORBIDDEN_FILENAME_CHARS
        .replace_all(title, "_")
        .chars()
        .take(MAX_TITLE_CHARS)
        .collect()
}

pub fn archive_file_name(date: NaiveDate, title: &str) -> String {
    format!("{}-{}.html", date.format("%Y-%m-%d"), sanitize_title(title))
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct ArchiveDocument {
    pub title: String,
    pub digest: String,
    pub body_html: String,
    pub date: NaiveDate,
}

impl ArchiveDocument {
    pub fn new(title: &str, digest: &str, body_html: &str, date: NaiveDate) -> Self {
        Self {
            title: title.to_string(),
            digest: digest.to_string(),
            body_html: body_html.to_string(),
            date,
        }
    }

    /// Document dated today (UTC).
    pub fn today(title: &str, digest: &str, body_html: &str) -> Self {
        Self::new(title, digest, body_html, Utc::now().date_naive())
    }

    pub fn file_name(&self) -> String {
        archive_file_name(self.date, &self.title)
    }

    /// Renders the complete standalone HTML document.
    pub fn render(&self) -> String {
        let title = escape_html(&self.title);
        let digest = escape_html(&self.digest);
        format!(
            r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        body {{
            font-family: 'PingFang SC', 'Microsoft YaHei', sans-serif;
            line-height: 1.6;
            color: #333;
            max-width: 800px;
            margin: 0 auto;
            padding: 20px;
        }}
        h1, h2, h3 {{
            color: #222;
        }}
        .digest {{
            color: #666;
            font-style: italic;
        }}
        img {{
            max-width: 100%;
            height: auto;
            display: block;
            margin: 20px auto;
        }}
    </style>
</head>
<body>
    <h1>{title}</h1>
    <p class="digest">{digest}</p>
    <div class="article-content">
    {body}
    </div>
</body>
</html>
"#,
            title = title,
            digest = digest,
            body = self.body_html,
        )
    }
}

/// Writes and reads archive documents under one output directory.
#[derive(Debug, Clone)]
pub struct ArchiveWriter {
    dir: PathBuf,
}

impl ArchiveWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, doc: &ArchiveDocument) -> PathBuf {
        self.dir.join(doc.file_name())
    }

    /// Renders today's document for the given parts and writes it.
    pub async fn write_archive(
        &self,
        title: &str,
        digest: &str,
        body_html: &str,
    ) -> Result<PathBuf, PublishError> {
        self.write(&ArchiveDocument::today(title, digest, body_html))
            .await
    }

    pub async fn write(&self, doc: &ArchiveDocument) -> Result<PathBuf, PublishError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            PublishError::archive(format!(
                "failed to create output directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let path = self.path_for(doc);
        tokio::fs::write(&path, doc.render()).await.map_err(|e| {
            PublishError::archive(format!("failed to write {}: {}", path.display(), e))
        })?;

        tracing::debug!(path = %path.display(), "archive document written");
        Ok(path)
    }

    /// Reads back an archived document by file name. `Ok(None)` when absent.
    pub async fn read(&self, file_name: &str) -> Result<Option<String>, PublishError> {
        validate_file_name(file_name)?;

        match tokio::fs::read_to_string(self.dir.join(file_name)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
            Err(e) => Err(PublishError::archive(format!(
                "failed to read {}: {}",
                file_name, e
            ))),
        }
    }
}

fn validate_file_name(file_name: &str) -> Result<(), PublishError> {
    // Names are a single path component; dots inside a name are fine.
    let traverses = file_name.contains('/')
        || file_name.contains('\\')
        || file_name.contains('\0')
        || file_name == "."
        || file_name == "..";
    if file_name.is_empty() || traverses || !file_name.ends_with(".html") {
        return Err(PublishError::invalid_argument(format!(
            "invalid article file name: {}",
            file_name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn test_sanitize_replaces_forbidden_chars() {
        assert_eq!(sanitize_title("My/Weird:Title?"), "My_Weird_Title_");
        assert_eq!(sanitize_title(r#"a\b*c"d<e>f|g"#), "a_b_c_d_e_f_g");
    }

    #[test]
    fn test_sanitize_truncates_by_chars() {
        let long = "标题".repeat(40);
        let sanitized = sanitize_title(&long);
        assert_eq!(sanitized.chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let titles = [
            "My/Weird:Title?",
            "",
            "plain",
            "????????????????????????????????????????????????????????????",
            "中文/标题:测试*很长很长很长很长很长很长很长很长很长很长很长很长很长很长很长很长很长很长很长",
        ];
        for title in titles {
            let once = sanitize_title(title);
            assert_eq!(sanitize_title(&once), once, "not idempotent for {:?}", title);
            assert!(once.chars().count() <= MAX_TITLE_CHARS);
        }
    }

    #[test]
    fn test_file_name_format() {
        assert_eq!(
            archive_file_name(date(), "My/Weird:Title?"),
            "2026-10-18-My_Weird_Title_.html"
        );
    }

    #[test]
    fn test_render_escapes_title_and_digest_only() {
        let doc = ArchiveDocument::new(
            "<script>alert(1)</script>",
            "Tom & \"Jerry\"",
            "<p>hi</p>",
            date(),
        );
        let html = doc.render();
        assert!(html.contains("<h1>&lt;script&gt;alert(1)&lt;/script&gt;</h1>"));
        assert!(html.contains("<title>&lt;script&gt;"));
        assert!(html.contains("Tom &amp; &quot;Jerry&quot;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("<p>hi</p>"));
    }

    #[test]
    fn test_render_keeps_path_punctuation_in_title() {
        let doc = ArchiveDocument::new("My/Weird:Title?", "A summary", "<p>hi</p>", date());
        let html = doc.render();
        assert!(html.contains("<h1>My/Weird:Title?</h1>"));
        assert!(html.contains("<meta charset=\"UTF-8\">"));
        assert!(html.contains("name=\"viewport\""));
        assert!(html.contains("<style>"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&'\""), "a&lt;b&gt;&amp;&#39;&quot;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_validate_file_name() {
        assert!(validate_file_name("2026-10-18-x.html").is_ok());
        assert!(validate_file_name("../secret.html").is_err());
        assert!(validate_file_name("a/b.html").is_err());
        assert!(validate_file_name("a\\b.html").is_err());
        assert!(validate_file_name("notes.txt").is_err());
        assert!(validate_file_name("").is_err());
    }

    #[test]
    fn test_validate_accepts_dots_inside_name() {
        assert!(validate_file_name("2026-10-18-Wait... what.html").is_ok());
        assert!(validate_file_name("2026-10-18-Version 2.0 released..html").is_ok());
        assert!(validate_file_name(&archive_file_name(date(), "..")).is_ok());
    }

    #[tokio::test]
    async fn test_read_back_title_with_dots() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ArchiveWriter::new(tmp.path());
        let doc = ArchiveDocument::new("Version 2.0 released.", "d", "<p>v2</p>", date());
        writer.write(&doc).await.unwrap();

        let content = writer.read(&doc.file_name()).await.unwrap().unwrap();
        assert!(content.contains("<p>v2</p>"));
    }

    #[tokio::test]
    async fn test_write_creates_dir_and_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ArchiveWriter::new(tmp.path().join("nested/output"));

        let first = ArchiveDocument::new("Same", "d", "<p>one</p>", date());
        let path = writer.write(&first).await.unwrap();
        assert_eq!(path, tmp.path().join("nested/output/2026-10-18-Same.html"));

        let second = ArchiveDocument::new("Same", "d", "<p>two</p>", date());
        let again = writer.write(&second).await.unwrap();
        assert_eq!(path, again);

        let content = writer.read("2026-10-18-Same.html").await.unwrap().unwrap();
        assert!(content.contains("<p>two</p>"));
        assert!(!content.contains("<p>one</p>"));
    }

    #[tokio::test]
    async fn test_read_missing_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ArchiveWriter::new(tmp.path());
        assert!(writer.read("2026-01-01-none.html").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_failure_is_archive_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, "file in the way").unwrap();

        let writer = ArchiveWriter::new(&blocker);
        let err = writer.write_archive("T", "D", "<p>b</p>").await.unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Archive);
    }
}
