//! Operator guidance for the manual publish hand-off.

use std::borrow::Cow;
use std::path::Path;

use tracing::{debug, info};

pub const LOGIN_URL: &str = "https://mp.weixin.qq.com/";

/// Characters kept from each end of a long body in log output.
pub const PREVIEW_CHARS: usize = 200;

/// Step-by-step instructions for publishing an article by hand.
pub fn manual_steps(title: &str, digest: &str, archive_path: &Path) -> Vec<String> {
    vec![
        "The account cannot publish through the API (unverified or not a service account); publish manually:".to_string(),
        format!("1. Log in to the official account platform: {}", LOGIN_URL),
        "2. Open the article (图文消息) section in the left menu".to_string(),
        "3. Start a new article".to_string(),
        format!("4. Title: {}", title),
        "   Author: fill in on the platform".to_string(),
        format!("   Digest: {}", digest),
        format!("5. Paste the body from the archived HTML file: {}", archive_path.display()),
        "6. Upload a cover image".to_string(),
        "7. Preview, then publish".to_string(),
    ]
}

pub fn log_manual_steps(title: &str, digest: &str, archive_path: &Path) {
    for line in manual_steps(title, digest, archive_path) {
        info!(target: "publisher::guide", "{}", line);
    }
}

/// Head/tail excerpt of `html` when it is longer than twice `limit`
/// characters; otherwise the whole string.
pub fn excerpt(html: &str, limit: usize) -> Cow<'_, str> {
    let total = html.chars().count();
    if total <= limit * 2 {
        return Cow::Borrowed(html);
    }

    let head: String = html.chars().take(limit).collect();
    let tail: String = html.chars().skip(total - limit).collect();
    Cow::Owned(format!(
        "{}\n... [{} characters omitted] ...\n{}",
        head,
        total - limit * 2,
        tail
    ))
}

pub fn log_preview(html: &str) {
    debug!(
        chars = html.chars().count(),
        preview = %excerpt(html, PREVIEW_CHARS),
        "article body"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_body_passes_through() {
        let body = "<p>hi</p>";
        assert!(matches!(excerpt(body, PREVIEW_CHARS), Cow::Borrowed(_)));
        assert_eq!(excerpt(&"x".repeat(400), PREVIEW_CHARS).len(), 400);
    }

    #[test]
    fn test_long_body_keeps_head_and_tail() {
        let body = format!("{}{}{}", "a".repeat(200), "Q".repeat(100), "z".repeat(200));
        let out = excerpt(&body, PREVIEW_CHARS);
        assert!(out.starts_with(&"a".repeat(200)));
        assert!(out.ends_with(&"z".repeat(200)));
        assert!(!out.contains('Q'));
        assert!(out.contains("[100 characters omitted]"));
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        let body = "文".repeat(500);
        let out = excerpt(&body, 10);
        assert!(out.starts_with(&"文".repeat(10)));
        assert!(out.ends_with(&"文".repeat(10)));
    }

    #[test]
    fn test_manual_steps_mention_inputs() {
        let steps = manual_steps("T", "D", Path::new("output/x.html"));
        assert!(steps.iter().any(|s| s.contains(LOGIN_URL)));
        assert!(steps.iter().any(|s| s.ends_with("Title: T")));
        assert!(steps.iter().any(|s| s.ends_with("Digest: D")));
        assert!(steps.iter().any(|s| s.contains("output/x.html")));
    }
}
