use serde::{Deserialize, Serialize};

/// A finished article handed over by the generation workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    #[serde(default)]
    pub digest: String,
    pub body_html: String,
    #[serde(default)]
    pub cover_image_url: Option<String>,
}

impl Article {
    pub fn new(
        title: impl Into<String>,
        digest: impl Into<String>,
        body_html: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            digest: digest.into(),
            body_html: body_html.into(),
            cover_image_url: None,
        }
    }

    pub fn with_cover(mut self, url: impl Into<String>) -> Self {
        self.cover_image_url = Some(url.into());
        self
    }

    /// Cover URL, with a missing value treated the same as an empty one.
    pub fn cover_url(&self) -> &str {
        self.cover_image_url.as_deref().unwrap_or("").trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_without_optional_fields() {
        let article: Article =
            serde_json::from_str(r#"{"title": "T", "body_html": "<p>x</p>"}"#).unwrap();
        assert_eq!(article.digest, "");
        assert_eq!(article.cover_url(), "");
    }

    #[test]
    fn test_cover_url_trims() {
        let article = Article::new("T", "D", "B").with_cover("  https://img.example/a.png ");
        assert_eq!(article.cover_url(), "https://img.example/a.png");
    }
}
