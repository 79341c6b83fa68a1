use std::path::PathBuf;

use serde::Deserialize;

/// Media id of an image pre-registered on the official account, used as the
/// cover when an article arrives without one.
pub const DEFAULT_COVER_MEDIA_ID: &str =
    "SwCSRjrdGJNaWioRQUHzgF68BHFkSlb_f5xlTquvsOSA6Yy0ZRjFo0aW9eS3JJu_";

pub const DEFAULT_API_BASE: &str = "https://api.weixin.qq.com";

#[derive(Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    /// Base URL of the platform API. Overridden in tests.
    pub api_base: String,
    pub app_id: Option<String>,
    pub app_secret: Option<String>,
    /// Set via WEIXIN_AUTOMATED_PUBLISH. Only verified service accounts may
    /// use the draft/freepublish APIs, so this defaults to false.
    pub automated_publish: bool,
    pub default_cover_media_id: String,
    pub output_dir: PathBuf,
    pub public_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            api_base: DEFAULT_API_BASE.to_string(),
            app_id: None,
            app_secret: None,
            automated_publish: false,
            default_cover_media_id: DEFAULT_COVER_MEDIA_ID.to_string(),
            output_dir: PathBuf::from("./output"),
            public_dir: PathBuf::from("./public"),
        }
    }
}

impl Config {
    /// Fails when either half of the app identity is missing.
    pub fn require_identity(&self) -> anyhow::Result<()> {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        if !present(&self.app_id) || !present(&self.app_secret) {
            anyhow::bail!(
                "Weixin configuration incomplete: set both WEIXIN_APP_ID and WEIXIN_APP_SECRET"
            );
        }
        Ok(())
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    Ok(from_lookup(|key| std::env::var(key).ok()))
}

/// Builds a config from an arbitrary variable source.
pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Config {
    let defaults = Config::default();
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    Config {
        port: lookup("PUBLISHER_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port),
        api_base: non_empty("WEIXIN_API_BASE")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base),
        app_id: non_empty("WEIXIN_APP_ID"),
        app_secret: non_empty("WEIXIN_APP_SECRET"),
        automated_publish: lookup("WEIXIN_AUTOMATED_PUBLISH")
            .map(|v| parse_flag(&v))
            .unwrap_or(defaults.automated_publish),
        default_cover_media_id: non_empty("WEIXIN_DEFAULT_COVER_MEDIA_ID")
            .unwrap_or(defaults.default_cover_media_id),
        output_dir: non_empty("PUBLISHER_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir),
        public_dir: non_empty("PUBLISHER_PUBLIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.public_dir),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
