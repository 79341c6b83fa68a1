use std::fmt;

/// Inline-content uploads above this size are refused by the platform.
pub const INLINE_MAX_BYTES: usize = 1024 * 1024;

/// Temporary image material is capped at 10 MiB.
pub const COVER_MAX_BYTES: usize = 10 * 1024 * 1024;

/// Upload class on the platform. Neither class counts against the permanent
/// material quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaClass {
    /// Kept by the platform for three days; used for covers. Returns a media id.
    Temporary,
    /// Embeddable in article bodies; JPEG/PNG up to 1 MB. Returns a URL.
    InlineContent,
}

impl fmt::Display for MediaClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaClass::Temporary => write!(f, "temporary"),
            MediaClass::InlineContent => write!(f, "inline-content"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Detects JPEG or PNG from the leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(ImageFormat::Png)
        } else {
            None
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
        }
    }
}
