//! Weixin official account API: access tokens, media uploads, and the
//! draft/freepublish endpoints.

pub mod client;
pub mod draft;
pub mod media;
pub mod token;

pub use client::{CallError, PlatformClient};
pub use draft::{DraftApi, DraftArticle, PublishOutcome};
pub use media::MediaUploader;
pub use token::CredentialCache;
