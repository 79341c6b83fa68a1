pub mod article;
pub mod credential;
pub mod media;
pub mod publish;

pub use article::Article;
pub use credential::Credential;
pub use media::{ImageFormat, MediaClass};
pub use publish::{PublishResult, PublishStatus};
