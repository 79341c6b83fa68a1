pub mod archive;

pub use archive::{ArchiveDocument, ArchiveWriter};
