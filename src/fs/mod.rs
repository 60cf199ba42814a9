//! The filesystem view over remote storage.

pub mod content_hash;
pub mod node;
pub mod path;
pub mod provider;
pub mod upload_state;
mod operations;

pub use node::{BrowseEntry, EnumeratedFile, FileStat, ItemDescriptor};
pub use path::RootConfig;
pub use provider::DropboxFs;
pub use upload_state::CHUNK_SIZE;
