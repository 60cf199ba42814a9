//! Dropbox API client and types.

pub mod client;
pub mod error;
#[cfg(test)]
pub(crate) mod memory;
pub mod metadata;
pub mod remote;

pub use client::ApiClient;
pub use error::{ApiErrorKind, ApiErrorSummary};
pub use metadata::{FileMetadata, FolderMetadata, Metadata, UploadCursor};
pub use remote::RemoteStorage;
