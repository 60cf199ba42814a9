//! # dropbox-fs
//!
//! A Dropbox account exposed as a generic hierarchical filesystem rooted at a
//! configurable folder.
//!
//! ## Features
//!
//! - **Virtual roots**: callers use paths relative to the mount folder; they
//!   are normalized and translated to Dropbox's absolute namespace.
//! - **Lookups**: `stat`, one-level `browse` and recursive `enumerate`, with
//!   absence reported as typed results instead of errors.
//! - **Mutations**: recursive delete and move.
//! - **Transfers**:
//!   - Streamed reads into any `futures` async writer, with an optional byte limit.
//!   - Streamed writes: single request up to 4 MiB, upload sessions beyond,
//!     never holding more than two chunks in memory.
//!   - Content-hash verification of committed uploads.
//!   - Progress tracking with custom callbacks.
//!
//! The provider talks to Dropbox through the [`api::RemoteStorage`] trait, so
//! any backend implementing it can be mounted.
//!
//! ## Example: Basic Usage
//!
//! ```no_run
//! use dropbox_fs::{DropboxFs, PluginConfig};
//! use futures::io::Cursor;
//!
//! # async fn example() -> dropbox_fs::Result<()> {
//! let config = PluginConfig::from_json(
//!     r#"{"dropbox_connection": {"access_token": "sl.XXXX"}}"#,
//! )?;
//! let fs = DropboxFs::connect("/Apps/reports", &config)?;
//!
//! // Write, then read back
//! fs.write("2024/summary.txt", &mut Cursor::new(b"all good".to_vec())).await?;
//! let mut content = Vec::new();
//! fs.read("2024/summary.txt", &mut content, None).await?;
//!
//! // List one level
//! let listing = fs.browse("/2024").await;
//! for child in listing.children.unwrap_or_default() {
//!     println!("{:?} ({:?} bytes)", child.full_path, child.size);
//! }
//!
//! fs.close().await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod fs;
pub mod http;
pub mod progress;

// Re-export commonly used types
pub use api::{ApiClient, RemoteStorage};
pub use config::{ConnectionConfig, PluginConfig};
pub use error::{DropboxError, Result};
pub use fs::{BrowseEntry, DropboxFs, EnumeratedFile, FileStat, ItemDescriptor, RootConfig, CHUNK_SIZE};
pub use progress::{ProgressCallback, TransferProgress};
