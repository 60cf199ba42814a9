//! The Dropbox filesystem provider.

use tracing::info;

use crate::api::client::ApiClient;
use crate::api::remote::RemoteStorage;
use crate::config::PluginConfig;
use crate::error::Result;
use crate::fs::path::RootConfig;

/// A Dropbox account (or any [`RemoteStorage`]) exposed as a filesystem
/// rooted at a configurable folder.
///
/// Virtual paths passed to the operations are relative to that folder and
/// may or may not start with `/`.
///
/// # Example
/// ```no_run
/// use dropbox_fs::{DropboxFs, PluginConfig};
///
/// # async fn example() -> dropbox_fs::Result<()> {
/// let config = PluginConfig::from_json(
///     r#"{"dropbox_connection": {"access_token": "sl.XXXX"}}"#,
/// )?;
/// let fs = DropboxFs::connect("/datasets", &config)?;
///
/// if let Some(stat) = fs.stat("/train.csv").await {
///     println!("{} ({} bytes)", stat.path, stat.size);
/// }
/// fs.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DropboxFs<R = ApiClient> {
    root: RootConfig,
    remote: R,
}

impl DropboxFs<ApiClient> {
    /// Connect to Dropbox with the host's plugin settings.
    pub fn connect(root: &str, config: &PluginConfig) -> Result<Self> {
        let client = ApiClient::new(&config.dropbox_connection)?;
        Ok(Self::new(root, client))
    }
}

impl<R: RemoteStorage> DropboxFs<R> {
    /// Mount `remote` at `root`.
    pub fn new(root: &str, remote: R) -> Self {
        let root = RootConfig::new(root);
        info!(root = root.normalized(), "dropbox filesystem mounted");
        Self { root, remote }
    }

    pub fn root(&self) -> &RootConfig {
        &self.root
    }

    pub(crate) fn remote(&self) -> &R {
        &self.remote
    }

    /// Absolute remote path for a virtual path.
    pub(crate) fn absolute(&self, path: &str) -> String {
        self.root.to_absolute(path)
    }

    /// Setting modification times is not supported; always `false`.
    pub fn set_last_modified(&self, path: &str, _last_modified: i64) -> bool {
        tracing::debug!(path, "set_last_modified is not supported");
        false
    }

    /// Release the remote client.
    pub async fn close(self) {
        self.remote.close().await;
    }
}
