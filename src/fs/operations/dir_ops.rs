//! Mutations: recursive delete and move.

use tracing::{debug, info};

use crate::api::remote::RemoteStorage;
use crate::error::{DropboxError, Result};
use crate::fs::path::normalize;
use crate::fs::provider::DropboxFs;

impl<R: RemoteStorage> DropboxFs<R> {
    /// Delete a file or folder and everything below it.
    ///
    /// # Returns
    /// `1` if an item was deleted, `0` if nothing existed at `path`.
    pub async fn delete_recursive(&self, path: &str) -> Result<u64> {
        let absolute = self.absolute(path);

        match self.remote().delete(&absolute).await {
            Ok(_) => {
                info!(path = %absolute, "deleted");
                Ok(1)
            }
            Err(e) if e.is_not_found() => {
                debug!(path = %absolute, "nothing to delete");
                Ok(0)
            }
            Err(e) => Err(DropboxError::Operation {
                action: "deleting",
                path: normalize(path),
                source: Box::new(e),
            }),
        }
    }

    /// Move a file or folder.
    ///
    /// # Returns
    /// `false` if the source did not exist.
    pub async fn move_path(&self, from: &str, to: &str) -> Result<bool> {
        let source = self.absolute(from);
        let target = self.absolute(to);

        match self.remote().move_path(&source, &target).await {
            Ok(_) => {
                info!(from = %source, to = %target, "moved");
                Ok(true)
            }
            Err(e) if e.is_not_found() => {
                debug!(from = %source, "nothing to move");
                Ok(false)
            }
            Err(e) => Err(DropboxError::Operation {
                action: "moving",
                path: normalize(from),
                source: Box::new(e),
            }),
        }
    }
}
