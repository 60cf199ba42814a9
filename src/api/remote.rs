//! The remote storage capability the filesystem provider is built on.

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::metadata::{FileMetadata, Metadata, UploadCursor};
use crate::error::Result;
use crate::http::ByteStream;

/// Operations the provider needs from the remote storage service.
///
/// Every path is absolute in the service's namespace and already normalized;
/// the provider root is `/`. Absence is reported as an error for which
/// [`crate::DropboxError::is_not_found`] returns `true`.
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Fetch metadata for a single path.
    async fn get_metadata(&self, path: &str) -> Result<Metadata>;

    /// List a folder's children, or its whole subtree when `recursive`.
    ///
    /// Implementations return every entry, following pagination.
    async fn list_folder(&self, path: &str, recursive: bool) -> Result<Vec<Metadata>>;

    /// Stream a file's content, or only its first `limit` bytes.
    ///
    /// A service may ignore `limit` and stream more; callers stop reading
    /// once they have enough.
    async fn download(&self, path: &str, limit: Option<u64>) -> Result<ByteStream>;

    /// Upload a file in a single request, replacing any existing file.
    async fn upload(&self, path: &str, data: Vec<u8>) -> Result<FileMetadata>;

    /// Open an upload session with its first chunk. Returns the session id.
    async fn upload_session_start(&self, data: Vec<u8>) -> Result<String>;

    /// Append a chunk at `cursor.offset`.
    async fn upload_session_append(&self, data: Vec<u8>, cursor: &UploadCursor) -> Result<()>;

    /// Append the final chunk and commit the session to `path`.
    async fn upload_session_finish(
        &self,
        data: Vec<u8>,
        cursor: &UploadCursor,
        path: &str,
    ) -> Result<FileMetadata>;

    /// Give up on a session so no further data can be appended.
    ///
    /// Services without an explicit abort let abandoned sessions expire.
    async fn upload_session_abort(&self, _cursor: &UploadCursor) -> Result<()> {
        Ok(())
    }

    /// Delete a file or folder (recursively).
    async fn delete(&self, path: &str) -> Result<Metadata>;

    /// Move a file or folder.
    async fn move_path(&self, from: &str, to: &str) -> Result<Metadata>;

    /// Release connections held by the client.
    async fn close(&self) {}
}

#[async_trait]
impl<T: RemoteStorage + ?Sized> RemoteStorage for Arc<T> {
    async fn get_metadata(&self, path: &str) -> Result<Metadata> {
        (**self).get_metadata(path).await
    }

    async fn list_folder(&self, path: &str, recursive: bool) -> Result<Vec<Metadata>> {
        (**self).list_folder(path, recursive).await
    }

    async fn download(&self, path: &str, limit: Option<u64>) -> Result<ByteStream> {
        (**self).download(path, limit).await
    }

    async fn upload(&self, path: &str, data: Vec<u8>) -> Result<FileMetadata> {
        (**self).upload(path, data).await
    }

    async fn upload_session_start(&self, data: Vec<u8>) -> Result<String> {
        (**self).upload_session_start(data).await
    }

    async fn upload_session_append(&self, data: Vec<u8>, cursor: &UploadCursor) -> Result<()> {
        (**self).upload_session_append(data, cursor).await
    }

    async fn upload_session_finish(
        &self,
        data: Vec<u8>,
        cursor: &UploadCursor,
        path: &str,
    ) -> Result<FileMetadata> {
        (**self).upload_session_finish(data, cursor, path).await
    }

    async fn upload_session_abort(&self, cursor: &UploadCursor) -> Result<()> {
        (**self).upload_session_abort(cursor).await
    }

    async fn delete(&self, path: &str) -> Result<Metadata> {
        (**self).delete(path).await
    }

    async fn move_path(&self, from: &str, to: &str) -> Result<Metadata> {
        (**self).move_path(from, to).await
    }

    async fn close(&self) {
        (**self).close().await
    }
}
