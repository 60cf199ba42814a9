//! Streamed writes through the chunked upload engine.
//!
//! The source is read one chunk ahead so at most two chunks are held at a
//! time. A payload that fits in one chunk goes out as a single request;
//! anything larger opens a session, appends full chunks and commits with the
//! last one.

use futures::io::AsyncRead;
use tracing::{debug, error, info, warn};

use super::utils::{read_chunk, report};
use crate::api::metadata::FileMetadata;
use crate::api::remote::RemoteStorage;
use crate::error::{DropboxError, Result};
use crate::fs::content_hash::ContentHasher;
use crate::fs::path::normalize;
use crate::fs::provider::DropboxFs;
use crate::fs::upload_state::{UploadSession, CHUNK_SIZE};
use crate::progress::ProgressCallback;

impl<R: RemoteStorage> DropboxFs<R> {
    /// Write `source` to `path`, replacing any existing file.
    ///
    /// # Returns
    /// Number of bytes written.
    ///
    /// # Errors
    /// [`DropboxError::Upload`] with the offset the remote had accepted when
    /// a read or remote call fails; any open upload session is closed first.
    pub async fn write<S>(&self, path: &str, source: &mut S) -> Result<u64>
    where
        S: AsyncRead + Unpin + ?Sized,
    {
        self.write_with_progress(path, source, None).await
    }

    /// Like [`DropboxFs::write`], reporting progress after each accepted
    /// chunk. The total is only known once the source is exhausted.
    pub async fn write_with_progress<S>(
        &self,
        path: &str,
        source: &mut S,
        mut progress: Option<ProgressCallback>,
    ) -> Result<u64>
    where
        S: AsyncRead + Unpin + ?Sized,
    {
        let absolute = self.absolute(path);
        let virtual_path = normalize(path);
        let mut hasher = ContentHasher::new();
        let mut session = None;

        let outcome = self
            .stream_upload(
                &absolute,
                &virtual_path,
                source,
                &mut hasher,
                &mut session,
                &mut progress,
            )
            .await;

        let (metadata, total) = match outcome {
            Ok(committed) => committed,
            Err(e) => {
                let offset = session.as_ref().map_or(0, UploadSession::offset);
                if let Some(open) = session.take() {
                    self.abort_session(&open, &absolute).await;
                }
                return Err(match e {
                    DropboxError::Cancelled => {
                        info!(path = %absolute, offset, "upload cancelled");
                        DropboxError::Cancelled
                    }
                    e => {
                        error!(path = %absolute, offset, error = %e, "upload failed");
                        DropboxError::Upload {
                            path: virtual_path,
                            offset,
                            source: Box::new(e),
                        }
                    }
                });
            }
        };

        let expected = hasher.finalize();
        if let Some(actual) = metadata.content_hash {
            if actual != expected {
                return Err(DropboxError::ContentHashMismatch {
                    path: virtual_path,
                    expected,
                    actual,
                });
            }
        }

        debug!(path = %absolute, bytes = total, "write complete");
        Ok(total)
    }

    /// Drive the upload. `session` holds the open session, if any, so the
    /// caller can close it when this fails.
    async fn stream_upload<S>(
        &self,
        absolute: &str,
        virtual_path: &str,
        source: &mut S,
        hasher: &mut ContentHasher,
        session: &mut Option<UploadSession>,
        progress: &mut Option<ProgressCallback>,
    ) -> Result<(FileMetadata, u64)>
    where
        S: AsyncRead + Unpin + ?Sized,
    {
        let first = read_chunk(source, CHUNK_SIZE).await?;
        hasher.update(&first);

        let mut next = if first.len() < CHUNK_SIZE {
            Vec::new()
        } else {
            read_chunk(source, CHUNK_SIZE).await?
        };

        if next.is_empty() {
            let total = first.len() as u64;
            let metadata = self.remote().upload(absolute, first).await?;
            report(progress, virtual_path, total, Some(total));
            return Ok((metadata, total));
        }

        let first_len = first.len();
        let session_id = self.remote().upload_session_start(first).await?;
        debug!(path = %absolute, session = %session_id, "upload session started");
        let open = session.insert(UploadSession::started(session_id, first_len));
        if !report(progress, virtual_path, open.offset(), None) {
            return Err(DropboxError::Cancelled);
        }

        loop {
            hasher.update(&next);
            let following = read_chunk(source, CHUNK_SIZE).await?;
            let len = next.len();

            if following.is_empty() {
                let metadata = self
                    .remote()
                    .upload_session_finish(next, &open.cursor(), absolute)
                    .await?;
                open.advance(len);
                let total = open.offset();
                *session = None;
                report(progress, virtual_path, total, Some(total));
                return Ok((metadata, total));
            }

            self.remote()
                .upload_session_append(next, &open.cursor())
                .await?;
            open.advance(len);
            if !report(progress, virtual_path, open.offset(), None) {
                return Err(DropboxError::Cancelled);
            }
            next = following;
        }
    }

    /// Close an abandoned session. Best effort: failures are only logged.
    async fn abort_session(&self, session: &UploadSession, absolute: &str) {
        if let Err(e) = self.remote().upload_session_abort(&session.cursor()).await {
            warn!(
                path = absolute,
                session = session.session_id(),
                error = %e,
                "closing upload session failed"
            );
        }
    }
}
