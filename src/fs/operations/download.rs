//! Streamed reads.

use futures::io::{AsyncWrite, AsyncWriteExt};
use futures::StreamExt;
use tracing::debug;

use super::utils::report;
use crate::api::remote::RemoteStorage;
use crate::error::{DropboxError, Result};
use crate::fs::path::normalize;
use crate::fs::provider::DropboxFs;
use crate::progress::ProgressCallback;

impl<R: RemoteStorage> DropboxFs<R> {
    /// Copy a file's content into `sink`.
    ///
    /// # Arguments
    /// * `path` - Virtual path of the file
    /// * `sink` - Destination for the content
    /// * `limit` - Stop after this many bytes; only that many are requested
    ///
    /// # Returns
    /// Number of bytes written to `sink`.
    pub async fn read<W>(&self, path: &str, sink: &mut W, limit: Option<u64>) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        self.read_with_progress(path, sink, limit, None).await
    }

    /// Like [`DropboxFs::read`], reporting progress after each piece written.
    /// The total is only known once the transfer ends.
    pub async fn read_with_progress<W>(
        &self,
        path: &str,
        sink: &mut W,
        limit: Option<u64>,
        mut progress: Option<ProgressCallback>,
    ) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let absolute = self.absolute(path);
        let virtual_path = normalize(path);
        let reading = |e| DropboxError::Operation {
            action: "reading",
            path: virtual_path.clone(),
            source: Box::new(e),
        };

        let mut stream = self
            .remote()
            .download(&absolute, limit)
            .await
            .map_err(reading)?;

        let mut written = 0u64;
        while limit.map_or(true, |limit| written < limit) {
            let Some(piece) = stream.next().await else {
                break;
            };
            let piece = piece.map_err(reading)?;

            // The remote may send more than was asked for.
            let take = match limit {
                Some(limit) => {
                    let remaining = usize::try_from(limit - written).unwrap_or(usize::MAX);
                    piece.len().min(remaining)
                }
                None => piece.len(),
            };
            sink.write_all(&piece[..take]).await?;
            written += take as u64;

            if !report(&mut progress, &virtual_path, written, None) {
                return Err(DropboxError::Cancelled);
            }
        }
        sink.flush().await?;

        report(&mut progress, &virtual_path, written, Some(written));
        debug!(path = %absolute, bytes = written, "read complete");
        Ok(written)
    }
}
