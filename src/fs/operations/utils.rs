//! Shared helpers for filesystem operations.

use std::io::{self, ErrorKind};

use futures::io::{AsyncRead, AsyncReadExt};

use crate::progress::{ProgressCallback, TransferProgress};

/// Read up to `size` bytes, stopping early only at end of stream.
///
/// A short (or empty) result therefore means the source is exhausted.
pub(crate) async fn read_chunk<R>(reader: &mut R, size: usize) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = vec![0u8; size];
    let mut filled = 0;

    while filled < size {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    buf.truncate(filled);
    Ok(buf)
}

/// Invoke the progress callback, if any. Returns `false` to cancel.
pub(crate) fn report(
    progress: &mut Option<ProgressCallback>,
    path: &str,
    done: u64,
    total: Option<u64>,
) -> bool {
    match progress {
        Some(callback) => callback(&TransferProgress::new(done, total, path)),
        None => true,
    }
}
