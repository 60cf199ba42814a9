//! Upload session bookkeeping.

use crate::api::metadata::UploadCursor;

/// Chunk size for session uploads; payloads up to this size go in one request.
pub const CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// State of an open upload session: its id and the bytes already accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    session_id: String,
    offset: u64,
}

impl UploadSession {
    /// State right after `start` accepted the first `first_chunk` bytes.
    pub fn started(session_id: String, first_chunk: usize) -> Self {
        Self {
            session_id,
            offset: first_chunk as u64,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Bytes the remote has accepted so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Cursor for the next append or finish.
    pub fn cursor(&self) -> UploadCursor {
        UploadCursor {
            session_id: self.session_id.clone(),
            offset: self.offset,
        }
    }

    /// Record an accepted chunk. Chunks are never empty nor larger than
    /// [`CHUNK_SIZE`], so the offset grows strictly by at most one chunk.
    pub fn advance(&mut self, chunk_len: usize) {
        debug_assert!(chunk_len > 0 && chunk_len <= CHUNK_SIZE);
        self.offset += chunk_len as u64;
    }
}
