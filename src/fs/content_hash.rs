//! Dropbox content hash.
//!
//! The content is split into 4 MiB blocks, each block is hashed with SHA-256,
//! and the hex-encoded SHA-256 of the concatenated block digests is the
//! file's `content_hash`. The hasher accepts data in arbitrary pieces.

use sha2::{Digest, Sha256};

/// Block size the content hash is defined over.
pub const BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Incremental content hasher.
#[derive(Clone, Default)]
pub struct ContentHasher {
    overall: Sha256,
    block: Sha256,
    block_len: usize,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next piece of content.
    pub fn update(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let take = (BLOCK_SIZE - self.block_len).min(data.len());
            self.block.update(&data[..take]);
            self.block_len += take;
            data = &data[take..];

            if self.block_len == BLOCK_SIZE {
                self.finish_block();
            }
        }
    }

    /// Hex digest of everything fed so far.
    pub fn finalize(mut self) -> String {
        if self.block_len > 0 {
            self.finish_block();
        }
        hex::encode(self.overall.finalize())
    }

    fn finish_block(&mut self) {
        let block = std::mem::take(&mut self.block);
        self.overall.update(block.finalize());
        self.block_len = 0;
    }
}

/// Content hash of an in-memory buffer.
pub fn content_hash(data: &[u8]) -> String {
    let mut hasher = ContentHasher::new();
    hasher.update(data);
    hasher.finalize()
}
