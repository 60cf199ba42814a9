//! Error types for the dropbox-fs library.

use thiserror::Error;

use crate::api::error::ApiErrorSummary;

/// Main error type for dropbox-fs operations.
#[derive(Error, Debug)]
pub enum DropboxError {
    /// HTTP request failed with status code.
    #[error("HTTP error: {status} - {body}")]
    HttpError { status: u16, body: String },

    /// Network request error.
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Reading the caller's source or writing the caller's sink failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Rate limited and the retry budget is spent.
    #[error("Rate limited by server, try again later")]
    RateLimited,

    /// Invalid or unexpected response from server.
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Dropbox API returned an endpoint error (HTTP 409).
    #[error("API error: {summary}")]
    ApiError { summary: ApiErrorSummary },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A listed descendant does not live under the folder that was listed.
    #[error("Path '{path}' is not under '{base}'")]
    PathMismatch { base: String, path: String },

    /// A delete or move failed for a reason other than absence.
    #[error("Error while {action} \"{path}\": {source}")]
    Operation {
        action: &'static str,
        path: String,
        #[source]
        source: Box<DropboxError>,
    },

    /// A write failed; `offset` is the number of bytes the remote accepted.
    #[error("Upload of \"{path}\" failed at offset {offset}: {source}")]
    Upload {
        path: String,
        offset: u64,
        #[source]
        source: Box<DropboxError>,
    },

    /// The committed file does not hash to what was sent.
    #[error("Content hash mismatch for \"{path}\": expected {expected}, got {actual}")]
    ContentHashMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// Transfer cancelled by a progress callback.
    #[error("Transfer cancelled")]
    Cancelled,
}

impl DropboxError {
    /// Build an API error from a raw `error_summary` string.
    pub fn api(summary: impl AsRef<str>) -> Self {
        DropboxError::ApiError {
            summary: ApiErrorSummary::parse(summary.as_ref()),
        }
    }

    /// Whether the remote reported the looked-up path as absent.
    ///
    /// Context wrappers are looked through, so an [`DropboxError::Operation`]
    /// around a not-found error is still not-found.
    pub fn is_not_found(&self) -> bool {
        match self {
            DropboxError::ApiError { summary } => summary.is_not_found(),
            DropboxError::Operation { source, .. } | DropboxError::Upload { source, .. } => {
                source.is_not_found()
            }
            _ => false,
        }
    }
}

/// Result type alias for dropbox-fs operations.
pub type Result<T> = std::result::Result<T, DropboxError>;
