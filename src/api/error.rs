//! Dropbox API error summaries.
//!
//! Endpoint errors come back as HTTP 409 with a body like
//! `{"error_summary": "path_lookup/not_found/..", "error": {...}}`.
//! The summary is a slash-separated chain of union tags; the first tag names
//! the argument that failed and the second names the reason.

use std::fmt;

/// Reason classes reported by the Dropbox API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Path does not exist
    NotFound,
    /// Something already exists at the destination
    Conflict,
    /// Destination is not writable
    NoWritePermission,
    /// Path is malformed
    MalformedPath,
    /// Content is restricted
    RestrictedContent,
    /// Account is over quota
    InsufficientSpace,
    /// Too many write operations in the namespace
    TooManyWriteOperations,
    /// Rate limited
    TooManyRequests,
    /// Upload session cursor offset does not match the server
    IncorrectOffset,
    /// Upload session is closed or expired
    SessionClosed,
    /// Unrecognized reason
    Other,
}

impl ApiErrorKind {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "not_found" => ApiErrorKind::NotFound,
            "conflict" => ApiErrorKind::Conflict,
            "no_write_permission" => ApiErrorKind::NoWritePermission,
            "malformed_path" => ApiErrorKind::MalformedPath,
            "restricted_content" => ApiErrorKind::RestrictedContent,
            "insufficient_space" => ApiErrorKind::InsufficientSpace,
            "too_many_write_operations" => ApiErrorKind::TooManyWriteOperations,
            "too_many_requests" => ApiErrorKind::TooManyRequests,
            "incorrect_offset" => ApiErrorKind::IncorrectOffset,
            "closed" | "not_closed" | "expired" => ApiErrorKind::SessionClosed,
            _ => ApiErrorKind::Other,
        }
    }

    /// Get human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            ApiErrorKind::NotFound => "Path not found",
            ApiErrorKind::Conflict => "Conflicting item at destination",
            ApiErrorKind::NoWritePermission => "No write permission",
            ApiErrorKind::MalformedPath => "Malformed path",
            ApiErrorKind::RestrictedContent => "Restricted content",
            ApiErrorKind::InsufficientSpace => "Insufficient space",
            ApiErrorKind::TooManyWriteOperations => "Too many write operations",
            ApiErrorKind::TooManyRequests => "Too many requests",
            ApiErrorKind::IncorrectOffset => "Incorrect upload offset",
            ApiErrorKind::SessionClosed => "Upload session closed",
            ApiErrorKind::Other => "Unknown error",
        }
    }
}

/// Tags that name a path argument whose `not_found` reason means absence.
const LOOKUP_TAGS: &[&str] = &["path", "path_lookup", "from_lookup"];

/// A parsed `error_summary`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorSummary {
    raw: String,
    tags: Vec<String>,
}

impl ApiErrorSummary {
    /// Parse an `error_summary` string.
    ///
    /// The trailing `..` and the random suffix the API appends are ignored.
    pub fn parse(summary: &str) -> Self {
        let tags = summary
            .split('/')
            .map(str::trim)
            .filter(|t| !t.is_empty() && !t.starts_with('.'))
            .map(str::to_string)
            .collect();
        Self {
            raw: summary.to_string(),
            tags,
        }
    }

    /// The raw summary string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The union tag chain, outermost first.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Reason class: the most specific recognized tag in the chain.
    pub fn kind(&self) -> ApiErrorKind {
        self.tags
            .iter()
            .map(|t| ApiErrorKind::from_tag(t))
            .find(|k| *k != ApiErrorKind::Other)
            .unwrap_or(ApiErrorKind::Other)
    }

    /// Whether this is the "path does not exist" error of a lookup argument.
    ///
    /// `to/not_found` on a move is not absence of the source, so only the
    /// lookup tags count.
    pub fn is_not_found(&self) -> bool {
        match self.tags.as_slice() {
            [arg, reason, ..] => LOOKUP_TAGS.contains(&arg.as_str()) && reason == "not_found",
            _ => false,
        }
    }
}

impl fmt::Display for ApiErrorSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind().description(), self.raw)
    }
}
