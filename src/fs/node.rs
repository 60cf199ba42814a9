//! Uniform descriptors built from Dropbox-native metadata.

use chrono::DateTime;
use serde::Serialize;

use crate::api::metadata::Metadata;
use crate::error::Result;

/// Classification of a remote path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemDescriptor {
    /// Regular file of the given size
    File { size: u64 },
    /// Folder
    Folder,
    /// Nothing there
    Absent,
}

impl ItemDescriptor {
    /// Classify native metadata. Deleted tombstones are absent.
    pub fn classify(metadata: &Metadata) -> Self {
        match metadata {
            Metadata::File(f) => ItemDescriptor::File { size: f.size },
            Metadata::Folder(_) => ItemDescriptor::Folder,
            Metadata::Deleted(_) => ItemDescriptor::Absent,
        }
    }

    /// Classify the outcome of a lookup; any error is absent.
    pub fn from_lookup(lookup: &Result<Metadata>) -> Self {
        match lookup {
            Ok(metadata) => Self::classify(metadata),
            Err(_) => ItemDescriptor::Absent,
        }
    }

    pub fn exists(&self) -> bool {
        !matches!(self, ItemDescriptor::Absent)
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, ItemDescriptor::Folder)
    }
}

/// Result of `stat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStat {
    /// Normalized virtual path
    pub path: String,
    /// Size in bytes (0 for directories)
    pub size: u64,
    pub is_directory: bool,
    /// Last server-side modification, epoch milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
}

impl FileStat {
    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            size: 0,
            is_directory: true,
            last_modified: None,
        }
    }

    pub fn file(path: impl Into<String>, size: u64, last_modified: Option<i64>) -> Self {
        Self {
            path: path.into(),
            size,
            is_directory: false,
            last_modified,
        }
    }
}

/// Result of `browse`, and the shape of each child it lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseEntry {
    /// Normalized virtual path (`None` when nothing exists)
    pub full_path: Option<String>,
    pub exists: bool,
    #[serde(rename = "directory")]
    pub is_directory: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Immediate children, only for a browsed directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<BrowseEntry>>,
}

impl BrowseEntry {
    pub fn missing() -> Self {
        Self {
            full_path: None,
            exists: false,
            is_directory: false,
            size: None,
            children: None,
        }
    }

    pub fn file(full_path: impl Into<String>, size: u64) -> Self {
        Self {
            full_path: Some(full_path.into()),
            exists: true,
            is_directory: false,
            size: Some(size),
            children: None,
        }
    }

    pub fn directory(full_path: impl Into<String>, children: Vec<BrowseEntry>) -> Self {
        Self {
            full_path: Some(full_path.into()),
            exists: true,
            is_directory: true,
            size: None,
            children: Some(children),
        }
    }

    /// A listed child: a leaf entry whose size is 0 for directories.
    pub fn child(full_path: impl Into<String>, descriptor: ItemDescriptor) -> Self {
        let (is_directory, size) = match descriptor {
            ItemDescriptor::File { size } => (false, size),
            _ => (true, 0),
        };
        Self {
            full_path: Some(full_path.into()),
            exists: true,
            is_directory,
            size: Some(size),
            children: None,
        }
    }
}

/// One file produced by `enumerate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumeratedFile {
    pub path: String,
    pub size: u64,
}

/// Parse an RFC 3339 timestamp into epoch milliseconds.
pub(crate) fn parse_timestamp_millis(value: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.timestamp_millis())
}
