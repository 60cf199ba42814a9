//! Lookup and listing operations: stat, browse and enumerate.
//!
//! These favor availability: absence and remote failures come back as typed
//! absence (logged), never as errors.

use tracing::{debug, warn};

use crate::api::metadata::Metadata;
use crate::api::remote::RemoteStorage;
use crate::error::{DropboxError, Result};
use crate::fs::node::{parse_timestamp_millis, BrowseEntry, EnumeratedFile, FileStat, ItemDescriptor};
use crate::fs::path::{file_name, join, normalize, strip_base, PROVIDER_ROOT};
use crate::fs::provider::DropboxFs;

impl<R: RemoteStorage> DropboxFs<R> {
    /// Get information about a file or folder.
    ///
    /// # Returns
    /// `None` if nothing exists at `path` or the lookup failed.
    pub async fn stat(&self, path: &str) -> Option<FileStat> {
        let absolute = self.absolute(path);
        let virtual_path = normalize(path);

        let (descriptor, metadata) = self.describe(&absolute).await;
        match descriptor {
            ItemDescriptor::Folder => Some(FileStat::directory(virtual_path)),
            ItemDescriptor::File { size } => {
                let last_modified = match &metadata {
                    Some(Metadata::File(f)) => f
                        .server_modified
                        .as_deref()
                        .and_then(parse_timestamp_millis),
                    _ => None,
                };
                Some(FileStat::file(virtual_path, size, last_modified))
            }
            ItemDescriptor::Absent => None,
        }
    }

    /// Describe `path` and, for a directory, its immediate children.
    ///
    /// Child paths are the caller's virtual path joined with each child name.
    pub async fn browse(&self, path: &str) -> BrowseEntry {
        let absolute = self.absolute(path);
        let virtual_path = normalize(path);

        let (descriptor, _) = self.describe(&absolute).await;
        match descriptor {
            ItemDescriptor::Folder => match self.remote().list_folder(&absolute, false).await {
                Ok(entries) => {
                    let children = entries
                        .iter()
                        .filter_map(|entry| {
                            let child = ItemDescriptor::classify(entry);
                            child
                                .exists()
                                .then(|| BrowseEntry::child(join(&virtual_path, entry.name()), child))
                        })
                        .collect();
                    BrowseEntry::directory(virtual_path, children)
                }
                Err(e) => {
                    warn!(path = %absolute, error = %e, "listing folder failed");
                    BrowseEntry::missing()
                }
            },
            ItemDescriptor::File { size } => BrowseEntry::file(virtual_path, size),
            ItemDescriptor::Absent => BrowseEntry::missing(),
        }
    }

    /// Enumerate files under `path` recursively.
    ///
    /// A file enumerates to itself, named by its last path segment. Files
    /// below a folder are returned with virtual paths rebuilt under `path`.
    /// With `first_non_empty`, stops after the first file with content.
    ///
    /// # Returns
    /// `Ok(None)` if nothing exists at `path`. The only error is a listed
    /// entry that does not live under the folder that was listed.
    pub async fn enumerate(
        &self,
        path: &str,
        first_non_empty: bool,
    ) -> Result<Option<Vec<EnumeratedFile>>> {
        let absolute = self.absolute(path);
        let virtual_path = normalize(path);

        let (descriptor, metadata) = self.describe(&absolute).await;
        match descriptor {
            ItemDescriptor::Absent => Ok(None),
            ItemDescriptor::File { size } => {
                let name = match file_name(&virtual_path) {
                    "" => metadata.as_ref().map(Metadata::name).unwrap_or_default(),
                    name => name,
                };
                Ok(Some(vec![EnumeratedFile {
                    path: name.to_string(),
                    size,
                }]))
            }
            ItemDescriptor::Folder => {
                let entries = match self.remote().list_folder(&absolute, true).await {
                    Ok(entries) => entries,
                    Err(e) => {
                        warn!(path = %absolute, error = %e, "recursive listing failed");
                        return Ok(None);
                    }
                };

                // Prefer the server's casing of the folder; children are
                // reported with it.
                let base = metadata
                    .as_ref()
                    .and_then(Metadata::path_display)
                    .map(normalize)
                    .unwrap_or(absolute);

                let mut files = Vec::new();
                for entry in &entries {
                    let Metadata::File(file) = entry else {
                        continue;
                    };
                    let suffix = entry_suffix(&base, entry)?;
                    files.push(EnumeratedFile {
                        path: join(&virtual_path, &suffix),
                        size: file.size,
                    });
                    if first_non_empty && file.size > 0 {
                        break;
                    }
                }
                debug!(path = %base, files = files.len(), "enumerated");
                Ok(Some(files))
            }
        }
    }

    /// Classify an absolute path, logging failed lookups.
    ///
    /// The provider root is a folder without asking the remote.
    async fn describe(&self, absolute: &str) -> (ItemDescriptor, Option<Metadata>) {
        if absolute == PROVIDER_ROOT {
            return (ItemDescriptor::Folder, None);
        }

        let lookup = self.remote().get_metadata(absolute).await;
        match &lookup {
            Err(e) if e.is_not_found() => debug!(path = absolute, "not found"),
            Err(e) => warn!(path = absolute, error = %e, "metadata lookup failed"),
            Ok(_) => {}
        }
        (ItemDescriptor::from_lookup(&lookup), lookup.ok())
    }
}

/// Segments of a listed entry's path below the listed folder `base`.
///
/// Dropbox paths are case-insensitive and `path_display` casing is only
/// guaranteed for the last component, so when the display path does not
/// start with `base` the lowercased paths decide the depth and the display
/// path supplies that many trailing segments.
fn entry_suffix(base: &str, entry: &Metadata) -> Result<String> {
    let display = entry.path_display();
    if let Some(suffix) = display.and_then(|d| strip_base(base, d).ok()) {
        return Ok(suffix.to_string());
    }

    let mismatch = || DropboxError::PathMismatch {
        base: base.to_string(),
        path: display.unwrap_or(entry.name()).to_string(),
    };

    let lower = entry.path_lower().ok_or_else(mismatch)?;
    let lower_base = base.to_lowercase();
    let lower_suffix = strip_base(&lower_base, lower)?;
    let depth = lower_suffix.split('/').filter(|s| !s.is_empty()).count();

    match display {
        Some(display) => {
            let segments: Vec<&str> = display.split('/').filter(|s| !s.is_empty()).collect();
            if segments.len() < depth {
                return Err(mismatch());
            }
            Ok(segments[segments.len() - depth..].join("/"))
        }
        None => Ok(lower_suffix.to_string()),
    }
}
