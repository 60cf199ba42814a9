//! In-memory `RemoteStorage` used by the test suites.
//!
//! Errors carry the same `error_summary` strings the real API returns, so
//! the provider's classification paths run unchanged against it.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};

use crate::api::metadata::{FileMetadata, FolderMetadata, Metadata, UploadCursor};
use crate::api::remote::RemoteStorage;
use crate::error::{DropboxError, Result};
use crate::fs::content_hash::content_hash;
use crate::http::ByteStream;

/// Size of the pieces a download is streamed in.
pub(crate) const DOWNLOAD_PIECE: usize = 64 * 1024;

/// One upload-related call, in the order the remote saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UploadCall {
    Single { path: String, len: usize },
    Start { len: usize },
    Append { len: usize, offset: u64 },
    Finish { len: usize, offset: u64, path: String },
    Abort { offset: u64 },
}

#[derive(Default)]
struct State {
    files: BTreeMap<String, Vec<u8>>,
    folders: BTreeSet<String>,
    sessions: HashMap<String, Vec<u8>>,
    closed_sessions: HashSet<String>,
    calls: Vec<UploadCall>,
    failures: HashMap<&'static str, String>,
    downloads: Vec<Download>,
    next_session: usize,
}

/// One download request and how many bytes were streamed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Download {
    pub path: String,
    pub limit: Option<u64>,
    pub served: usize,
}

#[derive(Default)]
pub(crate) struct MemoryRemote {
    state: Mutex<State>,
    metadata_calls: AtomicUsize,
    bad_hashes: AtomicBool,
    ignore_limits: AtomicBool,
    closed: AtomicBool,
}

fn not_found(arg: &str) -> DropboxError {
    DropboxError::api(format!("{}/not_found/..", arg))
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}

fn name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn descendant_prefix(path: &str) -> String {
    if path == "/" {
        "/".to_string()
    } else {
        format!("{}/", path)
    }
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file (and its ancestor folders).
    pub fn insert_file(&self, path: &str, data: &[u8]) {
        let mut state = self.state.lock().unwrap();
        Self::add_ancestors(&mut state, path);
        state.files.insert(path.to_string(), data.to_vec());
    }

    /// Add a folder (and its ancestors).
    pub fn insert_folder(&self, path: &str) {
        let mut state = self.state.lock().unwrap();
        Self::add_ancestors(&mut state, path);
        state.folders.insert(path.to_string());
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().files.get(path).cloned()
    }

    pub fn exists(&self, path: &str) -> bool {
        let state = self.state.lock().unwrap();
        state.files.contains_key(path) || state.folders.contains(path)
    }

    pub fn upload_calls(&self) -> Vec<UploadCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn open_sessions(&self) -> usize {
        let state = self.state.lock().unwrap();
        state
            .sessions
            .keys()
            .filter(|id| !state.closed_sessions.contains(*id))
            .count()
    }

    pub fn downloads(&self) -> Vec<Download> {
        self.state.lock().unwrap().downloads.clone()
    }

    /// Serve whole files even when a download asks for fewer bytes.
    pub fn ignore_download_limits(&self) {
        self.ignore_limits.store(true, Ordering::SeqCst);
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Make the next call to `op` fail with `summary`.
    pub fn fail_next(&self, op: &'static str, summary: &str) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(op, summary.to_string());
    }

    /// Report wrong content hashes for committed files.
    pub fn report_bad_hashes(&self) {
        self.bad_hashes.store(true, Ordering::SeqCst);
    }

    fn check_failure(state: &mut State, op: &'static str) -> Result<()> {
        match state.failures.remove(op) {
            Some(summary) => Err(DropboxError::api(summary)),
            None => Ok(()),
        }
    }

    fn add_ancestors(state: &mut State, path: &str) {
        let mut parent = parent_of(path);
        while parent != "/" {
            state.folders.insert(parent.to_string());
            parent = parent_of(parent);
        }
    }

    fn file_metadata(&self, path: &str, data: &[u8]) -> FileMetadata {
        let hash = if self.bad_hashes.load(Ordering::SeqCst) {
            "0".repeat(64)
        } else {
            content_hash(data)
        };
        FileMetadata {
            name: name_of(path).to_string(),
            id: None,
            path_lower: Some(path.to_lowercase()),
            path_display: Some(path.to_string()),
            size: data.len() as u64,
            server_modified: Some("2024-01-02T03:04:05Z".to_string()),
            rev: None,
            content_hash: Some(hash),
        }
    }

    fn folder_metadata(path: &str) -> FolderMetadata {
        FolderMetadata {
            name: name_of(path).to_string(),
            id: None,
            path_lower: Some(path.to_lowercase()),
            path_display: Some(path.to_string()),
        }
    }

    fn entry(&self, state: &State, path: &str) -> Option<Metadata> {
        if state.folders.contains(path) {
            Some(Metadata::Folder(Self::folder_metadata(path)))
        } else {
            state
                .files
                .get(path)
                .map(|data| Metadata::File(self.file_metadata(path, data)))
        }
    }

    fn commit(&self, state: &mut State, path: &str, data: Vec<u8>) -> FileMetadata {
        Self::add_ancestors(state, path);
        let metadata = self.file_metadata(path, &data);
        state.files.insert(path.to_string(), data);
        metadata
    }

    fn session_mut<'a>(
        state: &'a mut State,
        cursor: &UploadCursor,
    ) -> Result<&'a mut Vec<u8>> {
        if state.closed_sessions.contains(&cursor.session_id) {
            return Err(DropboxError::api("lookup_failed/closed/.."));
        }
        let session = state
            .sessions
            .get_mut(&cursor.session_id)
            .ok_or_else(|| DropboxError::api("lookup_failed/not_found/.."))?;
        if session.len() as u64 != cursor.offset {
            return Err(DropboxError::api("lookup_failed/incorrect_offset/.."));
        }
        Ok(session)
    }
}

#[async_trait]
impl RemoteStorage for MemoryRemote {
    async fn get_metadata(&self, path: &str) -> Result<Metadata> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        Self::check_failure(&mut state, "get_metadata")?;
        if path == "/" {
            // The real API rejects metadata requests for the root.
            return Err(DropboxError::HttpError {
                status: 400,
                body: "root has no metadata".to_string(),
            });
        }
        self.entry(&state, path).ok_or_else(|| not_found("path"))
    }

    async fn list_folder(&self, path: &str, recursive: bool) -> Result<Vec<Metadata>> {
        let mut state = self.state.lock().unwrap();
        Self::check_failure(&mut state, "list_folder")?;
        if path != "/" && !state.folders.contains(path) {
            if state.files.contains_key(path) {
                return Err(DropboxError::api("path/not_folder/.."));
            }
            return Err(not_found("path"));
        }

        let prefix = descendant_prefix(path);
        let mut keys: Vec<&String> = state
            .folders
            .iter()
            .chain(state.files.keys())
            .filter(|k| k.starts_with(&prefix))
            .filter(|k| recursive || parent_of(k) == path)
            .collect();
        keys.sort();

        let mut entries = Vec::new();
        if recursive && path != "/" {
            entries.push(Metadata::Folder(Self::folder_metadata(path)));
        }
        for key in keys {
            if let Some(entry) = self.entry(&state, key) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    async fn download(&self, path: &str, limit: Option<u64>) -> Result<ByteStream> {
        let mut state = self.state.lock().unwrap();
        Self::check_failure(&mut state, "download")?;
        let data = state.files.get(path).ok_or_else(|| not_found("path"))?;

        let served = match limit {
            Some(limit) if !self.ignore_limits.load(Ordering::SeqCst) => {
                data.len().min(usize::try_from(limit).unwrap_or(usize::MAX))
            }
            _ => data.len(),
        };
        let pieces: Vec<Result<Bytes>> = data[..served]
            .chunks(DOWNLOAD_PIECE)
            .map(|piece| Ok(Bytes::copy_from_slice(piece)))
            .collect();
        state.downloads.push(Download {
            path: path.to_string(),
            limit,
            served,
        });
        Ok(stream::iter(pieces).boxed())
    }

    async fn upload(&self, path: &str, data: Vec<u8>) -> Result<FileMetadata> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(UploadCall::Single {
            path: path.to_string(),
            len: data.len(),
        });
        Self::check_failure(&mut state, "upload")?;
        Ok(self.commit(&mut state, path, data))
    }

    async fn upload_session_start(&self, data: Vec<u8>) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(UploadCall::Start { len: data.len() });
        Self::check_failure(&mut state, "start")?;
        state.next_session += 1;
        let id = format!("session-{}", state.next_session);
        state.sessions.insert(id.clone(), data);
        Ok(id)
    }

    async fn upload_session_append(&self, data: Vec<u8>, cursor: &UploadCursor) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(UploadCall::Append {
            len: data.len(),
            offset: cursor.offset,
        });
        Self::check_failure(&mut state, "append")?;
        Self::session_mut(&mut state, cursor)?.extend_from_slice(&data);
        Ok(())
    }

    async fn upload_session_finish(
        &self,
        data: Vec<u8>,
        cursor: &UploadCursor,
        path: &str,
    ) -> Result<FileMetadata> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(UploadCall::Finish {
            len: data.len(),
            offset: cursor.offset,
            path: path.to_string(),
        });
        Self::check_failure(&mut state, "finish")?;
        Self::session_mut(&mut state, cursor)?.extend_from_slice(&data);
        let content = state
            .sessions
            .remove(&cursor.session_id)
            .unwrap_or_default();
        Ok(self.commit(&mut state, path, content))
    }

    async fn upload_session_abort(&self, cursor: &UploadCursor) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(UploadCall::Abort {
            offset: cursor.offset,
        });
        state.closed_sessions.insert(cursor.session_id.clone());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<Metadata> {
        let mut state = self.state.lock().unwrap();
        Self::check_failure(&mut state, "delete")?;
        let entry = self
            .entry(&state, path)
            .ok_or_else(|| not_found("path_lookup"))?;
        let prefix = descendant_prefix(path);
        state.files.retain(|k, _| k != path && !k.starts_with(&prefix));
        state.folders.retain(|k| k != path && !k.starts_with(&prefix));
        Ok(entry)
    }

    async fn move_path(&self, from: &str, to: &str) -> Result<Metadata> {
        let mut state = self.state.lock().unwrap();
        Self::check_failure(&mut state, "move")?;
        if self.entry(&state, from).is_none() {
            return Err(not_found("from_lookup"));
        }
        if self.entry(&state, to).is_some() {
            return Err(DropboxError::api("to/conflict/file/.."));
        }

        let prefix = descendant_prefix(from);
        let rename = |k: &str| -> Option<String> {
            if k == from {
                Some(to.to_string())
            } else {
                k.strip_prefix(&prefix).map(|rest| format!("{}/{}", to, rest))
            }
        };

        let files: Vec<(String, Vec<u8>)> = std::mem::take(&mut state.files).into_iter().collect();
        for (key, data) in files {
            let key = rename(&key).unwrap_or(key);
            state.files.insert(key, data);
        }
        let folders: Vec<String> = std::mem::take(&mut state.folders).into_iter().collect();
        for key in folders {
            let key = rename(&key).unwrap_or(key);
            state.folders.insert(key);
        }
        Self::add_ancestors(&mut state, to);

        self.entry(&state, to)
            .ok_or_else(|| DropboxError::InvalidResponse("moved entry vanished".to_string()))
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
