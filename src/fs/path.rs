//! Path translation between the virtual (root-relative) namespace and the
//! remote's absolute namespace.
//!
//! Every remote call goes through [`RootConfig::to_absolute`]; nothing else
//! builds absolute paths.

use crate::error::{DropboxError, Result};

/// The provider root in the remote's namespace.
pub const PROVIDER_ROOT: &str = "/";

/// Normalize a path: collapse repeated slashes, drop empty segments and
/// force a single leading slash. Empty input and `/` normalize to `/`.
pub fn normalize(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return PROVIDER_ROOT.to_string();
    }
    format!("/{}", segments.join("/"))
}

/// Strip a single leading slash, if present.
pub fn relativize(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

/// Join two paths and normalize the result.
pub fn join(base: &str, child: &str) -> String {
    normalize(&format!("{}/{}", base, child))
}

/// Last segment of a path (`""` for the root).
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').find(|s| !s.is_empty()).unwrap_or("")
}

/// Segments of `full` beyond `base`, without a leading slash.
///
/// `base` must be a prefix of `full` ending on a segment boundary;
/// `strip_base("/a", "/ab")` is a mismatch, not `"b"`. Both paths are
/// expected in normalized form.
pub fn strip_base<'a>(base: &str, full: &'a str) -> Result<&'a str> {
    let mismatch = || DropboxError::PathMismatch {
        base: base.to_string(),
        path: full.to_string(),
    };

    if base == PROVIDER_ROOT {
        return full.strip_prefix('/').ok_or_else(mismatch);
    }

    let rest = full.strip_prefix(base).ok_or_else(mismatch)?;
    if rest.is_empty() {
        Ok(rest)
    } else {
        rest.strip_prefix('/').ok_or_else(mismatch)
    }
}

/// Where the virtual filesystem is mounted inside the remote namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootConfig {
    configured: String,
    normalized: String,
}

impl RootConfig {
    pub fn new(root: &str) -> Self {
        Self {
            configured: root.to_string(),
            normalized: normalize(root),
        }
    }

    /// The root exactly as configured.
    pub fn configured(&self) -> &str {
        &self.configured
    }

    /// The root in normalized form.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Map a virtual path to the remote's absolute path.
    ///
    /// The result is normalized: one leading slash, no doubled or trailing
    /// separators except for the provider root itself.
    pub fn to_absolute(&self, virtual_path: &str) -> String {
        let parts = [
            PROVIDER_ROOT,
            relativize(&self.normalized),
            relativize(virtual_path),
        ];
        let joined = parts
            .iter()
            .filter(|p| !p.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("/");
        normalize(&joined)
    }
}

impl Default for RootConfig {
    fn default() -> Self {
        Self::new(PROVIDER_ROOT)
    }
}
