//! Provider configuration.
//!
//! The host hands the provider its plugin settings as a JSON document; the
//! Dropbox connection lives under `dropbox_connection`:
//!
//! ```json
//! {
//!   "dropbox_connection": {
//!     "access_token": "sl.XXXX",
//!     "timeout_secs": 60
//!   }
//! }
//! ```

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{DropboxError, Result};

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_RETRIES: u32 = 5;

/// Plugin-level settings supplied by the host.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginConfig {
    pub dropbox_connection: ConnectionConfig,
}

impl PluginConfig {
    /// Parse plugin settings from JSON and validate them.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.dropbox_connection.validate()?;
        Ok(config)
    }
}

/// Credentials and transport settings for one Dropbox account.
#[derive(Clone, Deserialize)]
pub struct ConnectionConfig {
    /// OAuth2 bearer token.
    pub access_token: String,
    /// Optional HTTP/SOCKS proxy URL.
    #[serde(default)]
    pub proxy: Option<String>,
    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries on rate limiting before giving up.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl ConnectionConfig {
    /// Connection settings with defaults for everything but the token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            proxy: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reject settings that cannot produce a working client.
    pub fn validate(&self) -> Result<()> {
        if self.access_token.trim().is_empty() {
            return Err(DropboxError::Config("access_token is empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(DropboxError::Config(
                "timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("access_token", &"<redacted>")
            .field("proxy", &self.proxy)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}
