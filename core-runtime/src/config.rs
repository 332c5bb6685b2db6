//! # Sync Configuration
//!
//! The configuration document lives inside the synced directory itself and
//! is excluded from synchronization by exact basename, together with the
//! persisted state document and OS metadata files.
//!
//! ## Usage
//!
//! ```no_run
//! use core_runtime::config::{SyncSettings, CONFIG_FILE_NAME};
//!
//! # fn example(sync_dir: &std::path::Path) -> core_runtime::Result<()> {
//! let raw = std::fs::read(sync_dir.join(CONFIG_FILE_NAME))
//!     .map_err(|e| core_runtime::Error::Config(e.to_string()))?;
//! let settings = SyncSettings::from_json(&raw)?;
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Basename of the configuration document inside the synced directory
pub const CONFIG_FILE_NAME: &str = ".drivesyncd.json";

/// Basename of the persisted state document inside the synced directory
pub const STATE_FILE_NAME: &str = ".drivesyncd.state.json";

/// OS-generated metadata files that never participate in sync
const OS_METADATA_NAMES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini"];

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_debounce_ms() -> u64 {
    2_000
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// OAuth client settings for the token refresh flow
///
/// The refresh token itself lives in the platform secure store, never in
/// this document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OAuthSettings {
    /// OAuth client ID
    pub client_id: String,

    /// OAuth client secret, when the client type requires one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Token endpoint URL
    #[serde(default = "default_token_url")]
    pub token_url: String,
}

/// The on-disk configuration document, one per synced directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    /// Remote container ID of the tree root to mirror
    pub remote_root_id: String,

    /// Interval between pull reconciliation passes (seconds)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Quiet period for coalescing local change events (milliseconds)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Additional basenames to exclude from sync (exact match)
    #[serde(default)]
    pub extra_excluded_names: Vec<String>,

    /// OAuth client settings
    pub oauth: OAuthSettings,
}

impl SyncSettings {
    /// Parse and validate a configuration document
    pub fn from_json(raw: &[u8]) -> Result<Self> {
        let settings: SyncSettings = serde_json::from_slice(raw)
            .map_err(|e| Error::Config(format!("Invalid configuration document: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the configuration, failing fast with actionable messages
    pub fn validate(&self) -> Result<()> {
        if self.remote_root_id.is_empty() {
            return Err(Error::Config(
                "remoteRootId cannot be empty. Set it to the ID of the remote folder to mirror."
                    .to_string(),
            ));
        }

        if self.poll_interval_secs == 0 {
            return Err(Error::Config(
                "pollIntervalSecs must be greater than 0".to_string(),
            ));
        }

        if self.debounce_ms == 0 {
            return Err(Error::Config("debounceMs must be greater than 0".to_string()));
        }

        if self.oauth.client_id.is_empty() {
            return Err(Error::Config("oauth.clientId cannot be empty".to_string()));
        }

        if self.oauth.token_url.is_empty() {
            return Err(Error::Config("oauth.tokenUrl cannot be empty".to_string()));
        }

        Ok(())
    }

    /// The full set of basenames excluded from sync by exact match
    pub fn excluded_names(&self) -> HashSet<String> {
        let mut names: HashSet<String> = OS_METADATA_NAMES.iter().map(|s| s.to_string()).collect();
        names.insert(CONFIG_FILE_NAME.to_string());
        names.insert(STATE_FILE_NAME.to_string());
        // The state store writes through a sibling temp file; a crash can
        // leave one behind and it must never be pushed.
        names.insert(format!("{}.tmp", STATE_FILE_NAME));
        names.extend(self.extra_excluded_names.iter().cloned());
        names
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_json() -> &'static str {
        r#"{
            "remoteRootId": "root123",
            "oauth": { "clientId": "client-1" }
        }"#
    }

    #[test]
    fn test_parse_minimal_document_applies_defaults() {
        let settings = SyncSettings::from_json(minimal_json().as_bytes()).unwrap();

        assert_eq!(settings.remote_root_id, "root123");
        assert_eq!(settings.poll_interval_secs, 30);
        assert_eq!(settings.debounce_ms, 2_000);
        assert_eq!(settings.oauth.token_url, default_token_url());
        assert!(settings.extra_excluded_names.is_empty());
    }

    #[test]
    fn test_rejects_empty_root() {
        let raw = r#"{"remoteRootId": "", "oauth": {"clientId": "c"}}"#;
        let err = SyncSettings::from_json(raw.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("remoteRootId"));
    }

    #[test]
    fn test_rejects_zero_poll_interval() {
        let raw = r#"{
            "remoteRootId": "r",
            "pollIntervalSecs": 0,
            "oauth": {"clientId": "c"}
        }"#;
        let err = SyncSettings::from_json(raw.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("pollIntervalSecs"));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = SyncSettings::from_json(b"{not json").unwrap_err();
        assert!(err.to_string().contains("Invalid configuration document"));
    }

    #[test]
    fn test_excluded_names_cover_documents_and_os_metadata() {
        let raw = r#"{
            "remoteRootId": "r",
            "extraExcludedNames": [".stignore"],
            "oauth": {"clientId": "c"}
        }"#;
        let settings = SyncSettings::from_json(raw.as_bytes()).unwrap();
        let names = settings.excluded_names();

        assert!(names.contains(CONFIG_FILE_NAME));
        assert!(names.contains(STATE_FILE_NAME));
        assert!(names.contains(&format!("{}.tmp", STATE_FILE_NAME)));
        assert!(names.contains(".DS_Store"));
        assert!(names.contains("Thumbs.db"));
        assert!(names.contains("desktop.ini"));
        assert!(names.contains(".stignore"));
    }
}
