//! Replica State
//!
//! The persisted baseline document, one per synced directory. It records,
//! for every tracked file, the remote object it corresponds to and the
//! mtime pair observed at the last successful synchronization. That pair is
//! what makes three-way conflict detection possible: a plain two-way mtime
//! compare cannot distinguish "remote changed" from "both changed".
//!
//! The document lives inside the synced directory itself and is excluded
//! from sync by basename. Missing or unreadable input yields an empty
//! document, never an error; saving is a full overwrite with no
//! partial-write visibility (temp file + rename).

use crate::error::{Result, SyncError};
use bridge_traits::fs::LocalFileSystem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Baseline for one tracked file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Opaque ID of the corresponding remote object
    pub remote_id: String,

    /// Local mtime observed when this record was last written (Unix seconds)
    pub local_mtime_at_sync: i64,

    /// Remote mtime observed when this record was last written (Unix seconds)
    pub remote_mtime_at_sync: i64,
}

/// The persisted replica-state document
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ReplicaState {
    /// Relative path (`/`-normalized, case-sensitive) → baseline record
    pub files: BTreeMap<String, FileRecord>,

    /// Relative directory path → remote container ID.
    ///
    /// Once recorded, a container ID is authoritative for the session and
    /// is never re-queried unless absent.
    pub folders: BTreeMap<String, String>,
}

/// Loads and persists the replica-state document.
///
/// No other component persists state directly.
pub struct StateStore {
    fs: Arc<dyn LocalFileSystem>,
    path: PathBuf,
}

impl StateStore {
    pub fn new(fs: Arc<dyn LocalFileSystem>, path: PathBuf) -> Self {
        Self { fs, path }
    }

    /// Load the persisted document.
    ///
    /// Never fails: a missing or unparsable document yields an empty state.
    pub async fn load(&self) -> ReplicaState {
        let raw = match self.fs.read_file(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = ?self.path, error = %e, "No readable state document, starting empty");
                return ReplicaState::default();
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(state) => state,
            Err(e) => {
                warn!(path = ?self.path, error = %e, "State document is corrupt, starting empty");
                ReplicaState::default()
            }
        }
    }

    /// Persist the document as a full overwrite.
    ///
    /// Writes a sibling temp file and renames it over the target, so readers
    /// never observe a partially-written document.
    pub async fn save(&self, state: &ReplicaState) -> Result<()> {
        let json = serde_json::to_vec_pretty(state).map_err(|e| {
            SyncError::State(bridge_traits::BridgeError::OperationFailed(format!(
                "state serialization failed: {}",
                e
            )))
        })?;

        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("state");
        let tmp = self.path.with_file_name(format!("{}.tmp", file_name));

        self.fs
            .write_file(&tmp, json.into())
            .await
            .map_err(SyncError::State)?;
        self.fs
            .rename(&tmp, &self.path)
            .await
            .map_err(SyncError::State)?;

        debug!(path = ?self.path, files = state.files.len(), folders = state.folders.len(), "Persisted state");
        Ok(())
    }
}
