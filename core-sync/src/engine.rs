//! # Sync Engine
//!
//! Facade owning the in-memory replica state and serializing
//! reconciliation passes.
//!
//! ## Concurrency
//!
//! The engine runs on a single logical worker with cooperative suspension
//! at I/O boundaries. The debounce-triggered push flow and the
//! poll-triggered pull flow can fire independently; both acquire the state
//! lock for the *duration of the whole pass*, so one flow can never
//! overwrite bookkeeping the other has not yet saved.
//!
//! ## Usage
//!
//! ```ignore
//! use core_sync::SyncEngine;
//!
//! let engine = SyncEngine::new(&settings, sync_dir, fs, remote, event_bus).await;
//! engine.initial_sync().await?;           // full-tree push at startup
//! let outcome = engine.pull().await?;     // poll tick
//! engine.push(&outcome.needs_push).await?;
//! ```

use crate::error::{Result, SyncError};
use crate::pull::{pull_tree, PullOutcome};
use crate::push::{push_batch, PushOutcome};
use crate::state::{ReplicaState, StateStore};
use bridge_traits::fs::LocalFileSystem;
use bridge_traits::remote::RemoteStore;
use core_runtime::config::{SyncSettings, STATE_FILE_NAME};
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Borrowed collaborators handed to the reconcilers for one pass
pub(crate) struct ReconcileCtx<'a> {
    pub fs: &'a dyn LocalFileSystem,
    pub remote: &'a dyn RemoteStore,
    pub store: &'a StateStore,
    pub root: &'a Path,
    pub root_id: &'a str,
    pub excluded: &'a HashSet<String>,
}

/// Bidirectional sync engine for one local directory and one remote tree
pub struct SyncEngine {
    fs: Arc<dyn LocalFileSystem>,
    remote: Arc<dyn RemoteStore>,
    store: StateStore,
    event_bus: EventBus,
    root: PathBuf,
    root_id: String,
    excluded: HashSet<String>,
    /// In-memory authoritative state, held for the duration of each pass
    state: Mutex<ReplicaState>,
}

impl SyncEngine {
    /// Create an engine, loading the persisted state document.
    ///
    /// A missing or corrupt document yields an empty state, never an error.
    pub async fn new(
        settings: &SyncSettings,
        sync_dir: PathBuf,
        fs: Arc<dyn LocalFileSystem>,
        remote: Arc<dyn RemoteStore>,
        event_bus: EventBus,
    ) -> Self {
        let store = StateStore::new(fs.clone(), sync_dir.join(STATE_FILE_NAME));
        let state = store.load().await;

        info!(
            root = ?sync_dir,
            tracked_files = state.files.len(),
            known_folders = state.folders.len(),
            "Loaded replica state"
        );

        Self {
            fs,
            remote,
            store,
            event_bus,
            root: sync_dir,
            root_id: settings.remote_root_id.clone(),
            excluded: settings.excluded_names(),
            state: Mutex::new(state),
        }
    }

    /// The synced directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ctx(&self) -> ReconcileCtx<'_> {
        ReconcileCtx {
            fs: self.fs.as_ref(),
            remote: self.remote.as_ref(),
            store: &self.store,
            root: &self.root,
            root_id: &self.root_id,
            excluded: &self.excluded,
        }
    }

    /// Push a batch of local paths to the remote store.
    ///
    /// Paths are processed in the order supplied. Holding the state lock for
    /// the whole pass serializes this push against concurrent pulls.
    #[instrument(skip(self, paths), fields(batch = paths.len()))]
    pub async fn push(&self, paths: &[PathBuf]) -> Result<PushOutcome> {
        let mut state = self.state.lock().await;
        let pass_id = Uuid::new_v4().to_string();

        self.event_bus
            .emit(CoreEvent::Sync(SyncEvent::PushStarted {
                pass_id: pass_id.clone(),
                batch_size: paths.len() as u64,
            }))
            .ok();

        match push_batch(&self.ctx(), &mut state, paths).await {
            Ok(outcome) => {
                info!(
                    pass_id = %pass_id,
                    uploaded = outcome.uploaded,
                    updated = outcome.updated,
                    deleted = outcome.deleted,
                    skipped = outcome.skipped,
                    "Push pass completed"
                );
                self.event_bus
                    .emit(CoreEvent::Sync(SyncEvent::PushCompleted {
                        pass_id,
                        uploaded: outcome.uploaded,
                        updated: outcome.updated,
                        deleted: outcome.deleted,
                    }))
                    .ok();
                Ok(outcome)
            }
            Err(e) => {
                error!(pass_id = %pass_id, error = %e, "Push pass failed");
                self.event_bus
                    .emit(CoreEvent::Sync(SyncEvent::PassFailed {
                        pass_id,
                        message: e.to_string(),
                    }))
                    .ok();
                Err(e)
            }
        }
    }

    /// Pull the remote tree, reconciling every syncable file.
    ///
    /// Returns the paths that must be pushed to complete the cycle; the
    /// caller (normally the poll scheduler) hands them to [`Self::push`].
    #[instrument(skip(self))]
    pub async fn pull(&self) -> Result<PullOutcome> {
        let mut state = self.state.lock().await;
        let pass_id = Uuid::new_v4().to_string();

        self.event_bus
            .emit(CoreEvent::Sync(SyncEvent::PullStarted {
                pass_id: pass_id.clone(),
            }))
            .ok();

        match pull_tree(&self.ctx(), &mut state).await {
            Ok(outcome) => {
                info!(
                    pass_id = %pass_id,
                    downloaded = outcome.downloaded,
                    skipped = outcome.skipped,
                    local_wins = outcome.local_wins,
                    untracked = outcome.untracked,
                    dropped = outcome.dropped,
                    needs_push = outcome.needs_push.len(),
                    "Pull pass completed"
                );
                self.event_bus
                    .emit(CoreEvent::Sync(SyncEvent::PullCompleted {
                        pass_id,
                        downloaded: outcome.downloaded,
                        needs_push: outcome.needs_push.len() as u64,
                    }))
                    .ok();
                Ok(outcome)
            }
            Err(e) => {
                error!(pass_id = %pass_id, error = %e, "Pull pass failed");
                self.event_bus
                    .emit(CoreEvent::Sync(SyncEvent::PassFailed {
                        pass_id,
                        message: e.to_string(),
                    }))
                    .ok();
                Err(e)
            }
        }
    }

    /// Push the full local tree, used once at startup.
    pub async fn initial_sync(&self) -> Result<PushOutcome> {
        let mut paths = self
            .fs
            .list_recursive(&self.root)
            .await
            .map_err(|e| SyncError::Local {
                path: self.root.display().to_string(),
                source: e,
            })?;
        paths.sort();

        info!(files = paths.len(), "Starting initial full-tree push");
        self.push(&paths).await
    }

    /// One complete reconciliation cycle: pull, then push whatever the pull
    /// pass scheduled.
    pub async fn sync_once(&self) -> Result<()> {
        let outcome = self.pull().await?;
        if !outcome.needs_push.is_empty() {
            self.push(&outcome.needs_push).await?;
        }
        Ok(())
    }

    /// Snapshot of the in-memory state, for diagnostics and tests.
    pub async fn state_snapshot(&self) -> ReplicaState {
        self.state.lock().await.clone()
    }
}
