//! Pull Reconciliation
//!
//! Drives remote→local propagation for the whole tree. The remote listing
//! is snapshotted once at pass start; every syncable file is run through
//! the conflict resolver, and remote-side deletions are processed only
//! after the full file-by-file pass completes.
//!
//! A remote-side disappearance with a surviving local copy is treated as
//! "push it back up", never as "delete it locally".

use crate::decide::{decide, SyncAction};
use crate::engine::ReconcileCtx;
use crate::error::{Result, SyncError};
use crate::paths::{basename, key_to_path};
use crate::state::{FileRecord, ReplicaState};
use bridge_traits::remote::{RemoteEntry, RemoteEntryKind, RemoteStore};
use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Counters and follow-up work for one pull pass
#[derive(Debug, Clone, Default)]
pub struct PullOutcome {
    /// Remote objects downloaded over the local copy
    pub downloaded: u64,
    /// Files unchanged since the last sync
    pub skipped: u64,
    /// Conflicts resolved in favor of the local copy
    pub local_wins: u64,
    /// Records untracked because the remote object disappeared while the
    /// local file survived
    pub untracked: u64,
    /// Stale records dropped (both sides gone)
    pub dropped: u64,
    /// Local paths the caller must hand to the push reconciler to complete
    /// the cycle
    pub needs_push: Vec<PathBuf>,
}

/// Build a map of the remote tree keyed by relative path.
///
/// An explicit worklist of container IDs keeps traversal depth bounded
/// regardless of tree shape.
pub(crate) async fn list_remote_tree(
    remote: &dyn RemoteStore,
    root_id: &str,
) -> bridge_traits::Result<BTreeMap<String, RemoteEntry>> {
    let mut tree = BTreeMap::new();
    let mut pending: VecDeque<(String, String)> = VecDeque::new();
    pending.push_back((root_id.to_string(), String::new()));

    while let Some((container_id, prefix)) = pending.pop_front() {
        let mut cursor = None;

        loop {
            let page = remote.list_children(&container_id, cursor).await?;

            for entry in page.entries {
                let key = if prefix.is_empty() {
                    entry.name.clone()
                } else {
                    format!("{}/{}", prefix, entry.name)
                };

                if entry.is_folder() {
                    pending.push_back((entry.id.clone(), key.clone()));
                }
                tree.insert(key, entry);
            }

            cursor = page.next_cursor;
            if cursor.is_none() {
                break;
            }
        }
    }

    Ok(tree)
}

pub(crate) async fn pull_tree(
    ctx: &ReconcileCtx<'_>,
    state: &mut ReplicaState,
) -> Result<PullOutcome> {
    let mut outcome = PullOutcome::default();

    let listing = list_remote_tree(ctx.remote, ctx.root_id)
        .await
        .map_err(SyncError::Listing)?;
    debug!(entries = listing.len(), "Snapshotted remote tree");

    for (key, entry) in &listing {
        match entry.kind {
            RemoteEntryKind::Folder => {
                state.folders.insert(key.clone(), entry.id.clone());
            }
            RemoteEntryKind::NativeDocument => {
                // No binary export; permanently excluded from sync.
                debug!(path = %key, "Skipping provider-native document");
            }
            RemoteEntryKind::File => {
                if ctx.excluded.contains(basename(key)) {
                    debug!(path = %key, "Skipping excluded name");
                    continue;
                }

                let local_path = key_to_path(ctx.root, key);
                let local_exists =
                    ctx.fs
                        .exists(&local_path)
                        .await
                        .map_err(|e| SyncError::Local {
                            path: key.clone(),
                            source: e,
                        })?;
                let local_mtime = if local_exists {
                    ctx.fs
                        .stat(&local_path)
                        .await
                        .map_err(|e| SyncError::Local {
                            path: key.clone(),
                            source: e,
                        })?
                        .modified_at
                } else {
                    None
                };

                match decide(
                    state.files.get(key),
                    local_exists,
                    local_mtime,
                    entry.modified_at,
                ) {
                    SyncAction::Download => {
                        let content =
                            ctx.remote
                                .download(&entry.id)
                                .await
                                .map_err(|e| SyncError::Remote {
                                    path: key.clone(),
                                    source: e,
                                })?;

                        if let Some(parent) = local_path.parent() {
                            ctx.fs
                                .create_dir_all(parent)
                                .await
                                .map_err(|e| SyncError::Local {
                                    path: key.clone(),
                                    source: e,
                                })?;
                        }
                        ctx.fs
                            .write_file(&local_path, content)
                            .await
                            .map_err(|e| SyncError::Local {
                                path: key.clone(),
                                source: e,
                            })?;

                        // Record the freshly observed local mtime so the next
                        // pass reads this download as "unchanged".
                        let fresh = ctx
                            .fs
                            .stat(&local_path)
                            .await
                            .map_err(|e| SyncError::Local {
                                path: key.clone(),
                                source: e,
                            })?;

                        state.files.insert(
                            key.clone(),
                            FileRecord {
                                remote_id: entry.id.clone(),
                                local_mtime_at_sync: fresh.modified_at.unwrap_or(0),
                                remote_mtime_at_sync: entry.modified_at,
                            },
                        );
                        outcome.downloaded += 1;
                        info!(path = %key, "Downloaded remote object");
                    }
                    SyncAction::LocalWins => {
                        // Re-point the record at the current remote object so
                        // the follow-up push updates it instead of creating a
                        // duplicate. The local baseline is left as-is for
                        // tracked files so local edits stay visible to
                        // conflict detection until the push lands.
                        let local_baseline = state
                            .files
                            .get(key)
                            .map(|r| r.local_mtime_at_sync)
                            .or(local_mtime)
                            .unwrap_or(0);

                        state.files.insert(
                            key.clone(),
                            FileRecord {
                                remote_id: entry.id.clone(),
                                local_mtime_at_sync: local_baseline,
                                remote_mtime_at_sync: entry.modified_at,
                            },
                        );
                        outcome.local_wins += 1;
                        outcome.needs_push.push(local_path);
                        info!(path = %key, "Conflict resolved for local copy, scheduling push");
                    }
                    SyncAction::Skip => {
                        outcome.skipped += 1;
                        debug!(path = %key, "Unchanged since last sync");
                    }
                }
            }
        }
    }

    // Deletion sweep: every tracked path absent from the snapshot taken at
    // pass start. Runs only after the full file pass.
    let tracked: Vec<String> = state.files.keys().cloned().collect();
    for key in tracked {
        if listing.contains_key(&key) {
            continue;
        }

        let local_path = key_to_path(ctx.root, &key);
        match ctx.fs.exists(&local_path).await {
            Ok(true) => {
                state.files.remove(&key);
                outcome.untracked += 1;
                outcome.needs_push.push(local_path);
                info!(path = %key, "Remote object gone, re-pushing local copy");
            }
            Ok(false) => {
                state.files.remove(&key);
                outcome.dropped += 1;
                debug!(path = %key, "Dropped stale record");
            }
            Err(e) => {
                // A single file's I/O error must not abort the sweep.
                warn!(path = %key, error = %e, "Could not check local file during deletion sweep");
            }
        }
    }

    ctx.store.save(state).await?;
    Ok(outcome)
}
