//! Push Reconciliation
//!
//! Drives local→remote propagation for a set of absolute paths, either a
//! debounced batch of change events or the full local tree at startup.
//!
//! Entries are processed independently, in the order supplied. State is
//! persisted after each successfully-processed entry, so a mid-batch
//! failure leaves the successful prefix reflected in the baseline and a
//! retry cannot recreate already-pushed objects as duplicates. A remote
//! failure aborts the remainder of the batch; deletion failures are logged
//! and do not abort.

use crate::engine::ReconcileCtx;
use crate::error::{Result, SyncError};
use crate::folders::resolve_folder;
use crate::paths::{basename, parent_key, relative_key};
use crate::state::{FileRecord, ReplicaState};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Counters for one push pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushOutcome {
    /// New remote objects created
    pub uploaded: u64,
    /// Existing remote objects updated in place
    pub updated: u64,
    /// Remote objects deleted after local removal
    pub deleted: u64,
    /// Entries skipped (excluded names, directories, untracked removals)
    pub skipped: u64,
}

pub(crate) async fn push_batch(
    ctx: &ReconcileCtx<'_>,
    state: &mut ReplicaState,
    paths: &[PathBuf],
) -> Result<PushOutcome> {
    let mut outcome = PushOutcome::default();

    for path in paths {
        let Some(rel) = relative_key(ctx.root, path) else {
            debug!(path = ?path, "Ignoring path outside the synced directory");
            outcome.skipped += 1;
            continue;
        };

        if ctx.excluded.contains(basename(&rel)) {
            debug!(path = %rel, "Skipping excluded name");
            outcome.skipped += 1;
            continue;
        }

        let exists = ctx
            .fs
            .exists(path)
            .await
            .map_err(|e| SyncError::Local {
                path: rel.clone(),
                source: e,
            })?;

        if !exists {
            // Local file is gone. Propagate the deletion if tracked.
            let Some(record) = state.files.get(&rel).cloned() else {
                debug!(path = %rel, "Untracked path vanished, nothing to do");
                outcome.skipped += 1;
                continue;
            };

            match ctx.remote.delete(&record.remote_id).await {
                Ok(()) => {
                    state.files.remove(&rel);
                    ctx.store.save(state).await?;
                    outcome.deleted += 1;
                    info!(path = %rel, "Deleted remote object for removed local file");
                }
                Err(e) => {
                    // The record stays so a later pass retries the delete.
                    warn!(path = %rel, error = %e, "Failed to delete remote object, continuing");
                }
            }
            continue;
        }

        let meta = ctx.fs.stat(path).await.map_err(|e| SyncError::Local {
            path: rel.clone(),
            source: e,
        })?;

        if meta.is_directory {
            // Containers are created lazily when a file needs a
            // destination, never from a bare directory event.
            debug!(path = %rel, "Skipping directory event");
            outcome.skipped += 1;
            continue;
        }

        let local_mtime = meta.modified_at.unwrap_or(0);
        let content = ctx
            .fs
            .read_file(path)
            .await
            .map_err(|e| SyncError::Local {
                path: rel.clone(),
                source: e,
            })?;

        if let Some(record) = state.files.get(&rel).cloned() {
            let updated = ctx
                .remote
                .update(&record.remote_id, content)
                .await
                .map_err(|e| SyncError::Remote {
                    path: rel.clone(),
                    source: e,
                })?;

            state.files.insert(
                rel.clone(),
                FileRecord {
                    remote_id: record.remote_id,
                    local_mtime_at_sync: local_mtime,
                    remote_mtime_at_sync: updated.modified_at,
                },
            );
            ctx.store.save(state).await?;
            outcome.updated += 1;
            info!(path = %rel, "Updated remote object");
        } else {
            let parent_id = resolve_folder(
                ctx.remote,
                ctx.root_id,
                &mut state.folders,
                parent_key(&rel).unwrap_or(""),
            )
            .await
            .map_err(|e| SyncError::Remote {
                path: rel.clone(),
                source: e,
            })?;

            let uploaded = ctx
                .remote
                .upload(basename(&rel), &parent_id, content)
                .await
                .map_err(|e| SyncError::Remote {
                    path: rel.clone(),
                    source: e,
                })?;

            state.files.insert(
                rel.clone(),
                FileRecord {
                    remote_id: uploaded.id,
                    local_mtime_at_sync: local_mtime,
                    remote_mtime_at_sync: uploaded.modified_at,
                },
            );
            ctx.store.save(state).await?;
            outcome.uploaded += 1;
            info!(path = %rel, "Created remote object");
        }
    }

    Ok(outcome)
}
