//! Conflict Resolution
//!
//! Pure three-way decision for a single file: given the tracked baseline
//! (if any), whether a local copy exists, and both current mtimes, produce
//! exactly one action. The baseline records the last mutually-confirmed
//! mtime pair, which is what lets the resolver tell "remote changed" apart
//! from "both changed".

use crate::state::FileRecord;

/// Action for one file during a pull pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// Fetch the remote content and overwrite the local copy
    Download,
    /// Remote unchanged since last sync; nothing to do
    Skip,
    /// Keep the local copy and push it back up
    LocalWins,
}

/// Decide the action for one file.
///
/// Ties resolve to `LocalWins`: the remote copy must be *strictly* newer to
/// overwrite local data.
///
/// Deterministic and total over the whole input domain; no I/O.
pub fn decide(
    tracked: Option<&FileRecord>,
    local_exists: bool,
    local_mtime: Option<i64>,
    remote_mtime: i64,
) -> SyncAction {
    let local_mtime = local_mtime.unwrap_or(i64::MIN);

    let Some(record) = tracked else {
        // No baseline. A missing local copy means a genuinely new remote
        // file; otherwise fall back to a direct two-way compare.
        if !local_exists {
            return SyncAction::Download;
        }
        return if remote_mtime > local_mtime {
            SyncAction::Download
        } else {
            SyncAction::LocalWins
        };
    };

    if remote_mtime <= record.remote_mtime_at_sync {
        return SyncAction::Skip;
    }

    // Remote changed since the baseline.
    if !local_exists {
        return SyncAction::Download;
    }
    if local_mtime <= record.local_mtime_at_sync {
        // Local unchanged since the baseline.
        return SyncAction::Download;
    }

    // Both sides changed: genuine conflict, newest current mtime wins.
    if remote_mtime > local_mtime {
        SyncAction::Download
    } else {
        SyncAction::LocalWins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(local: i64, remote: i64) -> FileRecord {
        FileRecord {
            remote_id: "r1".to_string(),
            local_mtime_at_sync: local,
            remote_mtime_at_sync: remote,
        }
    }

    #[test]
    fn test_untracked_missing_local_downloads() {
        assert_eq!(decide(None, false, None, 100), SyncAction::Download);
    }

    #[test]
    fn test_untracked_existing_local_compares_directly() {
        assert_eq!(decide(None, true, Some(50), 100), SyncAction::Download);
        assert_eq!(decide(None, true, Some(150), 100), SyncAction::LocalWins);
    }

    #[test]
    fn test_untracked_equal_mtimes_local_wins() {
        assert_eq!(decide(None, true, Some(100), 100), SyncAction::LocalWins);
    }

    #[test]
    fn test_tracked_remote_unchanged_skips() {
        let rec = record(10, 100);
        assert_eq!(decide(Some(&rec), true, Some(999), 100), SyncAction::Skip);
        assert_eq!(decide(Some(&rec), true, Some(999), 90), SyncAction::Skip);
        assert_eq!(decide(Some(&rec), false, None, 100), SyncAction::Skip);
    }

    #[test]
    fn test_tracked_remote_changed_local_missing_downloads() {
        let rec = record(10, 100);
        assert_eq!(decide(Some(&rec), false, None, 200), SyncAction::Download);
    }

    #[test]
    fn test_tracked_remote_changed_local_unchanged_downloads() {
        let rec = record(10, 100);
        assert_eq!(decide(Some(&rec), true, Some(10), 200), SyncAction::Download);
        assert_eq!(decide(Some(&rec), true, Some(5), 200), SyncAction::Download);
    }

    #[test]
    fn test_conflict_remote_strictly_newer_downloads() {
        // Baseline T0 = 10; local changed to T1 = 50; remote changed to
        // T2 = 200 > T1: remote wins.
        let rec = record(10, 10);
        assert_eq!(decide(Some(&rec), true, Some(50), 200), SyncAction::Download);
    }

    #[test]
    fn test_conflict_local_newer_wins() {
        // Local changed to T3 = 300 > remote T2 = 200: local wins.
        let rec = record(10, 10);
        assert_eq!(
            decide(Some(&rec), true, Some(300), 200),
            SyncAction::LocalWins
        );
    }

    #[test]
    fn test_conflict_equal_current_mtimes_local_wins() {
        let rec = record(10, 10);
        assert_eq!(
            decide(Some(&rec), true, Some(200), 200),
            SyncAction::LocalWins
        );
    }

    #[test]
    fn test_total_over_input_grid() {
        // Every combination yields exactly one action and never panics.
        let records = [None, Some(record(10, 10)), Some(record(50, 100))];
        let mtimes = [None, Some(0), Some(10), Some(50), Some(100), Some(200)];

        for tracked in &records {
            for local_exists in [false, true] {
                for local_mtime in mtimes {
                    for remote_mtime in [0, 10, 50, 100, 200] {
                        let action =
                            decide(tracked.as_ref(), local_exists, local_mtime, remote_mtime);
                        assert!(matches!(
                            action,
                            SyncAction::Download | SyncAction::Skip | SyncAction::LocalWins
                        ));
                    }
                }
            }
        }
    }
}
