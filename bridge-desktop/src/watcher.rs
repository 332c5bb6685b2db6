//! Filesystem Change Notification using notify

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    watch::{ChangeStream, ChangeWatcher},
};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{error, info, trace};

/// Channel capacity for raw change events.
///
/// Bursts larger than this block the notify callback thread briefly; the
/// downstream aggregator drains quickly, and anything missed is picked up
/// by the next poll pass.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// notify-based recursive directory watcher
pub struct NotifyWatcher;

impl NotifyWatcher {
    pub fn new() -> Self {
        Self
    }

    /// Whether an OS event kind signals a content or tree change
    fn is_relevant(kind: &EventKind) -> bool {
        matches!(
            kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        )
    }
}

impl Default for NotifyWatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChangeWatcher for NotifyWatcher {
    async fn subscribe(&self, root: &Path) -> Result<ChangeStream> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let mut watcher =
            notify::recommended_watcher(move |res: std::result::Result<Event, notify::Error>| {
                match res {
                    Ok(event) => {
                        if !NotifyWatcher::is_relevant(&event.kind) {
                            trace!(kind = ?event.kind, "Ignoring filesystem event");
                            return;
                        }

                        for path in event.paths {
                            // The callback runs on notify's own thread, so a
                            // blocking send is safe here.
                            if tx.blocking_send(path).is_err() {
                                // Receiver dropped; subscription is shutting down.
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "Filesystem watcher error");
                    }
                }
            })
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to create watcher: {}", e)))?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to watch {:?}: {}", root, e)))?;

        info!(root = ?root, "Watching directory for changes");

        Ok(ChangeStream::new(rx, Box::new(watcher)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_subscribe_reports_writes() {
        let dir = std::env::temp_dir().join(format!("drivesyncd-watch-test-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let watcher = NotifyWatcher::new();
        let mut stream = watcher.subscribe(&dir).await.unwrap();

        let target = dir.join("changed.txt");
        // Give the OS subscription a moment to become active.
        tokio::time::sleep(Duration::from_millis(200)).await;
        std::fs::write(&target, Bytes::from("x")).unwrap();

        let received = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                match stream.next().await {
                    Some(path) if path == target => break true,
                    Some(_) => continue,
                    None => break false,
                }
            }
        })
        .await
        .unwrap_or(false);

        assert!(received, "expected a change event for {:?}", target);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
