//! Filesystem Change Notification
//!
//! Turns OS-level change events into "this path changed" signals consumed
//! by the change aggregator. Coalescing and debouncing happen downstream;
//! the watcher delivers raw paths.

use async_trait::async_trait;
use std::any::Any;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use crate::error::Result;

/// A live change subscription.
///
/// Dropping the stream closes the underlying OS subscription.
pub struct ChangeStream {
    events: mpsc::Receiver<PathBuf>,
    /// Keeps the platform watcher alive for the lifetime of the stream
    _guard: Box<dyn Any + Send>,
}

impl ChangeStream {
    pub fn new(events: mpsc::Receiver<PathBuf>, guard: Box<dyn Any + Send>) -> Self {
        Self {
            events,
            _guard: guard,
        }
    }

    /// Receive the next changed path, or `None` once the watcher has closed
    pub async fn next(&mut self) -> Option<PathBuf> {
        self.events.recv().await
    }
}

/// Filesystem watcher trait
#[async_trait]
pub trait ChangeWatcher: Send + Sync {
    /// Subscribe to recursive change notifications under a root directory
    async fn subscribe(&self, root: &Path) -> Result<ChangeStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stream_delivers_and_closes() {
        let (tx, rx) = mpsc::channel(4);
        let mut stream = ChangeStream::new(rx, Box::new(()));

        tx.send(PathBuf::from("/tmp/a.txt")).await.unwrap();
        assert_eq!(stream.next().await, Some(PathBuf::from("/tmp/a.txt")));

        drop(tx);
        assert_eq!(stream.next().await, None);
    }
}
