//! # Event Bus System
//!
//! Event-driven architecture for the sync daemon using `tokio::sync::broadcast`.
//! Core modules publish typed events; any number of subscribers (UIs, test
//! harnesses, host integrations) can listen independently.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, SyncEvent};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Sync(SyncEvent::PullStarted {
//!         pass_id: "p-1".to_string(),
//!     }))
//!     .ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert!(matches!(event, CoreEvent::Sync(SyncEvent::PullStarted { .. })));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Subscribers should handle `RecvError::Lagged` gracefully (they missed
//! events but can continue) and treat `RecvError::Closed` as shutdown.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Authentication-related events
    Auth(AuthEvent),
    /// Reconciliation pass events
    Sync(SyncEvent),
}

/// Authentication events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind")]
pub enum AuthEvent {
    /// Access token was refreshed successfully
    TokenRefreshed,
    /// Token refresh failed
    RefreshFailed { message: String },
}

/// Reconciliation pass events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind")]
pub enum SyncEvent {
    /// A push pass started
    PushStarted { pass_id: String, batch_size: u64 },
    /// A push pass completed
    PushCompleted {
        pass_id: String,
        uploaded: u64,
        updated: u64,
        deleted: u64,
    },
    /// A pull pass started
    PullStarted { pass_id: String },
    /// A pull pass completed
    PullCompleted {
        pass_id: String,
        downloaded: u64,
        needs_push: u64,
    },
    /// A reconciliation pass failed; the daemon keeps running
    PassFailed { pass_id: String, message: String },
}

/// Central broadcast channel for publishing events.
///
/// Cloning the bus is cheap; all clones publish into the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Create a new event bus with the given buffer size
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size);
        Self { sender }
    }

    /// Publish an event to all current subscribers
    ///
    /// Returns an error only when there are no subscribers; publishers
    /// typically ignore it with `.ok()`.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Create a new independent subscription
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(CoreEvent::Sync(SyncEvent::PushStarted {
            pass_id: "p-1".to_string(),
            batch_size: 3,
        }))
        .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            CoreEvent::Sync(SyncEvent::PushStarted {
                pass_id: "p-1".to_string(),
                batch_size: 3,
            })
        );
    }

    #[tokio::test]
    async fn test_multiple_subscribers_each_receive() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(CoreEvent::Auth(AuthEvent::TokenRefreshed)).unwrap();

        assert_eq!(rx1.recv().await.unwrap(), CoreEvent::Auth(AuthEvent::TokenRefreshed));
        assert_eq!(rx2.recv().await.unwrap(), CoreEvent::Auth(AuthEvent::TokenRefreshed));
    }

    #[test]
    fn test_emit_without_subscribers_is_an_error() {
        let bus = EventBus::new(16);
        assert!(bus.emit(CoreEvent::Auth(AuthEvent::TokenRefreshed)).is_err());
    }

    #[test]
    fn test_event_serialization_roundtrip() {
        let event = CoreEvent::Sync(SyncEvent::PullCompleted {
            pass_id: "p-9".to_string(),
            downloaded: 2,
            needs_push: 1,
        });

        let json = serde_json::to_string(&event).unwrap();
        let back: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
