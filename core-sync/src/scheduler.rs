//! Reconciliation Triggers
//!
//! The only two triggers of reconciliation:
//!
//! - [`ChangeAggregator`] coalesces a burst of filesystem change events
//!   into one batch: every incoming event resets a quiet-period timer, and
//!   when the timer finally elapses uninterrupted the pending set is
//!   swapped out and pushed as a single batch.
//! - [`PollScheduler`] runs a pull pass on a fixed interval, immediately
//!   followed by a push of whatever the pull returned as "needs push".
//!
//! Failures at either trigger are logged and never stop the loops; both
//! terminate on the shutdown token.

use crate::engine::SyncEngine;
use bridge_traits::watch::ChangeStream;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Debounces local change events into push batches
pub struct ChangeAggregator {
    engine: Arc<SyncEngine>,
    quiet_period: Duration,
}

impl ChangeAggregator {
    pub fn new(engine: Arc<SyncEngine>, quiet_period: Duration) -> Self {
        Self {
            engine,
            quiet_period,
        }
    }

    /// Consume change events until the watcher closes or shutdown fires.
    ///
    /// A pending batch that has not reached its quiet period when shutdown
    /// fires is discarded; the next startup's full-tree push covers it.
    pub async fn run(self, mut changes: ChangeStream, shutdown: CancellationToken) {
        let mut pending: HashSet<PathBuf> = HashSet::new();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Change aggregator shutting down");
                    break;
                }
                event = changes.next() => {
                    match event {
                        // Every event resets the quiet-period timer below,
                        // because the select is re-entered with a fresh sleep.
                        Some(path) => {
                            debug!(path = ?path, "Queued local change");
                            pending.insert(path);
                        }
                        None => {
                            info!("Change stream closed, aggregator exiting");
                            break;
                        }
                    }
                }
                _ = sleep(self.quiet_period), if !pending.is_empty() => {
                    let mut batch: Vec<PathBuf> = pending.drain().collect();
                    batch.sort();

                    debug!(batch = batch.len(), "Quiet period elapsed, pushing batch");
                    if let Err(e) = self.engine.push(&batch).await {
                        // Logged, never fatal to the process.
                        error!(error = %e, "Debounced push failed");
                    }
                }
            }
        }
    }
}

/// Triggers pull reconciliation on a fixed interval
pub struct PollScheduler {
    engine: Arc<SyncEngine>,
    poll_interval: Duration,
}

impl PollScheduler {
    pub fn new(engine: Arc<SyncEngine>, poll_interval: Duration) -> Self {
        Self {
            engine,
            poll_interval,
        }
    }

    /// Run pull/push cycles until shutdown fires.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval fires immediately; the startup
        // sequence already ran a full sync, so wait one full period.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Poll scheduler shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    match self.engine.pull().await {
                        Ok(outcome) => {
                            if !outcome.needs_push.is_empty() {
                                if let Err(e) = self.engine.push(&outcome.needs_push).await {
                                    error!(error = %e, "Post-pull push failed");
                                }
                            }
                        }
                        Err(e) => {
                            // Logged, the scheduler never stops because of it.
                            error!(error = %e, "Poll pull failed");
                        }
                    }
                }
            }
        }
    }
}
