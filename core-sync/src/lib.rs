//! # Sync Engine
//!
//! Keeps a local directory and a remote folder tree mutually consistent.
//! Either side may change while the other is offline; reconciliation
//! converges without data loss for the common case and resolves conflicts
//! deterministically against the last-known-synced baseline.
//!
//! ## Components
//!
//! - **Replica State** (`state`): the persisted baseline document mapping
//!   relative paths to remote IDs and last-synced mtime pairs
//! - **Conflict Resolver** (`decide`): pure three-way decision for a single
//!   file given its baseline and both current mtimes
//! - **Folder Resolver** (`folders`): maps a relative directory path to a
//!   remote container ID, deduplicating against cached state and remote
//!   reality before creating anything
//! - **Push Reconciler** (`push`): local→remote propagation for a batch of
//!   paths
//! - **Pull Reconciler** (`pull`): remote→local propagation for the whole
//!   tree, including remote-deletion detection
//! - **Schedulers** (`scheduler`): debounced change aggregation and fixed
//!   interval polling, the only two triggers of reconciliation
//! - **Engine** (`engine`): facade owning the in-memory state and
//!   serializing reconciliation passes

pub mod decide;
pub mod engine;
pub mod error;
pub mod folders;
pub mod paths;
pub mod pull;
pub mod push;
pub mod scheduler;
pub mod state;

pub use decide::{decide, SyncAction};
pub use engine::SyncEngine;
pub use error::{Result, SyncError};
pub use pull::PullOutcome;
pub use push::PushOutcome;
pub use scheduler::{ChangeAggregator, PollScheduler};
pub use state::{FileRecord, ReplicaState, StateStore};
