//! # Bridge Traits
//!
//! Platform-agnostic capability traits consumed by the sync engine.
//!
//! The engine never talks to the network, the disk, or the OS keychain
//! directly. Every external capability is expressed as a trait in this crate
//! and injected as a trait object:
//!
//! - [`http::HttpClient`] - async HTTP transport
//! - [`fs::LocalFileSystem`] - local file I/O
//! - [`remote::RemoteStore`] - the remote hierarchical object store
//! - [`secure::SecureStore`] - secure credential persistence
//! - [`watch::ChangeWatcher`] - filesystem change notification

pub mod error;
pub mod fs;
pub mod http;
pub mod remote;
pub mod secure;
pub mod watch;

pub use error::{BridgeError, Result};
pub use fs::{FileMetadata, LocalFileSystem};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use remote::{
    ChildPage, RemoteEntry, RemoteEntryKind, RemoteStore, UpdatedObject, UploadedObject,
};
pub use secure::SecureStore;
pub use watch::{ChangeStream, ChangeWatcher};
