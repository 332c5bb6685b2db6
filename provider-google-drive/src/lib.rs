//! # Google Drive Provider
//!
//! Implements the `RemoteStore` trait for the Google Drive API v3.
//!
//! The connector speaks to Drive through the `HttpClient` bridge and obtains
//! bearer credentials per call from a `TokenProvider`, which refreshes them
//! transparently.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::GoogleDriveConnector;
pub use error::GoogleDriveError;
