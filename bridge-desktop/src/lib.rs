//! # Desktop Bridge Implementations
//!
//! Desktop-native implementations of the capability traits in
//! `bridge-traits`:
//!
//! - [`ReqwestHttpClient`] - HTTP transport over reqwest
//! - [`TokioFileSystem`] - file I/O over `tokio::fs`
//! - [`NotifyWatcher`] - filesystem change notification over `notify`
//! - [`KeyringSecureStore`] - credential storage in the OS keychain
//!   (feature `secure-store`, on by default)

pub mod filesystem;
pub mod http;
#[cfg(feature = "secure-store")]
pub mod secure_store;
pub mod watcher;

pub use filesystem::TokioFileSystem;
pub use http::ReqwestHttpClient;
#[cfg(feature = "secure-store")]
pub use secure_store::KeyringSecureStore;
pub use watcher::NotifyWatcher;
