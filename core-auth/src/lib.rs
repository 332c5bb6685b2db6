//! # Authentication Module
//!
//! OAuth 2.0 token lifecycle for the remote store.
//!
//! ## Overview
//!
//! Credential *acquisition* (the interactive consent flow) happens outside
//! the daemon; this crate takes over from an externally-obtained refresh
//! token and keeps a valid access token available:
//!
//! - [`TokenStore`] persists tokens in the platform secure store
//! - [`TokenManager`] hands out access tokens, refreshing transparently
//!   before expiry and failing with an authentication error when refresh is
//!   impossible (no refresh material, or the refresh itself was rejected)
//!
//! Remote store connectors depend on the [`TokenProvider`] trait rather than
//! the concrete manager, so they can be exercised against static tokens in
//! tests.

pub mod error;
pub mod manager;
pub mod token_store;
pub mod types;

pub use error::{AuthError, Result};
pub use manager::{OAuthConfig, TokenManager, TokenProvider};
pub use token_store::TokenStore;
pub use types::OAuthTokens;
