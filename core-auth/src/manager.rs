//! # Token Manager
//!
//! Keeps a valid access token available for remote store calls.
//!
//! ## Overview
//!
//! The manager loads the persisted token pair on first use, caches it in
//! memory, and refreshes it transparently when it is about to expire. A
//! single-flight lock ensures concurrent callers trigger at most one
//! refresh. Refresh failures surface as authentication errors to the
//! current reconciliation pass only; the daemon keeps running.
//!
//! ## Usage
//!
//! ```no_run
//! use core_auth::{OAuthConfig, TokenManager, TokenProvider};
//! use core_runtime::events::EventBus;
//! use std::sync::Arc;
//! # use bridge_traits::{HttpClient, SecureStore};
//!
//! # async fn example(
//! #     secure_store: Arc<dyn SecureStore>,
//! #     http_client: Arc<dyn HttpClient>,
//! # ) -> core_auth::Result<()> {
//! let config = OAuthConfig {
//!     client_id: "client-id".to_string(),
//!     client_secret: None,
//!     token_url: "https://oauth2.googleapis.com/token".to_string(),
//! };
//! let manager = TokenManager::new(config, secure_store, http_client, EventBus::default());
//!
//! let token = manager.access_token().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::token_store::TokenStore;
use crate::types::OAuthTokens;
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bridge_traits::secure::SecureStore;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Buffer before token expiration that triggers a refresh (5 minutes)
const TOKEN_REFRESH_BUFFER: Duration = Duration::from_secs(300);

/// Source of valid bearer credentials.
///
/// Remote store connectors depend on this trait so tests can supply a
/// static token.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a currently-valid access token, refreshing if necessary
    async fn access_token(&self) -> Result<String>;
}

/// OAuth client configuration for the refresh flow
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub token_url: String,
}

/// Token endpoint response for a refresh grant
#[derive(Debug, Deserialize)]
struct TokenRefreshResponse {
    access_token: String,
    expires_in: i64,
    /// Some providers rotate the refresh token; absent means keep the old one
    refresh_token: Option<String>,
}

/// Manages the OAuth token lifecycle with transparent refresh
pub struct TokenManager {
    config: OAuthConfig,
    token_store: TokenStore,
    http_client: Arc<dyn HttpClient>,
    event_bus: EventBus,
    /// In-memory copy of the current token pair
    cached: RwLock<Option<OAuthTokens>>,
    /// Single-flight guard so concurrent callers refresh at most once
    refresh_lock: Mutex<()>,
}

impl TokenManager {
    pub fn new(
        config: OAuthConfig,
        secure_store: Arc<dyn SecureStore>,
        http_client: Arc<dyn HttpClient>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            config,
            token_store: TokenStore::new(secure_store),
            http_client,
            event_bus,
            cached: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Adopt an externally-obtained refresh token.
    ///
    /// The stored pair is marked as already expired, so the first
    /// `access_token` call performs a refresh and validates the material.
    pub async fn adopt_refresh_token(&self, refresh_token: String) -> Result<()> {
        let tokens = OAuthTokens::with_expires_at(String::new(), Some(refresh_token), 0);
        self.token_store.store_tokens(&tokens).await?;
        *self.cached.write().await = Some(tokens);
        info!("Adopted refresh token");
        Ok(())
    }

    /// Drop the persisted credential
    pub async fn sign_out(&self) -> Result<()> {
        self.token_store.delete_tokens().await?;
        *self.cached.write().await = None;
        info!("Removed stored credential");
        Ok(())
    }

    async fn refresh(&self, tokens: &OAuthTokens) -> Result<OAuthTokens> {
        let Some(refresh_token) = tokens.refresh_token() else {
            return Err(AuthError::TokenRefreshFailed(
                "no refresh token available".to_string(),
            ));
        };

        let mut form: Vec<(&str, &str)> = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", &self.config.client_id),
        ];
        if let Some(secret) = &self.config.client_secret {
            form.push(("client_secret", secret));
        }

        let body = serde_urlencoded::to_string(&form)
            .map_err(|e| AuthError::TokenRefreshFailed(format!("encoding request: {}", e)))?;

        let request = HttpRequest::new(HttpMethod::Post, &self.config.token_url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body.into_bytes().into())
            .timeout(Duration::from_secs(30));

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::TokenRefreshFailed(e.to_string()))?;

        if !response.is_success() {
            return Err(AuthError::TokenRefreshFailed(format!(
                "token endpoint returned status {}",
                response.status
            )));
        }

        let parsed: TokenRefreshResponse = response
            .json()
            .map_err(|e| AuthError::TokenRefreshFailed(format!("parsing response: {}", e)))?;

        // Keep the previous refresh token unless the provider rotated it.
        let refresh_token = parsed
            .refresh_token
            .or_else(|| tokens.refresh_token().map(|s| s.to_string()));

        Ok(OAuthTokens::new(
            parsed.access_token,
            refresh_token,
            parsed.expires_in,
        ))
    }
}

#[async_trait]
impl TokenProvider for TokenManager {
    async fn access_token(&self) -> Result<String> {
        // Fast path: cached token still comfortably valid.
        {
            let cached = self.cached.read().await;
            if let Some(tokens) = cached.as_ref() {
                if !tokens.expires_within(TOKEN_REFRESH_BUFFER) {
                    return Ok(tokens.access_token().to_string());
                }
            }
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited for the lock.
        {
            let cached = self.cached.read().await;
            if let Some(tokens) = cached.as_ref() {
                if !tokens.expires_within(TOKEN_REFRESH_BUFFER) {
                    return Ok(tokens.access_token().to_string());
                }
            }
        }

        let current = match self.cached.read().await.clone() {
            Some(tokens) => tokens,
            None => self
                .token_store
                .retrieve_tokens()
                .await?
                .ok_or(AuthError::NotAuthenticated)?,
        };

        if !current.expires_within(TOKEN_REFRESH_BUFFER) {
            let token = current.access_token().to_string();
            *self.cached.write().await = Some(current);
            return Ok(token);
        }

        debug!("Access token expiring, refreshing");
        match self.refresh(&current).await {
            Ok(fresh) => {
                let token = fresh.access_token().to_string();
                self.token_store.store_tokens(&fresh).await?;
                *self.cached.write().await = Some(fresh);
                self.event_bus
                    .emit(CoreEvent::Auth(AuthEvent::TokenRefreshed))
                    .ok();
                info!("Access token refreshed");
                Ok(token)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                self.event_bus
                    .emit(CoreEvent::Auth(AuthEvent::RefreshFailed {
                        message: e.to_string(),
                    }))
                    .ok();
                Err(e)
            }
        }
    }
}
