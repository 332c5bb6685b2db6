//! Secure Token Storage
//!
//! Persists OAuth tokens in the platform secure store (Keychain, Credential
//! Manager, Secret Service) via the `SecureStore` bridge. Token values are
//! serialized to JSON before storage and never logged.

use crate::error::{AuthError, Result};
use crate::types::OAuthTokens;
use bridge_traits::secure::SecureStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Storage key for the daemon's single token pair.
///
/// One local replica talks to one remote tree, so there is exactly one
/// credential to keep.
const STORAGE_KEY: &str = "drivesyncd.oauth_tokens";

/// Serializable wrapper for stored tokens
#[derive(Serialize, Deserialize)]
struct StoredTokens {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: i64,
}

/// Secure storage for OAuth tokens
#[derive(Clone)]
pub struct TokenStore {
    secure_store: Arc<dyn SecureStore>,
}

impl TokenStore {
    pub fn new(secure_store: Arc<dyn SecureStore>) -> Self {
        debug!("Initializing TokenStore");
        Self { secure_store }
    }

    /// Store tokens, overwriting any previous pair
    pub async fn store_tokens(&self, tokens: &OAuthTokens) -> Result<()> {
        let stored = StoredTokens {
            access_token: tokens.access_token().to_string(),
            refresh_token: tokens.refresh_token().map(|s| s.to_string()),
            expires_at: tokens.expires_at(),
        };

        let json = serde_json::to_vec(&stored)
            .map_err(|e| AuthError::SecureStorageUnavailable(format!("Serialization: {}", e)))?;

        self.secure_store
            .set_secret(STORAGE_KEY, &json)
            .await
            .map_err(|e| AuthError::SecureStorageUnavailable(e.to_string()))?;

        debug!("Stored OAuth tokens");
        Ok(())
    }

    /// Retrieve the stored token pair, if any
    ///
    /// A corrupt stored value is treated as absent (and logged), so a broken
    /// secure-store entry degrades to "not authenticated" rather than a hard
    /// failure.
    pub async fn retrieve_tokens(&self) -> Result<Option<OAuthTokens>> {
        let raw = self
            .secure_store
            .get_secret(STORAGE_KEY)
            .await
            .map_err(|e| AuthError::SecureStorageUnavailable(e.to_string()))?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        match serde_json::from_slice::<StoredTokens>(&raw) {
            Ok(stored) => Ok(Some(OAuthTokens::with_expires_at(
                stored.access_token,
                stored.refresh_token,
                stored.expires_at,
            ))),
            Err(e) => {
                warn!(error = %e, "Stored tokens are unreadable, treating as absent");
                Ok(None)
            }
        }
    }

    /// Delete the stored token pair
    pub async fn delete_tokens(&self) -> Result<()> {
        self.secure_store
            .delete_secret(STORAGE_KEY)
            .await
            .map_err(|e| AuthError::SecureStorageUnavailable(e.to_string()))?;

        debug!("Deleted OAuth tokens");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemorySecureStore {
        data: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl SecureStore for MemorySecureStore {
        async fn set_secret(&self, key: &str, value: &[u8]) -> bridge_traits::Result<()> {
            self.data
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get_secret(&self, key: &str) -> bridge_traits::Result<Option<Vec<u8>>> {
            Ok(self.data.lock().unwrap().get(key).cloned())
        }

        async fn delete_secret(&self, key: &str) -> bridge_traits::Result<()> {
            self.data.lock().unwrap().remove(key);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_store_retrieve_delete_roundtrip() {
        let store = TokenStore::new(Arc::new(MemorySecureStore::default()));

        assert!(store.retrieve_tokens().await.unwrap().is_none());

        let tokens = OAuthTokens::with_expires_at(
            "access".to_string(),
            Some("refresh".to_string()),
            1_700_000_000,
        );
        store.store_tokens(&tokens).await.unwrap();

        let retrieved = store.retrieve_tokens().await.unwrap().unwrap();
        assert_eq!(retrieved.access_token(), "access");
        assert_eq!(retrieved.refresh_token(), Some("refresh"));
        assert_eq!(retrieved.expires_at(), 1_700_000_000);

        store.delete_tokens().await.unwrap();
        assert!(store.retrieve_tokens().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_entry_reads_as_absent() {
        let secure = Arc::new(MemorySecureStore::default());
        secure
            .set_secret(STORAGE_KEY, b"{not json")
            .await
            .unwrap();

        let store = TokenStore::new(secure);
        assert!(store.retrieve_tokens().await.unwrap().is_none());
    }
}
