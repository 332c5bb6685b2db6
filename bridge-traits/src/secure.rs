//! Secure Credential Storage
//!
//! Abstracts platform secure storage (Keychain, Credential Manager, Secret
//! Service). Used only for OAuth token persistence.
//!
//! Implementations MUST encrypt data at rest and never log secret values.

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Store a secret value, overwriting any previous value for the key
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Retrieve a secret value
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a secret
    async fn delete_secret(&self, key: &str) -> Result<()>;

    /// Check if a secret exists without retrieving it
    async fn has_secret(&self, key: &str) -> Result<bool> {
        Ok(self.get_secret(key).await?.is_some())
    }
}
