//! Secure Credential Storage using OS Keychain

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bridge_traits::{
    error::{BridgeError, Result},
    secure::SecureStore,
};
use keyring::Entry;
use tracing::{debug, error};

/// Keyring-based secure storage implementation
///
/// Uses platform-specific secure storage:
/// - macOS: Keychain
/// - Windows: Credential Manager (DPAPI)
/// - Linux: Secret Service (libsecret)
pub struct KeyringSecureStore {
    service_name: String,
}

impl KeyringSecureStore {
    /// Create a new secure store with default service name
    pub fn new() -> Self {
        Self {
            service_name: "drivesyncd".to_string(),
        }
    }

    /// Create a new secure store with custom service name
    pub fn with_service_name(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    fn get_entry(&self, key: &str) -> std::result::Result<Entry, keyring::Error> {
        Entry::new(&self.service_name, key)
    }

    fn map_keyring_error(e: keyring::Error) -> BridgeError {
        BridgeError::OperationFailed(format!("Keyring error: {}", e))
    }
}

impl Default for KeyringSecureStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecureStore for KeyringSecureStore {
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()> {
        // Keyring only supports strings, so binary data is base64 encoded.
        let encoded = BASE64.encode(value);

        let entry = self.get_entry(key).map_err(Self::map_keyring_error)?;
        entry
            .set_password(&encoded)
            .map_err(Self::map_keyring_error)?;

        debug!(key = key, "Stored secret in keyring");
        Ok(())
    }

    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entry = self.get_entry(key).map_err(Self::map_keyring_error)?;

        match entry.get_password() {
            Ok(encoded) => {
                let decoded = BASE64.decode(&encoded).map_err(|e| {
                    error!(key = key, error = %e, "Failed to decode secret");
                    BridgeError::OperationFailed(format!("Failed to decode secret: {}", e))
                })?;

                debug!(key = key, "Retrieved secret from keyring");
                Ok(Some(decoded))
            }
            Err(keyring::Error::NoEntry) => {
                debug!(key = key, "Secret not found in keyring");
                Ok(None)
            }
            Err(e) => Err(Self::map_keyring_error(e)),
        }
    }

    async fn delete_secret(&self, key: &str) -> Result<()> {
        let entry = self.get_entry(key).map_err(Self::map_keyring_error)?;

        match entry.delete_credential() {
            Ok(()) => {
                debug!(key = key, "Deleted secret from keyring");
                Ok(())
            }
            // Already absent counts as deleted.
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(Self::map_keyring_error(e)),
        }
    }
}
