//! OAuth token types

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// An OAuth 2.0 token pair with expiry accounting.
///
/// Token values are never logged; the `Debug` impl redacts them.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OAuthTokens {
    access_token: String,
    refresh_token: Option<String>,
    /// Absolute expiry as Unix seconds
    expires_at: i64,
}

impl OAuthTokens {
    /// Create tokens expiring `expires_in_secs` from now
    pub fn new(access_token: String, refresh_token: Option<String>, expires_in_secs: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: Utc::now().timestamp() + expires_in_secs,
        }
    }

    /// Reconstruct tokens with an absolute expiry timestamp
    pub fn with_expires_at(
        access_token: String,
        refresh_token: Option<String>,
        expires_at: i64,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at,
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    /// Whether the access token expires within the given buffer from now
    pub fn expires_within(&self, buffer: Duration) -> bool {
        let threshold = Utc::now().timestamp() + buffer.as_secs() as i64;
        self.expires_at <= threshold
    }
}

impl std::fmt::Debug for OAuthTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthTokens")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_accounting() {
        let fresh = OAuthTokens::new("at".to_string(), None, 3600);
        assert!(!fresh.expires_within(Duration::from_secs(300)));
        assert!(fresh.expires_within(Duration::from_secs(7200)));

        let expired = OAuthTokens::with_expires_at("at".to_string(), None, 0);
        assert!(expired.expires_within(Duration::from_secs(0)));
    }

    #[test]
    fn test_debug_redacts_token_values() {
        let tokens = OAuthTokens::new("secret-at".to_string(), Some("secret-rt".to_string()), 60);
        let rendered = format!("{:?}", tokens);
        assert!(!rendered.contains("secret-at"));
        assert!(!rendered.contains("secret-rt"));
    }
}
