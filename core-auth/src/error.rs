use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("Secure storage unavailable: {0}")]
    SecureStorageUnavailable(String),

    #[error("Not authenticated")]
    NotAuthenticated,
}

impl From<AuthError> for bridge_traits::error::BridgeError {
    fn from(e: AuthError) -> Self {
        bridge_traits::error::BridgeError::Auth(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
