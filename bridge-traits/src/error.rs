use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Remote API error (status {status}): {message}")]
    Http { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Remote object not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether this error reports a missing remote object.
    ///
    /// Remote deletion is specified as idempotent, so callers treat a
    /// not-found result as success.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BridgeError::NotFound(_) | BridgeError::Http { status: 404, .. }
        )
    }

    /// Whether this error reports a rejected or unrefreshable credential.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            BridgeError::Auth(_) | BridgeError::Http { status: 401, .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        assert!(BridgeError::NotFound("file1".to_string()).is_not_found());
        assert!(BridgeError::Http {
            status: 404,
            message: "gone".to_string()
        }
        .is_not_found());
        assert!(!BridgeError::Http {
            status: 500,
            message: "boom".to_string()
        }
        .is_not_found());
    }

    #[test]
    fn test_auth_detection() {
        assert!(BridgeError::Auth("expired".to_string()).is_auth());
        assert!(BridgeError::Http {
            status: 401,
            message: "unauthorized".to_string()
        }
        .is_auth());
        assert!(!BridgeError::NotAvailable("http".to_string()).is_auth());
    }
}
