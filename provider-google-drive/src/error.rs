use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GoogleDriveError {
    #[error("Drive API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Failed to parse Drive response: {0}")]
    ParseError(String),
}

impl From<GoogleDriveError> for BridgeError {
    fn from(e: GoogleDriveError) -> Self {
        match e {
            GoogleDriveError::ApiError {
                status_code: 404,
                message,
            } => BridgeError::NotFound(message),
            GoogleDriveError::ApiError {
                status_code: 401,
                message,
            } => BridgeError::Auth(message),
            GoogleDriveError::ApiError {
                status_code,
                message,
            } => BridgeError::Http {
                status: status_code,
                message,
            },
            GoogleDriveError::ParseError(message) => BridgeError::OperationFailed(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found: BridgeError = GoogleDriveError::ApiError {
            status_code: 404,
            message: "gone".to_string(),
        }
        .into();
        assert!(not_found.is_not_found());

        let auth: BridgeError = GoogleDriveError::ApiError {
            status_code: 401,
            message: "expired".to_string(),
        }
        .into();
        assert!(auth.is_auth());

        let server: BridgeError = GoogleDriveError::ApiError {
            status_code: 503,
            message: "unavailable".to_string(),
        }
        .into();
        assert!(matches!(server, BridgeError::Http { status: 503, .. }));
    }
}
