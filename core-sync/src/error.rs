use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Remote operation failed for '{path}': {source}")]
    Remote {
        path: String,
        #[source]
        source: BridgeError,
    },

    #[error("Remote listing failed: {0}")]
    Listing(#[source] BridgeError),

    #[error("Local I/O failed for '{path}': {source}")]
    Local {
        path: String,
        #[source]
        source: BridgeError,
    },

    #[error("Failed to persist replica state: {0}")]
    State(#[source] BridgeError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
