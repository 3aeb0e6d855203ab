//! Error types for ocean-session

use thiserror::Error;

/// Result type alias using ocean-session Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur inside the session layer
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the reply provider layer
    #[error(transparent)]
    Reply(#[from] ocean_reply::Error),

    /// Storage I/O failed
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be (de)serialized
    #[error("Storage JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The storage medium cannot be used at all
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl Error {
    /// Check if this error is a canceled reply
    pub fn is_canceled(&self) -> bool {
        match self {
            Error::Reply(e) => e.is_canceled(),
            _ => false,
        }
    }
}
