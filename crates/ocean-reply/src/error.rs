//! Error types for ocean-reply

use thiserror::Error;

/// Result type alias using ocean-reply Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while producing a reply
#[derive(Error, Debug)]
pub enum Error {
    /// The request was canceled through its cancellation token
    #[error("Request canceled")]
    Canceled,

    /// HTTP request failed before a response was received
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status
    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a status error, trimming an empty body to the canonical reason.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let body = if body.trim().is_empty() {
            reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("no response body")
                .to_string()
        } else {
            body
        };
        Self::Status { status, body }
    }

    /// Check if this error is a user-initiated cancellation
    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::Canceled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canceled_classification() {
        assert!(Error::Canceled.is_canceled());
    }

    #[test]
    fn test_status_is_not_canceled() {
        let e = Error::status(502, "bad gateway upstream");
        assert!(!e.is_canceled());
        assert_eq!(
            e.to_string(),
            "Request failed with status 502: bad gateway upstream"
        );
    }

    #[test]
    fn test_status_empty_body_uses_reason() {
        let e = Error::status(404, "  ");
        assert_eq!(e.to_string(), "Request failed with status 404: Not Found");
    }

    #[test]
    fn test_invalid_config_message() {
        let e = Error::InvalidConfig("missing base url".into());
        assert!(!e.is_canceled());
        assert_eq!(e.to_string(), "Invalid configuration: missing base url");
    }
}
