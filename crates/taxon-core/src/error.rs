//! Error types for taxon.

use thiserror::Error;

/// Result type alias using taxon's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for taxon operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad input shape (empty name, duplicate category names, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Requested LLM provider is not in the provider listing
    #[error("Invalid provider: {0}")]
    InvalidProvider(String),

    /// A single classifier call failed (recovered per group by the coordinator)
    #[error("Classifier error: {0}")]
    Classifier(String),

    /// Transport-level failure talking to a remote collaborator
    #[error("Network error: {0}")]
    Network(String),

    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error stems from the caller's input rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::NotFound(_)
                | Error::InvalidProvider(_)
                | Error::Unauthorized(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_validation() {
        let err = Error::Validation("name must not be empty".to_string());
        assert_eq!(err.to_string(), "Validation error: name must not be empty");
    }

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("category group 42".to_string());
        assert_eq!(err.to_string(), "Not found: category group 42");
    }

    #[test]
    fn test_error_display_invalid_provider() {
        let err = Error::InvalidProvider("bogus".to_string());
        assert_eq!(err.to_string(), "Invalid provider: bogus");
    }

    #[test]
    fn test_error_display_network() {
        let err = Error::Network("connection refused".to_string());
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn test_error_display_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.to_string().contains("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_client_error_classification() {
        assert!(Error::Validation("x".into()).is_client_error());
        assert!(Error::NotFound("x".into()).is_client_error());
        assert!(Error::InvalidProvider("x".into()).is_client_error());
        assert!(!Error::Network("x".into()).is_client_error());
        assert!(!Error::Internal("x".into()).is_client_error());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
