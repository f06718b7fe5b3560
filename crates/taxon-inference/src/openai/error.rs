//! OpenAI-specific error handling.

use taxon_core::Error;

/// OpenAI-compatible API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAIErrorCode {
    /// Invalid authentication credentials.
    AuthenticationError,
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// Model not found or not available.
    ModelNotFound,
    /// Request too large.
    ContextLengthExceeded,
    /// Server error.
    ServerError,
    /// Unknown error.
    Unknown,
}

impl OpenAIErrorCode {
    /// Determine error code from HTTP status and error type.
    pub fn from_response(status: u16, error_type: &str) -> Self {
        match (status, error_type) {
            (401, _) | (403, _) => Self::AuthenticationError,
            (429, _) => Self::RateLimitExceeded,
            (404, _) | (_, "model_not_found") => Self::ModelNotFound,
            (400, _) if error_type.contains("context_length") => Self::ContextLengthExceeded,
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }
}

/// Convert an OpenAI-compatible API error into a taxon error.
///
/// Credential and model problems are configuration errors; everything else
/// is a classifier failure for the one group being evaluated.
pub fn to_taxon_error(code: OpenAIErrorCode, message: &str) -> Error {
    match code {
        OpenAIErrorCode::AuthenticationError => {
            Error::Config(format!("Authentication failed: {}", message))
        }
        OpenAIErrorCode::ModelNotFound => Error::Config(format!("Model not found: {}", message)),
        OpenAIErrorCode::RateLimitExceeded => {
            Error::Classifier(format!("Rate limit exceeded: {}", message))
        }
        OpenAIErrorCode::ContextLengthExceeded => {
            Error::Classifier(format!("Context too long: {}", message))
        }
        OpenAIErrorCode::ServerError => Error::Classifier(format!("Server error: {}", message)),
        OpenAIErrorCode::Unknown => Error::Classifier(message.to_string()),
    }
}
