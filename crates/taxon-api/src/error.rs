//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::error;

use taxon_core::Error;

/// Error returned by handlers; renders as `{"error": message}`.
#[derive(Debug)]
pub enum ApiError {
    Internal(Error),
    Unauthorized(String),
    NotFound(String),
    BadRequest(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match &err {
            Error::NotFound(_) => ApiError::NotFound(err.to_string()),
            Error::Validation(_) | Error::InvalidProvider(_) => {
                ApiError::BadRequest(err.to_string())
            }
            Error::Unauthorized(_) => ApiError::Unauthorized(err.to_string()),
            _ => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Internal(err) => {
                error!(subsystem = "api", error = %err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: Error) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_core_errors_map_to_status_codes() {
        assert_eq!(
            status_of(Error::Validation("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(Error::InvalidProvider("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(Error::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(Error::Unauthorized("x".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(Error::Network("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(Error::Classifier("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
