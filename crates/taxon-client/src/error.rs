//! Mapping of HTTP error responses onto `taxon_core::Error`.

use reqwest::StatusCode;
use serde::Deserialize;

use taxon_core::Error;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Turn a non-2xx status and its body into the matching error variant.
///
/// The server renders errors as `{"error": "<Display of the error>"}`, so the
/// variant prefix is stripped again before re-wrapping.
pub fn error_from_response(status: StatusCode, body: &str) -> Error {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.trim().to_string());

    match status {
        StatusCode::BAD_REQUEST => match message.strip_prefix("Invalid provider: ") {
            Some(provider) => Error::InvalidProvider(provider.to_string()),
            None => Error::Validation(strip(&message, "Validation error: ")),
        },
        StatusCode::NOT_FOUND => Error::NotFound(strip(&message, "Not found: ")),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Unauthorized(strip(&message, "Unauthorized: "))
        }
        _ => Error::Internal(format!("{}: {}", status, message)),
    }
}

fn strip(message: &str, prefix: &str) -> String {
    message.strip_prefix(prefix).unwrap_or(message).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_provider_round_trips() {
        let err = error_from_response(
            StatusCode::BAD_REQUEST,
            r#"{"error": "Invalid provider: bogus"}"#,
        );
        assert!(matches!(err, Error::InvalidProvider(ref p) if p == "bogus"));
        assert_eq!(err.to_string(), "Invalid provider: bogus");
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            error_from_response(StatusCode::BAD_REQUEST, r#"{"error": "Validation error: x"}"#),
            Error::Validation(ref m) if m == "x"
        ));
        assert!(matches!(
            error_from_response(StatusCode::NOT_FOUND, r#"{"error": "Not found: group"}"#),
            Error::NotFound(ref m) if m == "group"
        ));
        assert!(matches!(
            error_from_response(StatusCode::UNAUTHORIZED, r#"{"error": "Authentication required"}"#),
            Error::Unauthorized(_)
        ));
        assert!(matches!(
            error_from_response(StatusCode::BAD_GATEWAY, "upstream down"),
            Error::Internal(ref m) if m.contains("upstream down")
        ));
    }
}
