//! Connection context for the REST client.

use taxon_core::{Error, Result};

/// Environment variable holding the API base URL.
pub const ENV_API_URL: &str = "TAXON_API_URL";

/// Environment variable holding the API token.
pub const ENV_API_TOKEN: &str = "TAXON_API_TOKEN";

/// Where to send requests and which token to present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    pub base_url: String,
    pub token: String,
}

impl ClientContext {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Read `TAXON_API_URL` and `TAXON_API_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(ENV_API_URL)
            .map_err(|_| Error::Config(format!("{} is not set", ENV_API_URL)))?;
        let token = std::env::var(ENV_API_TOKEN)
            .map_err(|_| Error::Config(format!("{} is not set", ENV_API_TOKEN)))?;
        Ok(Self::new(base_url, token))
    }

    /// Absolute URL for an API path (`path` starts with `/`).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Value of the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("Token {}", self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let ctx = ClientContext::new("http://localhost:8000/", "t");
        assert_eq!(
            ctx.url("/api/dashboard/"),
            "http://localhost:8000/api/dashboard/"
        );
        assert_eq!(ctx.authorization(), "Token t");
    }
}
