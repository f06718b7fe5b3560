//! Centralized default constants for taxon.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates reference these constants instead of defining their own magic
//! numbers. Environment variables override the runtime ones at startup.

// =============================================================================
// LABELS
// =============================================================================

/// Placeholder for provider, model, and group names that are not known.
pub const UNKNOWN: &str = "unknown";

/// Label stored when a per-group classifier call fails or times out.
pub const LABEL_ERROR: &str = "error";

/// Label stored when the classifier answers outside the group's categories.
pub const LABEL_UNCLASSIFIED: &str = "unclassified";

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Per-group classifier timeout in seconds.
pub const CLASSIFY_TIMEOUT_SECS: u64 = 60;

/// Content sent to the classifier is truncated to this many characters.
pub const CLASSIFY_CONTENT_CHARS: usize = 1000;

/// Sampling temperature for classification prompts.
pub const LLM_TEMPERATURE: f32 = 0.7;

/// Maximum tokens generated for one classification answer.
pub const LLM_MAX_TOKENS: u32 = 1000;

/// HTTP timeout for a single chat completion request, in seconds.
pub const LLM_HTTP_TIMEOUT_SECS: u64 = 120;

/// Provider used when a submission does not name one.
pub const DEFAULT_LLM_PROVIDER: &str = "deepseek";

/// Providers registered when `LLM_PROVIDERS` is not set.
pub const LLM_PROVIDERS: &[&str] = &["deepseek", "openai", "qwen", "doubao"];

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for content history.
pub const PAGE_SIZE: usize = 10;

/// Largest page size a caller may request.
pub const PAGE_SIZE_MAX: usize = 100;

/// Default page size for result history.
pub const RESULT_PAGE_LIMIT: i64 = 50;

/// Number of labels shown in the dashboard distribution.
pub const DASHBOARD_TOP_LABELS: i64 = 5;

/// Dashboard activity window in days.
pub const DASHBOARD_WINDOW_DAYS: i64 = 7;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server bind host.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 8000;

/// Maximum accepted upload/body size in bytes (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Length of the hex token fingerprint used as a user reference.
pub const TOKEN_FINGERPRINT_LEN: usize = 16;

// =============================================================================
// DATABASE POOL
// =============================================================================

/// Maximum connections in the PostgreSQL pool.
pub const DB_POOL_MAX_CONNECTIONS: u32 = 20;

/// Minimum idle connections kept in the pool.
pub const DB_POOL_MIN_CONNECTIONS: u32 = 2;

/// Seconds to wait for a connection before failing.
pub const DB_POOL_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Seconds before an idle connection is closed.
pub const DB_POOL_IDLE_TIMEOUT_SECS: u64 = 600;

/// Seconds before a connection is recycled.
pub const DB_POOL_MAX_LIFETIME_SECS: u64 = 1800;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_within_max() {
        assert!(PAGE_SIZE <= PAGE_SIZE_MAX);
    }

    #[test]
    fn test_default_provider_is_registered_by_default() {
        assert!(LLM_PROVIDERS.contains(&DEFAULT_LLM_PROVIDER));
    }

    #[test]
    fn test_pool_bounds() {
        assert!(DB_POOL_MIN_CONNECTIONS <= DB_POOL_MAX_CONNECTIONS);
    }
}
