//! taxon-api server binary.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taxon_api::{build_router, AppState};
use taxon_classify::CoordinatorConfig;
use taxon_core::defaults;
use taxon_db::{log_pool_metrics, Database, MemoryStore, PoolConfig};
use taxon_inference::{LlmClassifier, ProviderRegistry};

/// How often pool health is logged when running on PostgreSQL.
const POOL_METRICS_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "taxon_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "taxon_api=debug,taxon_classify=info,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("taxon-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false)); // no ANSI in files by default
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let host = std::env::var("HOST").unwrap_or_else(|_| defaults::SERVER_HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(defaults::SERVER_PORT);

    // LLM providers
    let providers = ProviderRegistry::from_env()?;
    let classifier = Arc::new(LlmClassifier::from_registry(&providers)?);
    let default_provider = providers.default_provider().to_string();
    info!(
        subsystem = "api",
        default_provider = %default_provider,
        providers = providers.providers().count(),
        "LLM providers configured"
    );
    let catalog = Arc::new(providers);

    // Storage
    let store_backend =
        std::env::var("STORE_BACKEND").unwrap_or_else(|_| "postgres".to_string());
    let state = match store_backend.as_str() {
        "memory" => {
            info!(subsystem = "api", "Using in-memory store; data is lost on exit");
            AppState::in_memory(MemoryStore::new(), classifier, catalog, default_provider)
        }
        _ => {
            let database_url = std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/taxon".to_string());
            let db = Database::connect_with_config(&database_url, PoolConfig::from_env()).await?;
            db.migrate().await?;
            info!(subsystem = "api", "Database connected and migrated");

            let pool = db.pool().clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(POOL_METRICS_INTERVAL);
                loop {
                    ticker.tick().await;
                    log_pool_metrics(&pool);
                }
            });
            AppState::with_database(&db, classifier, catalog, default_provider)
        }
    };

    let max_upload_bytes = std::env::var("MAX_UPLOAD_BYTES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults::MAX_UPLOAD_BYTES);
    let state = state
        .with_coordinator_config(CoordinatorConfig::from_env())
        .with_max_upload_bytes(max_upload_bytes);

    let app = build_router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
