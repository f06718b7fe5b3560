//! Shared application state.

use std::sync::Arc;

use taxon_classify::{CoordinatorConfig, SubmissionCoordinator};
use taxon_core::{
    defaults, CategoryGroupRepository, ClassificationResultRepository, Classifier,
    ContentRepository, EmailRuleRepository, ProviderCatalog, StatsRepository,
};
use taxon_db::{Database, MemoryStore};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub groups: Arc<dyn CategoryGroupRepository>,
    pub contents: Arc<dyn ContentRepository>,
    pub results: Arc<dyn ClassificationResultRepository>,
    pub stats: Arc<dyn StatsRepository>,
    pub rules: Arc<dyn EmailRuleRepository>,
    /// Provider listing; submissions may only name listed providers.
    pub catalog: Arc<dyn ProviderCatalog>,
    pub coordinator: SubmissionCoordinator,
    /// Provider used when a submission names none.
    pub default_provider: String,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        groups: Arc<dyn CategoryGroupRepository>,
        contents: Arc<dyn ContentRepository>,
        results: Arc<dyn ClassificationResultRepository>,
        stats: Arc<dyn StatsRepository>,
        rules: Arc<dyn EmailRuleRepository>,
        classifier: Arc<dyn Classifier>,
        catalog: Arc<dyn ProviderCatalog>,
        default_provider: impl Into<String>,
    ) -> Self {
        let coordinator = SubmissionCoordinator::new(
            Arc::clone(&groups),
            Arc::clone(&contents),
            Arc::clone(&results),
            classifier,
            Arc::clone(&catalog),
        );
        Self {
            groups,
            contents,
            results,
            stats,
            rules,
            catalog,
            coordinator,
            default_provider: default_provider.into(),
            max_upload_bytes: defaults::MAX_UPLOAD_BYTES,
        }
    }

    /// State backed by PostgreSQL repositories.
    pub fn with_database(
        db: &Database,
        classifier: Arc<dyn Classifier>,
        catalog: Arc<dyn ProviderCatalog>,
        default_provider: impl Into<String>,
    ) -> Self {
        Self::new(
            Arc::new(db.category_groups.clone()),
            Arc::new(db.contents.clone()),
            Arc::new(db.results.clone()),
            Arc::new(db.stats.clone()),
            Arc::new(db.email_rules.clone()),
            classifier,
            catalog,
            default_provider,
        )
    }

    /// State backed by a shared in-memory store.
    pub fn in_memory(
        store: MemoryStore,
        classifier: Arc<dyn Classifier>,
        catalog: Arc<dyn ProviderCatalog>,
        default_provider: impl Into<String>,
    ) -> Self {
        Self::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
            classifier,
            catalog,
            default_provider,
        )
    }

    pub fn with_coordinator_config(mut self, config: CoordinatorConfig) -> Self {
        self.coordinator = self.coordinator.with_config(config);
        self
    }

    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }
}
