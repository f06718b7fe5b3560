//! Classification submission coordinator.
//!
//! A submission fans the content out to every active category group at once
//! and collects exactly one result per group, in the order the groups were
//! snapshotted. Each group is evaluated in its own task on a `JoinSet`, so
//! dropping the submission future aborts every in-flight classifier call.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use taxon_core::{
    content_hash, defaults, new_v7, normalize_label, CategoryGroup, CategoryGroupRepository,
    ClassificationRequest, ClassificationResult, ClassificationResultRepository, Classifier,
    ContentItem, ContentRepository, ContentWithResults, Error, GroupOutcome, NewContentItem,
    ProviderCatalog, Result, ResultMetadata, ResultStatus,
};

/// Configuration for the submission coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Upper bound on a single group's classifier call.
    pub group_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            group_timeout: Duration::from_secs(defaults::CLASSIFY_TIMEOUT_SECS),
        }
    }
}

impl CoordinatorConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `CLASSIFY_TIMEOUT_SECS` | `60` | Per-group classifier timeout |
    pub fn from_env() -> Self {
        let secs = std::env::var("CLASSIFY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|s| *s > 0)
            .unwrap_or(defaults::CLASSIFY_TIMEOUT_SECS);
        Self {
            group_timeout: Duration::from_secs(secs),
        }
    }

    pub fn with_group_timeout(mut self, timeout: Duration) -> Self {
        self.group_timeout = timeout;
        self
    }
}

/// Fans submitted content out to the active category groups.
#[derive(Clone)]
pub struct SubmissionCoordinator {
    groups: Arc<dyn CategoryGroupRepository>,
    contents: Arc<dyn ContentRepository>,
    results: Arc<dyn ClassificationResultRepository>,
    classifier: Arc<dyn Classifier>,
    catalog: Arc<dyn ProviderCatalog>,
    config: CoordinatorConfig,
}

impl SubmissionCoordinator {
    pub fn new(
        groups: Arc<dyn CategoryGroupRepository>,
        contents: Arc<dyn ContentRepository>,
        results: Arc<dyn ClassificationResultRepository>,
        classifier: Arc<dyn Classifier>,
        catalog: Arc<dyn ProviderCatalog>,
    ) -> Self {
        Self {
            groups,
            contents,
            results,
            classifier,
            catalog,
            config: CoordinatorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Store a new content item and classify it against every active group.
    ///
    /// The provider is checked before anything is stored.
    pub async fn submit(
        &self,
        item: NewContentItem,
        provider: &str,
    ) -> Result<ContentWithResults> {
        self.ensure_provider(provider).await?;
        if item.content.trim().is_empty() {
            return Err(Error::Validation("content must not be empty".to_string()));
        }

        let stored = self.contents.insert(item).await?;
        let classification_results = self.classify_content(&stored, provider).await?;
        let item = self.contents.get(stored.id).await?;
        Ok(ContentWithResults {
            item,
            classification_results,
        })
    }

    /// Classify an already stored content item.
    ///
    /// Returns one result per active group in snapshot order. The item is
    /// marked processed only after every result has been persisted.
    #[instrument(
        skip(self, item),
        fields(subsystem = "classify", component = "coordinator", content_id = %item.id)
    )]
    pub async fn classify_content(
        &self,
        item: &ContentItem,
        provider: &str,
    ) -> Result<Vec<ClassificationResult>> {
        self.ensure_provider(provider).await?;
        let start = Instant::now();

        let snapshot = self.groups.list_active().await?;
        let outcomes = self.fan_out(item, &snapshot, provider).await;

        let hash = content_hash(item.text_body());
        let results: Vec<ClassificationResult> = snapshot
            .iter()
            .zip(outcomes)
            .map(|(group, outcome)| build_result(item, &hash, group, outcome, provider))
            .collect();

        if !results.is_empty() {
            self.results.insert_batch(&results).await?;
        }

        let (llm_provider, llm_model) = results
            .iter()
            .find(|r| !r.is_error())
            .map(|r| (r.llm_provider.clone(), r.llm_model.clone()))
            .unwrap_or_else(|| (provider.to_string(), defaults::UNKNOWN.to_string()));
        self.contents
            .mark_processed(item.id, &llm_provider, &llm_model)
            .await?;

        let failed = results.iter().filter(|r| r.is_error()).count();
        info!(
            op = "submit",
            provider,
            group_count = snapshot.len(),
            failed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Content classified"
        );
        Ok(results)
    }

    async fn ensure_provider(&self, provider: &str) -> Result<()> {
        if self.catalog.has_provider(provider).await? {
            Ok(())
        } else {
            warn!(
                subsystem = "classify",
                component = "coordinator",
                provider,
                "Rejected submission for unknown provider"
            );
            Err(Error::InvalidProvider(provider.to_string()))
        }
    }

    /// One classifier task per group; outcomes land in the slot of the
    /// group's snapshot position.
    async fn fan_out(
        &self,
        item: &ContentItem,
        snapshot: &[CategoryGroup],
        provider: &str,
    ) -> Vec<GroupOutcome> {
        let mut slots: Vec<Option<GroupOutcome>> = vec![None; snapshot.len()];
        let mut tasks = JoinSet::new();

        for (index, group) in snapshot.iter().enumerate() {
            let classifier = Arc::clone(&self.classifier);
            let timeout = self.config.group_timeout;
            let request = ClassificationRequest {
                content: item.text_body().to_string(),
                content_kind: item.kind,
                group_name: group.name.clone(),
                categories: group.category_names(),
                provider: provider.to_string(),
            };
            let group_id = group.id;

            tasks.spawn(async move {
                let start = Instant::now();
                let outcome = match tokio::time::timeout(timeout, classifier.classify(&request))
                    .await
                {
                    Ok(Ok(verdict)) => GroupOutcome::Classified(verdict),
                    Ok(Err(e)) => GroupOutcome::Failed {
                        reason: e.to_string(),
                    },
                    Err(_) => GroupOutcome::Failed {
                        reason: format!(
                            "classifier timed out after {}s",
                            timeout.as_secs_f64()
                        ),
                    },
                };
                debug!(
                    subsystem = "classify",
                    component = "coordinator",
                    %group_id,
                    group_name = %request.group_name,
                    success = matches!(outcome, GroupOutcome::Classified(_)),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Group evaluated"
                );
                (index, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => error!(error = ?e, "Classification task panicked"),
            }
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| GroupOutcome::Failed {
                    reason: "classification task aborted".to_string(),
                })
            })
            .collect()
    }
}

/// Turn one group's outcome into the result that gets stored.
fn build_result(
    item: &ContentItem,
    hash: &str,
    group: &CategoryGroup,
    outcome: GroupOutcome,
    provider: &str,
) -> ClassificationResult {
    let mut metadata = ResultMetadata {
        category_group_name: group.name.clone(),
        category_group_id: Some(group.id),
        ..Default::default()
    };

    let (classification, confidence, llm_provider, llm_model) = match outcome {
        GroupOutcome::Classified(verdict) => {
            let names = group.category_names();
            let classification = match normalize_label(&verdict.classification, &names) {
                Some(label) => {
                    metadata.status = ResultStatus::Classified;
                    label.to_string()
                }
                None => {
                    metadata.status = ResultStatus::Unclassified;
                    metadata.raw_label = Some(verdict.classification.clone());
                    defaults::LABEL_UNCLASSIFIED.to_string()
                }
            };
            metadata.explanation = verdict.explanation;
            let confidence = if verdict.confidence.is_finite() {
                verdict.confidence.clamp(0.0, 1.0)
            } else {
                0.0
            };
            (
                classification,
                confidence,
                verdict.llm_provider,
                verdict.llm_model,
            )
        }
        GroupOutcome::Failed { reason } => {
            metadata.status = ResultStatus::Error;
            metadata.explanation = format!("Error during classification: {}", reason);
            (
                defaults::LABEL_ERROR.to_string(),
                0.0,
                provider.to_string(),
                defaults::UNKNOWN.to_string(),
            )
        }
    };

    ClassificationResult {
        id: new_v7(),
        content_id: item.id,
        content_type: item.kind,
        content_hash: hash.to_string(),
        classification,
        confidence,
        metadata,
        llm_provider,
        llm_model,
        created_by: item.created_by.clone(),
        created_at: Utc::now(),
    }
}
