//! Core traits for taxon abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// CATEGORY GROUP REPOSITORY
// =============================================================================

/// Repository for category groups and their categories.
///
/// Every mutation is atomic: readers never observe a group whose categories
/// are half replaced.
#[async_trait]
pub trait CategoryGroupRepository: Send + Sync {
    /// All groups in creation order.
    async fn list(&self) -> Result<Vec<CategoryGroup>>;

    /// Active groups in creation order.
    async fn list_active(&self) -> Result<Vec<CategoryGroup>>;

    async fn get(&self, id: Uuid) -> Result<CategoryGroup>;

    /// Create a group with its categories. Input must already be validated.
    async fn create(&self, input: CategoryGroupInput, created_by: &str) -> Result<CategoryGroup>;

    /// Replace name, description and the full category collection.
    async fn update(&self, id: Uuid, input: CategoryGroupInput) -> Result<CategoryGroup>;

    /// Delete a group. Stored results keep the group name but lose the id.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Flip `is_active` and return the updated group.
    async fn toggle_active(&self, id: Uuid) -> Result<CategoryGroup>;

    /// Append one category to an existing group.
    async fn add_category(&self, group_id: Uuid, input: CategoryInput) -> Result<Category>;

    async fn list_categories(&self, group_id: Uuid) -> Result<Vec<Category>>;
}

// =============================================================================
// EMAIL RULE REPOSITORY
// =============================================================================

/// Repository for email classification rules.
#[async_trait]
pub trait EmailRuleRepository: Send + Sync {
    /// All rules, highest priority first, then creation order.
    async fn list(&self) -> Result<Vec<EmailRule>>;

    /// Active rules in evaluation order.
    async fn list_active(&self) -> Result<Vec<EmailRule>>;

    async fn get(&self, id: Uuid) -> Result<EmailRule>;

    async fn create(&self, input: EmailRuleInput) -> Result<EmailRule>;

    /// Replace every field of a rule.
    async fn update(&self, id: Uuid, input: EmailRuleInput) -> Result<EmailRule>;

    async fn delete(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// CONTENT REPOSITORY
// =============================================================================

/// Request for listing content items.
#[derive(Debug, Clone, Default)]
pub struct ListContentRequest {
    pub kind: Option<ContentKind>,
    pub created_by: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Response for listing content items.
#[derive(Debug, Clone, Default)]
pub struct ListContentResponse {
    pub items: Vec<ContentItem>,
    pub total: i64,
}

/// Repository for submitted content items.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn insert(&self, item: NewContentItem) -> Result<ContentItem>;

    async fn get(&self, id: Uuid) -> Result<ContentItem>;

    /// Newest first.
    async fn list(&self, req: ListContentRequest) -> Result<ListContentResponse>;

    /// Set `processed` together with the provider and model that served it.
    async fn mark_processed(&self, id: Uuid, llm_provider: &str, llm_model: &str) -> Result<()>;

    /// Delete a content item and the results attached to it.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// CLASSIFICATION RESULT REPOSITORY
// =============================================================================

/// Repository for immutable classification results. There is no update path.
#[async_trait]
pub trait ClassificationResultRepository: Send + Sync {
    /// Store a batch of results atomically, preserving the given order.
    async fn insert_batch(&self, results: &[ClassificationResult]) -> Result<()>;

    async fn get(&self, id: Uuid) -> Result<ClassificationResult>;

    /// Results for one content item in insertion order.
    async fn list_for_content(&self, content_id: Uuid) -> Result<Vec<ClassificationResult>>;

    /// Results for many content items, in insertion order per item.
    async fn list_for_contents(&self, content_ids: &[Uuid]) -> Result<Vec<ClassificationResult>>;

    /// Newest first, optionally restricted to one user.
    async fn list(
        &self,
        created_by: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ClassificationResult>>;
}

// =============================================================================
// STATS REPOSITORY
// =============================================================================

/// Aggregate counts for the dashboard.
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Per-kind counts of content and results created since `since`.
    async fn counts_since(&self, created_by: &str, since: DateTime<Utc>) -> Result<PeriodStats>;

    /// Most frequent labels, highest count first.
    async fn label_distribution(&self, created_by: &str, limit: i64) -> Result<Vec<LabelCount>>;
}

// =============================================================================
// CLASSIFIER COLLABORATORS
// =============================================================================

/// Classifies content against one group's categories.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, req: &ClassificationRequest) -> Result<ClassifierVerdict>;
}

/// Source of the provider identifiers a submission may name.
#[async_trait]
pub trait ProviderCatalog: Send + Sync {
    async fn list_providers(&self) -> Result<Vec<String>>;

    async fn has_provider(&self, provider: &str) -> Result<bool> {
        Ok(self.list_providers().await?.iter().any(|p| p == provider))
    }
}

/// Backend for text generation (chat completion).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text given a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate text with system context.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedCatalog(Vec<String>);

    #[async_trait]
    impl ProviderCatalog for FixedCatalog {
        async fn list_providers(&self) -> Result<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_has_provider_default_impl() {
        let catalog = FixedCatalog(vec!["deepseek".to_string(), "openai".to_string()]);
        assert!(catalog.has_provider("openai").await.unwrap());
        assert!(!catalog.has_provider("OpenAI").await.unwrap());
        assert!(!catalog.has_provider("bogus").await.unwrap());
    }
}
