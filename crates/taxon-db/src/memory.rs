//! In-memory repositories.
//!
//! A single `MemoryStore` implements every repository trait over one shared
//! state behind a tokio `RwLock`, so each mutation is one write-lock critical
//! section and readers never see partial writes. Used by tests and by the
//! server when `STORE_BACKEND=memory`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use taxon_core::{
    category_key, defaults, new_v7, normalize_rule_conditions, validate_category_name,
    validate_email_rule_input, validate_group_input, Category, CategoryGroup, CategoryGroupInput,
    CategoryGroupRepository, CategoryInput, ClassificationResult, ClassificationResultRepository,
    ContentItem, ContentRepository, EmailRule, EmailRuleInput, EmailRuleRepository, Error,
    LabelCount, ListContentRequest, ListContentResponse, NewContentItem, PeriodStats, Result,
    StatsRepository,
};

#[derive(Debug, Default)]
struct MemoryState {
    /// Creation order.
    groups: Vec<CategoryGroup>,
    /// Insertion order.
    contents: Vec<ContentItem>,
    /// Insertion order.
    results: Vec<ClassificationResult>,
    /// Creation order; listing sorts by priority.
    rules: Vec<EmailRule>,
}

impl MemoryState {
    fn group_mut(&mut self, id: Uuid) -> Result<&mut CategoryGroup> {
        self.groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| Error::NotFound(format!("category group {}", id)))
    }

    fn rule_mut(&mut self, id: Uuid) -> Result<&mut EmailRule> {
        self.rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::NotFound(format!("email rule {}", id)))
    }

    /// Highest priority first; ties keep creation order.
    fn rules_in_order(&self, active_only: bool) -> Vec<EmailRule> {
        let mut rules: Vec<EmailRule> = self
            .rules
            .iter()
            .filter(|r| !active_only || r.is_active)
            .cloned()
            .collect();
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        rules
    }

    fn content_mut(&mut self, id: Uuid) -> Result<&mut ContentItem> {
        self.contents
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::NotFound(format!("content item {}", id)))
    }
}

fn build_categories(inputs: &[CategoryInput], now: DateTime<Utc>) -> Vec<Category> {
    inputs
        .iter()
        .map(|c| Category {
            id: new_v7(),
            name: c.name.trim().to_string(),
            description: c.description.clone().unwrap_or_default(),
            created_at: now,
        })
        .collect()
}

/// Shared in-memory store. Cloning shares the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CategoryGroupRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<CategoryGroup>> {
        Ok(self.state.read().await.groups.clone())
    }

    async fn list_active(&self) -> Result<Vec<CategoryGroup>> {
        Ok(self
            .state
            .read()
            .await
            .groups
            .iter()
            .filter(|g| g.is_active)
            .cloned()
            .collect())
    }

    async fn get(&self, id: Uuid) -> Result<CategoryGroup> {
        self.state
            .read()
            .await
            .groups
            .iter()
            .find(|g| g.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("category group {}", id)))
    }

    async fn create(&self, input: CategoryGroupInput, created_by: &str) -> Result<CategoryGroup> {
        validate_group_input(&input)?;
        let now = Utc::now();
        let group = CategoryGroup {
            id: new_v7(),
            name: input.name.trim().to_string(),
            description: input.description.unwrap_or_default(),
            is_active: true,
            categories: build_categories(&input.categories, now),
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.groups.push(group.clone());
        Ok(group)
    }

    async fn update(&self, id: Uuid, input: CategoryGroupInput) -> Result<CategoryGroup> {
        validate_group_input(&input)?;
        let mut state = self.state.write().await;
        let group = state.group_mut(id)?;
        let now = Utc::now();
        group.name = input.name.trim().to_string();
        group.description = input.description.unwrap_or_default();
        group.categories = build_categories(&input.categories, now);
        group.updated_at = now;
        Ok(group.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        let before = state.groups.len();
        state.groups.retain(|g| g.id != id);
        if state.groups.len() == before {
            return Err(Error::NotFound(format!("category group {}", id)));
        }
        for result in state
            .results
            .iter_mut()
            .filter(|r| r.metadata.category_group_id == Some(id))
        {
            result.metadata.category_group_id = None;
        }
        Ok(())
    }

    async fn toggle_active(&self, id: Uuid) -> Result<CategoryGroup> {
        let mut state = self.state.write().await;
        let group = state.group_mut(id)?;
        group.is_active = !group.is_active;
        group.updated_at = Utc::now();
        Ok(group.clone())
    }

    async fn add_category(&self, group_id: Uuid, input: CategoryInput) -> Result<Category> {
        validate_category_name(&input.name)?;
        let mut state = self.state.write().await;
        let group = state.group_mut(group_id)?;
        let name = input.name.trim();
        let key = category_key(name);
        if group.categories.iter().any(|c| category_key(&c.name) == key) {
            return Err(Error::Validation(format!(
                "duplicate category name in group: {}",
                name
            )));
        }
        let now = Utc::now();
        let category = Category {
            id: new_v7(),
            name: name.to_string(),
            description: input.description.unwrap_or_default(),
            created_at: now,
        };
        group.categories.push(category.clone());
        group.updated_at = now;
        Ok(category)
    }

    async fn list_categories(&self, group_id: Uuid) -> Result<Vec<Category>> {
        Ok(CategoryGroupRepository::get(self, group_id).await?.categories)
    }
}

#[async_trait]
impl ContentRepository for MemoryStore {
    async fn insert(&self, item: NewContentItem) -> Result<ContentItem> {
        let now = Utc::now();
        let stored = ContentItem {
            id: new_v7(),
            kind: item.kind,
            title: item.title,
            content: item.content,
            processed: false,
            llm_provider: defaults::UNKNOWN.to_string(),
            llm_model: defaults::UNKNOWN.to_string(),
            metadata: item.metadata,
            created_by: item.created_by,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.contents.push(stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> Result<ContentItem> {
        self.state
            .read()
            .await
            .contents
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("content item {}", id)))
    }

    async fn list(&self, req: ListContentRequest) -> Result<ListContentResponse> {
        let state = self.state.read().await;
        let matching: Vec<&ContentItem> = state
            .contents
            .iter()
            .rev()
            .filter(|c| req.kind.map_or(true, |k| c.kind == k))
            .filter(|c| {
                req.created_by
                    .as_deref()
                    .map_or(true, |user| c.created_by == user)
            })
            .collect();

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(req.offset.max(0) as usize)
            .take(req.limit.max(0) as usize)
            .cloned()
            .collect();
        Ok(ListContentResponse { items, total })
    }

    async fn mark_processed(&self, id: Uuid, llm_provider: &str, llm_model: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let item = state.content_mut(id)?;
        item.processed = true;
        item.llm_provider = llm_provider.to_string();
        item.llm_model = llm_model.to_string();
        item.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        let before = state.contents.len();
        state.contents.retain(|c| c.id != id);
        if state.contents.len() == before {
            return Err(Error::NotFound(format!("content item {}", id)));
        }
        state.results.retain(|r| r.content_id != id);
        Ok(())
    }
}

#[async_trait]
impl ClassificationResultRepository for MemoryStore {
    async fn insert_batch(&self, results: &[ClassificationResult]) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(missing) = results
            .iter()
            .find(|r| !state.contents.iter().any(|c| c.id == r.content_id))
        {
            return Err(Error::NotFound(format!(
                "content item {}",
                missing.content_id
            )));
        }
        let stored: Vec<ClassificationResult> = results
            .iter()
            .cloned()
            .map(|mut r| {
                r.confidence = r.confidence.clamp(0.0, 1.0);
                if let Some(group_id) = r.metadata.category_group_id {
                    if !state.groups.iter().any(|g| g.id == group_id) {
                        r.metadata.category_group_id = None;
                    }
                }
                r
            })
            .collect();
        state.results.extend(stored);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<ClassificationResult> {
        self.state
            .read()
            .await
            .results
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("classification result {}", id)))
    }

    async fn list_for_content(&self, content_id: Uuid) -> Result<Vec<ClassificationResult>> {
        Ok(self
            .state
            .read()
            .await
            .results
            .iter()
            .filter(|r| r.content_id == content_id)
            .cloned()
            .collect())
    }

    async fn list_for_contents(&self, content_ids: &[Uuid]) -> Result<Vec<ClassificationResult>> {
        Ok(self
            .state
            .read()
            .await
            .results
            .iter()
            .filter(|r| content_ids.contains(&r.content_id))
            .cloned()
            .collect())
    }

    async fn list(
        &self,
        created_by: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ClassificationResult>> {
        Ok(self
            .state
            .read()
            .await
            .results
            .iter()
            .rev()
            .filter(|r| created_by.map_or(true, |user| r.created_by == user))
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl StatsRepository for MemoryStore {
    async fn counts_since(&self, created_by: &str, since: DateTime<Utc>) -> Result<PeriodStats> {
        let state = self.state.read().await;
        let mut stats = PeriodStats {
            classifications: state
                .results
                .iter()
                .filter(|r| r.created_by == created_by && r.created_at >= since)
                .count() as i64,
            ..Default::default()
        };
        for item in state
            .contents
            .iter()
            .filter(|c| c.created_by == created_by && c.created_at >= since)
        {
            match item.kind {
                taxon_core::ContentKind::Email => stats.emails += 1,
                taxon_core::ContentKind::File => stats.files += 1,
                taxon_core::ContentKind::Text => stats.texts += 1,
            }
        }
        Ok(stats)
    }

    async fn label_distribution(&self, created_by: &str, limit: i64) -> Result<Vec<LabelCount>> {
        let state = self.state.read().await;
        let mut counts: HashMap<&str, i64> = HashMap::new();
        for result in state.results.iter().filter(|r| r.created_by == created_by) {
            *counts.entry(result.classification.as_str()).or_default() += 1;
        }

        let mut distribution: Vec<LabelCount> = counts
            .into_iter()
            .map(|(label, count)| LabelCount {
                classification: label.to_string(),
                count,
            })
            .collect();
        distribution.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.classification.cmp(&b.classification))
        });
        distribution.truncate(limit.max(0) as usize);
        Ok(distribution)
    }
}

#[async_trait]
impl EmailRuleRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<EmailRule>> {
        Ok(self.state.read().await.rules_in_order(false))
    }

    async fn list_active(&self) -> Result<Vec<EmailRule>> {
        Ok(self.state.read().await.rules_in_order(true))
    }

    async fn get(&self, id: Uuid) -> Result<EmailRule> {
        self.state
            .read()
            .await
            .rules
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("email rule {}", id)))
    }

    async fn create(&self, input: EmailRuleInput) -> Result<EmailRule> {
        validate_email_rule_input(&input)?;
        let now = Utc::now();
        let rule = EmailRule {
            id: new_v7(),
            name: input.name.trim().to_string(),
            description: input.description.unwrap_or_default(),
            conditions: normalize_rule_conditions(&input.conditions),
            classification: input.classification.trim().to_string(),
            priority: input.priority,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.rules.push(rule.clone());
        Ok(rule)
    }

    async fn update(&self, id: Uuid, input: EmailRuleInput) -> Result<EmailRule> {
        validate_email_rule_input(&input)?;
        let mut state = self.state.write().await;
        let rule = state.rule_mut(id)?;
        rule.name = input.name.trim().to_string();
        rule.description = input.description.unwrap_or_default();
        rule.conditions = normalize_rule_conditions(&input.conditions);
        rule.classification = input.classification.trim().to_string();
        rule.priority = input.priority;
        rule.is_active = input.is_active;
        rule.updated_at = Utc::now();
        Ok(rule.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        let before = state.rules.len();
        state.rules.retain(|r| r.id != id);
        if state.rules.len() == before {
            return Err(Error::NotFound(format!("email rule {}", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxon_core::{content_hash, ContentKind, ResultMetadata, ResultStatus};

    fn result_for(content: &ContentItem, group: &CategoryGroup, label: &str) -> ClassificationResult {
        ClassificationResult {
            id: new_v7(),
            content_id: content.id,
            content_type: content.kind,
            content_hash: content_hash(&content.content),
            classification: label.to_string(),
            confidence: 0.8,
            metadata: ResultMetadata {
                explanation: "because".to_string(),
                category_group_name: group.name.clone(),
                category_group_id: Some(group.id),
                status: ResultStatus::Classified,
                raw_label: None,
            },
            llm_provider: "deepseek".to_string(),
            llm_model: "deepseek-chat".to_string(),
            created_by: content.created_by.clone(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_then_list_contains_group_once() {
        let store = MemoryStore::new();
        let created = CategoryGroupRepository::create(
            &store,
            CategoryGroupInput::new("Urgency", &["High", "Low"]),
            "u1",
        )
        .await
        .unwrap();

        let groups = CategoryGroupRepository::list(&store).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, created.id);
        assert_eq!(groups[0].category_names(), vec!["High", "Low"]);
        assert!(groups[0].is_active);
    }

    #[tokio::test]
    async fn test_create_with_duplicate_categories_fails_and_stores_nothing() {
        let store = MemoryStore::new();
        let err = CategoryGroupRepository::create(
            &store,
            CategoryGroupInput::new("Dup", &["A", "A"]),
            "u1",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(CategoryGroupRepository::list(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_state() {
        let store = MemoryStore::new();
        let group =
            CategoryGroupRepository::create(&store, CategoryGroupInput::new("G", &["A"]), "u")
                .await
                .unwrap();

        let once = store.toggle_active(group.id).await.unwrap();
        assert!(!once.is_active);
        let twice = store.toggle_active(group.id).await.unwrap();
        assert!(twice.is_active);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let store = MemoryStore::new();
        let id = new_v7();
        assert!(matches!(
            CategoryGroupRepository::get(&store, id).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            CategoryGroupRepository::update(&store, id, CategoryGroupInput::new("G", &[])).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            CategoryGroupRepository::delete(&store, id).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.toggle_active(id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_replaces_categories() {
        let store = MemoryStore::new();
        let group = CategoryGroupRepository::create(
            &store,
            CategoryGroupInput::new("G", &["A", "B"]),
            "u",
        )
        .await
        .unwrap();

        let updated =
            CategoryGroupRepository::update(&store, group.id, CategoryGroupInput::new("G2", &["C"]))
                .await
                .unwrap();
        assert_eq!(updated.name, "G2");
        assert_eq!(updated.category_names(), vec!["C"]);
        assert!(updated.updated_at >= group.updated_at);
    }

    #[tokio::test]
    async fn test_list_active_skips_inactive() {
        let store = MemoryStore::new();
        let a = CategoryGroupRepository::create(&store, CategoryGroupInput::new("A", &["x"]), "u")
            .await
            .unwrap();
        let b = CategoryGroupRepository::create(&store, CategoryGroupInput::new("B", &["y"]), "u")
            .await
            .unwrap();
        store.toggle_active(a.id).await.unwrap();

        let active = CategoryGroupRepository::list_active(&store).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, b.id);
    }

    #[tokio::test]
    async fn test_add_category_rejects_duplicate() {
        let store = MemoryStore::new();
        let group =
            CategoryGroupRepository::create(&store, CategoryGroupInput::new("G", &["A"]), "u")
                .await
                .unwrap();

        store
            .add_category(group.id, CategoryInput::new("B"))
            .await
            .unwrap();
        let err = store
            .add_category(group.id, CategoryInput::new("A"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let names: Vec<String> = store
            .list_categories(group.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_add_category_rejects_case_variant() {
        let store = MemoryStore::new();
        let group = CategoryGroupRepository::create(
            &store,
            CategoryGroupInput::new("Urgency", &["High"]),
            "u",
        )
        .await
        .unwrap();

        let err = store
            .add_category(group.id, CategoryInput::new(" high "))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(store.list_categories(group.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_group_preserves_results() {
        let store = MemoryStore::new();
        let group = CategoryGroupRepository::create(
            &store,
            CategoryGroupInput::new("Urgency", &["High"]),
            "u",
        )
        .await
        .unwrap();
        let content = ContentRepository::insert(&store, NewContentItem::text("t", "body", "u"))
            .await
            .unwrap();
        let result = result_for(&content, &group, "High");
        store.insert_batch(&[result.clone()]).await.unwrap();

        CategoryGroupRepository::delete(&store, group.id)
            .await
            .unwrap();

        let kept = store.list_for_content(content.id).await.unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].classification, "High");
        assert_eq!(kept[0].metadata.category_group_name, "Urgency");
        assert!(kept[0].metadata.category_group_id.is_none());
    }

    #[tokio::test]
    async fn test_content_list_newest_first_and_filtered() {
        let store = MemoryStore::new();
        let first = ContentRepository::insert(&store, NewContentItem::text("a", "one", "u1"))
            .await
            .unwrap();
        let second = ContentRepository::insert(&store, NewContentItem::text("b", "two", "u1"))
            .await
            .unwrap();
        ContentRepository::insert(&store, NewContentItem::text("c", "three", "u2"))
            .await
            .unwrap();

        let page = ContentRepository::list(
            &store,
            ListContentRequest {
                kind: Some(ContentKind::Text),
                created_by: Some("u1".to_string()),
                limit: 10,
                offset: 0,
            },
        )
        .await
        .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].id, second.id);
        assert_eq!(page.items[1].id, first.id);
    }

    #[tokio::test]
    async fn test_mark_processed_sets_provider() {
        let store = MemoryStore::new();
        let item = ContentRepository::insert(&store, NewContentItem::text("a", "one", "u"))
            .await
            .unwrap();
        assert!(!item.processed);
        assert_eq!(item.llm_provider, "unknown");

        store
            .mark_processed(item.id, "deepseek", "deepseek-chat")
            .await
            .unwrap();
        let reloaded = ContentRepository::get(&store, item.id).await.unwrap();
        assert!(reloaded.processed);
        assert_eq!(reloaded.llm_model, "deepseek-chat");
    }

    #[tokio::test]
    async fn test_delete_content_removes_its_results() {
        let store = MemoryStore::new();
        let group =
            CategoryGroupRepository::create(&store, CategoryGroupInput::new("G", &["A"]), "u")
                .await
                .unwrap();
        let item = ContentRepository::insert(&store, NewContentItem::text("a", "one", "u"))
            .await
            .unwrap();
        store
            .insert_batch(&[result_for(&item, &group, "A")])
            .await
            .unwrap();

        ContentRepository::delete(&store, item.id).await.unwrap();
        assert!(store.list_for_content(item.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_batch_requires_content() {
        let store = MemoryStore::new();
        let group =
            CategoryGroupRepository::create(&store, CategoryGroupInput::new("G", &["A"]), "u")
                .await
                .unwrap();
        let mut orphan = ContentRepository::insert(&store, NewContentItem::text("a", "x", "u"))
            .await
            .unwrap();
        orphan.id = new_v7();
        let err = store
            .insert_batch(&[result_for(&orphan, &group, "A")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_stats_counts_and_distribution() {
        let store = MemoryStore::new();
        let group = CategoryGroupRepository::create(
            &store,
            CategoryGroupInput::new("G", &["A", "B"]),
            "u",
        )
        .await
        .unwrap();
        let since = Utc::now() - chrono::Duration::days(7);

        let text = ContentRepository::insert(&store, NewContentItem::text("a", "x", "u"))
            .await
            .unwrap();
        let mut email = NewContentItem::text("mail.eml", "y", "u");
        email.kind = ContentKind::Email;
        let email = ContentRepository::insert(&store, email).await.unwrap();

        store
            .insert_batch(&[
                result_for(&text, &group, "A"),
                result_for(&email, &group, "A"),
                result_for(&email, &group, "B"),
            ])
            .await
            .unwrap();

        let stats = store.counts_since("u", since).await.unwrap();
        assert_eq!(stats.texts, 1);
        assert_eq!(stats.emails, 1);
        assert_eq!(stats.files, 0);
        assert_eq!(stats.classifications, 3);

        let distribution = store.label_distribution("u", 5).await.unwrap();
        assert_eq!(distribution[0].classification, "A");
        assert_eq!(distribution[0].count, 2);
        assert_eq!(distribution.len(), 2);

        let other_user = store.counts_since("someone-else", since).await.unwrap();
        assert_eq!(other_user, PeriodStats::default());
    }

    #[tokio::test]
    async fn test_email_rules_listed_by_priority() {
        let store = MemoryStore::new();
        let low = EmailRuleRepository::create(&store, EmailRuleInput::new("Low", "A"))
            .await
            .unwrap();
        let high = EmailRuleRepository::create(
            &store,
            EmailRuleInput::new("High", "B").with_priority(10),
        )
        .await
        .unwrap();
        let mut off = EmailRuleInput::new("Off", "C").with_priority(20);
        off.is_active = false;
        let off = EmailRuleRepository::create(&store, off).await.unwrap();

        let all: Vec<Uuid> = EmailRuleRepository::list(&store)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(all, vec![off.id, high.id, low.id]);

        let active: Vec<Uuid> = EmailRuleRepository::list_active(&store)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(active, vec![high.id, low.id]);
    }

    #[tokio::test]
    async fn test_email_rule_update_and_delete() {
        let store = MemoryStore::new();
        let rule = EmailRuleRepository::create(&store, EmailRuleInput::new("R", "Spam"))
            .await
            .unwrap();

        let mut input = EmailRuleInput::new("Renamed", "Ham").with_priority(3);
        input.conditions.sender_domains = vec!["@Example.com".to_string()];
        let updated = EmailRuleRepository::update(&store, rule.id, input)
            .await
            .unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.classification, "Ham");
        assert_eq!(updated.conditions.sender_domains, vec!["example.com"]);
        assert_eq!(updated.created_at, rule.created_at);

        let invalid = EmailRuleRepository::update(&store, rule.id, EmailRuleInput::new("", "X"))
            .await
            .unwrap_err();
        assert!(matches!(invalid, Error::Validation(_)));

        EmailRuleRepository::delete(&store, rule.id).await.unwrap();
        assert!(matches!(
            EmailRuleRepository::get(&store, rule.id).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            EmailRuleRepository::delete(&store, rule.id).await,
            Err(Error::NotFound(_))
        ));
    }
}
