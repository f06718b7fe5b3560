//! Core data models for taxon.
//!
//! These types are shared across all taxon crates and represent
//! the core domain entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::defaults;

// =============================================================================
// CATEGORY TYPES
// =============================================================================

/// A single category inside a group. Owned by exactly one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// A named, toggleable set of mutually exclusive categories.
///
/// Each group is one independent classification axis: a submitted content
/// item receives exactly one result per active group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CategoryGroup {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub is_active: bool,
    pub categories: Vec<Category>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CategoryGroup {
    /// Category names in their stored order.
    pub fn category_names(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.name.clone()).collect()
    }
}

/// Category fields supplied on create/update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CategoryInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

/// Request body for creating or fully replacing a category group.
///
/// `categories` replaces the whole collection on update; it is never merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CategoryGroupInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Vec<CategoryInput>,
}

impl CategoryGroupInput {
    pub fn new(name: impl Into<String>, categories: &[&str]) -> Self {
        Self {
            name: name.into(),
            description: None,
            categories: categories.iter().map(|c| CategoryInput::new(*c)).collect(),
        }
    }
}

/// Response body of the toggle endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ToggleActiveResponse {
    pub id: Uuid,
    pub is_active: bool,
    pub message: String,
}

impl From<&CategoryGroup> for ToggleActiveResponse {
    fn from(group: &CategoryGroup) -> Self {
        let verb = if group.is_active {
            "activated"
        } else {
            "deactivated"
        };
        Self {
            id: group.id,
            is_active: group.is_active,
            message: format!("Category group {} has been {}", group.name, verb),
        }
    }
}

// =============================================================================
// CONTENT TYPES
// =============================================================================

/// Kind of submitted content. Every kind carries a text body.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[default]
    Text,
    Email,
    File,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Text => "text",
            ContentKind::Email => "email",
            ContentKind::File => "file",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ContentKind::Text),
            "email" => Ok(ContentKind::Email),
            "file" => Ok(ContentKind::File),
            other => Err(format!("Unknown content kind: {}", other)),
        }
    }
}

/// A submitted content item (text input, email file, or uploaded file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ContentItem {
    pub id: Uuid,
    pub kind: ContentKind,
    /// Title for text input, filename for files and emails.
    pub title: String,
    /// Text body; for files and emails this is the extracted text.
    pub content: String,
    pub processed: bool,
    pub llm_provider: String,
    pub llm_model: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub metadata: JsonValue,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    /// Whether there is any text to classify.
    pub fn has_text_body(&self) -> bool {
        !self.content.trim().is_empty()
    }

    pub fn text_body(&self) -> &str {
        &self.content
    }
}

/// Fields needed to create a content item. Ids and timestamps are assigned
/// by the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct NewContentItem {
    pub kind: ContentKind,
    pub title: String,
    pub content: String,
    pub metadata: JsonValue,
    pub created_by: String,
}

impl NewContentItem {
    pub fn text(title: impl Into<String>, content: impl Into<String>, user: &str) -> Self {
        Self {
            kind: ContentKind::Text,
            title: title.into(),
            content: content.into(),
            metadata: JsonValue::Object(Default::default()),
            created_by: user.to_string(),
        }
    }
}

/// Request body for `POST /api/files/text/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SubmitContentRequest {
    pub content: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub llm_provider: Option<String>,
}

// =============================================================================
// CLASSIFICATION RESULT TYPES
// =============================================================================

/// Outcome status of a stored classification result.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    /// The label matched one of the group's categories.
    #[default]
    Classified,
    /// The classifier answered with a label outside the group.
    Unclassified,
    /// The classifier call failed or timed out.
    Error,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::Classified => "classified",
            ResultStatus::Unclassified => "unclassified",
            ResultStatus::Error => "error",
        }
    }
}

/// Typed metadata attached to every classification result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ResultMetadata {
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub category_group_name: String,
    /// Weak reference; becomes `None` once the group is deleted.
    #[serde(default)]
    pub category_group_id: Option<Uuid>,
    #[serde(default)]
    pub status: ResultStatus,
    /// Label the classifier returned when it did not match any category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_label: Option<String>,
}

/// Outcome of evaluating one content item against one category group.
/// Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ClassificationResult {
    pub id: Uuid,
    pub content_id: Uuid,
    pub content_type: ContentKind,
    pub content_hash: String,
    pub classification: String,
    pub confidence: f64,
    pub metadata: ResultMetadata,
    pub llm_provider: String,
    pub llm_model: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl ClassificationResult {
    pub fn is_error(&self) -> bool {
        self.metadata.status == ResultStatus::Error
    }
}

/// A content item joined with its classification results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ContentWithResults {
    #[serde(flatten)]
    pub item: ContentItem,
    pub classification_results: Vec<ClassificationResult>,
}

/// Paginated content history, as returned by the list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PaginatedContent {
    pub count: usize,
    pub total_pages: usize,
    pub next: Option<usize>,
    pub previous: Option<usize>,
    pub results: Vec<ContentWithResults>,
}

// =============================================================================
// CLASSIFIER COLLABORATOR TYPES
// =============================================================================

/// One classifier invocation: the content against one group's categories.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationRequest {
    pub content: String,
    pub content_kind: ContentKind,
    pub group_name: String,
    pub categories: Vec<String>,
    pub provider: String,
}

/// Parsed classifier answer for one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierVerdict {
    pub classification: String,
    pub confidence: f64,
    #[serde(default)]
    pub explanation: String,
    #[serde(default = "default_unknown")]
    pub llm_provider: String,
    #[serde(default = "default_unknown")]
    pub llm_model: String,
}

fn default_unknown() -> String {
    defaults::UNKNOWN.to_string()
}

/// Per-group outcome before it is turned into a stored result.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupOutcome {
    Classified(ClassifierVerdict),
    Failed { reason: String },
}

/// Response body of the provider-listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProviderList {
    pub providers: Vec<String>,
}

// =============================================================================
// DASHBOARD TYPES
// =============================================================================

/// Per-kind counts for a time window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PeriodStats {
    pub classifications: i64,
    pub emails: i64,
    pub files: i64,
    pub texts: i64,
}

/// How often a label was assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LabelCount {
    pub classification: String,
    pub count: i64,
}

/// Dashboard payload: last-week activity plus the most frequent labels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DashboardStats {
    pub recent_stats: PeriodStats,
    pub classification_distribution: Vec<LabelCount>,
}

/// Time window for `/api/stats/`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsPeriod {
    #[default]
    Week,
    Month,
    Year,
}

impl StatsPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatsPeriod::Week => "week",
            StatsPeriod::Month => "month",
            StatsPeriod::Year => "year",
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            StatsPeriod::Week => 7,
            StatsPeriod::Month => 30,
            StatsPeriod::Year => 365,
        }
    }
}

impl std::str::FromStr for StatsPeriod {
    type Err = String;

    /// Unknown values fall back to a year, matching the widest window.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "week" => StatsPeriod::Week,
            "month" => StatsPeriod::Month,
            _ => StatsPeriod::Year,
        })
    }
}

// =============================================================================
// EMAIL CLASSIFICATION RULES
// =============================================================================

/// Conditions an email must meet for a rule to match.
///
/// Empty lists and unset bounds impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RuleConditions {
    /// Matched against the part of the sender after `@`, ignoring case.
    #[serde(default)]
    pub sender_domains: Vec<String>,
    /// Any one keyword in the subject satisfies the condition.
    #[serde(default)]
    pub subject_keywords: Vec<String>,
    /// Any one keyword in the body satisfies the condition.
    #[serde(default)]
    pub body_keywords: Vec<String>,
    #[serde(default)]
    pub min_attachments: i32,
    #[serde(default)]
    pub max_attachments: Option<i32>,
    /// Total attachment size in bytes.
    #[serde(default)]
    pub min_attachment_size: i64,
    #[serde(default)]
    pub max_attachment_size: Option<i64>,
}

/// A stored email classification rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EmailRule {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub conditions: RuleConditions,
    /// Label assigned when the rule matches.
    pub classification: String,
    /// Higher priorities are evaluated first.
    pub priority: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

/// Request body for creating, replacing, or dry-running a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EmailRuleInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub conditions: RuleConditions,
    pub classification: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl EmailRuleInput {
    pub fn new(name: impl Into<String>, classification: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            conditions: RuleConditions::default(),
            classification: classification.into(),
            priority: 0,
            is_active: true,
        }
    }

    pub fn with_conditions(mut self, conditions: RuleConditions) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// One attachment of an email being checked against rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AttachmentSample {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: i64,
}

/// The parts of an email that rules look at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EmailSample {
    /// Sender address, bare or in `Name <addr>` form.
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentSample>,
}

impl EmailSample {
    pub fn attachment_count(&self) -> usize {
        self.attachments.len()
    }

    pub fn total_attachment_size(&self) -> i64 {
        self.attachments.iter().map(|a| a.size.max(0)).sum()
    }
}

/// Outcome of checking one rule against one email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RuleEvaluation {
    pub matches: bool,
    /// Failed conditions, or a single confirmation when every one held.
    pub reasons: Vec<String>,
    pub classification: Option<String>,
}

/// Body of `POST /api/email/email-rules/test_rule/`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TestRuleRequest {
    pub rule: EmailRuleInput,
    pub email: EmailSample,
}

/// The highest-priority active rule that matched an email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RuleMatch {
    pub rule_id: Uuid,
    pub rule_name: String,
    pub classification: String,
    pub priority: i32,
}
