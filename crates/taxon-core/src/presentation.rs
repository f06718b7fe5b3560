//! Result presentation: pagination and display normalization.
//!
//! Everything here is pure and works on already-fetched data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults::UNKNOWN;
use crate::models::{ClassificationResult, ContentKind, ContentWithResults, ResultStatus};

/// One page of an ordered sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    /// 1-based page number actually served.
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_count: usize,
}

/// Number of pages needed for `count` items; never less than one.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    let size = page_size.max(1);
    count.div_ceil(size).max(1)
}

/// Slice `items` into the requested page.
///
/// `page_number` is 1-based; zero is treated as the first page and a
/// `page_size` of zero as one. Pages past the end are empty.
pub fn page<T: Clone>(items: &[T], page_number: usize, page_size: usize) -> Page<T> {
    let page_number = page_number.max(1);
    let page_size = page_size.max(1);
    let start = (page_number - 1).saturating_mul(page_size);
    let results = if start >= items.len() {
        Vec::new()
    } else {
        let end = start.saturating_add(page_size).min(items.len());
        items[start..end].to_vec()
    };

    Page {
        results,
        page: page_number,
        page_size,
        total_pages: total_pages(items.len(), page_size),
        total_count: items.len(),
    }
}

/// Display row for one classification result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayResult {
    pub group_name: String,
    pub classification: String,
    pub confidence: f64,
    pub explanation: String,
    pub status: ResultStatus,
}

impl From<&ClassificationResult> for DisplayResult {
    fn from(result: &ClassificationResult) -> Self {
        Self {
            group_name: non_empty_or_unknown(&result.metadata.category_group_name),
            classification: result.classification.clone(),
            confidence: result.confidence.clamp(0.0, 1.0),
            explanation: result.metadata.explanation.clone(),
            status: result.metadata.status,
        }
    }
}

/// Display row for a content item and its results.
///
/// Provider and model read `"unknown"` when the item has no results or the
/// stored values are blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayItem {
    pub id: Uuid,
    pub kind: ContentKind,
    pub title: String,
    pub content: String,
    pub processed: bool,
    pub llm_provider: String,
    pub llm_model: String,
    pub created_at: DateTime<Utc>,
    pub results: Vec<DisplayResult>,
}

impl From<&ContentWithResults> for DisplayItem {
    fn from(entry: &ContentWithResults) -> Self {
        let item = &entry.item;
        let (llm_provider, llm_model) = match entry.classification_results.first() {
            None => (UNKNOWN.to_string(), UNKNOWN.to_string()),
            Some(first) => (
                first_non_empty(&first.llm_provider, &item.llm_provider),
                first_non_empty(&first.llm_model, &item.llm_model),
            ),
        };

        Self {
            id: item.id,
            kind: item.kind,
            title: item.title.clone(),
            content: item.content.clone(),
            processed: item.processed,
            llm_provider,
            llm_model,
            created_at: item.created_at,
            results: entry
                .classification_results
                .iter()
                .map(DisplayResult::from)
                .collect(),
        }
    }
}

impl From<ContentWithResults> for DisplayItem {
    fn from(entry: ContentWithResults) -> Self {
        DisplayItem::from(&entry)
    }
}

fn non_empty_or_unknown(value: &str) -> String {
    if value.trim().is_empty() {
        UNKNOWN.to_string()
    } else {
        value.to_string()
    }
}

fn first_non_empty(primary: &str, secondary: &str) -> String {
    if !primary.trim().is_empty() && primary != UNKNOWN {
        primary.to_string()
    } else {
        non_empty_or_unknown(secondary)
    }
}
