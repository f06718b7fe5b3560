//! Classification prompt construction and response parsing.
//!
//! The model is asked to answer with a JSON object
//! `{"classification": ..., "confidence": ..., "explanation": ...}`. Answers
//! often arrive wrapped in a markdown code fence or surrounded by prose, so the
//! parser extracts the outermost JSON object before decoding it.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use taxon_core::{defaults, ContentKind, Error, Result};

/// Parsed classifier answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationAnswer {
    pub classification: String,
    /// Confidence score clamped to 0.0-1.0.
    pub confidence: f64,
    pub explanation: String,
}

impl ClassificationAnswer {
    pub fn new(classification: impl Into<String>, confidence: f64, explanation: String) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            classification: classification.into(),
            confidence,
            explanation,
        }
    }
}

/// Truncate content to the classifier's character budget.
pub fn truncate_content(content: &str) -> &str {
    match content.char_indices().nth(defaults::CLASSIFY_CONTENT_CHARS) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}

/// System message listing the categories and the required answer format.
pub fn classification_system_prompt(group_name: &str, categories: &[String]) -> String {
    let listing = categories
        .iter()
        .map(|c| format!("- {}", c))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a content classification system. Classify the given content into exactly one category of the "{group}" category group.

Available classification categories:
{listing}

Respond with a single JSON object and nothing else:
{{"classification": "<one of the categories above, spelled exactly>", "confidence": <number between 0 and 1>, "explanation": "<brief explanation>"}}"#,
        group = group_name,
        listing = listing,
    )
}

/// User message carrying the (truncated) content.
pub fn classification_user_prompt(content: &str, kind: ContentKind) -> String {
    format!(
        r#"Content Type: {kind}
Content: {content}

Classify this content and provide:
1. The most appropriate classification category from the available categories
2. A confidence score between 0 and 1
3. A brief explanation for your classification"#,
        kind = kind,
        content = truncate_content(content),
    )
}

fn fenced_json() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").unwrap())
}

/// Locate the JSON object inside a model answer.
fn extract_json_object(response: &str) -> Option<&str> {
    if let Some(caps) = fenced_json().captures(response) {
        return caps.get(1).map(|m| m.as_str());
    }
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (end > start).then(|| &response[start..=end])
}

fn confidence_value(value: Option<&JsonValue>) -> f64 {
    match value {
        Some(JsonValue::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(JsonValue::String(s)) => {
            let s = s.trim();
            match s.strip_suffix('%') {
                Some(pct) => pct.trim().parse::<f64>().map(|p| p / 100.0).unwrap_or(0.0),
                None => s.parse().unwrap_or(0.0),
            }
        }
        _ => 0.0,
    }
}

/// Parse a model answer into a classification.
///
/// Fails with `Error::Classifier` when no JSON object is present or the
/// `classification` field is missing or blank.
pub fn parse_classification_response(response: &str) -> Result<ClassificationAnswer> {
    let json = extract_json_object(response).ok_or_else(|| {
        Error::Classifier(format!(
            "No JSON object in classifier response: {}",
            preview(response)
        ))
    })?;

    let value: JsonValue = serde_json::from_str(json)
        .map_err(|e| Error::Classifier(format!("Malformed classifier JSON: {}", e)))?;

    let classification = value
        .get("classification")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            Error::Classifier("Classifier response has no classification field".to_string())
        })?;

    let explanation = value
        .get("explanation")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .trim()
        .to_string();

    Ok(ClassificationAnswer::new(
        classification,
        confidence_value(value.get("confidence")),
        explanation,
    ))
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(80).collect();
    if text.chars().count() > 80 {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_lists_categories() {
        let prompt =
            classification_system_prompt("Urgency", &["High".to_string(), "Low".to_string()]);
        assert!(prompt.contains("- High\n- Low"));
        assert!(prompt.contains("\"Urgency\""));
        assert!(prompt.contains("\"classification\""));
    }

    #[test]
    fn test_user_prompt_truncates_content() {
        let long = "x".repeat(5000);
        let prompt = classification_user_prompt(&long, ContentKind::Email);
        assert!(prompt.starts_with("Content Type: email"));
        assert!(prompt.contains(&"x".repeat(1000)));
        assert!(!prompt.contains(&"x".repeat(1001)));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "é".repeat(1500);
        let cut = truncate_content(&text);
        assert_eq!(cut.chars().count(), 1000);
        assert_eq!(truncate_content("short"), "short");
    }

    #[test]
    fn test_parse_plain_json() {
        let answer = parse_classification_response(
            r#"{"classification": "High", "confidence": 0.92, "explanation": "urgent tone"}"#,
        )
        .unwrap();
        assert_eq!(answer.classification, "High");
        assert!((answer.confidence - 0.92).abs() < 1e-9);
        assert_eq!(answer.explanation, "urgent tone");
    }

    #[test]
    fn test_parse_fenced_json() {
        let response = "Sure!\n```json\n{\"classification\": \"Low\", \"confidence\": \"0.4\", \"explanation\": \"calm\"}\n```";
        let answer = parse_classification_response(response).unwrap();
        assert_eq!(answer.classification, "Low");
        assert!((answer.confidence - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_parse_json_surrounded_by_prose() {
        let response = r#"Here you go: {"classification": "Spam", "confidence": 1.7} hope it helps"#;
        let answer = parse_classification_response(response).unwrap();
        assert_eq!(answer.classification, "Spam");
        assert_eq!(answer.confidence, 1.0);
        assert_eq!(answer.explanation, "");
    }

    #[test]
    fn test_parse_percentage_confidence() {
        let answer =
            parse_classification_response(r#"{"classification": "A", "confidence": "85%"}"#)
                .unwrap();
        assert!((answer.confidence - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_negative_confidence_clamped() {
        let answer =
            parse_classification_response(r#"{"classification": "A", "confidence": -3}"#).unwrap();
        assert_eq!(answer.confidence, 0.0);
    }

    #[test]
    fn test_parse_without_json_fails() {
        let err = parse_classification_response("I cannot classify this.").unwrap_err();
        assert!(matches!(err, Error::Classifier(_)));
    }

    #[test]
    fn test_parse_missing_classification_fails() {
        let err = parse_classification_response(r#"{"confidence": 0.5}"#).unwrap_err();
        assert!(err.to_string().contains("no classification"));
    }

    #[test]
    fn test_parse_malformed_json_fails() {
        let err = parse_classification_response(r#"{"classification": "A", }"#).unwrap_err();
        assert!(err.to_string().contains("Malformed"));
    }
}
