//! Input validation for category groups and classifier labels.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::models::{CategoryGroupInput, EmailRuleInput, RuleConditions};

/// Reject empty category names.
pub fn validate_category_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation(
            "category name must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Comparison key for category names: trimmed and lowercased.
///
/// Uniqueness and label matching both use this key, so a group can never
/// hold two categories that the same classifier answer would map onto.
pub fn category_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Validate a group create/update payload.
///
/// The group name and every category name must be non-empty after trimming,
/// and category names must be unique within the group, ignoring case.
pub fn validate_group_input(input: &CategoryGroupInput) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(Error::Validation(
            "category group name must not be empty".to_string(),
        ));
    }

    let mut seen = HashSet::with_capacity(input.categories.len());
    for category in &input.categories {
        validate_category_name(&category.name)?;
        if !seen.insert(category_key(&category.name)) {
            return Err(Error::Validation(format!(
                "duplicate category name in group: {}",
                category.name.trim()
            )));
        }
    }
    Ok(())
}

/// Validate an email rule payload.
///
/// Name and classification must be non-empty, counts and sizes must not be
/// negative, and an upper bound may not sit below its lower bound.
pub fn validate_email_rule_input(input: &EmailRuleInput) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(Error::Validation("rule name must not be empty".to_string()));
    }
    if input.classification.trim().is_empty() {
        return Err(Error::Validation(
            "rule classification must not be empty".to_string(),
        ));
    }

    let c = &input.conditions;
    if c.min_attachments < 0 || c.max_attachments.is_some_and(|max| max < 0) {
        return Err(Error::Validation(
            "attachment counts must not be negative".to_string(),
        ));
    }
    if c.min_attachment_size < 0 || c.max_attachment_size.is_some_and(|max| max < 0) {
        return Err(Error::Validation(
            "attachment sizes must not be negative".to_string(),
        ));
    }
    if c.max_attachments.is_some_and(|max| max < c.min_attachments) {
        return Err(Error::Validation(
            "max_attachments is below min_attachments".to_string(),
        ));
    }
    if c.max_attachment_size
        .is_some_and(|max| max < c.min_attachment_size)
    {
        return Err(Error::Validation(
            "max_attachment_size is below min_attachment_size".to_string(),
        ));
    }
    if c.sender_domains
        .iter()
        .chain(&c.subject_keywords)
        .chain(&c.body_keywords)
        .any(|v| v.trim().is_empty())
    {
        return Err(Error::Validation(
            "rule domains and keywords must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Stored form of rule conditions: domains trimmed, lowercased and
/// without a leading `@`; keywords trimmed.
pub fn normalize_rule_conditions(conditions: &RuleConditions) -> RuleConditions {
    let mut normalized = conditions.clone();
    for domain in normalized.sender_domains.iter_mut() {
        *domain = domain.trim().trim_start_matches('@').to_lowercase();
    }
    for keyword in normalized
        .subject_keywords
        .iter_mut()
        .chain(normalized.body_keywords.iter_mut())
    {
        *keyword = keyword.trim().to_string();
    }
    normalized
}

/// Map a classifier label onto the group's stored category spelling.
///
/// Comparison is trimmed and case-insensitive. Returns `None` when the label
/// is not one of the categories.
pub fn normalize_label<'a>(label: &str, categories: &'a [String]) -> Option<&'a str> {
    let wanted = category_key(label);
    if wanted.is_empty() {
        return None;
    }
    categories
        .iter()
        .find(|c| category_key(c) == wanted)
        .map(|c| c.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryInput;

    #[test]
    fn test_valid_group_passes() {
        let input = CategoryGroupInput::new("Urgency", &["High", "Low"]);
        assert!(validate_group_input(&input).is_ok());
    }

    #[test]
    fn test_empty_group_name_rejected() {
        let input = CategoryGroupInput::new("   ", &["High"]);
        assert!(matches!(
            validate_group_input(&input),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_duplicate_category_names_rejected() {
        let input = CategoryGroupInput::new("Dup", &["A", "A"]);
        let err = validate_group_input(&input).unwrap_err();
        assert!(err.to_string().contains("duplicate category name"));
    }

    #[test]
    fn test_duplicate_after_trim_rejected() {
        let input = CategoryGroupInput::new("Dup", &["A", " A "]);
        assert!(validate_group_input(&input).is_err());
    }

    #[test]
    fn test_duplicate_differing_only_in_case_rejected() {
        let input = CategoryGroupInput::new("Urgency", &["High", "high"]);
        let err = validate_group_input(&input).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("high"));
    }

    #[test]
    fn test_category_key_trims_and_lowercases() {
        assert_eq!(category_key("  HiGh "), "high");
        assert_eq!(category_key("low"), category_key("LOW"));
    }

    #[test]
    fn test_empty_category_name_rejected() {
        let mut input = CategoryGroupInput::new("G", &["A"]);
        input.categories.push(CategoryInput::new(""));
        assert!(validate_group_input(&input).is_err());
    }

    #[test]
    fn test_group_without_categories_is_valid() {
        let input = CategoryGroupInput::new("Empty", &[]);
        assert!(validate_group_input(&input).is_ok());
    }

    #[test]
    fn test_email_rule_bounds_checked() {
        let mut input = EmailRuleInput::new("Big", "Archive");
        assert!(validate_email_rule_input(&input).is_ok());

        input.conditions.min_attachments = 3;
        input.conditions.max_attachments = Some(1);
        let err = validate_email_rule_input(&input).unwrap_err();
        assert!(err.to_string().contains("max_attachments"));

        input.conditions.max_attachments = None;
        input.conditions.min_attachment_size = -1;
        assert!(validate_email_rule_input(&input).is_err());
    }

    #[test]
    fn test_email_rule_needs_name_and_label() {
        assert!(validate_email_rule_input(&EmailRuleInput::new(" ", "Spam")).is_err());
        assert!(validate_email_rule_input(&EmailRuleInput::new("R", "")).is_err());

        let mut input = EmailRuleInput::new("R", "Spam");
        input.conditions.subject_keywords = vec!["".to_string()];
        assert!(validate_email_rule_input(&input).is_err());
    }

    #[test]
    fn test_rule_conditions_normalized_for_storage() {
        let conditions = RuleConditions {
            sender_domains: vec![" @Example.COM ".to_string()],
            subject_keywords: vec!["  Win ".to_string()],
            body_keywords: vec!["Prize\n".to_string()],
            ..Default::default()
        };
        let normalized = normalize_rule_conditions(&conditions);
        assert_eq!(normalized.sender_domains, vec!["example.com"]);
        assert_eq!(normalized.subject_keywords, vec!["Win"]);
        assert_eq!(normalized.body_keywords, vec!["Prize"]);
    }

    #[test]
    fn test_normalize_label_canonicalizes_case() {
        let cats = vec!["High".to_string(), "Low".to_string()];
        assert_eq!(normalize_label(" high ", &cats), Some("High"));
        assert_eq!(normalize_label("LOW", &cats), Some("Low"));
    }

    #[test]
    fn test_normalize_label_unknown() {
        let cats = vec!["High".to_string(), "Low".to_string()];
        assert_eq!(normalize_label("Medium", &cats), None);
        assert_eq!(normalize_label("", &cats), None);
    }
}
