//! Email classification rules.
//!
//! A rule matches only when every condition it sets holds. Rules are tried
//! from the highest priority down and the first match wins; equal
//! priorities keep their given order.

use tracing::debug;

use taxon_core::{EmailRule, EmailRuleInput, EmailSample, RuleConditions, RuleEvaluation, RuleMatch};

/// Reason reported when a rule matched.
pub const ALL_CONDITIONS_MET: &str = "All conditions met";

/// Check a single, possibly unsaved, rule against an email.
pub fn evaluate_rule(rule: &EmailRuleInput, email: &EmailSample) -> RuleEvaluation {
    let failed = failed_conditions(&rule.conditions, email);
    if failed.is_empty() {
        RuleEvaluation {
            matches: true,
            reasons: vec![ALL_CONDITIONS_MET.to_string()],
            classification: Some(rule.classification.clone()),
        }
    } else {
        RuleEvaluation {
            matches: false,
            reasons: failed,
            classification: None,
        }
    }
}

/// The first active rule, by descending priority, whose conditions all hold.
pub fn first_match(rules: &[EmailRule], email: &EmailSample) -> Option<RuleMatch> {
    let mut ordered: Vec<&EmailRule> = rules.iter().filter(|r| r.is_active).collect();
    ordered.sort_by(|a, b| b.priority.cmp(&a.priority));

    let matched = ordered
        .into_iter()
        .find(|rule| failed_conditions(&rule.conditions, email).is_empty())?;

    debug!(
        subsystem = "classify",
        component = "rules",
        rule_id = %matched.id,
        rule_name = %matched.name,
        priority = matched.priority,
        "Email rule matched"
    );
    Some(RuleMatch {
        rule_id: matched.id,
        rule_name: matched.name.clone(),
        classification: matched.classification.clone(),
        priority: matched.priority,
    })
}

/// Human-readable reasons for every condition the email misses.
fn failed_conditions(conditions: &RuleConditions, email: &EmailSample) -> Vec<String> {
    let mut failed = Vec::new();

    if !conditions.sender_domains.is_empty() {
        let domain = sender_domain(&email.from);
        let listed = conditions
            .sender_domains
            .iter()
            .any(|d| normalize_domain(d) == domain);
        if domain.is_empty() || !listed {
            failed.push("Sender domain does not match".to_string());
        }
    }

    if !contains_any(&email.subject, &conditions.subject_keywords) {
        failed.push("Subject keywords not found".to_string());
    }
    if !contains_any(&email.body, &conditions.body_keywords) {
        failed.push("Body keywords not found".to_string());
    }

    let count = email.attachment_count();
    let min_count = usize::try_from(conditions.min_attachments).unwrap_or(0);
    if count < min_count {
        failed.push("Too few attachments".to_string());
    }
    if let Some(max) = conditions.max_attachments {
        if count > usize::try_from(max).unwrap_or(0) {
            failed.push("Too many attachments".to_string());
        }
    }

    let size = email.total_attachment_size();
    if size < conditions.min_attachment_size {
        failed.push("Attachment size too small".to_string());
    }
    if conditions.max_attachment_size.is_some_and(|max| size > max) {
        failed.push("Attachment size too large".to_string());
    }

    failed
}

/// Lowercased domain of a sender such as `Alice <alice@Example.com>`.
fn sender_domain(from: &str) -> String {
    match from.rsplit_once('@') {
        Some((_, domain)) => normalize_domain(domain.trim_end_matches('>')),
        None => String::new(),
    }
}

fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_start_matches('@').to_lowercase()
}

/// True when no keywords are set or any keyword occurs, ignoring case.
fn contains_any(haystack: &str, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let haystack = haystack.to_lowercase();
    keywords
        .iter()
        .any(|kw| haystack.contains(&kw.trim().to_lowercase()))
}
