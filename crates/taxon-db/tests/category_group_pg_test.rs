//! PostgreSQL repository tests.
//!
//! These need a migrated database. Run with:
//! `DATABASE_URL=postgres://... cargo test -p taxon-db -- --ignored`

use taxon_db::{
    content_hash, create_pool, new_v7, CategoryGroupInput, CategoryGroupRepository,
    CategoryInput, ClassificationResult, ClassificationResultRepository, ContentRepository,
    Database, EmailRuleInput, EmailRuleRepository, Error, NewContentItem, ResultMetadata,
    ResultStatus, RuleConditions, DEFAULT_TEST_DATABASE_URL,
};

async fn setup_db() -> Database {
    let _ = dotenvy::dotenv();
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_TEST_DATABASE_URL.to_string());
    let pool = create_pool(&database_url)
        .await
        .expect("Failed to create test pool");
    Database::new(pool)
}

fn unique(name: &str) -> String {
    format!("{}-{}", name, uuid::Uuid::new_v4())
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_pg_create_get_and_list() {
    let db = setup_db().await;
    let name = unique("Urgency");
    let group = db
        .category_groups
        .create(CategoryGroupInput::new(&name, &["High", "Low"]), "pg-test")
        .await
        .expect("create group");

    let fetched = db.category_groups.get(group.id).await.expect("get group");
    assert_eq!(fetched.name, name);
    assert_eq!(fetched.category_names(), vec!["High", "Low"]);

    let listed = db.category_groups.list().await.expect("list groups");
    assert_eq!(listed.iter().filter(|g| g.id == group.id).count(), 1);

    db.category_groups.delete(group.id).await.expect("cleanup");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_pg_update_replaces_and_toggle_flips() {
    let db = setup_db().await;
    let group = db
        .category_groups
        .create(CategoryGroupInput::new(unique("G"), &["A", "B"]), "pg-test")
        .await
        .expect("create group");

    let updated = db
        .category_groups
        .update(group.id, CategoryGroupInput::new("Renamed", &["C"]))
        .await
        .expect("update group");
    assert_eq!(updated.category_names(), vec!["C"]);

    let toggled = db.category_groups.toggle_active(group.id).await.unwrap();
    assert!(!toggled.is_active);

    let added = db
        .category_groups
        .add_category(group.id, CategoryInput::new("D"))
        .await
        .expect("add category");
    assert_eq!(added.name, "D");

    let dup = db
        .category_groups
        .add_category(group.id, CategoryInput::new("C"))
        .await
        .unwrap_err();
    assert!(matches!(dup, Error::Validation(_)));

    db.category_groups.delete(group.id).await.expect("cleanup");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_pg_delete_group_keeps_results() {
    let db = setup_db().await;
    let group = db
        .category_groups
        .create(CategoryGroupInput::new(unique("Topic"), &["Billing"]), "pg-test")
        .await
        .unwrap();
    let item = db
        .contents
        .insert(NewContentItem::text("t", "invoice overdue", "pg-test"))
        .await
        .unwrap();

    let result = ClassificationResult {
        id: new_v7(),
        content_id: item.id,
        content_type: item.kind,
        content_hash: content_hash(&item.content),
        classification: "Billing".to_string(),
        confidence: 0.9,
        metadata: ResultMetadata {
            explanation: "mentions invoice".to_string(),
            category_group_name: group.name.clone(),
            category_group_id: Some(group.id),
            status: ResultStatus::Classified,
            raw_label: None,
        },
        llm_provider: "deepseek".to_string(),
        llm_model: "deepseek-chat".to_string(),
        created_by: "pg-test".to_string(),
        created_at: chrono::Utc::now(),
    };
    db.results.insert_batch(&[result.clone()]).await.unwrap();

    db.category_groups.delete(group.id).await.unwrap();

    let stored = db.results.get(result.id).await.unwrap();
    assert_eq!(stored.metadata.category_group_name, group.name);
    assert!(stored.metadata.category_group_id.is_none());

    db.contents.delete(item.id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_pg_blank_names_are_validation_errors() {
    let db = setup_db().await;

    let err = db
        .category_groups
        .create(CategoryGroupInput::new("   ", &["A"]), "pg-test")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let group = db
        .category_groups
        .create(CategoryGroupInput::new(unique("G"), &["A"]), "pg-test")
        .await
        .unwrap();

    let err = db
        .category_groups
        .update(group.id, CategoryGroupInput::new("", &["A"]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = db
        .category_groups
        .add_category(group.id, CategoryInput::new("  "))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let unchanged = db.category_groups.get(group.id).await.unwrap();
    assert_eq!(unchanged.name, group.name);
    assert_eq!(unchanged.category_names(), vec!["A"]);

    db.category_groups.delete(group.id).await.expect("cleanup");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_pg_duplicate_categories_on_create_store_nothing() {
    let db = setup_db().await;
    let name = unique("Dup");

    let err = db
        .category_groups
        .create(CategoryGroupInput::new(&name, &["High", "high"]), "pg-test")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let listed = db.category_groups.list().await.unwrap();
    assert!(listed.iter().all(|g| g.name != name));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_pg_add_category_rejects_case_variant() {
    let db = setup_db().await;
    let group = db
        .category_groups
        .create(CategoryGroupInput::new(unique("Urgency"), &["High"]), "pg-test")
        .await
        .unwrap();

    let err = db
        .category_groups
        .add_category(group.id, CategoryInput::new("HIGH"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    db.category_groups.delete(group.id).await.expect("cleanup");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_pg_list_active_never_mixes_names_and_categories() {
    let db = setup_db().await;
    let group = db
        .category_groups
        .create(CategoryGroupInput::new("Even", &["E1", "E2"]), "pg-test")
        .await
        .unwrap();

    let writer = {
        let repo = db.category_groups.clone();
        let id = group.id;
        tokio::spawn(async move {
            for i in 0..50 {
                let input = if i % 2 == 0 {
                    CategoryGroupInput::new("Odd", &["O1"])
                } else {
                    CategoryGroupInput::new("Even", &["E1", "E2"])
                };
                repo.update(id, input).await.expect("update");
            }
        })
    };

    for _ in 0..50 {
        let active = db.category_groups.list_active().await.unwrap();
        if let Some(seen) = active.iter().find(|g| g.id == group.id) {
            let expected: Vec<&str> = match seen.name.as_str() {
                "Even" => vec!["E1", "E2"],
                _ => vec!["O1"],
            };
            assert_eq!(seen.category_names(), expected);
        }
    }

    writer.await.unwrap();
    db.category_groups.delete(group.id).await.expect("cleanup");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_pg_email_rule_round_trip() {
    let db = setup_db().await;
    let input = EmailRuleInput::new(unique("Invoices"), "Billing")
        .with_priority(7)
        .with_conditions(RuleConditions {
            sender_domains: vec!["@Billing.Example.com".to_string()],
            body_keywords: vec!["overdue".to_string()],
            max_attachment_size: Some(10_000),
            ..Default::default()
        });

    let rule = db.email_rules.create(input).await.expect("create rule");
    assert_eq!(rule.conditions.sender_domains, vec!["billing.example.com"]);
    assert_eq!(rule.conditions.max_attachment_size, Some(10_000));

    let active = db.email_rules.list_active().await.unwrap();
    assert!(active.iter().any(|r| r.id == rule.id));

    let mut replacement = EmailRuleInput::new("Renamed", "Finance");
    replacement.is_active = false;
    let updated = db.email_rules.update(rule.id, replacement).await.unwrap();
    assert!(updated.conditions.body_keywords.is_empty());
    assert!(db
        .email_rules
        .list_active()
        .await
        .unwrap()
        .iter()
        .all(|r| r.id != rule.id));

    let invalid = db
        .email_rules
        .create(EmailRuleInput::new("", "X"))
        .await
        .unwrap_err();
    assert!(matches!(invalid, Error::Validation(_)));

    db.email_rules.delete(rule.id).await.expect("cleanup");
    assert!(matches!(
        db.email_rules.get(rule.id).await,
        Err(Error::NotFound(_))
    ));
}
