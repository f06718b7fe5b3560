//! Client against a real taxon-api router served on a local port.

use std::sync::Arc;

use taxon_api::{build_router, AppState};
use taxon_client::{ClientContext, TaxonClient};
use taxon_core::{
    CategoryGroupInput, CategoryInput, EmailRuleInput, EmailSample, Error, RuleConditions,
    SubmitContentRequest,
};
use taxon_db::MemoryStore;
use taxon_inference::mock::MockClassifier;
use taxon_inference::{ProviderConfig, ProviderRegistry};

async fn spawn_server() -> String {
    let mut registry = ProviderRegistry::new("deepseek");
    registry.register(ProviderConfig::new("deepseek"));
    let state = AppState::in_memory(
        MemoryStore::new(),
        Arc::new(MockClassifier::new().with_answer("Urgency", "High", 0.9)),
        Arc::new(registry),
        "deepseek",
    );
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_group_lifecycle_through_client() {
    let client = TaxonClient::new(ClientContext::new(spawn_server().await, "tok")).unwrap();

    let group = client
        .create_group(&CategoryGroupInput::new("Urgency", &["High", "Low"]))
        .await
        .unwrap();
    client
        .add_category(group.id, &CategoryInput::new("Medium"))
        .await
        .unwrap();
    assert_eq!(client.list_categories(group.id).await.unwrap().len(), 3);

    let toggled = client.toggle_active(group.id).await.unwrap();
    assert!(!toggled.is_active);

    client.delete_group(group.id).await.unwrap();
    assert!(matches!(
        client.get_group(group.id).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_submission_and_history_through_client() {
    let client = TaxonClient::new(ClientContext::new(spawn_server().await, "tok")).unwrap();
    client
        .create_group(&CategoryGroupInput::new("Urgency", &["High", "Low"]))
        .await
        .unwrap();

    let submitted = client
        .submit_text(&SubmitContentRequest {
            content: "Everything is on fire".to_string(),
            title: "Fire".to_string(),
            llm_provider: None,
        })
        .await
        .unwrap();
    assert_eq!(submitted.classification_results[0].classification, "High");

    let history = client.text_history(1, 10).await.unwrap();
    assert_eq!(history.count, 1);
    assert_eq!(history.results[0].item.title, "Fire");

    let err = client
        .submit_text(&SubmitContentRequest {
            content: "x".to_string(),
            title: String::new(),
            llm_provider: Some("bogus".to_string()),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidProvider(ref p) if p == "bogus"));

    let dashboard = client.dashboard().await.unwrap();
    assert_eq!(dashboard.recent_stats.texts, 1);
}

#[tokio::test]
async fn test_email_rules_through_client() {
    let client = TaxonClient::new(ClientContext::new(spawn_server().await, "tok")).unwrap();

    let newsletter = EmailRuleInput::new("Newsletters", "Bulk").with_conditions(RuleConditions {
        subject_keywords: vec!["newsletter".to_string()],
        ..Default::default()
    });
    let rule = client.create_email_rule(&newsletter).await.unwrap();
    let urgent = client
        .create_email_rule(
            &EmailRuleInput::new("Pager", "Urgent")
                .with_priority(5)
                .with_conditions(RuleConditions {
                    sender_domains: vec!["pager.example.com".to_string()],
                    ..Default::default()
                }),
        )
        .await
        .unwrap();

    let sample = EmailSample {
        from: "alerts@pager.example.com".to_string(),
        subject: "Weekly newsletter".to_string(),
        ..Default::default()
    };
    let matched = client.evaluate_email_rules(&sample).await.unwrap().unwrap();
    assert_eq!(matched.rule_id, urgent.id);

    client.delete_email_rule(urgent.id).await.unwrap();
    let matched = client.evaluate_email_rules(&sample).await.unwrap().unwrap();
    assert_eq!(matched.rule_id, rule.id);
    assert_eq!(client.list_email_rules().await.unwrap().len(), 1);
    assert_eq!(client.get_email_rule(rule.id).await.unwrap().name, "Newsletters");
}
