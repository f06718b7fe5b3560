//! Wire-level tests for the OpenAI-compatible backend and the LLM classifier.
//!
//! A wiremock server stands in for the provider endpoint.

use std::sync::Arc;

use taxon_core::{ClassificationRequest, Classifier, ContentKind, Error, GenerationBackend};
use taxon_inference::openai::{OpenAIBackend, OpenAIConfig};
use taxon_inference::{LlmClassifier, ProviderConfig, ProviderRegistry};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-1",
        "model": "deepseek-chat",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }
        ],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
    })
}

fn backend_for(server: &MockServer) -> OpenAIBackend {
    OpenAIBackend::new(OpenAIConfig {
        base_url: server.uri(),
        api_key: Some("sk-test".to_string()),
        model: "deepseek-chat".to_string(),
        timeout_seconds: 5,
        ..Default::default()
    })
    .expect("backend")
}

#[tokio::test]
async fn test_chat_completion_sends_auth_and_messages() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(header("Content-Type", "application/json"))
        .and(body_partial_json(serde_json::json!({
            "model": "deepseek-chat",
            "max_tokens": 1000,
            "messages": [
                { "role": "system", "content": "be brief" },
                { "role": "user", "content": "hello" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("hi there")))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let answer = backend.generate_with_system("be brief", "hello").await.unwrap();
    assert_eq!(answer, "hi there");
}

#[tokio::test]
async fn test_unauthorized_maps_to_config_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": { "message": "Invalid API key", "type": "invalid_request_error" }
        })))
        .mount(&server)
        .await;

    let err = backend_for(&server).generate("hello").await.unwrap_err();
    assert!(matches!(err, Error::Config(_)), "got {:?}", err);
    assert!(err.to_string().contains("Invalid API key"));
}

#[tokio::test]
async fn test_server_error_maps_to_classifier_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let err = backend_for(&server).generate("hello").await.unwrap_err();
    assert!(matches!(err, Error::Classifier(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_empty_choices_is_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "x",
            "choices": []
        })))
        .mount(&server)
        .await;

    let err = backend_for(&server).generate("hello").await.unwrap_err();
    assert!(err.to_string().contains("no choices"));
}

#[tokio::test]
async fn test_classifier_end_to_end_against_provider() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "```json\n{\"classification\": \"Billing\", \"confidence\": 0.83, \"explanation\": \"mentions an invoice\"}\n```",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut registry = ProviderRegistry::new("deepseek");
    registry.register(
        ProviderConfig::new("deepseek")
            .with_base_url(server.uri())
            .with_api_key("sk-test"),
    );
    let classifier = LlmClassifier::from_registry(&registry).unwrap();

    let verdict = classifier
        .classify(&ClassificationRequest {
            content: "Please find the invoice for March attached.".to_string(),
            content_kind: ContentKind::Email,
            group_name: "Department".to_string(),
            categories: vec!["Billing".to_string(), "Support".to_string()],
            provider: "deepseek".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(verdict.classification, "Billing");
    assert!((verdict.confidence - 0.83).abs() < 1e-9);
    assert_eq!(verdict.explanation, "mentions an invoice");
    assert_eq!(verdict.llm_provider, "deepseek");
    assert_eq!(verdict.llm_model, "deepseek-chat");
}

#[tokio::test]
async fn test_classifier_rejects_unregistered_provider() {
    let backend = OpenAIBackend::new(OpenAIConfig::default()).expect("backend");
    let classifier = LlmClassifier::new().with_backend("deepseek", Arc::new(backend));

    let err = classifier
        .classify(&ClassificationRequest {
            content: "x".to_string(),
            content_kind: ContentKind::Text,
            group_name: "G".to_string(),
            categories: vec!["A".to_string()],
            provider: "qwen".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidProvider(_)));
}
