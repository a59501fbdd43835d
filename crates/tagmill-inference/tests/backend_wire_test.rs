//! Integration tests for backend wire formats.
//!
//! These verify against a mock HTTP server that each backend sends the
//! request shape its provider expects (paths, auth headers, body fields)
//! and maps response shapes and failures to the right error variants.

use tagmill_core::{ChatBackend, Error};
use tagmill_inference::{
    AzureBackend, AzureConfig, OllamaBackend, OllamaConfig, OpenAIBackend, OpenAIConfig,
};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_completion_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-123",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": content
            },
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": 10,
            "completion_tokens": 5,
            "total_tokens": 15
        }
    })
}

// ==========================================================================
// OpenAI-compatible backend
// ==========================================================================

#[tokio::test]
async fn test_openai_sends_bearer_auth_and_messages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(header("Content-Type", "application/json"))
        .and(body_partial_json(serde_json::json!({
            "model": "test-gen",
            "messages": [
                {"role": "system", "content": "Extract metadata."},
                {"role": "user", "content": "Document text"}
            ],
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion_body("{}")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = OpenAIConfig {
        base_url: mock_server.uri(),
        api_key: Some("test-key".to_string()),
        model: "test-gen".to_string(),
        ..Default::default()
    };
    let backend = OpenAIBackend::new(config).expect("Failed to create backend");

    let outcome = backend
        .send_chat("Extract metadata.", "Document text")
        .await
        .expect("Request should succeed");
    assert_eq!(outcome.text, "{}");
    assert_eq!(outcome.usage.total_tokens, 15);
}

#[tokio::test]
async fn test_openai_no_auth_header_without_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion_body("ok")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = OpenAIConfig {
        base_url: mock_server.uri(),
        api_key: None,
        model: "local".to_string(),
        ..Default::default()
    };
    let backend = OpenAIBackend::new(config).expect("Failed to create backend");

    let outcome = backend.send_chat("", "prompt").await.unwrap();
    assert_eq!(outcome.text, "ok");

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("Authorization").is_none());
}

#[tokio::test]
async fn test_openai_http_error_maps_to_request_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": {"message": "Rate limit exceeded", "type": "rate_limit_error"}
        })))
        .mount(&mock_server)
        .await;

    let config = OpenAIConfig {
        base_url: mock_server.uri(),
        model: "test-gen".to_string(),
        ..Default::default()
    };
    let backend = OpenAIBackend::new(config).unwrap();

    let err = backend.send_chat("", "prompt").await.unwrap_err();
    match err {
        Error::Request(msg) => assert!(msg.contains("Rate limit exceeded")),
        other => panic!("Expected Request error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_openai_empty_choices_is_invalid_shape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "chatcmpl-123",
            "choices": []
        })))
        .mount(&mock_server)
        .await;

    let config = OpenAIConfig {
        base_url: mock_server.uri(),
        model: "test-gen".to_string(),
        ..Default::default()
    };
    let backend = OpenAIBackend::new(config).unwrap();

    let err = backend.send_chat("", "prompt").await.unwrap_err();
    assert!(matches!(err, Error::InvalidResponseShape(_)));
}

#[tokio::test]
async fn test_openai_unreachable_host_is_backend_unavailable() {
    // Nothing listens on this port
    let config = OpenAIConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        model: "test-gen".to_string(),
        timeout_seconds: 2,
        ..Default::default()
    };
    let backend = OpenAIBackend::new(config).unwrap();

    let err = backend.send_chat("", "prompt").await.unwrap_err();
    assert!(matches!(err, Error::BackendUnavailable(_)));
}

// ==========================================================================
// Azure OpenAI backend
// ==========================================================================

#[tokio::test]
async fn test_azure_deployment_url_and_api_key_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/deployments/tags-gpt4o/chat/completions"))
        .and(query_param("api-version", "2024-08-01-preview"))
        .and(header("api-key", "azure-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion_body("azure ok")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = AzureConfig {
        endpoint: mock_server.uri(),
        api_key: "azure-secret".to_string(),
        deployment: "tags-gpt4o".to_string(),
        api_version: "2024-08-01-preview".to_string(),
        ..Default::default()
    };
    let backend = AzureBackend::new(config).expect("Failed to create backend");

    let outcome = backend.send_chat("sys", "user").await.unwrap();
    assert_eq!(outcome.text, "azure ok");
}

#[tokio::test]
async fn test_azure_auth_failure_maps_to_request_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": {"message": "Access denied due to invalid subscription key"}
        })))
        .mount(&mock_server)
        .await;

    let config = AzureConfig {
        endpoint: mock_server.uri(),
        api_key: "wrong-key".to_string(),
        deployment: "tags-gpt4o".to_string(),
        ..Default::default()
    };
    let backend = AzureBackend::new(config).unwrap();

    let err = backend.send_chat("", "prompt").await.unwrap_err();
    assert!(matches!(err, Error::Request(_)));
}

// ==========================================================================
// Ollama backend
// ==========================================================================

#[tokio::test]
async fn test_ollama_generate_request_shape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(serde_json::json!({
            "model": "llama3.1:8b",
            "system": "Extract metadata.",
            "prompt": "Document text",
            "stream": false,
            "format": "json"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model": "llama3.1:8b",
            "response": "{\"title\": \"Invoice\"}",
            "done": true
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = OllamaConfig {
        base_url: mock_server.uri(),
        model: "llama3.1:8b".to_string(),
        ..Default::default()
    };
    let backend = OllamaBackend::new(config).expect("Failed to create backend");

    let outcome = backend
        .send_chat("Extract metadata.", "Document text")
        .await
        .unwrap();
    assert_eq!(outcome.text, "{\"title\": \"Invoice\"}");
    // The generate endpoint reports no usage
    assert!(outcome.usage.is_empty());
}

#[tokio::test]
async fn test_ollama_missing_response_field_is_invalid_shape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model": "llama3.1:8b",
            "done": true
        })))
        .mount(&mock_server)
        .await;

    let config = OllamaConfig {
        base_url: mock_server.uri(),
        ..Default::default()
    };
    let backend = OllamaBackend::new(config).unwrap();

    let err = backend.send_chat("", "prompt").await.unwrap_err();
    assert!(matches!(err, Error::InvalidResponseShape(_)));
}

#[tokio::test]
async fn test_ollama_model_not_found_is_request_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": "model \"missing:latest\" not found"
        })))
        .mount(&mock_server)
        .await;

    let config = OllamaConfig {
        base_url: mock_server.uri(),
        model: "missing:latest".to_string(),
        ..Default::default()
    };
    let backend = OllamaBackend::new(config).unwrap();

    let err = backend.send_chat("", "prompt").await.unwrap_err();
    assert!(matches!(err, Error::Request(_)));
}
