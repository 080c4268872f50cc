use serde_json::json;
use tocal::error::AppError;
use tocal::recognition::{OllamaConfig, OllamaHttpClient, RecognitionClient};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(base_url: String) -> OllamaHttpClient {
    OllamaHttpClient::new(OllamaConfig {
        base_url,
        model: "llava".to_string(),
    })
    .expect("Failed to create Ollama client")
}

async fn server_with_tags(body: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_ready_when_model_is_installed() {
    let server = server_with_tags(json!({
        "models": [{ "name": "mistral:7b" }, { "name": "llava:latest", "size": 4733363377u64 }]
    }))
    .await;

    let result = client_for(server.uri()).check_ready().await;
    assert!(result.is_ok(), "expected ready, got {:?}", result);
}

#[tokio::test]
async fn test_ready_accepts_bare_model_names() {
    let server = server_with_tags(json!({ "models": ["LLaVA:13b"] })).await;
    assert!(client_for(server.uri()).check_ready().await.is_ok());
}

#[tokio::test]
async fn test_model_missing() {
    let server = server_with_tags(json!({ "models": [{ "name": "mistral:7b" }] })).await;

    match client_for(server.uri()).check_ready().await {
        Err(AppError::ModelMissing(msg)) => assert!(msg.contains("ollama pull llava")),
        other => panic!("expected ModelMissing, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_tags_body_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_string("definitely not json"))
        .mount(&server)
        .await;

    assert!(matches!(
        client_for(server.uri()).check_ready().await,
        Err(AppError::ServiceUnavailable(_))
    ));
}

#[tokio::test]
async fn test_unreachable_server_is_unavailable() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("local addr").port()
    };

    match client_for(format!("http://127.0.0.1:{}", port)).check_ready().await {
        Err(AppError::ServiceUnavailable(msg)) => assert!(msg.contains("ollama serve")),
        other => panic!("expected ServiceUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_recognize_returns_text_and_suggestions() {
    let reply = r#"[{"course":"CSE 143","title":"Data Structures","days":"MWF","time":"10:30-11:20","location":"KNE 120"},{"course":"MATH 126"}]"#;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "llava",
            "stream": false,
            "images": ["AQID"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llava",
            "response": reply,
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(server.uri())
        .recognize(&[1, 2, 3])
        .await
        .expect("recognition should succeed");

    assert_eq!(result.text, reply);
    assert!(result.structured.is_empty());
    assert_eq!(result.suggestions.len(), 2);
    assert_eq!(result.suggestions[0].days.as_deref(), Some("MWF"));
    assert_eq!(result.suggestions[1].course.as_deref(), Some("MATH 126"));
    assert_eq!(result.suggestions[1].title, None);
}

#[tokio::test]
async fn test_recognize_keeps_text_when_reply_is_not_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "The image shows a weekly class schedule."
        })))
        .mount(&server)
        .await;

    let result = client_for(server.uri())
        .recognize(&[7])
        .await
        .expect("recognition should succeed");

    assert_eq!(result.text, "The image shows a weekly class schedule.");
    assert!(result.suggestions.is_empty());
    assert!(result.structured.is_empty());
}

#[tokio::test]
async fn test_recognize_server_error_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .mount(&server)
        .await;

    match client_for(server.uri()).recognize(&[7]).await {
        Err(AppError::RecognitionFailed(msg)) => assert!(msg.contains("model crashed")),
        other => panic!("expected RecognitionFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_recognize_bad_envelope_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "unexpected" })))
        .mount(&server)
        .await;

    assert!(matches!(
        client_for(server.uri()).recognize(&[7]).await,
        Err(AppError::RecognitionFailed(_))
    ));
}
