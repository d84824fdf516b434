use std::time::Duration;

use docchat::BackendMode;
use docchat::api::{BackendError, ChatBackend, ChatRequest, HttpBackend, UploadFile};
use docchat::core::format::TextFormatter;
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, body_string_contains, method, path},
};

// ============================================================================
// Helper Functions
// ============================================================================

fn backend(server: &MockServer, mode: BackendMode) -> HttpBackend {
    HttpBackend::new(&server.uri(), mode, Duration::from_secs(5)).unwrap()
}

fn request<'a>(text: &'a str) -> ChatRequest<'a> {
    ChatRequest {
        session_id: "session-1",
        text,
    }
}

fn pdf_file() -> UploadFile {
    UploadFile {
        file_name: "paper.pdf".to_string(),
        mime_type: "application/pdf".to_string(),
        bytes: b"%PDF-1.7 body".to_vec(),
    }
}

// ============================================================================
// Questions
// ============================================================================

#[tokio::test]
async fn test_query_mode_posts_query_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_json(json!({ "query": "What is the deadline?" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "response": "**Friday**" })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let answer = backend(&mock_server, BackendMode::Query)
        .send(request("What is the deadline?"))
        .await
        .unwrap();

    assert_eq!(answer, "**Friday**");
    assert_eq!(
        TextFormatter::default().format(&answer),
        "<strong>Friday</strong>"
    );
}

#[tokio::test]
async fn test_chat_mode_sends_session_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({ "message": "hi", "session_id": "session-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "hello" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let answer = backend(&mock_server, BackendMode::Chat)
        .send(request("hi"))
        .await
        .unwrap();
    assert_eq!(answer, "hello");
}

#[tokio::test]
async fn test_api_error_uses_detail_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({ "detail": "index not ready" })),
        )
        .mount(&mock_server)
        .await;

    let result = backend(&mock_server, BackendMode::Query)
        .send(request("q"))
        .await;

    match result {
        Err(BackendError::Api { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "index not ready");
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_api_error_falls_back_to_raw_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&mock_server)
        .await;

    let result = backend(&mock_server, BackendMode::Query)
        .send(request("q"))
        .await;

    assert!(matches!(
        result,
        Err(BackendError::Api { status: 401, ref message }) if message == "Unauthorized"
    ));
}

#[tokio::test]
async fn test_malformed_answer_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let result = backend(&mock_server, BackendMode::Query)
        .send(request("q"))
        .await;

    assert!(matches!(result, Err(BackendError::Parse(_))));
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    // Nothing listens on the discard port.
    let backend = HttpBackend::new(
        "http://127.0.0.1:9",
        BackendMode::Query,
        Duration::from_secs(2),
    )
    .unwrap();

    let result = backend.send(request("q")).await;
    assert!(matches!(result, Err(BackendError::Network(_))));
}

// ============================================================================
// Uploads
// ============================================================================

#[tokio::test]
async fn test_upload_sends_multipart_file() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"paper.pdf\""))
        .and(body_string_contains("%PDF-1.7 body"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "message": "paper.pdf indexed", "filename": "paper.pdf" })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let message = backend(&mock_server, BackendMode::Query)
        .upload(pdf_file())
        .await
        .unwrap();
    assert_eq!(message, "paper.pdf indexed");
}

#[tokio::test]
async fn test_upload_without_message_reports_file_name() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    let message = backend(&mock_server, BackendMode::Query)
        .upload(pdf_file())
        .await
        .unwrap();
    assert_eq!(message, "paper.pdf uploaded");
}

#[tokio::test]
async fn test_upload_rejected_by_backend() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(
            ResponseTemplate::new(413).set_body_json(json!({ "error": "file too large" })),
        )
        .mount(&mock_server)
        .await;

    let result = backend(&mock_server, BackendMode::Query)
        .upload(pdf_file())
        .await;

    assert!(matches!(
        result,
        Err(BackendError::Api { status: 413, ref message }) if message == "file too large"
    ));
}
