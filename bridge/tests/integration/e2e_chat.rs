use super::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer};

#[tokio::test]
async fn e2e_process_chat_completed() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-4",
            "choices": [{"message": {"content": "Rust is a systems language."}, "finish_reason": "stop"}],
            "usage": {"total_tokens": 12}
        })))
        .expect(1)
        .mount(&provider)
        .await;

    let (addr, _server) = start_test_server(openai_service(&provider.uri(), Some("sk-test"))).await;
    let mut client = new_client(addr).await;

    let resp = client
        .process_chat(chat_request("s-e2e", "What is Rust?"))
        .await
        .expect("process_chat")
        .into_inner();

    assert_eq!(resp.content, "Rust is a systems language.");
    assert_eq!(resp.session_id, "s-e2e");
    assert_eq!(resp.status, TaskStatus::Completed as i32);
    assert!(resp.is_final);
}

#[tokio::test]
async fn e2e_process_chat_without_credentials_is_failed() {
    let (addr, _server) = start_test_server(openai_service("http://127.0.0.1:1", None)).await;
    let mut client = new_client(addr).await;

    let resp = client
        .process_chat(chat_request("s-e2e", "Hi"))
        .await
        .expect("soft failures are not gRPC errors")
        .into_inner();

    assert_eq!(resp.status, TaskStatus::Failed as i32);
    assert_eq!(resp.content, "Error: LLM service not properly configured");
    assert!(resp.is_final);
}
