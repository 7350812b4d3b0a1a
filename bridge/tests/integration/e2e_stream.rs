use std::collections::HashSet;

use super::*;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tokio_stream::wrappers::ReceiverStream;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer};

async fn mock_stream(provider: &MockServer, lines: &[&str]) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(sse(lines))
        .mount(provider)
        .await;
}

#[tokio::test]
async fn e2e_process_stream_relays_chunks() {
    let provider = MockServer::start().await;
    mock_stream(
        &provider,
        &[
            r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#,
            r#"data: {"choices":[{"delta":{"content":"lo"}}]}"#,
            "data: [DONE]",
        ],
    )
    .await;

    let (addr, _server) = start_test_server(openai_service(&provider.uri(), Some("sk-test"))).await;
    let mut client = new_client(addr).await;

    let outbound = tokio_stream::iter(vec![stream_chat("s-stream", "Hi")]);
    let mut inbound = client
        .process_stream(outbound)
        .await
        .expect("open stream")
        .into_inner();

    let mut chats = Vec::new();
    while let Some(msg) = inbound.message().await.expect("stream message") {
        assert_eq!(msg.session_id, "s-stream");
        chats.push(chat_of(msg));
    }

    let contents: Vec<_> = chats.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(contents, ["Hel", "Hello", "Hello"]);
    assert!(chats.iter().all(|c| c.status == TaskStatus::InProgress as i32));
    assert_eq!(chats.iter().filter(|c| c.is_final).count(), 1);
    assert!(chats.last().unwrap().is_final);

    let ids: HashSet<_> = chats.iter().map(|c| c.message_id.as_str()).collect();
    assert_eq!(ids.len(), chats.len());
}

#[tokio::test]
async fn e2e_process_stream_handles_successive_chats() {
    let provider = MockServer::start().await;
    mock_stream(
        &provider,
        &[
            r#"data: {"choices":[{"delta":{"content":"ok"},"finish_reason":"stop"}]}"#,
        ],
    )
    .await;

    let (addr, _server) = start_test_server(openai_service(&provider.uri(), Some("sk-test"))).await;
    let mut client = new_client(addr).await;

    let (tx, rx) = mpsc::channel(4);
    let mut inbound = client
        .process_stream(ReceiverStream::new(rx))
        .await
        .expect("open stream")
        .into_inner();

    for turn in ["first", "second"] {
        tx.send(stream_chat("s-multi", turn)).await.unwrap();
        loop {
            let msg = timeout(Duration::from_secs(5), inbound.message())
                .await
                .expect("response in time")
                .expect("stream message")
                .expect("stream still open");
            if chat_of(msg).is_final {
                break;
            }
        }
    }

    drop(tx);
    let end = timeout(Duration::from_secs(5), inbound.message())
        .await
        .expect("stream closes in time")
        .expect("clean close");
    assert!(end.is_none());
}

#[tokio::test]
async fn e2e_process_stream_without_credentials_is_failed() {
    let (addr, _server) = start_test_server(openai_service("http://127.0.0.1:1", None)).await;
    let mut client = new_client(addr).await;

    let mut inbound = client
        .process_stream(tokio_stream::iter(vec![stream_chat("s-none", "Hi")]))
        .await
        .expect("open stream")
        .into_inner();

    let msg = inbound.message().await.unwrap().expect("one response");
    let chat = chat_of(msg);
    assert_eq!(chat.status, TaskStatus::Failed as i32);
    assert!(chat.is_final);
    assert_eq!(chat.content, "Error: LLM service not properly configured");
    assert!(inbound.message().await.unwrap().is_none());
}
