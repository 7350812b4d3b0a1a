//! End-to-end tests: real tonic server, real orchestrator, mocked LLM provider

use std::net::SocketAddr;
use std::sync::Arc;

use neuron_bridge::{RelayService, RelayState};
use neuron_core::{LlmService, Orchestrator, ProviderConfig, ProviderKind};
use neuron_proto::ai_service_server::AiServiceServer;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use wiremock::ResponseTemplate;

pub use neuron_proto::{
    ai_service_client::AiServiceClient, stream_request, stream_response, ChatRequest,
    ChatResponse, MessageType, StreamRequest, StreamResponse, TaskStatus,
};

/// OpenAI-compatible service pointed at `base_url`
pub fn openai_service(base_url: &str, api_key: Option<&str>) -> LlmService {
    LlmService::new(ProviderConfig {
        provider: ProviderKind::OpenAi,
        base_url: base_url.to_string(),
        api_key: api_key.map(str::to_string),
        default_model: "gpt-4".to_string(),
        default_max_tokens: 256,
        default_temperature: 0.5,
        request_timeout_ms: 5_000,
    })
    .expect("build llm service")
}

/// Start an AIService gRPC server on an ephemeral localhost port and return the bound address
pub async fn start_test_server(llm: LlmService) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let orchestrator = Arc::new(Orchestrator::new(Arc::new(llm)));
    let svc = RelayService::new(RelayState::new(orchestrator));

    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().unwrap();
    let incoming = TcpListenerStream::new(listener);

    let handle = tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(AiServiceServer::new(svc))
            .serve_with_incoming(incoming)
            .await
            .expect("server exited cleanly");
    });

    (addr, handle)
}

pub async fn new_client(addr: SocketAddr) -> AiServiceClient<tonic::transport::Channel> {
    AiServiceClient::connect(format!("http://{}", addr))
        .await
        .expect("connect client")
}

pub fn chat_request(session_id: &str, content: &str) -> ChatRequest {
    ChatRequest {
        session_id: session_id.to_string(),
        user_id: "user-1".to_string(),
        content: content.to_string(),
        message_type: MessageType::Text as i32,
        metadata: Default::default(),
    }
}

pub fn stream_chat(session_id: &str, content: &str) -> StreamRequest {
    StreamRequest {
        session_id: session_id.to_string(),
        user_id: "user-1".to_string(),
        payload: Some(stream_request::Payload::Chat(chat_request(session_id, content))),
    }
}

pub fn chat_of(msg: StreamResponse) -> ChatResponse {
    match msg.payload {
        Some(stream_response::Payload::Chat(chat)) => chat,
        None => panic!("response without chat payload"),
    }
}

pub fn sse(lines: &[&str]) -> ResponseTemplate {
    let body: String = lines.iter().map(|l| format!("{l}\n\n")).collect();
    ResponseTemplate::new(200).set_body_raw(body, "text/event-stream")
}

mod e2e_chat;
mod e2e_stream;
