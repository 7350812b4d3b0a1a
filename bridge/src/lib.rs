use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status};
use tracing::{error, info};

use neuron_core::{ChatBackend, ChatTurn};
use neuron_proto::{
    ai_service_server::{AiService, AiServiceServer},
    ChatRequest, ChatResponse, StreamRequest, StreamResponse, TaskStatus,
};

pub mod relay;
pub mod response;

pub use relay::{relay_session, SessionStreamContext};
pub use response::failed_response_from_status;

use response::{chat_response, effective_message_type, fault_response, internal_status};

/// Outbound buffer per `ProcessStream` connection
const STREAM_CHANNEL_CAPACITY: usize = 64;

#[derive(thiserror::Error, Debug)]
pub enum BridgeError {
    #[error("transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Clone)]
pub struct RelayState {
    pub backend: Arc<dyn ChatBackend>,
}

impl RelayState {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }
}

/// `AIService` implementation: unary `ProcessChat` and bidirectional `ProcessStream`
#[derive(Clone)]
pub struct RelayService {
    state: RelayState,
}

impl RelayService {
    pub fn new(state: RelayState) -> Self {
        Self { state }
    }
}

#[tonic::async_trait]
impl AiService for RelayService {
    async fn process_chat(
        &self,
        request: Request<ChatRequest>,
    ) -> std::result::Result<Response<ChatResponse>, Status> {
        let req = request.into_inner();
        info!(session_id = %req.session_id, user_id = %req.user_id, "Processing chat request");

        let message_type = effective_message_type(req.message_type);
        let turn = ChatTurn::new(req.session_id.clone(), req.user_id, req.content);

        match self.state.backend.process_message(&turn).await {
            Ok(chunk) => {
                let status = if chunk.is_error() {
                    TaskStatus::Failed
                } else {
                    TaskStatus::Completed
                };
                Ok(Response::new(chat_response(
                    &req.session_id,
                    chunk.content,
                    message_type,
                    status,
                    true,
                )))
            }
            Err(e) => {
                let detail = e.to_string();
                error!(session_id = %req.session_id, error = %detail, "Error processing chat");
                let failed = fault_response(&req.session_id, message_type, &detail);
                Err(internal_status(&detail, &failed))
            }
        }
    }

    type ProcessStreamStream = std::pin::Pin<
        Box<dyn futures_core::Stream<Item = std::result::Result<StreamResponse, Status>> + Send>,
    >;

    async fn process_stream(
        &self,
        request: Request<tonic::Streaming<StreamRequest>>,
    ) -> std::result::Result<Response<Self::ProcessStreamStream>, Status> {
        let inbound = request.into_inner();
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);

        tokio::spawn(relay_session(Arc::clone(&self.state.backend), inbound, tx));

        let outbound = ReceiverStream::new(rx);
        info!("ProcessStream outbound established");
        Ok(Response::new(Box::pin(outbound) as Self::ProcessStreamStream))
    }
}

/// Serve `AIService` on `addr` until `shutdown` resolves
pub async fn start_server<F>(addr: std::net::SocketAddr, svc: RelayService, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send,
{
    info!(%addr, "Starting NeuronAI gRPC server");
    tonic::transport::Server::builder()
        .add_service(AiServiceServer::new(svc))
        .serve_with_shutdown(addr, shutdown)
        .await
        .map_err(|e| BridgeError::Transport(e.to_string()))
}
