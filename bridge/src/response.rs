use neuron_core::ResponseChunk;
use neuron_proto::{
    stream_response, AgentType, ChatResponse, MessageType, StreamResponse, TaskStatus,
};
use prost::Message;
use tonic::Status;

/// Fresh server-side timestamp for an outbound message
pub fn now_timestamp() -> prost_types::Timestamp {
    let now = chrono::Utc::now();
    prost_types::Timestamp {
        seconds: now.timestamp(),
        nanos: now.timestamp_subsec_nanos() as i32,
    }
}

pub fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Echo the caller's message type; unknown or unspecified becomes TEXT
pub fn effective_message_type(raw: i32) -> i32 {
    match MessageType::try_from(raw) {
        Ok(MessageType::Unspecified) | Err(_) => MessageType::Text as i32,
        Ok(t) => t as i32,
    }
}

/// One outbound `ChatResponse` stamped with a new id and timestamp
pub fn chat_response(
    session_id: &str,
    content: String,
    message_type: i32,
    status: TaskStatus,
    is_final: bool,
) -> ChatResponse {
    ChatResponse {
        message_id: new_message_id(),
        session_id: session_id.to_string(),
        content,
        message_type,
        agent_type: AgentType::Orchestrator as i32,
        status: status as i32,
        timestamp: Some(now_timestamp()),
        is_final,
    }
}

/// Streamed chunk → outbound message. Soft-error chunks are reported FAILED.
pub fn chunk_response(session_id: &str, chunk: ResponseChunk, message_type: i32) -> ChatResponse {
    let status = if chunk.is_error() {
        TaskStatus::Failed
    } else {
        TaskStatus::InProgress
    };
    chat_response(session_id, chunk.content, message_type, status, chunk.is_final)
}

/// Terminal FAILED message for a dispatch fault
pub fn fault_response(session_id: &str, message_type: i32, detail: &str) -> ChatResponse {
    chat_response(
        session_id,
        format!("Error: {detail}"),
        message_type,
        TaskStatus::Failed,
        true,
    )
}

pub fn stream_response(session_id: &str, chat: ChatResponse) -> StreamResponse {
    StreamResponse {
        session_id: session_id.to_string(),
        payload: Some(stream_response::Payload::Chat(chat)),
    }
}

/// `INTERNAL` status carrying the FAILED `ChatResponse` in its details
pub fn internal_status(detail: &str, response: &ChatResponse) -> Status {
    Status::with_details(
        tonic::Code::Internal,
        detail.to_string(),
        bytes::Bytes::from(response.encode_to_vec()),
    )
}

/// Recover the FAILED `ChatResponse` a `ProcessChat` fault carries
pub fn failed_response_from_status(status: &Status) -> Option<ChatResponse> {
    if status.details().is_empty() {
        return None;
    }
    ChatResponse::decode(status.details()).ok()
}
