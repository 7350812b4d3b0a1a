//! Per-connection loop behind `ProcessStream`.
//!
//! One inbound message is dispatched and its chunks fully drained before the
//! next inbound message is read, so responses to different chats on the same
//! stream never interleave.

use std::sync::Arc;

use neuron_core::{ChatBackend, ChatTurn};
use neuron_proto::{stream_request, ChatRequest, StreamRequest, StreamResponse};
use tokio::sync::mpsc;
use tokio_stream::{Stream, StreamExt};
use tonic::Status;
use tracing::{debug, error, info, warn};

use crate::response::{chunk_response, effective_message_type, fault_response, stream_response};

pub type Outbound = mpsc::Sender<std::result::Result<StreamResponse, Status>>;

/// Identity of one bidirectional stream, fixed by its first message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStreamContext {
    pub session_id: String,
    pub user_id: String,
}

/// Drive one client stream until it ends, errors, or the client goes away
pub async fn relay_session<S>(backend: Arc<dyn ChatBackend>, inbound: S, tx: Outbound)
where
    S: Stream<Item = std::result::Result<StreamRequest, Status>> + Send,
{
    let mut inbound = Box::pin(inbound);
    let mut ctx: Option<SessionStreamContext> = None;

    loop {
        let next = tokio::select! {
            biased;
            _ = tx.closed() => {
                info!("ProcessStream client went away");
                break;
            }
            next = inbound.next() => next,
        };
        let req = match next {
            Some(Ok(req)) => req,
            Some(Err(status)) => {
                warn!(code = ?status.code(), message = %status.message(), "ProcessStream inbound error");
                break;
            }
            None => break,
        };

        let ctx = ctx.get_or_insert_with(|| SessionStreamContext {
            session_id: req.session_id.clone(),
            user_id: req.user_id.clone(),
        });
        info!(
            session_id = %req.session_id,
            user_id = %req.user_id,
            "Processing stream request"
        );

        let chat = match req.payload {
            Some(stream_request::Payload::Chat(chat)) => chat,
            None => {
                debug!(session_id = %ctx.session_id, "Stream request without chat payload ignored");
                continue;
            }
        };
        let session_id = if req.session_id.is_empty() {
            chat.session_id.clone()
        } else {
            req.session_id
        };

        if !relay_chat(backend.as_ref(), &session_id, chat, &tx).await {
            break;
        }
    }

    match &ctx {
        Some(ctx) => info!(session_id = %ctx.session_id, user_id = %ctx.user_id, "ProcessStream inbound ended"),
        None => info!("ProcessStream ended before any request"),
    }
}

/// Relay one chat. Returns `false` once the client can no longer receive.
async fn relay_chat(
    backend: &dyn ChatBackend,
    session_id: &str,
    chat: ChatRequest,
    tx: &Outbound,
) -> bool {
    let message_type = effective_message_type(chat.message_type);
    let turn = ChatTurn::new(
        if chat.session_id.is_empty() { session_id.to_string() } else { chat.session_id },
        chat.user_id,
        chat.content,
    );

    let mut chunks = match backend.process_stream(&turn).await {
        Ok(chunks) => chunks,
        Err(e) => {
            error!(session_id = %session_id, error = %e, "Error in stream processing");
            let msg = fault_response(session_id, message_type, &e.to_string());
            return tx.send(Ok(stream_response(session_id, msg))).await.is_ok();
        }
    };

    loop {
        // Dropping `chunks` on disconnect releases the provider connection
        let next = tokio::select! {
            biased;
            _ = tx.closed() => return false,
            next = chunks.next() => next,
        };
        let chunk = match next {
            Some(chunk) => chunk,
            None => {
                warn!(session_id = %session_id, "Generation ended without a final chunk");
                let msg = fault_response(session_id, message_type, "generation ended unexpectedly");
                return tx.send(Ok(stream_response(session_id, msg))).await.is_ok();
            }
        };
        let is_final = chunk.is_final;
        let msg = chunk_response(session_id, chunk, message_type);
        if tx.send(Ok(stream_response(session_id, msg))).await.is_err() {
            return false;
        }
        if is_final {
            return true;
        }
    }
}
