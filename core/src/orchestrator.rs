//! Dispatch seam between the gRPC relay and the LLM service.
//!
//! The relay only knows `ChatBackend`. An `Err` from either method is an
//! unexpected fault of the dispatch itself; generation failures are reported
//! in-band as error chunks and never come back as `Err`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::llm::{ChunkStream, GenerationRequest, LlmService, ResponseChunk};
use crate::prompt::PromptTemplates;
use crate::Result;

/// One inbound chat message, stripped of transport details
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatTurn {
    pub session_id: String,
    pub user_id: String,
    pub content: String,
}

impl ChatTurn {
    pub fn new(
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Single final answer for one turn
    async fn process_message(&self, turn: &ChatTurn) -> Result<ResponseChunk>;

    /// Chunked answer for one turn, ending in exactly one final chunk
    async fn process_stream(&self, turn: &ChatTurn) -> Result<ChunkStream>;
}

/// Applies the prompt templates and forwards to `LlmService`
#[derive(Clone)]
pub struct Orchestrator {
    llm: Arc<LlmService>,
    prompts: PromptTemplates,
}

impl Orchestrator {
    pub fn new(llm: Arc<LlmService>) -> Self {
        Self::with_prompts(llm, PromptTemplates::default())
    }

    pub fn with_prompts(llm: Arc<LlmService>, prompts: PromptTemplates) -> Self {
        Self { llm, prompts }
    }

    pub fn llm(&self) -> &LlmService {
        &self.llm
    }

    fn build_request(&self, turn: &ChatTurn) -> GenerationRequest {
        GenerationRequest::new(self.prompts.build_chat_prompt(&turn.content))
            .with_system_prompt(self.prompts.build_system_prompt())
    }
}

#[async_trait]
impl ChatBackend for Orchestrator {
    async fn process_message(&self, turn: &ChatTurn) -> Result<ResponseChunk> {
        info!(
            session_id = %turn.session_id,
            user_id = %turn.user_id,
            content_length = turn.content.len(),
            "Processing message"
        );
        Ok(self.llm.generate_response(&self.build_request(turn)).await)
    }

    async fn process_stream(&self, turn: &ChatTurn) -> Result<ChunkStream> {
        info!(
            session_id = %turn.session_id,
            user_id = %turn.user_id,
            "Processing stream"
        );
        Ok(self.llm.generate_stream(self.build_request(turn)))
    }
}
