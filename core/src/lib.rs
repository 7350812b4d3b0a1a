// NeuronAI Core Library
// LLM provider adapters, streaming normalization and chat orchestration

pub mod config;
pub mod llm;
pub mod orchestrator;
pub mod prompt;
pub mod telemetry;

// Export core types
pub use config::{ProviderConfig, ProviderKind, ServerConfig};
pub use llm::{
    ChunkStream, ErrorKind, GenerationRequest, LlmError, LlmService, ModelInfo, ResponseChunk,
};
pub use orchestrator::{ChatBackend, ChatTurn, Orchestrator};
pub use prompt::PromptTemplates;

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NeuronError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Dispatch error: {0}")]
    Dispatch(String),
}
pub type Result<T> = std::result::Result<T, NeuronError>;
