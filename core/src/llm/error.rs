use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire name of a generation failure, carried in `ResponseChunk::error`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ClientNotInitialized,
    GenerationFailed,
    StreamGenerationFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ClientNotInitialized => "client_not_initialized",
            ErrorKind::GenerationFailed => "generation_failed",
            ErrorKind::StreamGenerationFailed => "stream_generation_failed",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generation failures. None of these escape `LlmService`'s soft API; they are
/// folded into a terminal error chunk instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Credentialed provider without an API key. Permanent for the service's lifetime.
    #[error("LLM service not properly configured")]
    ClientNotConfigured,

    /// Unary provider call failed: transport, non-2xx status or malformed body
    #[error("{0}")]
    GenerationFailed(String),

    /// Streaming provider call failed before or after the first chunk
    #[error("{0}")]
    StreamGenerationFailed(String),
}

impl LlmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LlmError::ClientNotConfigured => ErrorKind::ClientNotInitialized,
            LlmError::GenerationFailed(_) => ErrorKind::GenerationFailed,
            LlmError::StreamGenerationFailed(_) => ErrorKind::StreamGenerationFailed,
        }
    }

    /// Human-readable text shown to the end user
    pub fn user_message(&self) -> String {
        format!("Error: {self}")
    }
}

pub type LlmResult<T> = std::result::Result<T, LlmError>;
