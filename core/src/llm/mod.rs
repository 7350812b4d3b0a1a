//! LLM module: provider adapters, streaming normalization, and the service facade
//!
//! This module provides:
//! - `LlmService` for unary and streamed generations with soft failures
//! - `ProviderAdapter` over the OpenAI-compatible and local-daemon backends
//! - `ResponseAccumulator` and `LineBuffer` for incremental body consumption
//! - `GenerationRequest` / `ResponseChunk` value types

mod accumulator;
mod error;
mod line_buffer;
mod local_daemon;
mod openai;
mod provider;
mod service;
mod stream;
mod types;

pub use accumulator::ResponseAccumulator;
pub use error::{ErrorKind, LlmError, LlmResult};
pub use line_buffer::LineBuffer;
pub use local_daemon::{LocalDaemonAdapter, NdjsonFrameDecoder};
pub use openai::{OpenAiAdapter, SseFrameDecoder};
pub use provider::{ChatPayload, ProviderAdapter};
pub use service::LlmService;
pub use stream::{relay_body, ChunkStream, Frame, FrameDecoder};
pub use types::{ChatMessage, GenerationRequest, ModelInfo, ResponseChunk};
