//! Incremental consumption of a streamed provider body.
//!
//! Each provider contributes a `FrameDecoder` that understands its line format
//! (SSE `data:` lines, or one JSON object per line). `relay_body` does the rest:
//! line splitting, accumulation, and exactly one terminal chunk.

use std::fmt::Display;

use async_stream::stream;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use tracing::{debug, warn};

use super::accumulator::ResponseAccumulator;
use super::error::LlmError;
use super::line_buffer::LineBuffer;
use super::types::ResponseChunk;

/// Lazy, single-consumer sequence of chunks ending in one `is_final` chunk
pub type ChunkStream = BoxStream<'static, ResponseChunk>;

/// What one wire line contributed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub delta: Option<String>,
    /// Set when the provider signalled the end of generation
    pub finish_reason: Option<String>,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

impl Frame {
    pub fn delta(text: impl Into<String>) -> Self {
        Self {
            delta: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn finished(reason: impl Into<String>) -> Self {
        Self {
            finish_reason: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.finish_reason.is_some()
    }
}

/// Per-provider line parser. Returning `None` skips the line; malformed input
/// must never be an error.
pub trait FrameDecoder: Send {
    fn decode(&mut self, line: &str) -> Option<Frame>;
}

/// Turn a raw body byte stream into normalized chunks.
///
/// Stops reading as soon as a terminal frame is seen; dropping the returned
/// stream drops `body` and with it the underlying connection.
pub fn relay_body<S, B, E, D>(body: S, mut decoder: D, mut acc: ResponseAccumulator) -> ChunkStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
    D: FrameDecoder + 'static,
{
    let chunks = stream! {
        let mut body = Box::pin(body);
        let mut lines = LineBuffer::new();
        loop {
            let (batch, ended) = match body.next().await {
                Some(Ok(bytes)) => (lines.push(bytes.as_ref()), false),
                Some(Err(e)) => {
                    warn!(target = "llm_client", error = %e, "Stream read failed");
                    yield acc.fail(&LlmError::StreamGenerationFailed(e.to_string()));
                    return;
                }
                None => (lines.finish().into_iter().collect::<Vec<_>>(), true),
            };

            for line in batch {
                let frame = match decoder.decode(&line) {
                    Some(frame) => frame,
                    None => {
                        debug!(target = "llm_client", line = %line, "Skipping unparseable stream line");
                        continue;
                    }
                };
                acc.observe_model(frame.model);
                acc.observe_usage(frame.tokens_used);
                if let Some(chunk) = frame.delta.as_deref().and_then(|d| acc.push(d)) {
                    yield chunk;
                }
                if frame.finish_reason.is_some() {
                    debug!(
                        target = "llm_client",
                        finish_reason = ?frame.finish_reason,
                        content_length = acc.content().len(),
                        "Completed streaming LLM response"
                    );
                    yield acc.finish(frame.finish_reason);
                    return;
                }
            }

            if ended {
                warn!(
                    target = "llm_client",
                    content_length = acc.content().len(),
                    "Stream ended without a terminator"
                );
                yield acc.finish(None);
                return;
            }
        }
    };
    chunks.boxed()
}
