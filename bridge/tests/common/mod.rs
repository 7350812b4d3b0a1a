//! Scripted `ChatBackend` doubles shared by the bridge tests

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use neuron_core::{ChatBackend, ChatTurn, ChunkStream, NeuronError, ResponseChunk};

/// How a scripted turn answers
#[derive(Clone)]
pub enum Script {
    /// Chunks with running content; the last one is final
    Deltas(Vec<&'static str>),
    /// Deltas followed by a soft-error chunk
    SoftError(Vec<&'static str>),
    /// Chunks that never reach a final one
    Truncated(Vec<&'static str>),
    /// Dispatch fault
    Fault(&'static str),
}

pub struct ScriptedBackend {
    script: Box<dyn Fn(&ChatTurn) -> Script + Send + Sync>,
    pub seen: Mutex<Vec<ChatTurn>>,
}

impl ScriptedBackend {
    pub fn new(script: impl Fn(&ChatTurn) -> Script + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn always(script: Script) -> Self {
        Self::new(move |_| script.clone())
    }
}

pub fn running_chunks(deltas: &[&str]) -> Vec<ResponseChunk> {
    let mut content = String::new();
    deltas
        .iter()
        .map(|d| {
            content.push_str(d);
            ResponseChunk {
                content: content.clone(),
                delta: Some(d.to_string()),
                ..Default::default()
            }
        })
        .collect()
}

pub fn final_chunk(content: &str) -> ResponseChunk {
    ResponseChunk {
        content: content.to_string(),
        is_final: true,
        finish_reason: Some("stop".to_string()),
        ..Default::default()
    }
}

fn soft_error(partial: &str) -> ResponseChunk {
    ResponseChunk::from_error(
        &neuron_core::LlmError::StreamGenerationFailed("upstream reset".to_string()),
        partial,
    )
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn process_message(&self, turn: &ChatTurn) -> neuron_core::Result<ResponseChunk> {
        self.seen.lock().unwrap().push(turn.clone());
        match (self.script)(turn) {
            Script::Deltas(d) | Script::Truncated(d) => Ok(final_chunk(&d.concat())),
            Script::SoftError(_) => Ok(ResponseChunk::from_error(
                &neuron_core::LlmError::GenerationFailed("rate limited".to_string()),
                "",
            )),
            Script::Fault(msg) => Err(NeuronError::Dispatch(msg.to_string())),
        }
    }

    async fn process_stream(&self, turn: &ChatTurn) -> neuron_core::Result<ChunkStream> {
        self.seen.lock().unwrap().push(turn.clone());
        let chunks = match (self.script)(turn) {
            Script::Deltas(d) => {
                let mut chunks = running_chunks(&d);
                chunks.push(final_chunk(&d.concat()));
                chunks
            }
            Script::SoftError(d) => {
                let mut chunks = running_chunks(&d);
                chunks.push(soft_error(&d.concat()));
                chunks
            }
            Script::Truncated(d) => running_chunks(&d),
            Script::Fault(msg) => return Err(NeuronError::Dispatch(msg.to_string())),
        };
        Ok(stream::iter(chunks).boxed())
    }
}

