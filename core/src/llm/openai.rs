use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::accumulator::ResponseAccumulator;
use super::error::{LlmError, LlmResult};
use super::provider::ChatPayload;
use super::stream::{relay_body, ChunkStream, Frame, FrameDecoder};
use super::types::{ChatMessage, ResponseChunk};

/// OpenAI-compatible `/chat/completions` backend
#[derive(Clone)]
pub struct OpenAiAdapter {
    http: Client,
    base_url: String,
    api_key: String,
    unary_timeout: Option<Duration>,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<AssistantMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiAdapter {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            unary_timeout: None,
        }
    }

    /// Whole-request deadline for non-streaming calls. Streams are bounded only
    /// by the client's connect and read timeouts.
    pub fn with_unary_timeout(mut self, timeout: Duration) -> Self {
        self.unary_timeout = Some(timeout);
        self
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn send(&self, payload: &ChatPayload, stream: bool) -> reqwest::Result<reqwest::Response> {
        let url = self.url();
        debug!(target = "llm_client", stream, "POST {} via Chat Completions", url);
        let body = ChatCompletionRequest {
            model: &payload.model,
            messages: &payload.messages,
            max_tokens: payload.max_tokens,
            temperature: payload.temperature,
            stream,
        };
        let mut builder = self.http.post(&url);
        if let Some(timeout) = self.unary_timeout.filter(|_| !stream) {
            builder = builder.timeout(timeout);
        }
        builder
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
    }

    pub async fn complete(&self, payload: &ChatPayload) -> LlmResult<ResponseChunk> {
        let resp = self
            .send(payload, false)
            .await
            .map_err(|e| LlmError::GenerationFailed(format!("Chat Completions HTTP error: {e}")))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            error!(target = "llm_client", %status, body = %text, "Chat Completions error");
            return Err(LlmError::GenerationFailed(format!(
                "Chat Completions error: status={} body={}",
                status, text
            )));
        }

        let parsed: ChatCompletionResponse = resp.json().await.map_err(|e| {
            LlmError::GenerationFailed(format!("Failed to parse Chat Completions JSON: {e}"))
        })?;
        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            LlmError::GenerationFailed("Missing choices[0] in chat completions".into())
        })?;

        Ok(ResponseChunk {
            content: choice.message.and_then(|m| m.content).unwrap_or_default(),
            delta: None,
            is_final: true,
            finish_reason: choice.finish_reason,
            error: None,
            tokens_used: Some(parsed.usage.map(|u| u.total_tokens).unwrap_or(0)),
            model: Some(parsed.model.unwrap_or_else(|| payload.model.clone())),
        })
    }

    pub async fn stream(&self, payload: &ChatPayload) -> LlmResult<ChunkStream> {
        let resp = self.send(payload, true).await.map_err(|e| {
            LlmError::StreamGenerationFailed(format!("Chat Completions HTTP error: {e}"))
        })?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            error!(target = "llm_client", %status, body = %text, "Chat Completions stream error");
            return Err(LlmError::StreamGenerationFailed(format!(
                "Chat Completions error: status={} body={}",
                status, text
            )));
        }
        Ok(relay_body(
            resp.bytes_stream(),
            SseFrameDecoder,
            ResponseAccumulator::new(payload.model.clone()),
        ))
    }
}

/// `data: {json}` lines terminated by `data: [DONE]`
#[derive(Debug, Default)]
pub struct SseFrameDecoder;

impl FrameDecoder for SseFrameDecoder {
    fn decode(&mut self, line: &str) -> Option<Frame> {
        let data = line.strip_prefix("data: ")?;
        if data.trim() == "[DONE]" {
            return Some(Frame::finished("stop"));
        }
        let chunk: ChatCompletionChunk = serde_json::from_str(data).ok()?;
        let (delta, finish_reason) = match chunk.choices.into_iter().next() {
            Some(choice) => (
                choice.delta.and_then(|d| d.content),
                choice.finish_reason.filter(|r| !r.is_empty()),
            ),
            None => (None, None),
        };
        Some(Frame {
            delta,
            finish_reason,
            model: chunk.model,
            tokens_used: chunk.usage.map(|u| u.total_tokens),
        })
    }
}
