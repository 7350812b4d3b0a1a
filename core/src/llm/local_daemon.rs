use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::accumulator::ResponseAccumulator;
use super::error::{LlmError, LlmResult};
use super::provider::ChatPayload;
use super::stream::{relay_body, ChunkStream, Frame, FrameDecoder};
use super::types::{ChatMessage, ResponseChunk};

/// Local model daemon (Ollama-style `/api/chat`). Needs no credentials and
/// reports no token usage.
#[derive(Clone)]
pub struct LocalDaemonAdapter {
    http: Client,
    base_url: String,
    unary_timeout: Option<Duration>,
}

#[derive(Debug, Serialize)]
struct DaemonChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: DaemonOptions,
}

#[derive(Debug, Serialize)]
struct DaemonOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct DaemonChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    message: Option<DaemonMessage>,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Deserialize)]
struct DaemonMessage {
    #[serde(default)]
    content: String,
}

impl LocalDaemonAdapter {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
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
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }

    async fn send(&self, payload: &ChatPayload, stream: bool) -> reqwest::Result<reqwest::Response> {
        let url = self.url();
        debug!(target = "llm_client", stream, "POST {} via local daemon", url);
        let body = DaemonChatRequest {
            model: &payload.model,
            messages: &payload.messages,
            stream,
            options: DaemonOptions {
                temperature: payload.temperature,
                num_predict: Some(payload.max_tokens).filter(|n| *n > 0),
            },
        };
        let mut builder = self.http.post(&url);
        if let Some(timeout) = self.unary_timeout.filter(|_| !stream) {
            builder = builder.timeout(timeout);
        }
        builder
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
    }

    pub async fn complete(&self, payload: &ChatPayload) -> LlmResult<ResponseChunk> {
        let resp = self
            .send(payload, false)
            .await
            .map_err(|e| LlmError::GenerationFailed(format!("Local daemon HTTP error: {e}")))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            error!(target = "llm_client", %status, body = %text, "Local daemon error");
            return Err(LlmError::GenerationFailed(format!(
                "Local daemon error: status={} body={}",
                status, text
            )));
        }

        let parsed: DaemonChatResponse = resp.json().await.map_err(|e| {
            LlmError::GenerationFailed(format!("Failed to parse local daemon JSON: {e}"))
        })?;
        let message = parsed.message.ok_or_else(|| {
            LlmError::GenerationFailed("Missing message.content in local daemon response".into())
        })?;

        Ok(ResponseChunk {
            content: message.content,
            delta: None,
            is_final: true,
            finish_reason: Some("stop".to_string()),
            error: None,
            tokens_used: Some(0),
            model: Some(parsed.model.unwrap_or_else(|| payload.model.clone())),
        })
    }

    pub async fn stream(&self, payload: &ChatPayload) -> LlmResult<ChunkStream> {
        let resp = self.send(payload, true).await.map_err(|e| {
            LlmError::StreamGenerationFailed(format!("Local daemon HTTP error: {e}"))
        })?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            error!(target = "llm_client", %status, body = %text, "Local daemon stream error");
            return Err(LlmError::StreamGenerationFailed(format!(
                "Local daemon error: status={} body={}",
                status, text
            )));
        }
        let mut acc = ResponseAccumulator::new(payload.model.clone());
        acc.observe_usage(Some(0));
        Ok(relay_body(resp.bytes_stream(), NdjsonFrameDecoder, acc))
    }
}

/// One JSON object per line: `{"message":{"content":"..."},"done":false}`
#[derive(Debug, Default)]
pub struct NdjsonFrameDecoder;

impl FrameDecoder for NdjsonFrameDecoder {
    fn decode(&mut self, line: &str) -> Option<Frame> {
        let parsed: DaemonChatResponse = serde_json::from_str(line.trim()).ok()?;
        Some(Frame {
            delta: parsed.message.map(|m| m.content),
            finish_reason: parsed.done.then(|| "stop".to_string()),
            model: parsed.model,
            tokens_used: None,
        })
    }
}
