use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures::StreamExt;
use reqwest::Client;
use tracing::{error, info, warn};

use crate::config::ProviderConfig;
use crate::{NeuronError, Result};

use super::error::{LlmError, LlmResult};
use super::provider::{ChatPayload, ProviderAdapter};
use super::stream::ChunkStream;
use super::types::{GenerationRequest, ModelInfo, ResponseChunk};

/// Entry point for generations. Built once per process and shared.
///
/// Soft-failure contract: neither `generate_response` nor `generate_stream`
/// ever returns an error; failures arrive as a terminal chunk with `error` set.
#[derive(Clone)]
pub struct LlmService {
    cfg: Arc<ProviderConfig>,
    provider: Option<ProviderAdapter>,
}

impl LlmService {
    pub fn new(cfg: ProviderConfig) -> Result<Self> {
        // No total deadline here; it would also bound streamed bodies.
        // Unary sends add their own per-request deadline.
        let per_op = Duration::from_millis(cfg.request_timeout_ms);
        let http = Client::builder()
            .connect_timeout(per_op)
            .read_timeout(per_op)
            .build()
            .map_err(|e| NeuronError::HttpClient(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(cfg, http))
    }

    /// Use an existing connection pool
    pub fn with_client(cfg: ProviderConfig, http: Client) -> Self {
        let provider = ProviderAdapter::from_config(&cfg, http);
        match &provider {
            Some(p) => info!(provider = p.kind().as_str(), model = %cfg.default_model, "Initialized LLM client"),
            None => warn!(provider = cfg.provider.as_str(), "No valid LLM credentials found"),
        }
        Self {
            cfg: Arc::new(cfg),
            provider,
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ProviderConfig::from_env()?)
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.cfg
    }

    /// Unary generation with the failure kept typed
    pub async fn try_generate_response(&self, req: &GenerationRequest) -> LlmResult<ResponseChunk> {
        let provider = self.provider.as_ref().ok_or(LlmError::ClientNotConfigured)?;
        let payload = ChatPayload::resolve(req, &self.cfg);
        info!(
            model = %payload.model,
            prompt_length = req.prompt.len(),
            "Generating LLM response"
        );
        let chunk = provider.complete(&payload).await?;
        info!(
            tokens_used = chunk.tokens_used.unwrap_or(0),
            model = chunk.model.as_deref().unwrap_or_default(),
            "Generated LLM response"
        );
        Ok(chunk)
    }

    pub async fn generate_response(&self, req: &GenerationRequest) -> ResponseChunk {
        match self.try_generate_response(req).await {
            Ok(chunk) => chunk,
            Err(e) => {
                error!(error = %e, kind = %e.kind(), "Error generating LLM response");
                ResponseChunk::from_error(&e, "")
            }
        }
    }

    /// Streaming generation. Nothing is sent until the stream is first polled.
    pub fn generate_stream(&self, req: GenerationRequest) -> ChunkStream {
        let provider = self.provider.clone();
        let cfg = Arc::clone(&self.cfg);
        let chunks = stream! {
            let provider = match provider {
                Some(p) => p,
                None => {
                    error!("LLM client not initialized");
                    yield ResponseChunk::from_error(&LlmError::ClientNotConfigured, "");
                    return;
                }
            };
            let payload = ChatPayload::resolve(&req, &cfg);
            info!(
                model = %payload.model,
                prompt_length = req.prompt.len(),
                "Generating streaming LLM response"
            );
            match provider.stream(&payload).await {
                Ok(mut inner) => {
                    while let Some(chunk) = inner.next().await {
                        let last = chunk.is_final;
                        yield chunk;
                        if last {
                            return;
                        }
                    }
                }
                Err(e) => {
                    error!(error = %e, "Error in LLM stream generation");
                    yield ResponseChunk::from_error(&e, "");
                }
            }
        };
        chunks.boxed()
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: self.cfg.provider.as_str().to_string(),
            default_model: self.cfg.default_model.clone(),
            max_tokens: self.cfg.default_max_tokens,
            temperature: self.cfg.default_temperature,
            client_initialized: self.is_configured(),
        }
    }
}
