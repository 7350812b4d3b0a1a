use std::time::Duration;

use reqwest::Client;

use crate::config::{ProviderConfig, ProviderKind};

use super::error::LlmResult;
use super::local_daemon::LocalDaemonAdapter;
use super::openai::OpenAiAdapter;
use super::stream::ChunkStream;
use super::types::{ChatMessage, GenerationRequest, ResponseChunk};

/// A `GenerationRequest` with every default filled in from `ProviderConfig`
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPayload {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ChatPayload {
    pub fn resolve(req: &GenerationRequest, cfg: &ProviderConfig) -> Self {
        Self {
            model: req
                .model
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| cfg.default_model.clone()),
            messages: req.messages(),
            // 0 is not a usable budget, so it means "use the default"
            max_tokens: req
                .max_tokens
                .filter(|n| *n > 0)
                .unwrap_or(cfg.default_max_tokens),
            // NaN survives `clamp` and would serialize as `null`
            temperature: req
                .temperature
                .filter(|t| t.is_finite())
                .unwrap_or(cfg.default_temperature)
                .clamp(0.0, 2.0),
        }
    }
}

/// The backend selected at construction. Never re-chosen per call.
#[derive(Clone)]
pub enum ProviderAdapter {
    OpenAi(OpenAiAdapter),
    LocalDaemon(LocalDaemonAdapter),
}

impl ProviderAdapter {
    /// `None` when the provider needs an API key and none is configured
    pub fn from_config(cfg: &ProviderConfig, http: Client) -> Option<Self> {
        let unary_timeout = Duration::from_millis(cfg.request_timeout_ms);
        match cfg.provider {
            ProviderKind::LocalDaemon => Some(Self::LocalDaemon(
                LocalDaemonAdapter::new(http, cfg.base_url.clone()).with_unary_timeout(unary_timeout),
            )),
            ProviderKind::OpenAi => {
                let key = cfg.api_key.as_deref().filter(|k| !k.trim().is_empty())?;
                Some(Self::OpenAi(
                    OpenAiAdapter::new(http, cfg.base_url.clone(), key)
                        .with_unary_timeout(unary_timeout),
                ))
            }
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::OpenAi(_) => ProviderKind::OpenAi,
            Self::LocalDaemon(_) => ProviderKind::LocalDaemon,
        }
    }

    pub async fn complete(&self, payload: &ChatPayload) -> LlmResult<ResponseChunk> {
        match self {
            Self::OpenAi(a) => a.complete(payload).await,
            Self::LocalDaemon(a) => a.complete(payload).await,
        }
    }

    pub async fn stream(&self, payload: &ChatPayload) -> LlmResult<ChunkStream> {
        match self {
            Self::OpenAi(a) => a.stream(payload).await,
            Self::LocalDaemon(a) => a.stream(payload).await,
        }
    }
}
