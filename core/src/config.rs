//! Process configuration, read once from the environment at startup.
//!
//! Values are resolved through a lookup function so tests can feed a map
//! instead of mutating the process environment.

use std::net::SocketAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{NeuronError, Result};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Backend family. Closed set: each variant has exactly one adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// OpenAI-compatible REST API, bearer-token authenticated
    OpenAi,
    /// Local model daemon, unauthenticated
    LocalDaemon,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::LocalDaemon => "ollama",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderKind::OpenAi)
    }
}

impl FromStr for ProviderKind {
    type Err = NeuronError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "openai_compatible" => Ok(ProviderKind::OpenAi),
            "ollama" | "local" | "local_daemon" => Ok(ProviderKind::LocalDaemon),
            other => Err(NeuronError::Config(format!("unknown LLM_PROVIDER '{other}'"))),
        }
    }
}

/// Immutable provider settings shared by every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider: ProviderKind,
    pub base_url: String,
    pub api_key: Option<String>,
    pub default_model: String,
    pub default_max_tokens: u32,
    pub default_temperature: f32,
    pub request_timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            api_key: None,
            default_model: "gpt-4".to_string(),
            default_max_tokens: 4096,
            default_temperature: 0.7,
            request_timeout_ms: 120_000,
        }
    }
}

impl ProviderConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());
        let defaults = Self::default();

        let provider = match get("LLM_PROVIDER") {
            Some(v) => v.parse()?,
            None => ProviderKind::OpenAi,
        };
        let (base_url, api_key, default_model) = match provider {
            ProviderKind::OpenAi => (
                get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                get("OPENAI_API_KEY"),
                get("DEFAULT_MODEL").unwrap_or(defaults.default_model),
            ),
            ProviderKind::LocalDaemon => (
                get("OLLAMA_BASE_URL").unwrap_or_else(|| DEFAULT_OLLAMA_BASE_URL.to_string()),
                None,
                get("DEFAULT_MODEL").unwrap_or_else(|| "llama3".to_string()),
            ),
        };

        Ok(Self {
            provider,
            base_url,
            api_key,
            default_model,
            default_max_tokens: parse_or(get("MAX_TOKENS"), defaults.default_max_tokens),
            default_temperature: parse_finite_or(get("TEMPERATURE"), defaults.default_temperature),
            request_timeout_ms: parse_or(get("REQUEST_TIMEOUT_MS"), defaults.request_timeout_ms),
        })
    }
}

/// gRPC listener and runtime settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_workers: usize,
    pub shutdown_grace_secs: u64,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 50051,
            max_workers: 10,
            shutdown_grace_secs: 5,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());
        let defaults = Self::default();
        Self {
            host: get("SERVICE_HOST").unwrap_or(defaults.host),
            port: parse_or(get("SERVICE_PORT"), defaults.port),
            max_workers: parse_or(get("MAX_WORKERS"), defaults.max_workers).max(1),
            shutdown_grace_secs: parse_or(get("SHUTDOWN_GRACE_SECS"), defaults.shutdown_grace_secs),
            log_level: get("LOG_LEVEL")
                .map(|s| s.to_ascii_lowercase())
                .unwrap_or(defaults.log_level),
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        format!("{}:{}", host, self.port)
            .parse()
            .map_err(|e| NeuronError::Config(format!("invalid bind address {host}:{}: {e}", self.port)))
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// `f32::from_str` accepts "NaN" and "inf"; neither is a usable setting
fn parse_finite_or(value: Option<String>, default: f32) -> f32 {
    value
        .and_then(|v| v.trim().parse::<f32>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}
