use serde::{Deserialize, Serialize};

use super::error::{ErrorKind, LlmError};

/// One generation call. Built by the caller, consumed by `LlmService`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub model: Option<String>,
    /// `Some(0)` is treated the same as `None`: the provider default applies
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// System message (if any) followed by exactly one user message
    pub fn messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.system_prompt.as_deref().filter(|s| !s.is_empty()) {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(&self.prompt));
        messages
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Normalized unit of a generation response, unary or streamed.
///
/// `content` is always the full text accumulated so far; `delta` is what this
/// chunk added. Exactly one chunk of a stream has `is_final` set, and it is the last.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseChunk {
    pub content: String,
    pub delta: Option<String>,
    pub is_final: bool,
    pub finish_reason: Option<String>,
    pub error: Option<ErrorKind>,
    pub tokens_used: Option<u32>,
    pub model: Option<String>,
}

impl ResponseChunk {
    /// Terminal chunk for a failed generation. Partial streamed text, if any, is kept
    /// ahead of the error message.
    pub fn from_error(err: &LlmError, partial: &str) -> Self {
        let content = if partial.is_empty() {
            err.user_message()
        } else {
            format!("{partial}\n\n{}", err.user_message())
        };
        Self {
            content,
            is_final: true,
            error: Some(err.kind()),
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Snapshot of the active provider settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub provider: String,
    pub default_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub client_initialized: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_put_system_prompt_first() {
        let req = GenerationRequest::new("hi").with_system_prompt("be brief");
        let messages = req.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ChatMessage::system("be brief"));
        assert_eq!(messages[1], ChatMessage::user("hi"));
    }

    #[test]
    fn empty_system_prompt_is_dropped() {
        let req = GenerationRequest::new("hi").with_system_prompt("");
        assert_eq!(req.messages(), vec![ChatMessage::user("hi")]);
    }

    #[test]
    fn error_chunk_keeps_partial_content() {
        let err = LlmError::StreamGenerationFailed("connection reset".into());
        let chunk = ResponseChunk::from_error(&err, "Hel");
        assert!(chunk.is_final);
        assert_eq!(chunk.error, Some(ErrorKind::StreamGenerationFailed));
        assert!(chunk.content.starts_with("Hel"));
        assert!(chunk.content.ends_with("Error: connection reset"));

        let chunk = ResponseChunk::from_error(&LlmError::ClientNotConfigured, "");
        assert_eq!(chunk.content, "Error: LLM service not properly configured");
    }
}
