use super::error::LlmError;
use super::types::ResponseChunk;

/// Running text of one streamed generation.
///
/// Every chunk it hands out carries the full text so far, so a consumer that
/// only keeps the latest chunk never loses content.
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    content: String,
    model: Option<String>,
    tokens_used: Option<u32>,
}

impl ResponseAccumulator {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            ..Default::default()
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Provider-reported model name, when a frame carries one
    pub fn observe_model(&mut self, model: Option<String>) {
        if let Some(m) = model.filter(|m| !m.is_empty()) {
            self.model = Some(m);
        }
    }

    pub fn observe_usage(&mut self, tokens: Option<u32>) {
        if tokens.is_some() {
            self.tokens_used = tokens;
        }
    }

    /// Append a delta. Empty deltas produce no chunk.
    pub fn push(&mut self, delta: &str) -> Option<ResponseChunk> {
        if delta.is_empty() {
            return None;
        }
        self.content.push_str(delta);
        Some(ResponseChunk {
            content: self.content.clone(),
            delta: Some(delta.to_string()),
            is_final: false,
            ..Default::default()
        })
    }

    /// Summary chunk closing the stream; repeats the content without a delta
    pub fn finish(&self, finish_reason: Option<String>) -> ResponseChunk {
        ResponseChunk {
            content: self.content.clone(),
            delta: None,
            is_final: true,
            finish_reason,
            error: None,
            tokens_used: self.tokens_used,
            model: self.model.clone(),
        }
    }

    pub fn fail(&self, err: &LlmError) -> ResponseChunk {
        ResponseChunk {
            model: self.model.clone(),
            ..ResponseChunk::from_error(err, &self.content)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ErrorKind;

    #[test]
    fn content_is_concatenation_of_deltas() {
        let mut acc = ResponseAccumulator::new("gpt-4");
        let a = acc.push("Hel").unwrap();
        let b = acc.push("lo").unwrap();
        assert_eq!(a.content, "Hel");
        assert_eq!(b.content, format!("{}{}", a.content, b.delta.clone().unwrap()));
        assert!(!a.is_final && !b.is_final);

        let last = acc.finish(Some("stop".into()));
        assert!(last.is_final);
        assert_eq!(last.content, "Hello");
        assert_eq!(last.delta, None);
        assert_eq!(last.model.as_deref(), Some("gpt-4"));
    }

    #[test]
    fn empty_delta_is_not_emitted() {
        let mut acc = ResponseAccumulator::new("m");
        assert!(acc.push("").is_none());
        assert_eq!(acc.content(), "");
    }

    #[test]
    fn failure_preserves_partial_text() {
        let mut acc = ResponseAccumulator::new("m");
        acc.push("partial answer");
        let chunk = acc.fail(&LlmError::StreamGenerationFailed("eof".into()));
        assert_eq!(chunk.error, Some(ErrorKind::StreamGenerationFailed));
        assert!(chunk.content.starts_with("partial answer"));
        assert!(chunk.content.contains("Error: eof"));
    }
}
