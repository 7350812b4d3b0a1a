/// Default assistant persona sent as the system message
pub const SYSTEM_PROMPT: &str = "You are NeuronAI, a helpful AI assistant designed to assist users \
with a wide range of tasks. You can help with:\n\
- Answering questions and providing information\n\
- Writing and editing text\n\
- Generating code snippets\n\
- Analyzing and summarizing content\n\
- Collaborating with other specialized agents\n\n\
Be clear, concise, and helpful in your responses.";

/// Wraps the raw user message; `{user_message}` is substituted
pub const CHAT_TEMPLATE: &str =
    "User: {user_message}\n\nProvide a helpful response to the user's message.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplates {
    system_prompt: String,
    chat_template: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            system_prompt: SYSTEM_PROMPT.to_string(),
            chat_template: CHAT_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplates {
    pub fn new(system_prompt: impl Into<String>, chat_template: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            chat_template: chat_template.into(),
        }
    }

    pub fn build_system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn build_chat_prompt(&self, user_message: &str) -> String {
        self.chat_template.replace("{user_message}", user_message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_prompt_wraps_message() {
        let prompts = PromptTemplates::default();
        assert_eq!(
            prompts.build_chat_prompt("Hello"),
            "User: Hello\n\nProvide a helpful response to the user's message."
        );
        assert!(prompts.build_system_prompt().starts_with("You are NeuronAI"));
    }

    #[test]
    fn custom_template() {
        let prompts = PromptTemplates::new("sys", "<<{user_message}>>");
        assert_eq!(prompts.build_chat_prompt("x"), "<<x>>");
        assert_eq!(prompts.build_system_prompt(), "sys");
    }
}
