//! The append-only conversation log (spec §4.C). The system prompt is held
//! separately by the caller and is never part of this log.

use serde_json::{json, Value};
use synergy_common::Role;

use crate::models::Provider;

#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    turns: Vec<ConversationTurn>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, role: Role, text: String) {
        self.turns.push(ConversationTurn { role, text });
    }

    pub fn reset(&mut self) {
        self.turns.clear();
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Shapes the turn sequence into the wire schema for `provider`
    /// (spec §4.D); the caller prepends the system prompt and model id.
    pub fn render_provider(&self, provider: Provider) -> Value {
        match provider {
            Provider::OpenAi | Provider::Anthropic => {
                json!(self
                    .turns
                    .iter()
                    .map(|t| json!({"role": t.role.as_str(), "content": t.text}))
                    .collect::<Vec<_>>())
            }
            Provider::Gemini => {
                json!(self
                    .turns
                    .iter()
                    .map(|t| {
                        let role = if matches!(t.role, Role::Assistant) { "model" } else { "user" };
                        json!({"role": role, "parts": [{"text": t.text}]})
                    })
                    .collect::<Vec<_>>())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_provider_shapes_openai_messages() {
        let mut convo = ConversationLog::new();
        convo.append(Role::User, "hi".to_string());
        convo.append(Role::Assistant, "hello".to_string());

        let rendered = convo.render_provider(Provider::OpenAi);
        assert_eq!(rendered, json!([{"role": "user", "content": "hi"}, {"role": "assistant", "content": "hello"}]));
    }

    #[test]
    fn render_provider_maps_assistant_to_model_for_gemini() {
        let mut convo = ConversationLog::new();
        convo.append(Role::User, "hi".to_string());
        convo.append(Role::Assistant, "hello".to_string());

        let rendered = convo.render_provider(Provider::Gemini);
        assert_eq!(
            rendered,
            json!([
                {"role": "user", "parts": [{"text": "hi"}]},
                {"role": "model", "parts": [{"text": "hello"}]},
            ])
        );
    }

    #[test]
    fn reset_clears_the_log() {
        let mut convo = ConversationLog::new();
        convo.append(Role::User, "hi".to_string());
        convo.reset();
        assert!(convo.turns().is_empty());
    }
}
