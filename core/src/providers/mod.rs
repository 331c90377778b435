//! The provider dispatcher (spec §4.D): builds a provider-specific request,
//! invokes the transport, classifies the result, and extracts reply text.

mod anthropic;
mod gemini;
mod openai;

use synergy_common::Role;

use crate::convo::ConversationLog;
use crate::error::SynergyError;
use crate::models::{ModelRecord, Provider};
use crate::stack::ContextStack;
use crate::transport::{self, TransportConfig};

/// Separator placed between the rendered attachment block and the user's
/// prompt text in the effective outgoing message.
const ATTACHMENT_SEPARATOR: &str = "\n---\n";

/// First 400 characters of a response body, used for both `HttpError` and
/// `JsonParseError` previews (spec §4.D).
fn body_preview(body: &str) -> String {
    body.chars().take(400).collect()
}

pub struct Dispatcher {
    transport_cfg: TransportConfig,
}

impl Dispatcher {
    pub fn new(transport_cfg: TransportConfig) -> Self {
        Self { transport_cfg }
    }

    /// `ask(prompt-text) -> reply-text | Error` (spec §4.D). The caller is
    /// responsible for the empty-input guard; this function always invokes
    /// the provider.
    pub fn ask(
        &self,
        model: &ModelRecord,
        system_prompt: &str,
        base64_to_assistant: bool,
        stack: &ContextStack,
        convo: &mut ConversationLog,
        prompt: &str,
    ) -> Result<String, SynergyError> {
        let attachments = stack.render_payload(base64_to_assistant);
        let effective_message =
            if attachments.is_empty() { prompt.to_string() } else { format!("{attachments}{ATTACHMENT_SEPARATOR}{prompt}") };

        let api_key = std::env::var(model.provider.api_key_env())
            .map_err(|_| SynergyError::MissingApiKey(model.provider.as_str().to_string()))?;

        // The log is not mutated until the round-trip succeeds (spec §7):
        // on failure it must not gain an orphan user turn with no matching
        // assistant reply, or the alternating-turn invariant (spec §3)
        // breaks on the next retry. Render the wire turns from a scratch
        // copy that includes the pending message instead.
        let mut pending = convo.clone();
        pending.append(Role::User, effective_message.clone());
        let turns = pending.render_provider(model.provider);
        let (url, headers, body) = match model.provider {
            Provider::OpenAi => openai::build_request(model, system_prompt, turns, &api_key),
            Provider::Anthropic => anthropic::build_request(model, system_prompt, turns, &api_key),
            Provider::Gemini => gemini::build_request(model, system_prompt, turns, &api_key),
        };

        let resp = transport::post(&self.transport_cfg, &url, &headers, &body.to_string())?;

        if resp.exit != 0 {
            return Err(SynergyError::TransportError { exit_code: resp.exit, stderr: resp.stderr });
        }
        if !(200..300).contains(&resp.status) {
            return Err(SynergyError::HttpError { status: resp.status, body_preview: body_preview(&resp.body) });
        }

        let json: serde_json::Value =
            serde_json::from_str(&resp.body).map_err(|_| SynergyError::JsonParseError(body_preview(&resp.body)))?;

        let reply = match model.provider {
            Provider::OpenAi => openai::extract_reply(&json),
            Provider::Anthropic => anthropic::extract_reply(&json),
            Provider::Gemini => gemini::extract_reply(&json),
        }
        .ok_or_else(|| SynergyError::SchemaError(model.provider.as_str().to_string()))?;

        convo.append(Role::User, effective_message);
        convo.append(Role::Assistant, reply.clone());
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelRegistry;

    #[test]
    fn body_preview_truncates_to_exactly_400_chars() {
        let body = "x".repeat(600);
        let preview = body_preview(&body);
        assert_eq!(preview.len(), 400);
        assert_eq!(preview, "x".repeat(400));
    }

    #[test]
    fn missing_api_key_is_reported_without_hitting_the_transport() {
        std::env::remove_var("OPENAI_API_KEY");
        let registry = ModelRegistry::new();
        let model = registry.list().iter().find(|n| n.starts_with("gpt-5")).map(|_| ());
        assert!(model.is_some());

        let mut registry = registry;
        registry.set_active("gpt-5").expect("known model");
        let model = registry.get_active().clone();

        let dispatcher = Dispatcher::new(TransportConfig {
            max_retries: 1,
            offline: false,
            offline_response: String::new(),
            curl_stub: None,
            capture_dir: None,
        });

        let stack = ContextStack::new();
        let mut convo = ConversationLog::new();
        let err = dispatcher.ask(&model, "system", true, &stack, &mut convo, "hello").unwrap_err();
        assert!(matches!(err, SynergyError::MissingApiKey(p) if p == "openai"));
        assert!(convo.turns().is_empty(), "a failed ask must not leave an orphan user turn");
    }

    #[test]
    fn offline_mode_produces_a_reply_without_a_real_network_call() {
        std::env::set_var("GEMINI_API_KEY", "test-key");
        let mut registry = ModelRegistry::new();
        registry.set_active("gemini-flash").expect("known model");
        let model = registry.get_active().clone();

        let dispatcher = Dispatcher::new(TransportConfig {
            max_retries: 1,
            offline: true,
            offline_response: r#"{"candidates":[{"content":{"parts":[{"text":"hi there"}]}}]}"#.to_string(),
            curl_stub: None,
            capture_dir: None,
        });

        let stack = ContextStack::new();
        let mut convo = ConversationLog::new();
        let reply = dispatcher.ask(&model, "system", true, &stack, &mut convo, "hello").expect("offline reply");
        assert_eq!(reply, "hi there");
        assert_eq!(convo.turns().len(), 2);
        std::env::remove_var("GEMINI_API_KEY");
    }
}
