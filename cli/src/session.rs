//! The session aggregate the command processor mutates (spec §3 "Lifecycle",
//! SPEC_FULL §0): context stack, conversation log, active model, session
//! identity, and flags, all owned exclusively by the REPL.

use uuid::Uuid;

use synergy_core::{ConversationLog, ContextStack, ModelRegistry};

/// The system prompt Synergy sends on every request. Held separately from
/// the conversation log (spec §3) and never appended to it.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are Synergy, a terminal-based assistant collaborating with the user on code and text.";

pub struct SessionState {
    pub registry: ModelRegistry,
    pub stack: ContextStack,
    pub convo: ConversationLog,
    pub session_uuid: Uuid,
    pub base64_to_assistant: bool,
    pub system_prompt: String,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            registry: ModelRegistry::new(),
            stack: ContextStack::new(),
            convo: ConversationLog::new(),
            session_uuid: Uuid::new_v4(),
            base64_to_assistant: true,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    /// `,reset` (spec §4.I): clears the stack and conversation log and
    /// rotates session identity to a fresh UUID (spec §3).
    pub fn reset(&mut self) {
        self.stack.reset();
        self.convo.reset();
        self.session_uuid = Uuid::new_v4();
    }

    /// Replaces stack, conversation, model, and session identity from a
    /// loaded dump (spec §4.F), leaving the active model untouched when the
    /// dump names an unknown or absent shortname.
    pub fn adopt_loaded(&mut self, loaded: synergy_core::LoadedSession, fresh_uuid_on_legacy: Uuid) {
        self.stack = loaded.stack;
        self.convo = loaded.convo;
        self.session_uuid = loaded.session_uuid.unwrap_or(fresh_uuid_on_legacy);
        if let Some(prompt) = loaded.system_prompt {
            self.system_prompt = prompt;
        }
        if let Some(model) = loaded.model {
            let _ = self.registry.set_active(&model);
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
