//! Named model records and the active-model selector (spec §4.A).

use std::collections::BTreeMap;

use crate::error::SynergyError;

/// One of the three supported chat-completion wire protocols. A closed
/// tagged union by design (spec §9) — there is no open plugin surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Provider {
    OpenAi,
    Anthropic,
    Gemini,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Gemini => "gemini",
        }
    }

    pub fn api_key_env(self) -> &'static str {
        match self {
            Provider::OpenAi => synergy_common::env::OPENAI_API_KEY,
            Provider::Anthropic => synergy_common::env::ANTHROPIC_API_KEY,
            Provider::Gemini => synergy_common::env::GEMINI_API_KEY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelRecord {
    pub shortname: String,
    pub provider: Provider,
    pub wire_model_id: String,
    pub default_max_tokens: u32,
}

/// Static mapping from shortname to model record, plus a distinguished
/// active shortname. Invariant: the active shortname is always present.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    records: BTreeMap<String, ModelRecord>,
    active: String,
}

impl ModelRegistry {
    /// The reference configuration's default active model.
    pub const DEFAULT_ACTIVE: &'static str = "gemini-flash";

    pub fn new() -> Self {
        let mut records = BTreeMap::new();
        for record in reference_models() {
            records.insert(record.shortname.clone(), record);
        }
        Self { records, active: Self::DEFAULT_ACTIVE.to_string() }
    }

    pub fn list(&self) -> Vec<String> {
        self.records
            .keys()
            .map(|name| if name == &self.active { format!("{name} *") } else { name.clone() })
            .collect()
    }

    pub fn get_active(&self) -> &ModelRecord {
        self.records
            .get(&self.active)
            .unwrap_or_else(|| unreachable!("active shortname is always present by invariant"))
    }

    pub fn set_active(&mut self, name: &str) -> Result<(), SynergyError> {
        if !self.records.contains_key(name) {
            return Err(SynergyError::UnknownModel(name.to_string()));
        }
        self.active = name.to_string();
        Ok(())
    }

    pub fn active_shortname(&self) -> &str {
        &self.active
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn reference_models() -> Vec<ModelRecord> {
    vec![
        ModelRecord {
            shortname: "gemini-flash".to_string(),
            provider: Provider::Gemini,
            wire_model_id: "gemini-1.5-flash".to_string(),
            default_max_tokens: 8192,
        },
        ModelRecord {
            shortname: "gemini-pro".to_string(),
            provider: Provider::Gemini,
            wire_model_id: "gemini-1.5-pro".to_string(),
            default_max_tokens: 8192,
        },
        ModelRecord {
            shortname: "gpt-5".to_string(),
            provider: Provider::OpenAi,
            wire_model_id: "gpt-5".to_string(),
            default_max_tokens: 4096,
        },
        ModelRecord {
            shortname: "claude-sonnet".to_string(),
            provider: Provider::Anthropic,
            wire_model_id: "claude-3-5-sonnet-20241022".to_string(),
            default_max_tokens: 4096,
        },
    ]
}
