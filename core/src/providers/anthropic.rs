use serde_json::{json, Value};

use crate::models::ModelRecord;

const URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub fn build_request(model: &ModelRecord, system: &str, turns: Value, api_key: &str) -> (String, Vec<(String, String)>, Value) {
    let body = json!({
        "model": model.wire_model_id,
        "max_tokens": model.default_max_tokens,
        "system": system,
        "messages": turns,
    });
    let headers = vec![
        ("x-api-key".to_string(), api_key.to_string()),
        ("anthropic-version".to_string(), ANTHROPIC_VERSION.to_string()),
        ("Content-Type".to_string(), "application/json".to_string()),
    ];
    (URL.to_string(), headers, body)
}

pub fn extract_reply(json: &Value) -> Option<String> {
    json.pointer("/content/0/text").and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provider;

    fn model() -> ModelRecord {
        ModelRecord {
            shortname: "claude-sonnet".into(),
            provider: Provider::Anthropic,
            wire_model_id: "claude-3-5-sonnet-20241022".into(),
            default_max_tokens: 4096,
        }
    }

    #[test]
    fn body_excludes_system_from_the_messages_array() {
        let turns = json!([{"role": "user", "content": "hi"}]);
        let (url, headers, body) = build_request(&model(), "be nice", turns, "key");
        assert_eq!(url, URL);
        assert!(headers.iter().any(|(k, v)| k == "x-api-key" && v == "key"));
        assert!(headers.iter().any(|(k, v)| k == "anthropic-version" && v == ANTHROPIC_VERSION));
        assert_eq!(body["system"], "be nice");
        assert_eq!(body["messages"], json!([{"role": "user", "content": "hi"}]));
        assert_eq!(body["max_tokens"], 4096);
    }

    #[test]
    fn extract_reply_reads_content_path() {
        let response = json!({"content": [{"text": "hello"}]});
        assert_eq!(extract_reply(&response), Some("hello".to_string()));
    }
}
