use serde_json::{json, Value};

use crate::models::ModelRecord;

const URL: &str = "https://api.openai.com/v1/chat/completions";

pub fn build_request(model: &ModelRecord, system: &str, turns: Value, api_key: &str) -> (String, Vec<(String, String)>, Value) {
    let mut messages = vec![json!({"role": "system", "content": system})];
    if let Value::Array(rest) = turns {
        messages.extend(rest);
    }

    let body = json!({
        "model": model.wire_model_id,
        "messages": messages,
        "stream": false,
    });
    let headers = vec![
        ("Authorization".to_string(), format!("Bearer {api_key}")),
        ("Content-Type".to_string(), "application/json".to_string()),
    ];
    (URL.to_string(), headers, body)
}

pub fn extract_reply(json: &Value) -> Option<String> {
    json.pointer("/choices/0/message/content").and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provider;

    fn model() -> ModelRecord {
        ModelRecord { shortname: "gpt-5".into(), provider: Provider::OpenAi, wire_model_id: "gpt-5".into(), default_max_tokens: 4096 }
    }

    #[test]
    fn body_prepends_the_system_message() {
        let turns = json!([{"role": "user", "content": "hi"}]);
        let (url, headers, body) = build_request(&model(), "be nice", turns, "key");
        assert_eq!(url, URL);
        assert!(headers.iter().any(|(k, v)| k == "Authorization" && v == "Bearer key"));
        assert_eq!(body["messages"][0], json!({"role": "system", "content": "be nice"}));
        assert_eq!(body["messages"][1], json!({"role": "user", "content": "hi"}));
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn extract_reply_reads_choices_path() {
        let response = json!({"choices": [{"message": {"content": "hello"}}]});
        assert_eq!(extract_reply(&response), Some("hello".to_string()));
    }

    #[test]
    fn extract_reply_is_none_on_schema_mismatch() {
        assert_eq!(extract_reply(&json!({})), None);
    }
}
