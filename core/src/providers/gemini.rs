use serde_json::{json, Value};

use crate::models::ModelRecord;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub fn build_request(model: &ModelRecord, system: &str, turns: Value, api_key: &str) -> (String, Vec<(String, String)>, Value) {
    let mut contents = vec![json!({"role": "user", "parts": [{"text": system}]})];
    if let Value::Array(rest) = turns {
        contents.extend(rest);
    }

    let body = json!({
        "contents": contents,
        "generationConfig": {"maxOutputTokens": model.default_max_tokens},
    });
    let url = format!("{BASE_URL}/{}:generateContent?key={api_key}", model.wire_model_id);
    (url, Vec::new(), body)
}

pub fn extract_reply(json: &Value) -> Option<String> {
    json.pointer("/candidates/0/content/parts/0/text").and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provider;

    fn model() -> ModelRecord {
        ModelRecord { shortname: "gemini-flash".into(), provider: Provider::Gemini, wire_model_id: "gemini-1.5-flash".into(), default_max_tokens: 8192 }
    }

    #[test]
    fn system_prompt_becomes_the_first_user_content() {
        let turns = json!([{"role": "user", "parts": [{"text": "hi"}]}]);
        let (url, headers, body) = build_request(&model(), "be nice", turns, "key");
        assert!(url.contains("gemini-1.5-flash:generateContent?key=key"));
        assert!(headers.is_empty());
        assert_eq!(body["contents"][0], json!({"role": "user", "parts": [{"text": "be nice"}]}));
        assert_eq!(body["contents"][1], json!({"role": "user", "parts": [{"text": "hi"}]}));
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
    }

    #[test]
    fn extract_reply_reads_candidates_path() {
        let response = json!({"candidates": [{"content": {"parts": [{"text": "hello"}]}}]});
        assert_eq!(extract_reply(&response), Some("hello".to_string()));
    }
}
