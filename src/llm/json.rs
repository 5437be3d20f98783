// src/llm/json.rs
use serde_json::{Map, Value};

use super::LlmError;
use crate::utils::truncate_to_char_boundary;

/// Strip a markdown code fence (```json ... ``` or ``` ... ```) if the
/// response contains one, otherwise return the trimmed text. The body runs
/// to the last fence, so fenced snippets quoted inside the JSON survive.
pub fn strip_code_fence(response: &str) -> &str {
    let text = response.trim();

    let start = match text.find("```json") {
        Some(idx) => idx + "```json".len(),
        None => match text.find("```") {
            Some(idx) => idx + "```".len(),
            None => return text,
        },
    };

    let body = &text[start..];
    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Decode the first JSON object in an LLM reply. Text before the first `{`
/// and anything after the object are ignored. A reply that is already a bare
/// object is decoded as is; fences are only stripped when it starts with one
/// or the direct decode fails.
pub fn parse_json_response(response: &str) -> Result<Map<String, Value>, LlmError> {
    let text = response.trim();

    if text.starts_with("```") {
        return first_object(strip_code_fence(text));
    }

    match first_object(text) {
        Err(_) if text.contains("```") => first_object(strip_code_fence(text)),
        result => result,
    }
}

fn first_object(text: &str) -> Result<Map<String, Value>, LlmError> {
    let text = match text.find('{') {
        Some(idx) => &text[idx..],
        None => text,
    };

    let mut stream = serde_json::Deserializer::from_str(text).into_iter::<Value>();
    match stream.next() {
        Some(Ok(Value::Object(map))) => Ok(map),
        Some(Ok(other)) => Err(LlmError::InvalidJson(format!(
            "expected an object, got {}",
            type_name(&other)
        ))),
        Some(Err(e)) => Err(LlmError::InvalidJson(format!(
            "{} (response starts with: {:?})",
            e,
            truncate_to_char_boundary(text, 120)
        ))),
        None => Err(LlmError::InvalidJson("empty response".to_string())),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {}  "), "{}");
        assert_eq!(strip_code_fence("Here you go:\n```json\n{\"a\":1}\n```\nDone."), "{\"a\":1}");
    }

    #[test]
    fn test_plain_object() {
        let map = parse_json_response(r#"{"score": 3}"#).unwrap();
        assert_eq!(map["score"], 3);
    }

    #[test]
    fn test_fenced_object_with_prose() {
        let reply = "Sure! Here is the profile:\n```json\n{\"name\": \"토스\"}\n```";
        let map = parse_json_response(reply).unwrap();
        assert_eq!(map["name"], "토스");
    }

    #[test]
    fn test_leading_text_and_trailing_data_ignored() {
        let reply = "Result: {\"a\": {\"b\": [1, 2]}} {\"second\": true} trailing words";
        let map = parse_json_response(reply).unwrap();
        assert_eq!(map["a"]["b"][1], 2);
        assert!(map.get("second").is_none());
    }

    #[test]
    fn test_bare_object_with_fenced_snippet_in_a_string() {
        let reply = "{\"evidence\": [\"README shows ```rust fn main() {} ``` examples\"], \"score\": 3}";
        let map = parse_json_response(reply).unwrap();
        assert_eq!(map["score"], 3);
        assert_eq!(
            map["evidence"][0],
            "README shows ```rust fn main() {} ``` examples"
        );
    }

    #[test]
    fn test_fenced_object_with_fenced_snippet_in_a_string() {
        let reply = "```json\n{\"quote\": \"```sh\\ncargo run\\n```\", \"score\": 2}\n```";
        let map = parse_json_response(reply).unwrap();
        assert_eq!(map["score"], 2);
        assert_eq!(map["quote"], "```sh\ncargo run\n```");
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(matches!(
            parse_json_response("[1, 2, 3]"),
            Err(LlmError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            parse_json_response("I cannot help with that."),
            Err(LlmError::InvalidJson(_))
        ));
        assert!(matches!(
            parse_json_response("   "),
            Err(LlmError::InvalidJson(_))
        ));
        assert!(matches!(
            parse_json_response("{\"unterminated\": "),
            Err(LlmError::InvalidJson(_))
        ));
    }
}
