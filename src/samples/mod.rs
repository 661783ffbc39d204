//! The sample programs as library flows.
//!
//! Each flow takes a client and a writer for its human-readable output, so
//! the demo binaries print to stdout and tests capture into a buffer.

pub mod deepseek;
pub mod endpoints;
pub mod nova;
pub mod tool_use;

/// Region the Bedrock samples run in.
pub const BEDROCK_SAMPLE_REGION: &str = "us-east-1";

/// Prompt shared by the Nova and DeepSeek streaming samples.
pub const HELLO_WORLD_PROMPT: &str = "Describe the purpose of a 'hello world' program in one line.";

/// Render a JSON value for display: strings without quotes, everything else
/// as compact JSON.
pub(crate) fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("abc")), "abc");
        assert_eq!(display_value(&json!(12)), "12");
        assert_eq!(display_value(&json!({"a": [1]})), r#"{"a":[1]}"#);
    }
}
