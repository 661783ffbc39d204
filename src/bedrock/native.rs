//! Model-native payloads for `InvokeModel`.
//!
//! Amazon Nova takes a `messages-v1` body and streams chunks shaped like
//! Converse stream events. DeepSeek R1 takes a raw prompt built from its chat
//! template and answers with `choices[].text`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Nova request schema version.
pub const NOVA_SCHEMA_VERSION: &str = "messages-v1";

/// Nova `messages-v1` request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NovaRequest {
    /// Always `messages-v1`.
    pub schema_version: String,
    /// Optional system prompts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<Vec<NovaContent>>,
    /// Conversation.
    pub messages: Vec<NovaMessage>,
    /// Sampling parameters.
    pub inference_config: NovaInferenceConfig,
}

impl NovaRequest {
    /// A single-turn request with the given user text.
    pub fn user_text(text: impl Into<String>, inference_config: NovaInferenceConfig) -> Self {
        Self {
            schema_version: NOVA_SCHEMA_VERSION.to_string(),
            system: None,
            messages: vec![NovaMessage {
                role: "user".to_string(),
                content: vec![NovaContent { text: text.into() }],
            }],
            inference_config,
        }
    }
}

/// A Nova message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NovaMessage {
    /// `user` or `assistant`.
    pub role: String,
    /// Text content.
    pub content: Vec<NovaContent>,
}

/// A Nova text content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NovaContent {
    /// Text.
    pub text: String,
}

/// Nova sampling parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NovaInferenceConfig {
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Top-k sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

/// What a Nova stream chunk carries.
#[derive(Debug, Clone, PartialEq)]
pub enum NovaChunk {
    /// Generated text.
    TextDelta(String),
    /// End-of-stream usage and metrics.
    Metadata(NovaMetadata),
    /// `messageStart`, `messageStop`, `contentBlockStop`, or a delta with no text.
    Other,
}

impl NovaChunk {
    /// Classify a chunk by the keys it carries.
    ///
    /// A `contentBlockDelta` chunk is text when `delta.text` is a string.
    /// Otherwise a chunk with `metadata` is metadata. Everything else is
    /// `Other`.
    pub fn classify(chunk: &Value) -> Self {
        if let Some(delta) = chunk.get("contentBlockDelta") {
            return match delta.pointer("/delta/text").and_then(Value::as_str) {
                Some(text) => NovaChunk::TextDelta(text.to_string()),
                None => NovaChunk::Other,
            };
        }

        match chunk.get("metadata") {
            Some(metadata) => NovaChunk::Metadata(NovaMetadata::from_chunk(metadata, chunk)),
            None => NovaChunk::Other,
        }
    }
}

/// Metadata from the final Nova chunk. Absent fields stay `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NovaMetadata {
    /// `metadata.usage`.
    pub usage: Option<NovaUsage>,
    /// Sibling `amazon-bedrock-invocationMetrics`.
    pub invocation_metrics: Option<StreamInvocationMetrics>,
    /// `metadata.metrics` when non-empty.
    pub metrics: Option<Map<String, Value>>,
    /// `metadata.trace` when non-empty.
    pub trace: Option<Map<String, Value>>,
}

impl NovaMetadata {
    fn from_chunk(metadata: &Value, chunk: &Value) -> Self {
        let non_empty = |key: &str| {
            metadata
                .get(key)
                .and_then(Value::as_object)
                .filter(|map| !map.is_empty())
                .cloned()
        };

        Self {
            usage: metadata.get("usage").map(NovaUsage::from_value),
            invocation_metrics: chunk
                .get("amazon-bedrock-invocationMetrics")
                .map(StreamInvocationMetrics::from_value),
            metrics: non_empty("metrics"),
            trace: non_empty("trace"),
        }
    }
}

/// Token usage in Nova metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NovaUsage {
    /// `inputTokens`.
    pub input_tokens: Option<u64>,
    /// `outputTokens`.
    pub output_tokens: Option<u64>,
    /// `cacheReadInputTokenCount`.
    pub cache_read_input_token_count: Option<u64>,
    /// `cacheWriteInputTokenCount`.
    pub cache_write_input_token_count: Option<u64>,
}

impl NovaUsage {
    fn from_value(value: &Value) -> Self {
        Self {
            input_tokens: uint(value, "inputTokens"),
            output_tokens: uint(value, "outputTokens"),
            cache_read_input_token_count: uint(value, "cacheReadInputTokenCount"),
            cache_write_input_token_count: uint(value, "cacheWriteInputTokenCount"),
        }
    }
}

/// `amazon-bedrock-invocationMetrics` on the last stream chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamInvocationMetrics {
    /// `inputTokenCount`.
    pub input_token_count: Option<u64>,
    /// `outputTokenCount`.
    pub output_token_count: Option<u64>,
    /// `invocationLatency`, milliseconds.
    pub invocation_latency: Option<u64>,
    /// `firstByteLatency`, milliseconds.
    pub first_byte_latency: Option<u64>,
    /// `cacheReadInputTokenCount`.
    pub cache_read_input_token_count: Option<u64>,
    /// `cacheWriteInputTokenCount`.
    pub cache_write_input_token_count: Option<u64>,
}

impl StreamInvocationMetrics {
    fn from_value(value: &Value) -> Self {
        Self {
            input_token_count: uint(value, "inputTokenCount"),
            output_token_count: uint(value, "outputTokenCount"),
            invocation_latency: uint(value, "invocationLatency"),
            first_byte_latency: uint(value, "firstByteLatency"),
            cache_read_input_token_count: uint(value, "cacheReadInputTokenCount"),
            cache_write_input_token_count: uint(value, "cacheWriteInputTokenCount"),
        }
    }
}

fn uint(value: &Value, key: &str) -> Option<u64> {
    value.get(key).and_then(Value::as_u64)
}

// ============================================================================
// DeepSeek R1
// ============================================================================

/// Wrap a user prompt in the DeepSeek R1 chat template.
pub fn deepseek_prompt(prompt: &str) -> String {
    format!(
        "<｜begin▁of▁sentence｜><｜User｜>{}<｜Assistant｜><think>\n",
        prompt
    )
}

/// DeepSeek R1 native request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepSeekRequest {
    /// Templated prompt.
    pub prompt: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling.
    pub top_p: f32,
    /// Stop sequences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

impl DeepSeekRequest {
    /// Build a request from a plain user prompt.
    pub fn new(prompt: &str, max_tokens: u32, temperature: f32, top_p: f32) -> Self {
        Self {
            prompt: deepseek_prompt(prompt),
            max_tokens,
            temperature,
            top_p,
            stop: None,
        }
    }
}

/// DeepSeek R1 native response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeepSeekResponse {
    /// Generated choices.
    #[serde(default)]
    pub choices: Vec<DeepSeekChoice>,
}

impl DeepSeekResponse {
    /// Texts of all choices in order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.choices.iter().map(|c| c.text.as_str())
    }
}

/// One DeepSeek choice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeepSeekChoice {
    /// Generated text.
    #[serde(default)]
    pub text: String,
    /// Why generation stopped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_nova_request_shape() {
        let request = NovaRequest::user_text(
            "hello",
            NovaInferenceConfig {
                max_tokens: Some(500),
                temperature: Some(0.5),
                top_p: None,
                top_k: Some(20),
            },
        );
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "schemaVersion": "messages-v1",
                "messages": [{"role": "user", "content": [{"text": "hello"}]}],
                "inferenceConfig": {"maxTokens": 500, "temperature": 0.5, "topK": 20}
            })
        );
    }

    #[test]
    fn test_classify_text_delta() {
        let chunk = json!({"contentBlockDelta": {"delta": {"text": "Hello"}, "contentBlockIndex": 0}});
        assert_eq!(NovaChunk::classify(&chunk), NovaChunk::TextDelta("Hello".into()));
    }

    #[test]
    fn test_classify_delta_without_text_is_other() {
        let chunk = json!({"contentBlockDelta": {"delta": {}}, "metadata": {}});
        assert_eq!(NovaChunk::classify(&chunk), NovaChunk::Other);
    }

    #[test]
    fn test_classify_other_events() {
        assert_eq!(NovaChunk::classify(&json!({"messageStart": {"role": "assistant"}})), NovaChunk::Other);
        assert_eq!(NovaChunk::classify(&json!({"messageStop": {"stopReason": "end_turn"}})), NovaChunk::Other);
        assert_eq!(NovaChunk::classify(&json!({"contentBlockStop": {"contentBlockIndex": 0}})), NovaChunk::Other);
    }

    #[test]
    fn test_classify_metadata() {
        let chunk = json!({
            "metadata": {
                "usage": {"inputTokens": 13, "outputTokens": 25},
                "metrics": {},
                "trace": {"guardrail": "none"}
            },
            "amazon-bedrock-invocationMetrics": {
                "inputTokenCount": 13,
                "outputTokenCount": 25,
                "invocationLatency": 412,
                "firstByteLatency": 120
            }
        });

        let metadata = match NovaChunk::classify(&chunk) {
            NovaChunk::Metadata(m) => m,
            other => panic!("Expected metadata, got {:?}", other),
        };

        let usage = metadata.usage.unwrap();
        assert_eq!(usage.input_tokens, Some(13));
        assert_eq!(usage.cache_read_input_token_count, None);
        let metrics = metadata.invocation_metrics.unwrap();
        assert_eq!(metrics.invocation_latency, Some(412));
        assert_eq!(metrics.first_byte_latency, Some(120));
        assert!(metadata.metrics.is_none());
        assert_eq!(metadata.trace.unwrap()["guardrail"], "none");
    }

    #[test]
    fn test_deepseek_prompt_template() {
        assert_eq!(
            deepseek_prompt("Hi"),
            "<｜begin▁of▁sentence｜><｜User｜>Hi<｜Assistant｜><think>\n"
        );

        let request = DeepSeekRequest::new("Hi", 1000, 0.5, 0.5);
        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire["max_tokens"], 1000);
        assert!(wire.get("stop").is_none());
    }

    #[test]
    fn test_deepseek_response_texts() {
        let response: DeepSeekResponse = serde_json::from_value(json!({
            "choices": [{"text": "I can help.", "stop_reason": "stop"}, {"text": "Also this."}]
        }))
        .unwrap();
        assert_eq!(response.texts().collect::<Vec<_>>(), vec!["I can help.", "Also this."]);
    }
}
