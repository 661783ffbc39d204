//! Request and response types for Bedrock Runtime.
//!
//! Converse types mirror the wire shape: structs use camelCase field names and
//! unions are externally tagged objects such as `{"text": "..."}`.

use crate::document::Document;
use crate::error::{InferenceError, RequestError, StreamError};
use bytes::Bytes;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;

// ============================================================================
// InvokeModel
// ============================================================================

/// Request for `InvokeModel` and `InvokeModelWithResponseStream`.
///
/// The body is the model's native payload, passed through untouched.
#[derive(Debug, Clone)]
pub struct InvokeModelRequest {
    /// Model ID or inference profile ID.
    pub model_id: String,
    /// Native request payload.
    pub body: Bytes,
    /// MIME type of the body.
    pub content_type: String,
    /// Desired MIME type of the response.
    pub accept: String,
}

impl InvokeModelRequest {
    /// Create a request with a raw JSON body.
    pub fn new(model_id: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            model_id: model_id.into(),
            body: body.into(),
            content_type: "application/json".to_string(),
            accept: "application/json".to_string(),
        }
    }

    /// Create a request by serializing a native payload.
    pub fn from_json<T: Serialize>(model_id: impl Into<String>, payload: &T) -> Result<Self, InferenceError> {
        let body = serde_json::to_vec(payload).map_err(|e| {
            InferenceError::Request(RequestError::InvalidParameter {
                parameter: "body".to_string(),
                message: format!("Failed to serialize request: {}", e),
            })
        })?;
        Ok(Self::new(model_id, body))
    }
}

/// Invocation metrics reported in `InvokeModel` response headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationMetrics {
    /// `x-amzn-bedrock-input-token-count`.
    pub input_token_count: Option<u64>,
    /// `x-amzn-bedrock-output-token-count`.
    pub output_token_count: Option<u64>,
    /// `x-amzn-bedrock-invocation-latency`, in milliseconds.
    pub invocation_latency_ms: Option<u64>,
}

impl InvocationMetrics {
    pub(crate) fn from_headers(headers: &HashMap<String, String>) -> Self {
        let number = |name: &str| headers.get(name).and_then(|v| v.trim().parse().ok());
        Self {
            input_token_count: number("x-amzn-bedrock-input-token-count"),
            output_token_count: number("x-amzn-bedrock-output-token-count"),
            invocation_latency_ms: number("x-amzn-bedrock-invocation-latency"),
        }
    }
}

/// Response from `InvokeModel`.
#[derive(Debug, Clone)]
pub struct InvokeModelResponse {
    /// Native response payload.
    pub body: Bytes,
    /// MIME type of the body.
    pub content_type: Option<String>,
    /// Token counts and latency from response headers.
    pub metrics: InvocationMetrics,
    /// AWS request ID.
    pub request_id: Option<String>,
}

impl InvokeModelResponse {
    /// Body as UTF-8 text.
    pub fn body_str(&self) -> Result<&str, InferenceError> {
        std::str::from_utf8(&self.body).map_err(|e| {
            InferenceError::Stream(StreamError::ParseError {
                message: format!("Response body is not UTF-8: {}", e),
            })
        })
    }

    /// Parse the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, InferenceError> {
        serde_json::from_slice(&self.body).map_err(|e| {
            InferenceError::Stream(StreamError::ParseError {
                message: format!("Failed to parse response JSON: {}", e),
            })
        })
    }
}

/// One `chunk` event of `InvokeModelWithResponseStream`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseChunk {
    /// Decoded chunk bytes: the model's native chunk JSON.
    pub bytes: Vec<u8>,
}

impl ResponseChunk {
    /// Chunk as UTF-8 text.
    pub fn as_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.bytes)
    }

    /// Parse the chunk as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.bytes)
    }
}

// ============================================================================
// Converse
// ============================================================================

/// Role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationRole {
    /// User turn.
    User,
    /// Model turn.
    Assistant,
}

/// A conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent the message.
    pub role: ConversationRole,
    /// Message content.
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// A user message with a single text block.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ConversationRole::User,
            content: vec![ContentBlock::Text(text.into())],
        }
    }

    /// An assistant message with a single text block.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ConversationRole::Assistant,
            content: vec![ContentBlock::Text(text.into())],
        }
    }

    /// Text of the first content block, if it is a text block.
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().and_then(ContentBlock::as_text)
    }
}

/// A block of message content.
///
/// Block types this crate does not model are kept as [`ContentBlock::Unknown`]
/// and serialize back unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    /// Plain text.
    Text(String),
    /// A tool call requested by the model.
    ToolUse(ToolUseBlock),
    /// The result of a tool call, sent back by the caller.
    ToolResult(ToolResultBlock),
    /// Model reasoning.
    ReasoningContent(ReasoningContentBlock),
    /// Any other block type, such as `image` or `citationsContent`.
    Unknown {
        /// Wire tag of the block.
        type_name: String,
        /// Block body.
        value: Document,
    },
}

impl Serialize for ContentBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            ContentBlock::Text(text) => map.serialize_entry("text", text)?,
            ContentBlock::ToolUse(block) => map.serialize_entry("toolUse", block)?,
            ContentBlock::ToolResult(block) => map.serialize_entry("toolResult", block)?,
            ContentBlock::ReasoningContent(block) => map.serialize_entry("reasoningContent", block)?,
            ContentBlock::Unknown { type_name, value } => map.serialize_entry(type_name, value)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ContentBlock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = serde_json::Map::<String, Value>::deserialize(deserializer)?;
        if map.len() != 1 {
            return Err(D::Error::custom(format!(
                "content block must have exactly one member, found {}",
                map.len()
            )));
        }

        let (tag, value) = match map.into_iter().next() {
            Some(entry) => entry,
            None => return Err(D::Error::custom("empty content block")),
        };

        let block = match tag.as_str() {
            "text" => serde_json::from_value(value).map(ContentBlock::Text),
            "toolUse" => serde_json::from_value(value).map(ContentBlock::ToolUse),
            "toolResult" => serde_json::from_value(value).map(ContentBlock::ToolResult),
            "reasoningContent" => serde_json::from_value(value).map(ContentBlock::ReasoningContent),
            _ => Ok(ContentBlock::Unknown {
                value: Document::from_value(value),
                type_name: tag,
            }),
        };
        block.map_err(D::Error::custom)
    }
}

impl ContentBlock {
    /// Wire name of the block type.
    pub fn type_name(&self) -> &str {
        match self {
            ContentBlock::Text(_) => "text",
            ContentBlock::ToolUse(_) => "toolUse",
            ContentBlock::ToolResult(_) => "toolResult",
            ContentBlock::ReasoningContent(_) => "reasoningContent",
            ContentBlock::Unknown { type_name, .. } => type_name,
        }
    }

    /// Text, if this is a text block.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Tool use, if this is a tool use block.
    pub fn as_tool_use(&self) -> Option<&ToolUseBlock> {
        match self {
            ContentBlock::ToolUse(tool_use) => Some(tool_use),
            _ => None,
        }
    }
}

/// A tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolUseBlock {
    /// Identifier echoed back in the tool result.
    pub tool_use_id: String,
    /// Tool name.
    pub name: String,
    /// Tool arguments.
    pub input: Document,
}

/// A tool result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultBlock {
    /// The tool use this answers.
    pub tool_use_id: String,
    /// Result content.
    pub content: Vec<ToolResultContentBlock>,
    /// Whether the tool succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ToolResultStatus>,
}

/// Content of a tool result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolResultContentBlock {
    /// Text result.
    Text(String),
    /// Structured result.
    Json(Document),
}

/// Outcome of a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolResultStatus {
    /// Tool succeeded.
    Success,
    /// Tool failed.
    Error,
}

/// Reasoning emitted by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReasoningContentBlock {
    /// Readable reasoning.
    ReasoningText(ReasoningTextBlock),
    /// Encrypted reasoning (base64).
    RedactedContent(String),
}

/// Readable reasoning text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningTextBlock {
    /// Reasoning text.
    pub text: String,
    /// Signature verifying the reasoning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// System prompt content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SystemContentBlock {
    /// System prompt text.
    Text(String),
}

/// Inference parameters for Converse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceConfiguration {
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Stop sequences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
}

impl InferenceConfiguration {
    /// Set maximum tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set top-p.
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }
}

/// Tools available to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfiguration {
    /// Tool definitions.
    pub tools: Vec<Tool>,
    /// How the model must choose a tool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
}

impl ToolConfiguration {
    /// Configuration with the given tools and automatic choice.
    pub fn new(tools: Vec<Tool>) -> Self {
        Self {
            tools,
            tool_choice: None,
        }
    }
}

/// A tool definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tool {
    /// A tool described by name and input schema.
    ToolSpec(ToolSpecification),
}

/// Name, description and input schema of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpecification {
    /// Tool name.
    pub name: String,
    /// What the tool does.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Input schema.
    pub input_schema: ToolInputSchema,
}

/// Tool input schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolInputSchema {
    /// JSON schema as a document.
    Json(Document),
}

/// Tool selection mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolChoice {
    /// The model decides.
    Auto(EmptyChoice),
    /// The model must call some tool.
    Any(EmptyChoice),
    /// The model must call the named tool.
    Tool(SpecificToolChoice),
}

/// Serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyChoice {}

/// A specific tool to call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecificToolChoice {
    /// Tool name.
    pub name: String,
}

/// Request for `Converse` and `ConverseStream`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseRequest {
    /// Model ID; sent in the path.
    #[serde(skip)]
    pub model_id: String,
    /// Conversation so far.
    pub messages: Vec<Message>,
    /// System prompts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<Vec<SystemContentBlock>>,
    /// Inference parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inference_config: Option<InferenceConfiguration>,
    /// Tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfiguration>,
    /// Model-specific fields passed through as-is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_model_request_fields: Option<Document>,
}

impl ConverseRequest {
    /// Create a request with required fields.
    pub fn new(model_id: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model_id: model_id.into(),
            messages,
            system: None,
            inference_config: None,
            tool_config: None,
            additional_model_request_fields: None,
        }
    }

    /// Set a system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(vec![SystemContentBlock::Text(system.into())]);
        self
    }

    /// Set inference parameters.
    pub fn with_inference_config(mut self, config: InferenceConfiguration) -> Self {
        self.inference_config = Some(config);
        self
    }

    /// Set tools.
    pub fn with_tool_config(mut self, config: ToolConfiguration) -> Self {
        self.tool_config = Some(config);
        self
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StopReason {
    /// Natural end of turn.
    EndTurn,
    /// The model wants a tool called.
    ToolUse,
    /// Hit `maxTokens`.
    MaxTokens,
    /// Hit a stop sequence.
    StopSequence,
    /// A guardrail intervened.
    GuardrailIntervened,
    /// Content was filtered.
    ContentFiltered,
    /// A reason this crate does not know about.
    Other(String),
}

impl StopReason {
    /// Wire value.
    pub fn as_str(&self) -> &str {
        match self {
            StopReason::EndTurn => "end_turn",
            StopReason::ToolUse => "tool_use",
            StopReason::MaxTokens => "max_tokens",
            StopReason::StopSequence => "stop_sequence",
            StopReason::GuardrailIntervened => "guardrail_intervened",
            StopReason::ContentFiltered => "content_filtered",
            StopReason::Other(s) => s,
        }
    }
}

impl From<String> for StopReason {
    fn from(value: String) -> Self {
        match value.as_str() {
            "end_turn" => StopReason::EndTurn,
            "tool_use" => StopReason::ToolUse,
            "max_tokens" => StopReason::MaxTokens,
            "stop_sequence" => StopReason::StopSequence,
            "guardrail_intervened" => StopReason::GuardrailIntervened,
            "content_filtered" => StopReason::ContentFiltered,
            _ => StopReason::Other(value),
        }
    }
}

impl From<StopReason> for String {
    fn from(value: StopReason) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token usage of a Converse call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    /// Input tokens.
    #[serde(default)]
    pub input_tokens: u64,
    /// Output tokens.
    #[serde(default)]
    pub output_tokens: u64,
    /// Input plus output.
    #[serde(default)]
    pub total_tokens: u64,
    /// Input tokens read from the prompt cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_input_tokens: Option<u64>,
    /// Input tokens written to the prompt cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_write_input_tokens: Option<u64>,
}

/// Latency of a Converse call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseMetrics {
    /// Milliseconds.
    #[serde(default)]
    pub latency_ms: u64,
}

/// Output of a Converse call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverseOutput {
    /// The generated message.
    #[serde(default)]
    pub message: Option<Message>,
}

/// Response from `Converse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseResponse {
    /// Generated output.
    pub output: ConverseOutput,
    /// Why generation stopped.
    pub stop_reason: StopReason,
    /// Token usage.
    #[serde(default)]
    pub usage: TokenUsage,
    /// Latency.
    #[serde(default)]
    pub metrics: ConverseMetrics,
    /// Model-specific response fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_model_response_fields: Option<Document>,
}

impl ConverseResponse {
    /// The generated message, if any.
    pub fn message(&self) -> Option<&Message> {
        self.output.message.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_unknown_content_block_is_preserved() {
        let raw = json!({
            "role": "assistant",
            "content": [
                {"text": "See the chart."},
                {"image": {"format": "png", "source": {"bytes": "iVBORw0K"}}}
            ]
        });

        let message: Message = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(message.first_text(), Some("See the chart."));
        assert_eq!(message.content[1].type_name(), "image");
        match &message.content[1] {
            ContentBlock::Unknown { value, .. } => {
                assert_eq!(value.get("format").and_then(|d| d.as_str()), Some("png"));
            }
            other => panic!("Expected unknown block, got {:?}", other),
        }

        assert_eq!(serde_json::to_value(&message).unwrap(), raw);
    }

    #[test]
    fn test_content_block_requires_single_member() {
        let result: Result<ContentBlock, _> = serde_json::from_value(json!({"text": "a", "image": {}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_converse_request_wire_shape() {
        let schema = Document::from_value(json!({"type": "object"}));
        let request = ConverseRequest::new("anthropic.claude-3-haiku-20240307-v1:0", vec![Message::user("hi")])
            .with_inference_config(
                InferenceConfiguration::default()
                    .with_max_tokens(512)
                    .with_temperature(0.5)
                    .with_top_p(0.9),
            )
            .with_tool_config(ToolConfiguration::new(vec![Tool::ToolSpec(ToolSpecification {
                name: "queryWeather".into(),
                description: Some("queryWeather".into()),
                input_schema: ToolInputSchema::Json(schema),
            })]));

        // Through text, so f32 fields compare by their printed form.
        let wire: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&request).unwrap()).unwrap();
        assert_eq!(
            wire,
            json!({
                "messages": [{"role": "user", "content": [{"text": "hi"}]}],
                "inferenceConfig": {"maxTokens": 512, "temperature": 0.5, "topP": 0.9},
                "toolConfig": {"tools": [{"toolSpec": {
                    "name": "queryWeather",
                    "description": "queryWeather",
                    "inputSchema": {"json": {"type": "object"}}
                }}]}
            })
        );
    }

    #[test]
    fn test_converse_response_parse() {
        let response: ConverseResponse = serde_json::from_value(json!({
            "output": {"message": {"role": "assistant", "content": [
                {"text": "Let me check."},
                {"toolUse": {"toolUseId": "tooluse_1", "name": "queryWeather",
                             "input": {"latitude": "39.9", "longitude": "116.4"}}}
            ]}},
            "stopReason": "tool_use",
            "usage": {"inputTokens": 10, "outputTokens": 20, "totalTokens": 30},
            "metrics": {"latencyMs": 123}
        }))
        .unwrap();

        let message = response.message().unwrap();
        assert_eq!(message.first_text(), Some("Let me check."));
        assert_eq!(message.content[1].type_name(), "toolUse");
        let tool_use = message.content[1].as_tool_use().unwrap();
        assert_eq!(tool_use.input.get("latitude").and_then(Document::as_str), Some("39.9"));
        assert_eq!(response.stop_reason, StopReason::ToolUse);
        assert_eq!(response.usage.total_tokens, 30);
        assert_eq!(response.metrics.latency_ms, 123);
    }

    #[test]
    fn test_stop_reason_unknown_value() {
        let reason: StopReason = serde_json::from_value(json!("model_context_window_exceeded")).unwrap();
        assert_eq!(reason, StopReason::Other("model_context_window_exceeded".into()));
        assert_eq!(serde_json::to_value(&reason).unwrap(), json!("model_context_window_exceeded"));
    }

    #[test]
    fn test_reasoning_block_shape() {
        let block: ContentBlock = serde_json::from_value(json!({
            "reasoningContent": {"reasoningText": {"text": "thinking", "signature": "sig"}}
        }))
        .unwrap();
        assert_eq!(block.type_name(), "reasoningContent");
        assert_eq!(block.as_text(), None);
    }

    #[test]
    fn test_invocation_metrics_from_headers() {
        let mut headers = HashMap::new();
        headers.insert("x-amzn-bedrock-input-token-count".to_string(), "12".to_string());
        headers.insert("x-amzn-bedrock-invocation-latency".to_string(), "345".to_string());

        let metrics = InvocationMetrics::from_headers(&headers);
        assert_eq!(metrics.input_token_count, Some(12));
        assert_eq!(metrics.output_token_count, None);
        assert_eq!(metrics.invocation_latency_ms, Some(345));
    }

    #[test]
    fn test_tool_choice_shape() {
        let choice = ToolChoice::Auto(EmptyChoice::default());
        assert_eq!(serde_json::to_value(&choice).unwrap(), json!({"auto": {}}));
    }
}
