//! `ConverseStream` events and their accumulation into a message.

use super::types::{
    ContentBlock, ConversationRole, ConverseMetrics, Message, ReasoningContentBlock,
    ReasoningTextBlock, StopReason, TokenUsage, ToolUseBlock,
};
use crate::document::Document;
use crate::error::{InferenceError, StreamError};
use crate::streaming::EventStreamMessage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// An event of a `ConverseStream` response.
#[derive(Debug, Clone, PartialEq)]
pub enum ConverseStreamEvent {
    /// The assistant message begins.
    MessageStart(MessageStartEvent),
    /// A content block begins. Only tool use blocks announce themselves.
    ContentBlockStart(ContentBlockStartEvent),
    /// Incremental content.
    ContentBlockDelta(ContentBlockDeltaEvent),
    /// A content block is complete.
    ContentBlockStop(ContentBlockStopEvent),
    /// The message is complete.
    MessageStop(MessageStopEvent),
    /// Usage and latency, sent last.
    Metadata(ConverseStreamMetadataEvent),
}

impl ConverseStreamEvent {
    /// Decode an event frame. Unknown event types yield `None`.
    pub fn from_message(message: &EventStreamMessage) -> Result<Option<Self>, InferenceError> {
        let event_type = match message.event_type() {
            Some(event_type) => event_type,
            None => return Ok(None),
        };

        let event = match event_type {
            "messageStart" => ConverseStreamEvent::MessageStart(decode(message)?),
            "contentBlockStart" => ConverseStreamEvent::ContentBlockStart(decode(message)?),
            "contentBlockDelta" => ConverseStreamEvent::ContentBlockDelta(decode(message)?),
            "contentBlockStop" => ConverseStreamEvent::ContentBlockStop(decode(message)?),
            "messageStop" => ConverseStreamEvent::MessageStop(decode(message)?),
            "metadata" => ConverseStreamEvent::Metadata(decode(message)?),
            other => {
                debug!(event_type = other, "Ignoring unknown converse stream event");
                return Ok(None);
            }
        };

        Ok(Some(event))
    }
}

fn decode<T: serde::de::DeserializeOwned>(message: &EventStreamMessage) -> Result<T, InferenceError> {
    message.payload_json().map_err(|e| {
        InferenceError::Stream(StreamError::ParseError {
            message: format!(
                "Invalid {} event: {}",
                message.event_type().unwrap_or("unknown"),
                e
            ),
        })
    })
}

/// `messageStart` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageStartEvent {
    /// Role of the message being generated.
    pub role: ConversationRole,
}

/// `contentBlockStart` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlockStartEvent {
    /// Block index within the message.
    pub content_block_index: u32,
    /// What kind of block starts.
    pub start: ContentBlockStart,
}

/// Start of a content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentBlockStart {
    /// A tool call begins.
    ToolUse(ToolUseBlockStart),
}

/// Tool call identity, sent before its input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolUseBlockStart {
    /// Tool use ID.
    pub tool_use_id: String,
    /// Tool name.
    pub name: String,
}

/// `contentBlockDelta` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlockDeltaEvent {
    /// Block index within the message.
    pub content_block_index: u32,
    /// The increment.
    pub delta: ContentBlockDelta,
}

/// Incremental block content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentBlockDelta {
    /// Text fragment.
    Text(String),
    /// Fragment of the tool input JSON.
    ToolUse(ToolUseBlockDelta),
    /// Reasoning fragment.
    ReasoningContent(ReasoningContentBlockDelta),
}

/// Tool input fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUseBlockDelta {
    /// Partial JSON text.
    pub input: String,
}

/// Reasoning fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReasoningContentBlockDelta {
    /// Reasoning text.
    Text(String),
    /// Signature over the reasoning.
    Signature(String),
    /// Encrypted reasoning.
    RedactedContent(String),
}

/// `contentBlockStop` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlockStopEvent {
    /// Block index within the message.
    pub content_block_index: u32,
}

/// `messageStop` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageStopEvent {
    /// Why generation stopped.
    pub stop_reason: StopReason,
    /// Model-specific fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_model_response_fields: Option<Document>,
}

/// `metadata` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverseStreamMetadataEvent {
    /// Token usage.
    #[serde(default)]
    pub usage: TokenUsage,
    /// Latency.
    #[serde(default)]
    pub metrics: ConverseMetrics,
    /// Guardrail trace, when enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Document>,
}

#[derive(Debug, Clone, PartialEq)]
enum BlockState {
    Text(String),
    Reasoning {
        text: String,
        signature: Option<String>,
        redacted: Option<String>,
    },
    ToolUse {
        tool_use_id: String,
        name: String,
        input: String,
        parsed: Option<Document>,
    },
}

/// Collects stream events into the complete assistant message.
#[derive(Debug, Clone, Default)]
pub struct ConverseStreamAccumulator {
    role: Option<ConversationRole>,
    blocks: BTreeMap<u32, BlockState>,
    stop_reason: Option<StopReason>,
    usage: Option<TokenUsage>,
    metrics: Option<ConverseMetrics>,
}

impl ConverseStreamAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event.
    ///
    /// Fails when a tool use block stops with input that is not valid JSON.
    pub fn apply(&mut self, event: &ConverseStreamEvent) -> Result<(), InferenceError> {
        match event {
            ConverseStreamEvent::MessageStart(start) => self.role = Some(start.role),
            ConverseStreamEvent::ContentBlockStart(start) => {
                let ContentBlockStart::ToolUse(tool) = &start.start;
                self.blocks.insert(
                    start.content_block_index,
                    BlockState::ToolUse {
                        tool_use_id: tool.tool_use_id.clone(),
                        name: tool.name.clone(),
                        input: String::new(),
                        parsed: None,
                    },
                );
            }
            ConverseStreamEvent::ContentBlockDelta(delta) => {
                self.apply_delta(delta.content_block_index, &delta.delta)
            }
            ConverseStreamEvent::ContentBlockStop(stop) => {
                if let Some(BlockState::ToolUse { input, parsed, .. }) =
                    self.blocks.get_mut(&stop.content_block_index)
                {
                    *parsed = Some(parse_tool_input(input)?);
                }
            }
            ConverseStreamEvent::MessageStop(stop) => {
                self.stop_reason = Some(stop.stop_reason.clone())
            }
            ConverseStreamEvent::Metadata(metadata) => {
                self.usage = Some(metadata.usage.clone());
                self.metrics = Some(metadata.metrics.clone());
            }
        }
        Ok(())
    }

    fn apply_delta(&mut self, index: u32, delta: &ContentBlockDelta) {
        match delta {
            ContentBlockDelta::Text(fragment) => {
                if let BlockState::Text(text) = self
                    .blocks
                    .entry(index)
                    .or_insert_with(|| BlockState::Text(String::new()))
                {
                    text.push_str(fragment);
                }
            }
            ContentBlockDelta::ToolUse(fragment) => {
                if let Some(BlockState::ToolUse { input, .. }) = self.blocks.get_mut(&index) {
                    input.push_str(&fragment.input);
                }
            }
            ContentBlockDelta::ReasoningContent(reasoning) => {
                let state = self.blocks.entry(index).or_insert_with(|| BlockState::Reasoning {
                    text: String::new(),
                    signature: None,
                    redacted: None,
                });
                if let BlockState::Reasoning {
                    text,
                    signature,
                    redacted,
                } = state
                {
                    match reasoning {
                        ReasoningContentBlockDelta::Text(fragment) => text.push_str(fragment),
                        ReasoningContentBlockDelta::Signature(sig) => *signature = Some(sig.clone()),
                        ReasoningContentBlockDelta::RedactedContent(data) => {
                            redacted.get_or_insert_with(String::new).push_str(data)
                        }
                    }
                }
            }
        }
    }

    /// All output text so far.
    pub fn text(&self) -> String {
        self.blocks
            .values()
            .filter_map(|block| match block {
                BlockState::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// All reasoning text so far.
    pub fn reasoning_text(&self) -> String {
        self.blocks
            .values()
            .filter_map(|block| match block {
                BlockState::Reasoning { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Completed tool calls.
    pub fn tool_uses(&self) -> Vec<ToolUseBlock> {
        self.blocks
            .values()
            .filter_map(|block| match block {
                BlockState::ToolUse {
                    tool_use_id,
                    name,
                    parsed: Some(input),
                    ..
                } => Some(ToolUseBlock {
                    tool_use_id: tool_use_id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Stop reason, once `messageStop` arrived.
    pub fn stop_reason(&self) -> Option<&StopReason> {
        self.stop_reason.as_ref()
    }

    /// Usage, once `metadata` arrived.
    pub fn usage(&self) -> Option<&TokenUsage> {
        self.usage.as_ref()
    }

    /// Latency, once `metadata` arrived.
    pub fn metrics(&self) -> Option<&ConverseMetrics> {
        self.metrics.as_ref()
    }

    /// Assemble the message, blocks in index order.
    ///
    /// Tool use blocks that never stopped are left out.
    pub fn into_message(self) -> Message {
        let content = self
            .blocks
            .into_values()
            .filter_map(|block| match block {
                BlockState::Text(text) => Some(ContentBlock::Text(text)),
                BlockState::Reasoning {
                    redacted: Some(data),
                    ..
                } => Some(ContentBlock::ReasoningContent(
                    ReasoningContentBlock::RedactedContent(data),
                )),
                BlockState::Reasoning {
                    text, signature, ..
                } => Some(ContentBlock::ReasoningContent(
                    ReasoningContentBlock::ReasoningText(ReasoningTextBlock { text, signature }),
                )),
                BlockState::ToolUse {
                    tool_use_id,
                    name,
                    parsed: Some(input),
                    ..
                } => Some(ContentBlock::ToolUse(ToolUseBlock {
                    tool_use_id,
                    name,
                    input,
                })),
                BlockState::ToolUse { .. } => None,
            })
            .collect();

        Message {
            role: self.role.unwrap_or(ConversationRole::Assistant),
            content,
        }
    }
}

fn parse_tool_input(input: &str) -> Result<Document, InferenceError> {
    if input.trim().is_empty() {
        return Ok(Document::Object(BTreeMap::new()));
    }
    Document::from_json_str(input).map_err(|e| {
        InferenceError::Stream(StreamError::ParseError {
            message: format!("Invalid tool input: {}", e),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::HeaderValue;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn event(event_type: &str, payload: serde_json::Value) -> ConverseStreamEvent {
        let message = EventStreamMessage::new()
            .with_header(":event-type", HeaderValue::from(event_type))
            .with_header(":message-type", "event".into())
            .with_payload(payload.to_string());
        ConverseStreamEvent::from_message(&message).unwrap().unwrap()
    }

    #[test]
    fn test_decode_events() {
        assert_eq!(
            event("messageStart", json!({"role": "assistant", "p": "abc"})),
            ConverseStreamEvent::MessageStart(MessageStartEvent {
                role: ConversationRole::Assistant
            })
        );

        match event(
            "contentBlockDelta",
            json!({"contentBlockIndex": 0, "delta": {"reasoningContent": {"text": "hmm"}}}),
        ) {
            ConverseStreamEvent::ContentBlockDelta(delta) => assert_eq!(
                delta.delta,
                ContentBlockDelta::ReasoningContent(ReasoningContentBlockDelta::Text("hmm".into()))
            ),
            other => panic!("Unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_unknown_event_is_skipped() {
        let message = EventStreamMessage::new()
            .with_header(":event-type", "somethingNew".into())
            .with_payload(&b"{}"[..]);
        assert!(ConverseStreamEvent::from_message(&message).unwrap().is_none());
    }

    #[test]
    fn test_malformed_event_is_parse_error() {
        let message = EventStreamMessage::new()
            .with_header(":event-type", "contentBlockStop".into())
            .with_payload(&b"{}"[..]);
        assert!(matches!(
            ConverseStreamEvent::from_message(&message),
            Err(InferenceError::Stream(StreamError::ParseError { .. }))
        ));
    }

    #[test]
    fn test_accumulate_reasoning_text_and_tool_use() {
        let events = vec![
            event("messageStart", json!({"role": "assistant"})),
            event("contentBlockDelta", json!({"contentBlockIndex": 0, "delta": {"reasoningContent": {"text": "Need "}}})),
            event("contentBlockDelta", json!({"contentBlockIndex": 0, "delta": {"reasoningContent": {"text": "weather."}}})),
            event("contentBlockDelta", json!({"contentBlockIndex": 0, "delta": {"reasoningContent": {"signature": "sig"}}})),
            event("contentBlockStop", json!({"contentBlockIndex": 0})),
            event("contentBlockDelta", json!({"contentBlockIndex": 1, "delta": {"text": "Checking"}})),
            event("contentBlockDelta", json!({"contentBlockIndex": 1, "delta": {"text": " now."}})),
            event("contentBlockStop", json!({"contentBlockIndex": 1})),
            event("contentBlockStart", json!({"contentBlockIndex": 2, "start": {"toolUse": {"toolUseId": "t-1", "name": "queryWeather"}}})),
            event("contentBlockDelta", json!({"contentBlockIndex": 2, "delta": {"toolUse": {"input": "{\"latitude\":"}}})),
            event("contentBlockDelta", json!({"contentBlockIndex": 2, "delta": {"toolUse": {"input": "\"39.9\"}"}}})),
            event("contentBlockStop", json!({"contentBlockIndex": 2})),
            event("messageStop", json!({"stopReason": "tool_use"})),
            event("metadata", json!({"usage": {"inputTokens": 5, "outputTokens": 7, "totalTokens": 12}, "metrics": {"latencyMs": 99}})),
        ];

        let mut acc = ConverseStreamAccumulator::new();
        for e in &events {
            acc.apply(e).unwrap();
        }

        assert_eq!(acc.text(), "Checking now.");
        assert_eq!(acc.reasoning_text(), "Need weather.");
        assert_eq!(acc.stop_reason(), Some(&StopReason::ToolUse));
        assert_eq!(acc.usage().unwrap().total_tokens, 12);
        assert_eq!(acc.metrics().unwrap().latency_ms, 99);

        let tools = acc.tool_uses();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].input.get("latitude").and_then(Document::as_str), Some("39.9"));

        let message = acc.into_message();
        let types: Vec<_> = message.content.iter().map(ContentBlock::type_name).collect();
        assert_eq!(types, vec!["reasoningContent", "text", "toolUse"]);
        match &message.content[0] {
            ContentBlock::ReasoningContent(ReasoningContentBlock::ReasoningText(block)) => {
                assert_eq!(block.signature.as_deref(), Some("sig"));
            }
            other => panic!("Unexpected block {:?}", other),
        }
    }

    #[test]
    fn test_empty_tool_input_is_empty_object() {
        let mut acc = ConverseStreamAccumulator::new();
        acc.apply(&event("contentBlockStart", json!({"contentBlockIndex": 0, "start": {"toolUse": {"toolUseId": "t", "name": "noArgs"}}})))
            .unwrap();
        acc.apply(&event("contentBlockStop", json!({"contentBlockIndex": 0}))).unwrap();
        assert_eq!(acc.tool_uses()[0].input, Document::Object(BTreeMap::new()));
    }

    #[test]
    fn test_invalid_tool_input_fails_at_stop() {
        let mut acc = ConverseStreamAccumulator::new();
        acc.apply(&event("contentBlockStart", json!({"contentBlockIndex": 0, "start": {"toolUse": {"toolUseId": "t", "name": "x"}}})))
            .unwrap();
        acc.apply(&event("contentBlockDelta", json!({"contentBlockIndex": 0, "delta": {"toolUse": {"input": "{\"a\""}}})))
            .unwrap();
        assert!(acc.apply(&event("contentBlockStop", json!({"contentBlockIndex": 0}))).is_err());
    }

    #[test]
    fn test_metadata_serializes_for_display() {
        let metadata = match event(
            "metadata",
            json!({"usage": {"inputTokens": 1, "outputTokens": 2, "totalTokens": 3}, "metrics": {"latencyMs": 4}}),
        ) {
            ConverseStreamEvent::Metadata(m) => m,
            other => panic!("Unexpected event {:?}", other),
        };
        assert_eq!(
            serde_json::to_string(&metadata).unwrap(),
            r#"{"usage":{"inputTokens":1,"outputTokens":2,"totalTokens":3},"metrics":{"latencyMs":4}}"#
        );
    }
}
