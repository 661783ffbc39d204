//! Stream a Nova Lite answer through `InvokeModelWithResponseStream`.

use super::{display_value, HELLO_WORLD_PROMPT};
use crate::bedrock::{
    BedrockRuntimeClient, InvokeModelRequest, NovaChunk, NovaInferenceConfig, NovaMetadata,
    NovaRequest,
};
use crate::error::InferenceError;
use futures::StreamExt;
use serde_json::Value;
use std::io::Write;
use tracing::{debug, error, warn};

/// Model the sample invokes.
pub const MODEL_ID: &str = "us.amazon.nova-lite-v1:0";

/// The fixed native request: one user turn, maxTokens 500, temperature 0.7,
/// topP 0.9, topK 20.
pub fn request() -> Result<InvokeModelRequest, InferenceError> {
    let payload = NovaRequest::user_text(
        HELLO_WORLD_PROMPT,
        NovaInferenceConfig {
            max_tokens: Some(500),
            temperature: Some(0.7),
            top_p: Some(0.9),
            top_k: Some(20),
        },
    );
    InvokeModelRequest::from_json(MODEL_ID, &payload)
}

/// Print text deltas as they arrive and the metadata block at the end.
///
/// Returns the complete generated text. Chunks that are not valid JSON are
/// logged and skipped; a failed stream is logged and returned as the error.
pub async fn invoke_model_with_response_stream<C, W>(client: &C, out: &mut W) -> Result<String, InferenceError>
where
    C: BedrockRuntimeClient + ?Sized,
    W: Write,
{
    let mut stream = client.invoke_model_with_response_stream(request()?);
    let mut complete = String::new();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                error!(model_id = MODEL_ID, "Can't invoke model: {}", e);
                return Err(e);
            }
        };

        let json: Value = match chunk.json() {
            Ok(json) => json,
            Err(e) => {
                warn!("Error processing response chunk: {}", e);
                continue;
            }
        };

        match NovaChunk::classify(&json) {
            NovaChunk::TextDelta(text) => {
                write!(out, "{}", text)?;
                out.flush()?;
                complete.push_str(&text);
            }
            NovaChunk::Metadata(metadata) => write_metadata(out, &metadata)?,
            NovaChunk::Other => debug!("Ignoring chunk without text or metadata"),
        }
    }

    writeln!(out, "\n--- Complete response received ---")?;
    Ok(complete)
}

/// Print the `=== METADATA INFORMATION ===` block. Absent values are left out.
pub fn write_metadata<W: Write>(out: &mut W, metadata: &NovaMetadata) -> std::io::Result<()> {
    writeln!(out, "\n\n=== METADATA INFORMATION ===")?;

    if let Some(usage) = &metadata.usage {
        writeln!(out, "Usage Information:")?;
        line(out, "Input Tokens", usage.input_tokens, "")?;
        line(out, "Output Tokens", usage.output_tokens, "")?;
        line(out, "Cache Read Input Tokens", usage.cache_read_input_token_count, "")?;
        line(out, "Cache Write Input Tokens", usage.cache_write_input_token_count, "")?;
    }

    if let Some(metrics) = &metadata.invocation_metrics {
        writeln!(out, "\nInvocation Metrics:")?;
        line(out, "Input Token Count", metrics.input_token_count, "")?;
        line(out, "Output Token Count", metrics.output_token_count, "")?;
        line(out, "Invocation Latency", metrics.invocation_latency, "ms")?;
        line(out, "First Byte Latency", metrics.first_byte_latency, "ms")?;
        line(out, "Cache Read Input Token Count", metrics.cache_read_input_token_count, "")?;
        line(out, "Cache Write Input Token Count", metrics.cache_write_input_token_count, "")?;
    }

    if let Some(metrics) = &metadata.metrics {
        writeln!(out, "\nAdditional Metrics:")?;
        for (key, value) in metrics {
            writeln!(out, "- {}: {}", key, display_value(value))?;
        }
    }

    if let Some(trace) = &metadata.trace {
        writeln!(out, "\nTrace Information:")?;
        for (key, value) in trace {
            writeln!(out, "- {}: {}", key, display_value(value))?;
        }
    }

    writeln!(out, "===========================")
}

fn line<W: Write>(out: &mut W, label: &str, value: Option<u64>, unit: &str) -> std::io::Result<()> {
    match value {
        Some(value) => writeln!(out, "- {}: {}{}", label, value, unit),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_request_payload() {
        let request = request().unwrap();
        assert_eq!(request.model_id, MODEL_ID);

        let body: Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body["schemaVersion"], "messages-v1");
        assert_eq!(body["inferenceConfig"]["maxTokens"], 500);
        assert_eq!(body["inferenceConfig"]["topK"], 20);
        assert_eq!(body["messages"][0]["content"][0]["text"], HELLO_WORLD_PROMPT);
    }

    #[test]
    fn test_write_metadata_full() {
        let chunk = json!({
            "metadata": {
                "usage": {
                    "inputTokens": 18,
                    "outputTokens": 25,
                    "cacheReadInputTokenCount": 0,
                    "cacheWriteInputTokenCount": 0
                },
                "metrics": {},
                "trace": {"guardrail": "none"}
            },
            "amazon-bedrock-invocationMetrics": {
                "inputTokenCount": 18,
                "outputTokenCount": 25,
                "invocationLatency": 412,
                "firstByteLatency": 180,
                "cacheReadInputTokenCount": 0,
                "cacheWriteInputTokenCount": 0
            }
        });
        let metadata = match NovaChunk::classify(&chunk) {
            NovaChunk::Metadata(m) => m,
            other => panic!("Unexpected chunk {:?}", other),
        };

        let mut out = Vec::new();
        write_metadata(&mut out, &metadata).unwrap();

        let expected = "\n\n=== METADATA INFORMATION ===\n\
Usage Information:\n\
- Input Tokens: 18\n\
- Output Tokens: 25\n\
- Cache Read Input Tokens: 0\n\
- Cache Write Input Tokens: 0\n\
\n\
Invocation Metrics:\n\
- Input Token Count: 18\n\
- Output Token Count: 25\n\
- Invocation Latency: 412ms\n\
- First Byte Latency: 180ms\n\
- Cache Read Input Token Count: 0\n\
- Cache Write Input Token Count: 0\n\
\n\
Trace Information:\n\
- guardrail: none\n\
===========================\n";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_write_metadata_skips_missing_fields() {
        let metadata = match NovaChunk::classify(&json!({"metadata": {"usage": {"inputTokens": 3}}})) {
            NovaChunk::Metadata(m) => m,
            other => panic!("Unexpected chunk {:?}", other),
        };

        let mut out = Vec::new();
        write_metadata(&mut out, &metadata).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\n\n=== METADATA INFORMATION ===\nUsage Information:\n- Input Tokens: 3\n===========================\n"
        );
    }
}
