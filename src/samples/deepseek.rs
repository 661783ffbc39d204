//! DeepSeek R1 through `InvokeModel` and through `ConverseStream`.

use super::HELLO_WORLD_PROMPT;
use crate::bedrock::{
    BedrockRuntimeClient, ContentBlockDelta, ConverseRequest, ConverseStreamAccumulator,
    ConverseStreamEvent, DeepSeekRequest, DeepSeekResponse, InferenceConfiguration,
    InvokeModelRequest, Message, ReasoningContentBlockDelta,
};
use crate::error::{InferenceError, StreamError};
use futures::StreamExt;
use std::io::Write;
use tracing::error;

/// Model both flows invoke.
pub const MODEL_ID: &str = "us.deepseek.r1-v1:0";

/// Prompt of the `InvokeModel` flow.
pub const INVOKE_PROMPT: &str = "Hi. In a short paragraph, explain what you can do.";

/// Native request: max_tokens 1000, temperature 0.9, top_p 0.9.
pub fn invoke_request() -> Result<InvokeModelRequest, InferenceError> {
    InvokeModelRequest::from_json(MODEL_ID, &DeepSeekRequest::new(INVOKE_PROMPT, 1000, 0.9, 0.9))
}

/// Converse request: one user message, maxTokens 512, temperature 0.5, topP 0.9.
pub fn converse_request() -> ConverseRequest {
    ConverseRequest::new(MODEL_ID, vec![Message::user(HELLO_WORLD_PROMPT)]).with_inference_config(
        InferenceConfiguration::default()
            .with_max_tokens(512)
            .with_temperature(0.5)
            .with_top_p(0.9),
    )
}

/// Print the banner, invoke the model, print the raw response and each
/// choice's text.
pub async fn invoke_model<C, W>(client: &C, out: &mut W) -> Result<DeepSeekResponse, InferenceError>
where
    C: BedrockRuntimeClient + ?Sized,
    W: Write,
{
    let rule = "=".repeat(35);
    writeln!(out, "{}", rule)?;
    writeln!(out, "Welcome to the Amazon Bedrock demo!")?;
    writeln!(out, "{}", rule)?;
    writeln!(out, "Model: Bedrock DeepSeek Large")?;
    writeln!(out, "Prompt: {}", INVOKE_PROMPT)?;
    writeln!(out, "Invoking model...\n")?;

    let response = match client.invoke_model(invoke_request()?).await {
        Ok(response) => response,
        Err(e) => {
            error!(model_id = MODEL_ID, "Error invoking model: {}", e);
            return Err(e);
        }
    };

    writeln!(out, "Response: {}", response.body_str()?)?;

    let parsed: DeepSeekResponse = response.json()?;
    for text in parsed.texts() {
        writeln!(out, "{}", text)?;
    }

    Ok(parsed)
}

/// Stream a conversation turn, printing reasoning and answer text as they
/// arrive and the metadata event as JSON at the end.
pub async fn converse_stream<C, W>(client: &C, out: &mut W) -> Result<ConverseStreamAccumulator, InferenceError>
where
    C: BedrockRuntimeClient + ?Sized,
    W: Write,
{
    let mut stream = client.converse_stream(converse_request());
    let mut accumulator = ConverseStreamAccumulator::new();

    while let Some(event) = stream.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                error!("ERROR: Can't invoke '{}'. Reason: {}", MODEL_ID, e);
                return Err(e);
            }
        };

        match &event {
            ConverseStreamEvent::ContentBlockDelta(delta) => match &delta.delta {
                ContentBlockDelta::ReasoningContent(ReasoningContentBlockDelta::Text(text))
                | ContentBlockDelta::Text(text) => {
                    write!(out, "{}", text)?;
                    out.flush()?;
                }
                _ => {}
            },
            ConverseStreamEvent::Metadata(metadata) => {
                let json = serde_json::to_string(metadata).map_err(|e| {
                    InferenceError::Stream(StreamError::ParseError {
                        message: format!("Failed to render metadata: {}", e),
                    })
                })?;
                writeln!(out, "\n\nMetadata: {}", json)?;
            }
            _ => {}
        }

        accumulator.apply(&event)?;
    }

    Ok(accumulator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_invoke_request_payload() {
        let request = invoke_request().unwrap();
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(
            body["prompt"],
            "<｜begin▁of▁sentence｜><｜User｜>Hi. In a short paragraph, explain what you can do.<｜Assistant｜><think>\n"
        );
    }

    #[test]
    fn test_converse_request() {
        let request = converse_request();
        assert_eq!(request.model_id, MODEL_ID);
        assert_eq!(request.messages[0].first_text(), Some(HELLO_WORLD_PROMPT));
        assert_eq!(request.inference_config.as_ref().and_then(|c| c.max_tokens), Some(512));
    }
}
