//! Converse with Claude 3 Haiku and a `queryWeather` tool.

use crate::bedrock::{
    BedrockRuntimeClient, ConverseRequest, InferenceConfiguration, Message, Tool,
    ToolConfiguration, ToolInputSchema, ToolSpecification,
};
use crate::document::Document;
use crate::error::InferenceError;
use std::io::Write;
use tracing::error;

/// Model the sample invokes.
pub const MODEL_ID: &str = "anthropic.claude-3-haiku-20240307-v1:0";

/// User input: "check today's weather".
pub const INPUT_TEXT: &str = "查询今天的天气";

/// Input schema of the weather tool: latitude and longitude strings, both
/// required.
pub const WEATHER_TOOL_SCHEMA: &str = r#"{"type":"object","properties":{"latitude":{"type":"string","description":"纬度"},"longitude":{"type":"string","description":"经度"}},"required":["latitude","longitude"]}"#;

/// Build the `queryWeather` tool from its JSON schema.
pub fn weather_tool() -> Result<Tool, InferenceError> {
    let schema = Document::from_json_str(WEATHER_TOOL_SCHEMA)?;
    Ok(Tool::ToolSpec(ToolSpecification {
        name: "queryWeather".to_string(),
        description: Some("queryWeather".to_string()),
        input_schema: ToolInputSchema::Json(schema),
    }))
}

/// The Converse request: maxTokens 512, temperature 0.5, topP 0.9.
pub fn request() -> Result<ConverseRequest, InferenceError> {
    Ok(ConverseRequest::new(MODEL_ID, vec![Message::user(INPUT_TEXT)])
        .with_tool_config(ToolConfiguration::new(vec![weather_tool()?]))
        .with_inference_config(
            InferenceConfiguration::default()
                .with_max_tokens(512)
                .with_temperature(0.5)
                .with_top_p(0.9),
        ))
}

/// Send the request, print each content block's type and tool use, then
/// the text of the first block.
///
/// Returns that text, or `None` when the first block is not text.
pub async fn converse_with_weather_tool<C, W>(client: &C, out: &mut W) -> Result<Option<String>, InferenceError>
where
    C: BedrockRuntimeClient + ?Sized,
    W: Write,
{
    let request = match request() {
        Ok(request) => request,
        Err(e) => {
            error!("ERROR: Failed to create weather query tool: {}", e);
            return Err(e);
        }
    };

    let response = match client.converse(request).await {
        Ok(response) => response,
        Err(e) => {
            error!("ERROR: Can't invoke '{}'. Reason: {}", MODEL_ID, e);
            return Err(e);
        }
    };

    let content = response.message().map(|m| m.content.as_slice()).unwrap_or_default();
    for block in content {
        writeln!(out, "{}", block.type_name())?;
        match block.as_tool_use() {
            Some(tool_use) => writeln!(
                out,
                "ToolUseBlock(ToolUseId={}, Name={}, Input={})",
                tool_use.tool_use_id, tool_use.name, tool_use.input
            )?,
            None => writeln!(out, "null")?,
        }
    }

    let text = content
        .first()
        .and_then(|block| block.as_text())
        .map(str::to_string);
    writeln!(out, "{}", text.as_deref().unwrap_or("null"))?;

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_weather_tool_wire_shape() {
        let tool = serde_json::to_value(weather_tool().unwrap()).unwrap();
        assert_eq!(
            tool,
            json!({
                "toolSpec": {
                    "name": "queryWeather",
                    "description": "queryWeather",
                    "inputSchema": {
                        "json": {
                            "type": "object",
                            "properties": {
                                "latitude": {"type": "string", "description": "纬度"},
                                "longitude": {"type": "string", "description": "经度"}
                            },
                            "required": ["latitude", "longitude"]
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_request_has_tool_and_config() {
        let request = request().unwrap();
        assert_eq!(request.model_id, MODEL_ID);
        assert_eq!(request.tool_config.as_ref().map(|c| c.tools.len()), Some(1));
        assert_eq!(request.messages[0].first_text(), Some(INPUT_TEXT));
    }
}
