//! Bedrock Runtime client.
//!
//! Covers the four runtime operations the samples use: `InvokeModel`,
//! `InvokeModelWithResponseStream`, `Converse` and `ConverseStream`.

mod converse_stream;
mod native;
mod types;

pub use converse_stream::*;
pub use native::*;
pub use types::*;

use crate::config::{AwsService, InferenceConfig};
use crate::credentials::CredentialsProvider;
use crate::error::{InferenceError, RequestError, StreamError};
use crate::streaming::EventStreamMessage;
use crate::transport::{
    event_stream, ServiceRequest, ServiceTransport, EVENT_STREAM_CONTENT_TYPE,
    REQUEST_ID_HEADER,
};
use async_stream::try_stream;
use async_trait::async_trait;
use base64::Engine;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Boxed stream returned by the streaming operations.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T, InferenceError>> + Send + 'a>>;

/// Bedrock Runtime operations.
#[async_trait]
pub trait BedrockRuntimeClient: Send + Sync {
    /// Invoke a model with its native request payload.
    async fn invoke_model(&self, request: InvokeModelRequest) -> Result<InvokeModelResponse, InferenceError>;

    /// Invoke a model and stream its native response chunks.
    fn invoke_model_with_response_stream(&self, request: InvokeModelRequest) -> BoxStream<'_, ResponseChunk>;

    /// Send a conversation through the model-agnostic Converse API.
    async fn converse(&self, request: ConverseRequest) -> Result<ConverseResponse, InferenceError>;

    /// Converse with a streamed response.
    fn converse_stream(&self, request: ConverseRequest) -> BoxStream<'_, ConverseStreamEvent>;
}

/// Bedrock Runtime client over signed HTTP.
pub struct BedrockRuntimeClientImpl {
    transport: ServiceTransport,
}

impl BedrockRuntimeClientImpl {
    /// Create a client with the given configuration and credentials.
    pub fn new(
        config: &InferenceConfig,
        credentials_provider: Arc<dyn CredentialsProvider>,
    ) -> Result<Self, InferenceError> {
        Ok(Self {
            transport: ServiceTransport::new(AwsService::BedrockRuntime, config, credentials_provider)?,
        })
    }

    /// Base URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }
}

fn model_path(model_id: &str, operation: &str) -> String {
    format!("/model/{}/{}", urlencoding::encode(model_id), operation)
}

fn serialize_converse(request: &ConverseRequest) -> Result<Vec<u8>, InferenceError> {
    if request.messages.is_empty() {
        return Err(InferenceError::Request(RequestError::InvalidParameter {
            parameter: "messages".to_string(),
            message: "At least one message is required".to_string(),
        }));
    }
    serde_json::to_vec(request).map_err(|e| {
        InferenceError::Request(RequestError::InvalidParameter {
            parameter: "body".to_string(),
            message: format!("Failed to serialize Converse request: {}", e),
        })
    })
}

#[derive(Deserialize)]
struct ChunkPayload {
    bytes: String,
}

/// Decode a `chunk` frame: `{"bytes": "<base64>"}`.
pub(crate) fn decode_chunk(message: &EventStreamMessage) -> Result<ResponseChunk, InferenceError> {
    let payload: ChunkPayload = message.payload_json().map_err(|e| {
        InferenceError::Stream(StreamError::ParseError {
            message: format!("Invalid chunk event: {}", e),
        })
    })?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.bytes.as_bytes())
        .map_err(|e| {
            InferenceError::Stream(StreamError::ParseError {
                message: format!("Invalid chunk encoding: {}", e),
            })
        })?;
    Ok(ResponseChunk { bytes })
}

#[async_trait]
impl BedrockRuntimeClient for BedrockRuntimeClientImpl {
    #[instrument(skip(self, request), fields(model_id = %request.model_id))]
    async fn invoke_model(&self, request: InvokeModelRequest) -> Result<InvokeModelResponse, InferenceError> {
        debug!(body_size = request.body.len(), "Invoking model");

        let path = model_path(&request.model_id, "invoke");
        let service_request = ServiceRequest::post(path, &request.body)
            .header("content-type", request.content_type.as_str())
            .header("accept", request.accept.as_str())
            .resource(&request.model_id);

        let (headers, body) = self.transport.send_unary(&service_request).await?;

        Ok(InvokeModelResponse {
            metrics: InvocationMetrics::from_headers(&headers),
            content_type: headers.get("content-type").cloned(),
            request_id: headers.get(REQUEST_ID_HEADER).cloned(),
            body,
        })
    }

    fn invoke_model_with_response_stream(&self, request: InvokeModelRequest) -> BoxStream<'_, ResponseChunk> {
        Box::pin(try_stream! {
            debug!(model_id = %request.model_id, "Starting streaming invoke");

            let path = model_path(&request.model_id, "invoke-with-response-stream");
            let service_request = ServiceRequest::post(path, &request.body)
                .header("content-type", request.content_type.as_str())
                .header("x-amzn-bedrock-accept", request.accept.as_str())
                .header("accept", EVENT_STREAM_CONTENT_TYPE)
                .resource(&request.model_id);

            let response = self.transport.send(&service_request).await?;
            let mut events = Box::pin(event_stream(response, self.transport.stream_chunk_timeout()));

            while let Some(message) = events.next().await {
                let message = message?;
                match message.event_type() {
                    Some("chunk") => {
                        let chunk = decode_chunk(&message)?;
                        yield chunk;
                    }
                    other => debug!(event_type = other.unwrap_or("-"), "Skipping non-chunk event"),
                }
            }
        })
    }

    #[instrument(skip(self, request), fields(model_id = %request.model_id))]
    async fn converse(&self, request: ConverseRequest) -> Result<ConverseResponse, InferenceError> {
        let body = serialize_converse(&request)?;
        debug!(messages = request.messages.len(), "Sending Converse request");

        let path = model_path(&request.model_id, "converse");
        let service_request = ServiceRequest::post(path, &body)
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .resource(&request.model_id);

        let (_, body) = self.transport.send_unary(&service_request).await?;

        serde_json::from_slice(&body).map_err(|e| {
            InferenceError::Stream(StreamError::ParseError {
                message: format!("Failed to parse Converse response: {}", e),
            })
        })
    }

    fn converse_stream(&self, request: ConverseRequest) -> BoxStream<'_, ConverseStreamEvent> {
        Box::pin(try_stream! {
            let body = serialize_converse(&request)?;
            debug!(model_id = %request.model_id, messages = request.messages.len(), "Starting ConverseStream");

            let path = model_path(&request.model_id, "converse-stream");
            let service_request = ServiceRequest::post(path, &body)
                .header("content-type", "application/json")
                .header("accept", EVENT_STREAM_CONTENT_TYPE)
                .resource(&request.model_id);

            let response = self.transport.send(&service_request).await?;
            let mut events = Box::pin(event_stream(response, self.transport.stream_chunk_timeout()));

            while let Some(message) = events.next().await {
                let message = message?;
                if let Some(event) = ConverseStreamEvent::from_message(&message)? {
                    yield event;
                }
            }
        })
    }
}

impl std::fmt::Debug for BedrockRuntimeClientImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BedrockRuntimeClientImpl")
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_path_encodes_id() {
        assert_eq!(
            model_path("us.amazon.nova-lite-v1:0", "invoke"),
            "/model/us.amazon.nova-lite-v1%3A0/invoke"
        );
        assert_eq!(
            model_path("arn:aws:bedrock:us-east-1:123:inference-profile/x", "converse"),
            "/model/arn%3Aaws%3Abedrock%3Aus-east-1%3A123%3Ainference-profile%2Fx/converse"
        );
    }

    #[test]
    fn test_decode_chunk() {
        let message = EventStreamMessage::new()
            .with_header(":event-type", "chunk".into())
            .with_payload(&br#"{"bytes":"eyJhIjoxfQ==","p":"abcd"}"#[..]);
        let chunk = decode_chunk(&message).unwrap();
        assert_eq!(chunk.as_str().unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn test_decode_chunk_rejects_bad_base64() {
        let message = EventStreamMessage::new().with_payload(&br#"{"bytes":"***"}"#[..]);
        assert!(matches!(
            decode_chunk(&message),
            Err(InferenceError::Stream(StreamError::ParseError { .. }))
        ));
    }

    #[test]
    fn test_converse_requires_messages() {
        let request = ConverseRequest::new("m", vec![]);
        assert!(matches!(
            serialize_converse(&request),
            Err(InferenceError::Request(RequestError::InvalidParameter { .. }))
        ));
    }
}
