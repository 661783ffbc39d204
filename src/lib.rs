//! AWS inference clients and samples.
//!
//! Thin, typed clients for Amazon Bedrock Runtime and Amazon SageMaker, plus
//! the sample flows built on them: a Nova response stream, DeepSeek R1 through
//! `InvokeModel` and `ConverseStream`, a Claude tool-use conversation, and
//! SageMaker endpoint discovery and invocation.
//!
//! # Features
//!
//! - **Bedrock Runtime**: `InvokeModel`, `InvokeModelWithResponseStream`,
//!   `Converse` and `ConverseStream`
//! - **SageMaker**: `ListEndpoints` with pagination, `InvokeEndpoint`
//! - **Event streams**: AWS binary event-stream framing with CRC checks
//! - **Documents**: schemaless values for tool schemas and tool input
//! - **AWS Signature V4** with environment, properties-file and profile
//!   credentials
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use aws_inference::{BedrockRuntimeClient, ClientBuilder, ConverseRequest, Message};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), aws_inference::InferenceError> {
//!     let client = ClientBuilder::new().from_env().bedrock_runtime()?;
//!
//!     let response = client
//!         .converse(ConverseRequest::new(
//!             "anthropic.claude-3-haiku-20240307-v1:0",
//!             vec![Message::user("Hello!")],
//!         ))
//!         .await?;
//!
//!     if let Some(text) = response.message().and_then(|m| m.first_text()) {
//!         println!("{}", text);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Streaming
//!
//! ```rust,no_run
//! use aws_inference::{BedrockRuntimeClient, ClientBuilder, ContentBlockDelta, ConverseRequest, ConverseStreamEvent, Message};
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), aws_inference::InferenceError> {
//! let client = ClientBuilder::new().from_env().bedrock_runtime()?;
//! let request = ConverseRequest::new("us.deepseek.r1-v1:0", vec![Message::user("Tell me a story")]);
//!
//! let mut stream = client.converse_stream(request);
//! while let Some(event) = stream.next().await {
//!     if let ConverseStreamEvent::ContentBlockDelta(delta) = event? {
//!         if let ContentBlockDelta::Text(text) = delta.delta {
//!             print!("{}", text);
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # SageMaker
//!
//! ```rust,no_run
//! use aws_inference::samples::endpoints::EndpointHandler;
//! use aws_inference::ClientBuilder;
//!
//! # async fn example() -> Result<(), aws_inference::InferenceError> {
//! let builder = ClientBuilder::new().from_properties_file("config.properties")?;
//! let handler = EndpointHandler::from_builder(&builder)?;
//! handler.send_request(None, None).await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod bedrock;
pub mod client;
pub mod config;
pub mod credentials;
pub mod document;
pub mod error;
pub mod logging;
pub mod mocks;
pub mod resilience;
pub mod sagemaker;
pub mod samples;
pub mod signing;
pub mod streaming;
mod transport;

// Clients
pub use bedrock::{BedrockRuntimeClient, BedrockRuntimeClientImpl, BoxStream};
pub use client::ClientBuilder;
pub use sagemaker::{
    SageMakerClient, SageMakerClientImpl, SageMakerRuntimeClient, SageMakerRuntimeClientImpl,
};

// Configuration
pub use config::{AwsService, InferenceConfig, InferenceConfigBuilder, Properties, RetryConfig};

// Credentials
pub use credentials::{
    AwsCredentials, ChainCredentialsProvider, CredentialsProvider, EnvCredentialsProvider,
    ProfileCredentialsProvider, PropertiesCredentialsProvider, StaticCredentialsProvider,
};

// Errors
pub use error::{
    AuthenticationError, ConfigurationError, CredentialsError, InferenceError, ModelError,
    NetworkError, RateLimitError, RequestError, ServerError, StreamError,
};

// Bedrock types
pub use bedrock::{
    ContentBlock, ContentBlockDelta, ConversationRole, ConverseRequest, ConverseResponse,
    ConverseStreamAccumulator, ConverseStreamEvent, InferenceConfiguration, InvokeModelRequest,
    InvokeModelResponse, Message, ResponseChunk, StopReason, TokenUsage, Tool, ToolConfiguration,
    ToolInputSchema, ToolSpecification, ToolUseBlock,
};

// SageMaker types
pub use sagemaker::{
    EndpointStatus, EndpointSummary, InvokeEndpointRequest, InvokeEndpointResponse,
    ListEndpointsRequest, ListEndpointsResponse,
};

// Documents and framing
pub use document::Document;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use resilience::RetryPolicy;
pub use signing::{AwsSigner, RequestSigner, SignedRequest};
pub use streaming::{EventStreamMessage, EventStreamParser, HeaderValue};

/// Result type alias for inference operations.
pub type Result<T> = std::result::Result<T, InferenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        let _ = std::any::type_name::<InferenceError>();
        let _ = std::any::type_name::<InferenceConfig>();
        let _ = std::any::type_name::<AwsCredentials>();
        let _ = std::any::type_name::<ConverseRequest>();
        let _ = std::any::type_name::<InvokeEndpointRequest>();
        let _ = std::any::type_name::<Document>();
    }

    #[test]
    fn test_message_helpers() {
        let user = Message::user("Hello");
        assert_eq!(user.role, ConversationRole::User);
        assert_eq!(user.first_text(), Some("Hello"));

        let assistant = Message::assistant("Hi there!");
        assert_eq!(assistant.role, ConversationRole::Assistant);
    }
}
