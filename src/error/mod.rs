//! Error types for the AWS inference clients.
//!
//! Errors are categorized by their source and nature so callers can decide
//! whether to retry, surface a configuration problem, or report a model fault.

mod mapping;

pub use mapping::{
    map_exception_frame, map_http_error, parse_error_type, parse_retry_after, ErrorBody,
};

use std::time::Duration;
use thiserror::Error;

/// Top-level error type for Bedrock and SageMaker operations.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Credential-related errors.
    #[error("Credentials error: {0}")]
    Credentials(#[from] CredentialsError),

    /// Authentication and authorization errors.
    #[error("Authentication error: {0}")]
    Authentication(#[from] AuthenticationError),

    /// Model or endpoint errors.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Request validation errors.
    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    /// Rate limiting errors.
    #[error("Rate limit error: {0}")]
    RateLimit(#[from] RateLimitError),

    /// Server-side errors.
    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    /// Streaming errors.
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    /// Network errors.
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Writing sample output failed.
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

impl InferenceError {
    /// Returns true if the error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            InferenceError::RateLimit(_) => true,
            InferenceError::Server(e) => e.is_retryable(),
            InferenceError::Network(e) => e.is_retryable(),
            InferenceError::Model(ModelError::NotReady { .. }) => true,
            _ => false,
        }
    }

    /// Returns the retry delay hint if available.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            InferenceError::RateLimit(RateLimitError::TooManyRequests { retry_after, .. }) => {
                *retry_after
            }
            InferenceError::Server(ServerError::ServiceUnavailable { retry_after, .. }) => {
                *retry_after
            }
            _ => None,
        }
    }

    /// Replace the retry delay hint of throttling and unavailable errors.
    ///
    /// Other errors are returned unchanged.
    pub fn with_retry_after(mut self, delay: Duration) -> Self {
        match &mut self {
            InferenceError::RateLimit(RateLimitError::TooManyRequests { retry_after, .. })
            | InferenceError::Server(ServerError::ServiceUnavailable { retry_after, .. }) => {
                *retry_after = Some(delay);
            }
            _ => {}
        }
        self
    }

    /// Returns the HTTP status code if applicable.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            InferenceError::Request(RequestError::UnsupportedValue { .. }) => None,
            InferenceError::Request(RequestError::InvalidParameter { .. }) => None,
            InferenceError::Request(_) => Some(400),
            InferenceError::Authentication(_) => Some(403),
            InferenceError::Model(ModelError::NotFound { .. }) => Some(404),
            InferenceError::Model(ModelError::NotAccessible { .. }) => Some(403),
            InferenceError::Model(ModelError::NotReady { .. }) => Some(429),
            InferenceError::Model(ModelError::Timeout { .. }) => Some(408),
            InferenceError::Model(ModelError::InvocationFailed { .. }) => Some(424),
            InferenceError::RateLimit(_) => Some(429),
            InferenceError::Server(ServerError::InternalError { .. }) => Some(500),
            InferenceError::Server(ServerError::ServiceUnavailable { .. }) => Some(503),
            _ => None,
        }
    }

    /// Returns the AWS error code if available.
    pub fn aws_error_code(&self) -> Option<&str> {
        match self {
            InferenceError::Model(e) => Some(e.code()),
            InferenceError::Authentication(e) => Some(e.code()),
            InferenceError::RateLimit(e) => Some(e.code()),
            InferenceError::Server(e) => Some(e.code()),
            _ => None,
        }
    }

    /// Returns the AWS request ID if available.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            InferenceError::Model(e) => e.request_id(),
            InferenceError::Authentication(e) => e.request_id(),
            InferenceError::RateLimit(e) => e.request_id(),
            InferenceError::Server(e) => e.request_id(),
            InferenceError::Request(e) => e.request_id(),
            InferenceError::Stream(e) => e.request_id(),
            _ => None,
        }
    }
}

/// Configuration-related errors.
#[derive(Debug, Clone, Error)]
pub enum ConfigurationError {
    /// Missing required region configuration.
    #[error("Missing region: region must be specified via config, properties file or environment")]
    MissingRegion,

    /// Missing required credentials.
    #[error("Missing credentials: credentials must be specified via config or environment")]
    MissingCredentials,

    /// A required key is absent from a properties file.
    #[error("Property '{key}' not set in {path}")]
    MissingProperty {
        /// The property key.
        key: String,
        /// The file that was read.
        path: String,
    },

    /// A properties file could not be read.
    #[error("Unable to read properties file {path}: {message}")]
    PropertiesFile {
        /// The file that was read.
        path: String,
        /// Error message.
        message: String,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {field} - {message}")]
    InvalidConfiguration {
        /// The configuration field name.
        field: String,
        /// Error message.
        message: String,
    },

    /// Region string is not a valid AWS region.
    #[error("Region '{region}' is not a valid AWS region")]
    InvalidRegion {
        /// The rejected region.
        region: String,
    },
}

/// Credential-related errors.
#[derive(Debug, Error)]
pub enum CredentialsError {
    /// No credentials could be found.
    #[error("Credentials not found: no credentials could be loaded from any source")]
    NotFound,

    /// Credentials have expired.
    #[error("Credentials expired: session credentials expired at {expiration}")]
    Expired {
        /// When the credentials expired.
        expiration: String,
    },

    /// Credentials are invalid.
    #[error("Invalid credentials: {message}")]
    Invalid {
        /// Details about why credentials are invalid.
        message: String,
    },
}

/// Authentication and authorization errors.
#[derive(Debug, Error)]
pub enum AuthenticationError {
    /// Access denied by IAM policy.
    #[error("Access denied: {}", .message.as_deref().unwrap_or("no message"))]
    AccessDenied {
        /// Error message.
        message: Option<String>,
        /// AWS request ID.
        request_id: Option<String>,
    },

    /// Invalid signature.
    #[error("Signature verification failed")]
    SignatureError {
        /// AWS request ID.
        request_id: Option<String>,
    },

    /// Expired token.
    #[error("Token has expired")]
    ExpiredToken {
        /// AWS request ID.
        request_id: Option<String>,
    },
}

impl AuthenticationError {
    /// Returns the AWS error code.
    pub fn code(&self) -> &str {
        match self {
            AuthenticationError::AccessDenied { .. } => "AccessDeniedException",
            AuthenticationError::SignatureError { .. } => "SignatureDoesNotMatch",
            AuthenticationError::ExpiredToken { .. } => "ExpiredTokenException",
        }
    }

    /// Returns the AWS request ID if available.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            AuthenticationError::AccessDenied { request_id, .. }
            | AuthenticationError::SignatureError { request_id }
            | AuthenticationError::ExpiredToken { request_id } => request_id.as_deref(),
        }
    }
}

/// Model and endpoint errors.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Model or endpoint not found.
    #[error("Resource not found: '{resource}'")]
    NotFound {
        /// The model ID or endpoint name.
        resource: String,
        /// AWS request ID.
        request_id: Option<String>,
    },

    /// Model not accessible in region.
    #[error("Model '{model_id}' is not accessible in region '{region}'")]
    NotAccessible {
        /// The model ID.
        model_id: String,
        /// The AWS region.
        region: String,
        /// AWS request ID.
        request_id: Option<String>,
    },

    /// Model not ready to serve requests.
    #[error("Model not ready: '{resource}'")]
    NotReady {
        /// The model ID or endpoint name.
        resource: String,
        /// AWS request ID.
        request_id: Option<String>,
    },

    /// Model took too long to respond.
    #[error("Model timed out: {message}")]
    Timeout {
        /// Error message.
        message: String,
        /// AWS request ID.
        request_id: Option<String>,
    },

    /// The hosted model container returned an error.
    #[error(
        "Model invocation failed{}: {}",
        .original_status_code.map(|c| format!(" with status {}", c)).unwrap_or_default(),
        .original_message.as_deref().unwrap_or("no message")
    )]
    InvocationFailed {
        /// Status code returned by the model container.
        original_status_code: Option<u16>,
        /// Message returned by the model container.
        original_message: Option<String>,
        /// CloudWatch log stream of the container.
        log_stream_arn: Option<String>,
        /// AWS request ID.
        request_id: Option<String>,
    },
}

impl ModelError {
    /// Returns the AWS error code.
    pub fn code(&self) -> &str {
        match self {
            ModelError::NotFound { .. } => "ResourceNotFoundException",
            ModelError::NotAccessible { .. } => "AccessDeniedException",
            ModelError::NotReady { .. } => "ModelNotReadyException",
            ModelError::Timeout { .. } => "ModelTimeoutException",
            ModelError::InvocationFailed { .. } => "ModelError",
        }
    }

    /// Returns the AWS request ID if available.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            ModelError::NotFound { request_id, .. }
            | ModelError::NotAccessible { request_id, .. }
            | ModelError::NotReady { request_id, .. }
            | ModelError::Timeout { request_id, .. }
            | ModelError::InvocationFailed { request_id, .. } => request_id.as_deref(),
        }
    }
}

/// Request validation errors.
#[derive(Debug, Error)]
pub enum RequestError {
    /// General validation error.
    #[error("Validation error: {message}")]
    Validation {
        /// Details about the validation error.
        message: String,
        /// AWS request ID.
        request_id: Option<String>,
    },

    /// Invalid request parameter, caught before sending.
    #[error("Invalid parameter '{parameter}': {message}")]
    InvalidParameter {
        /// The invalid parameter name.
        parameter: String,
        /// Error message.
        message: String,
    },

    /// A value cannot be represented as a document.
    #[error("Unsupported value type: {type_name}")]
    UnsupportedValue {
        /// Name of the rejected type.
        type_name: String,
    },
}

impl RequestError {
    /// Returns the AWS request ID if available.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            RequestError::Validation { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }
}

/// Rate limiting errors.
#[derive(Debug, Error)]
pub enum RateLimitError {
    /// Too many requests.
    #[error("Too many requests: rate limit exceeded")]
    TooManyRequests {
        /// Retry after duration hint.
        retry_after: Option<Duration>,
        /// AWS request ID.
        request_id: Option<String>,
    },

    /// Service quota exceeded.
    #[error("Service quota exceeded")]
    QuotaExceeded {
        /// AWS request ID.
        request_id: Option<String>,
    },
}

impl RateLimitError {
    /// Returns the AWS error code.
    pub fn code(&self) -> &str {
        match self {
            RateLimitError::TooManyRequests { .. } => "ThrottlingException",
            RateLimitError::QuotaExceeded { .. } => "ServiceQuotaExceededException",
        }
    }

    /// Returns the AWS request ID if available.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            RateLimitError::TooManyRequests { request_id, .. }
            | RateLimitError::QuotaExceeded { request_id } => request_id.as_deref(),
        }
    }
}

/// Server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Internal server error (500).
    #[error("Internal server error: {}", .message.as_deref().unwrap_or("no message"))]
    InternalError {
        /// Error message.
        message: Option<String>,
        /// AWS request ID.
        request_id: Option<String>,
    },

    /// Service unavailable (503).
    #[error("Service unavailable")]
    ServiceUnavailable {
        /// Retry after duration hint.
        retry_after: Option<Duration>,
        /// AWS request ID.
        request_id: Option<String>,
    },
}

impl ServerError {
    /// Returns the AWS error code.
    pub fn code(&self) -> &str {
        match self {
            ServerError::InternalError { .. } => "InternalServerException",
            ServerError::ServiceUnavailable { .. } => "ServiceUnavailableException",
        }
    }

    /// Returns the AWS request ID if available.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            ServerError::InternalError { request_id, .. }
            | ServerError::ServiceUnavailable { request_id, .. } => request_id.as_deref(),
        }
    }

    /// Returns true if the error is retryable.
    pub fn is_retryable(&self) -> bool {
        true
    }
}

/// Streaming errors.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Parse error in event stream or chunk payload.
    #[error("Event stream parse error: {message}")]
    ParseError {
        /// Error message.
        message: String,
    },

    /// CRC mismatch in event stream.
    #[error("Event stream CRC mismatch")]
    CrcMismatch,

    /// Stream interrupted.
    #[error("Stream interrupted after {chunks_received} chunks: {message}")]
    StreamInterrupted {
        /// Number of chunks received before interruption.
        chunks_received: usize,
        /// Error message.
        message: String,
        /// AWS request ID.
        request_id: Option<String>,
    },

    /// Stream timeout.
    #[error("Stream timeout after {timeout:?} waiting for chunk")]
    StreamTimeout {
        /// Timeout duration.
        timeout: Duration,
        /// Number of chunks received before timeout.
        chunks_received: usize,
    },

    /// Model error reported inside the stream.
    #[error("Model error during streaming: {message}")]
    ModelError {
        /// Error message.
        message: String,
        /// AWS request ID.
        request_id: Option<String>,
    },
}

impl StreamError {
    /// Returns the AWS request ID if available.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            StreamError::StreamInterrupted { request_id, .. }
            | StreamError::ModelError { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }
}

/// Network errors.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Connection failed.
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        /// Error message.
        message: String,
    },

    /// Request timed out.
    #[error("Request timed out after {duration:?}")]
    Timeout {
        /// The timeout duration.
        duration: Duration,
    },

    /// Response body could not be read.
    #[error("Failed to read response: {message}")]
    ResponseRead {
        /// Error message.
        message: String,
    },
}

impl NetworkError {
    /// Returns true if the error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            NetworkError::ConnectionFailed { .. } | NetworkError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_retryable() {
        let rate_limit = InferenceError::RateLimit(RateLimitError::TooManyRequests {
            retry_after: Some(Duration::from_secs(30)),
            request_id: None,
        });
        assert!(rate_limit.is_retryable());

        let server_error = InferenceError::Server(ServerError::InternalError {
            message: None,
            request_id: None,
        });
        assert!(server_error.is_retryable());

        let access_denied = InferenceError::Authentication(AuthenticationError::AccessDenied {
            message: None,
            request_id: None,
        });
        assert!(!access_denied.is_retryable());

        let model_failed = InferenceError::Model(ModelError::InvocationFailed {
            original_status_code: Some(500),
            original_message: None,
            log_stream_arn: None,
            request_id: None,
        });
        assert!(!model_failed.is_retryable());
    }

    #[test]
    fn test_error_status_code() {
        let not_found = InferenceError::Model(ModelError::NotFound {
            resource: "my-endpoint".into(),
            request_id: None,
        });
        assert_eq!(not_found.status_code(), Some(404));

        let invalid = InferenceError::Request(RequestError::Validation {
            message: "bad".into(),
            request_id: None,
        });
        assert_eq!(invalid.status_code(), Some(400));

        let unsupported = InferenceError::Request(RequestError::UnsupportedValue {
            type_name: "map with non-string keys".into(),
        });
        assert_eq!(unsupported.status_code(), None);
    }

    #[test]
    fn test_retry_after() {
        let rate_limit = InferenceError::RateLimit(RateLimitError::TooManyRequests {
            retry_after: Some(Duration::from_secs(30)),
            request_id: None,
        });
        assert_eq!(rate_limit.retry_after(), Some(Duration::from_secs(30)));

        let credentials = InferenceError::Credentials(CredentialsError::NotFound);
        assert!(credentials.retry_after().is_none());
    }

    #[test]
    fn test_with_retry_after() {
        let throttled = InferenceError::RateLimit(RateLimitError::TooManyRequests {
            retry_after: Some(Duration::from_secs(5)),
            request_id: None,
        })
        .with_retry_after(Duration::from_secs(12));
        assert_eq!(throttled.retry_after(), Some(Duration::from_secs(12)));

        let unavailable = InferenceError::Server(ServerError::ServiceUnavailable {
            retry_after: None,
            request_id: None,
        })
        .with_retry_after(Duration::from_secs(3));
        assert_eq!(unavailable.retry_after(), Some(Duration::from_secs(3)));

        let validation = InferenceError::Request(RequestError::Validation {
            message: "bad".into(),
            request_id: None,
        })
        .with_retry_after(Duration::from_secs(3));
        assert_eq!(validation.retry_after(), None);
    }

    #[test]
    fn test_model_invocation_failed_display() {
        let error = ModelError::InvocationFailed {
            original_status_code: Some(500),
            original_message: Some("boom".to_string()),
            log_stream_arn: None,
            request_id: Some("req-1".to_string()),
        };
        assert_eq!(error.to_string(), "Model invocation failed with status 500: boom");
        assert_eq!(error.request_id(), Some("req-1"));
    }
}
