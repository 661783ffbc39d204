//! HTTP and event-stream exception to `InferenceError` mapping.

use super::*;
use serde::Deserialize;
use std::time::Duration;

/// Error fields that Bedrock and SageMaker put in JSON error bodies.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    /// Error type for JSON-1.1 protocols (`SageMaker.ListEndpoints` etc).
    #[serde(rename = "__type", default)]
    pub error_type: Option<String>,
    /// Error message.
    #[serde(alias = "Message", default)]
    pub message: Option<String>,
    /// Status code returned by a SageMaker model container.
    #[serde(rename = "OriginalStatusCode", default)]
    pub original_status_code: Option<u16>,
    /// Message returned by a SageMaker model container.
    #[serde(rename = "OriginalMessage", default)]
    pub original_message: Option<String>,
    /// Log stream of the failing SageMaker container.
    #[serde(rename = "LogStreamArn", default)]
    pub log_stream_arn: Option<String>,
}

impl ErrorBody {
    /// Parse an error body, tolerating empty or non-JSON payloads.
    pub fn parse(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

/// Map an HTTP error response to an `InferenceError`.
///
/// `error_type` comes from the `x-amzn-errortype` header when present and
/// falls back to the `__type` body field.
pub fn map_http_error(
    status: u16,
    error_type: Option<&str>,
    body: ErrorBody,
    request_id: Option<String>,
    resource: Option<&str>,
    region: Option<&str>,
) -> InferenceError {
    let error_type = error_type
        .map(str::to_string)
        .or_else(|| body.error_type.as_deref().map(|t| parse_error_type(t).to_string()))
        .unwrap_or_default();
    let message = body.message.clone();
    let resource_name = resource.unwrap_or("unknown").to_string();

    match (status, error_type.as_str()) {
        (_, "ValidationException") | (_, "ValidationError") => {
            InferenceError::Request(RequestError::Validation {
                message: message.unwrap_or_else(|| "Validation error".to_string()),
                request_id,
            })
        }

        (_, "AccessDeniedException") => match (resource, region) {
            (Some(model_id), Some(region)) => {
                InferenceError::Model(ModelError::NotAccessible {
                    model_id: model_id.to_string(),
                    region: region.to_string(),
                    request_id,
                })
            }
            _ => InferenceError::Authentication(AuthenticationError::AccessDenied {
                message,
                request_id,
            }),
        },
        (_, "UnrecognizedClientException") | (_, "InvalidSignatureException") | (_, "SignatureDoesNotMatch") => {
            InferenceError::Authentication(AuthenticationError::SignatureError { request_id })
        }
        (_, "ExpiredTokenException") => {
            InferenceError::Authentication(AuthenticationError::ExpiredToken { request_id })
        }

        (_, "ResourceNotFoundException") | (_, "ResourceNotFound") => {
            InferenceError::Model(ModelError::NotFound {
                resource: resource_name,
                request_id,
            })
        }
        (_, "ModelNotReadyException") => InferenceError::Model(ModelError::NotReady {
            resource: resource_name,
            request_id,
        }),
        (_, "ModelTimeoutException") => InferenceError::Model(ModelError::Timeout {
            message: message.unwrap_or_else(|| "Model timed out".to_string()),
            request_id,
        }),
        (_, "ModelError") | (_, "ModelErrorException") => {
            InferenceError::Model(ModelError::InvocationFailed {
                original_status_code: body.original_status_code,
                original_message: body.original_message.or(message),
                log_stream_arn: body.log_stream_arn,
                request_id,
            })
        }
        (_, "ModelStreamErrorException") => InferenceError::Stream(StreamError::ModelError {
            message: message.unwrap_or_else(|| "Model stream error".to_string()),
            request_id,
        }),

        (_, "ThrottlingException") => InferenceError::RateLimit(RateLimitError::TooManyRequests {
            retry_after: Some(Duration::from_secs(5)),
            request_id,
        }),
        (_, "ServiceQuotaExceededException") => {
            InferenceError::RateLimit(RateLimitError::QuotaExceeded { request_id })
        }

        (_, "ServiceUnavailableException") | (_, "ServiceUnavailable") => {
            InferenceError::Server(ServerError::ServiceUnavailable {
                retry_after: Some(Duration::from_secs(10)),
                request_id,
            })
        }
        (_, "InternalServerException") | (_, "InternalFailure") | (_, "InternalDependencyException") => {
            InferenceError::Server(ServerError::InternalError { message, request_id })
        }

        // Unknown error type: fall back to the status code.
        (403, _) => InferenceError::Authentication(AuthenticationError::AccessDenied {
            message,
            request_id,
        }),
        (404, _) => InferenceError::Model(ModelError::NotFound {
            resource: resource_name,
            request_id,
        }),
        (429, _) => InferenceError::RateLimit(RateLimitError::TooManyRequests {
            retry_after: Some(Duration::from_secs(5)),
            request_id,
        }),
        (503, _) => InferenceError::Server(ServerError::ServiceUnavailable {
            retry_after: Some(Duration::from_secs(10)),
            request_id,
        }),
        (400..=499, _) => InferenceError::Request(RequestError::Validation {
            message: message.unwrap_or_else(|| format!("Client error: {}", status)),
            request_id,
        }),
        (500..=599, _) => InferenceError::Server(ServerError::InternalError { message, request_id }),
        _ => InferenceError::Server(ServerError::InternalError {
            message: Some(format!("Unexpected status code: {}", status)),
            request_id,
        }),
    }
}

/// Map an event-stream exception frame to an `InferenceError`.
///
/// Exception types in streams use lower camel case (`throttlingException`).
pub fn map_exception_frame(exception_type: Option<&str>, payload: &[u8]) -> InferenceError {
    let body = ErrorBody::parse(payload);
    let message = body
        .message
        .clone()
        .unwrap_or_else(|| String::from_utf8_lossy(payload).into_owned());

    match exception_type.unwrap_or("") {
        "throttlingException" => InferenceError::RateLimit(RateLimitError::TooManyRequests {
            retry_after: Some(Duration::from_secs(5)),
            request_id: None,
        }),
        "serviceQuotaExceededException" => {
            InferenceError::RateLimit(RateLimitError::QuotaExceeded { request_id: None })
        }
        "validationException" => InferenceError::Request(RequestError::Validation {
            message,
            request_id: None,
        }),
        "modelTimeoutException" => InferenceError::Model(ModelError::Timeout {
            message,
            request_id: None,
        }),
        "internalServerException" => InferenceError::Server(ServerError::InternalError {
            message: Some(message),
            request_id: None,
        }),
        "serviceUnavailableException" => InferenceError::Server(ServerError::ServiceUnavailable {
            retry_after: None,
            request_id: None,
        }),
        _ => InferenceError::Stream(StreamError::ModelError {
            message,
            request_id: None,
        }),
    }
}

/// Extract the bare error code from an `x-amzn-errortype` header or `__type` field.
///
/// Handles `Code:http://internal...` and `com.amazonaws.sagemaker#Code`.
pub fn parse_error_type(value: &str) -> &str {
    let value = value.split(':').next().unwrap_or(value);
    value.rsplit('#').next().unwrap_or(value)
}

/// Extract retry-after from response headers.
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    header_value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
