//! Signed HTTP transport shared by the Bedrock and SageMaker clients.

use crate::config::{AwsService, InferenceConfig};
use crate::credentials::CredentialsProvider;
use crate::error::{
    map_exception_frame, map_http_error, parse_error_type, parse_retry_after, ConfigurationError, ErrorBody,
    InferenceError, NetworkError, StreamError,
};
use crate::resilience::RetryPolicy;
use crate::signing::{AwsSigner, RequestSigner};
use crate::streaming::{EventStreamMessage, EventStreamParser};
use async_stream::try_stream;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::{Client as HttpClient, Method, Response};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};
use url::Url;

/// Request ID header set by AWS services.
pub const REQUEST_ID_HEADER: &str = "x-amzn-requestid";

/// Error type header set by AWS services.
pub const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

/// Server-supplied delay, in seconds, before retrying.
pub const RETRY_AFTER_HEADER: &str = "retry-after";

/// Content type of event stream responses.
pub const EVENT_STREAM_CONTENT_TYPE: &str = "application/vnd.amazon.eventstream";

/// A request to one service, before signing.
#[derive(Debug, Clone)]
pub(crate) struct ServiceRequest<'a> {
    pub method: Method,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Option<&'a [u8]>,
    /// Model ID or endpoint name, for error reporting.
    pub resource: Option<&'a str>,
}

impl<'a> ServiceRequest<'a> {
    pub fn post(path: impl Into<String>, body: &'a [u8]) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            headers: HashMap::new(),
            body: Some(body),
            resource: None,
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_string(), value.into());
        self
    }

    pub fn resource(mut self, resource: &'a str) -> Self {
        self.resource = Some(resource);
        self
    }
}

/// HTTP client, signer and endpoint for one AWS service.
pub(crate) struct ServiceTransport {
    service: AwsService,
    endpoint: String,
    region: String,
    timeout: Duration,
    stream_chunk_timeout: Duration,
    http_client: HttpClient,
    signer: RequestSigner,
    retry: RetryPolicy,
}

impl ServiceTransport {
    pub fn new(
        service: AwsService,
        config: &InferenceConfig,
        credentials_provider: Arc<dyn CredentialsProvider>,
    ) -> Result<Self, InferenceError> {
        let http_client = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                InferenceError::Network(NetworkError::ConnectionFailed {
                    message: format!("Failed to create HTTP client: {}", e),
                })
            })?;

        Ok(Self {
            service,
            endpoint: config.endpoint(service),
            region: config.region.clone(),
            timeout: config.timeout,
            stream_chunk_timeout: config.stream_chunk_timeout,
            http_client,
            signer: RequestSigner::new(credentials_provider, &config.region, service),
            retry: RetryPolicy::new(config.retry.clone()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn stream_chunk_timeout(&self) -> Duration {
        self.stream_chunk_timeout
    }

    fn url(&self, path: &str) -> Result<Url, InferenceError> {
        Url::parse(&format!("{}{}", self.endpoint, path)).map_err(|e| {
            InferenceError::Configuration(ConfigurationError::InvalidConfiguration {
                field: "endpoint_url".to_string(),
                message: format!("Invalid URL for {}: {}", self.service, e),
            })
        })
    }

    /// Sign and send once. Non-2xx responses become errors.
    pub async fn send(&self, request: &ServiceRequest<'_>) -> Result<Response, InferenceError> {
        let url = self.url(&request.path)?;
        let signed = self
            .signer
            .sign(request.method.as_str(), &url, &request.headers, request.body)
            .await?;

        trace!(service = %self.service, method = %request.method, url = %signed.url, "Sending request");

        let mut builder = self.http_client.request(request.method.clone(), signed.url);
        for (name, value) in &signed.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = signed.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                InferenceError::Network(NetworkError::Timeout {
                    duration: self.timeout,
                })
            } else {
                InferenceError::Network(NetworkError::ConnectionFailed {
                    message: e.to_string(),
                })
            }
        })?;

        if !response.status().is_success() {
            return Err(self.parse_error_response(response, request.resource).await);
        }

        debug!(
            service = %self.service,
            status = response.status().as_u16(),
            request_id = request_id(&response).unwrap_or("-"),
            "Request succeeded"
        );

        Ok(response)
    }

    /// Send with retries; the whole response body is read inside each attempt.
    pub async fn send_unary(
        &self,
        request: &ServiceRequest<'_>,
    ) -> Result<(HashMap<String, String>, Bytes), InferenceError> {
        self.retry
            .execute(|| async {
                let response = self.send(request).await?;
                let headers = header_map(&response);
                let body = read_body(response).await?;
                Ok((headers, body))
            })
            .await
    }

    async fn parse_error_response(&self, response: Response, resource: Option<&str>) -> InferenceError {
        let status = response.status().as_u16();
        let request_id = request_id(&response).map(String::from);
        let error_type = response
            .headers()
            .get(ERROR_TYPE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| parse_error_type(s).to_string());

        let retry_after = response
            .headers()
            .get(RETRY_AFTER_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);

        let body = response.bytes().await.unwrap_or_default();
        let mut error = map_http_error(
            status,
            error_type.as_deref(),
            ErrorBody::parse(&body),
            request_id,
            resource,
            Some(&self.region),
        );
        if let Some(delay) = retry_after {
            error = error.with_retry_after(delay);
        }

        warn!(
            service = %self.service,
            status,
            error_code = error.aws_error_code().unwrap_or("-"),
            request_id = error.request_id().unwrap_or("-"),
            "Request failed: {}",
            error
        );

        error
    }
}

impl std::fmt::Debug for ServiceTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceTransport")
            .field("service", &self.service)
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

/// The `x-amzn-requestid` header, if present.
pub(crate) fn request_id(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
}

/// Response headers with lowercase names. Non-UTF-8 values are skipped.
pub(crate) fn header_map(response: &Response) -> HashMap<String, String> {
    response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_lowercase(), v.to_string()))
        })
        .collect()
}

pub(crate) async fn read_body(response: Response) -> Result<Bytes, InferenceError> {
    response.bytes().await.map_err(|e| {
        InferenceError::Network(NetworkError::ResponseRead {
            message: e.to_string(),
        })
    })
}

/// Decode a byte stream into event stream frames.
///
/// Exception frames end the stream with the mapped error. A gap longer than
/// `chunk_timeout` between network chunks ends it with `StreamTimeout`.
pub(crate) fn decode_event_stream<S, E>(
    bytes: S,
    chunk_timeout: Duration,
    request_id: Option<String>,
) -> impl Stream<Item = Result<EventStreamMessage, InferenceError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin,
    E: std::fmt::Display + Send,
{
    try_stream! {
        let mut bytes = bytes;
        let mut parser = EventStreamParser::new();
        let mut frames_received = 0usize;

        loop {
            let next = tokio::time::timeout(chunk_timeout, bytes.next())
                .await
                .map_err(|_| {
                    InferenceError::Stream(StreamError::StreamTimeout {
                        timeout: chunk_timeout,
                        chunks_received: frames_received,
                    })
                })?;

            let chunk = match next {
                Some(chunk) => chunk.map_err(|e| {
                    InferenceError::Stream(StreamError::StreamInterrupted {
                        chunks_received: frames_received,
                        message: e.to_string(),
                        request_id: request_id.clone(),
                    })
                })?,
                None => break,
            };

            parser.feed(&chunk);

            while let Some(message) = parser.next_message()? {
                if message.is_exception() {
                    Err(map_exception_frame(message.exception_type(), &message.payload))?;
                }
                frames_received += 1;
                yield message;
            }
        }

        if parser.buffered() > 0 {
            Err(InferenceError::Stream(StreamError::StreamInterrupted {
                chunks_received: frames_received,
                message: format!("{} trailing bytes after last frame", parser.buffered()),
                request_id: request_id.clone(),
            }))?;
        }
    }
}

/// Decode a streaming HTTP response into event stream frames.
pub(crate) fn event_stream(
    response: Response,
    chunk_timeout: Duration,
) -> impl Stream<Item = Result<EventStreamMessage, InferenceError>> + Send {
    let request_id = request_id(&response).map(String::from);
    decode_event_stream(Box::pin(response.bytes_stream()), chunk_timeout, request_id)
}
