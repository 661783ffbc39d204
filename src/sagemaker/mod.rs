//! SageMaker clients: endpoint listing (control plane) and endpoint
//! invocation (runtime).

mod types;

pub use types::*;

use crate::config::{AwsService, InferenceConfig};
use crate::credentials::CredentialsProvider;
use crate::error::{InferenceError, RequestError, StreamError};
use crate::transport::{ServiceRequest, ServiceTransport, REQUEST_ID_HEADER};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

const JSON_1_1_CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const LIST_ENDPOINTS_TARGET: &str = "SageMaker.ListEndpoints";

/// SageMaker control plane operations.
#[async_trait]
pub trait SageMakerClient: Send + Sync {
    /// List one page of endpoints.
    async fn list_endpoints(&self, request: ListEndpointsRequest) -> Result<ListEndpointsResponse, InferenceError>;

    /// List every endpoint, following `NextToken` across pages.
    async fn list_all_endpoints(&self, request: ListEndpointsRequest) -> Result<Vec<EndpointSummary>, InferenceError> {
        let mut request = request;
        let mut endpoints = Vec::new();
        loop {
            let page = self.list_endpoints(request.clone()).await?;
            endpoints.extend(page.endpoints);
            match page.next_token.filter(|t| !t.is_empty()) {
                Some(token) => request.next_token = Some(token),
                None => break,
            }
        }
        Ok(endpoints)
    }
}

/// SageMaker Runtime operations.
#[async_trait]
pub trait SageMakerRuntimeClient: Send + Sync {
    /// Send a raw payload to a hosted endpoint.
    async fn invoke_endpoint(&self, request: InvokeEndpointRequest) -> Result<InvokeEndpointResponse, InferenceError>;
}

/// SageMaker control plane client over signed HTTP.
pub struct SageMakerClientImpl {
    transport: ServiceTransport,
}

impl SageMakerClientImpl {
    /// Create a client with the given configuration and credentials.
    pub fn new(
        config: &InferenceConfig,
        credentials_provider: Arc<dyn CredentialsProvider>,
    ) -> Result<Self, InferenceError> {
        Ok(Self {
            transport: ServiceTransport::new(AwsService::SageMaker, config, credentials_provider)?,
        })
    }
}

#[async_trait]
impl SageMakerClient for SageMakerClientImpl {
    #[instrument(skip(self, request))]
    async fn list_endpoints(&self, request: ListEndpointsRequest) -> Result<ListEndpointsResponse, InferenceError> {
        let body = serde_json::to_vec(&request).map_err(|e| {
            InferenceError::Request(RequestError::InvalidParameter {
                parameter: "body".to_string(),
                message: format!("Failed to serialize ListEndpoints request: {}", e),
            })
        })?;

        debug!(has_next_token = request.next_token.is_some(), "Listing endpoints");

        let service_request = ServiceRequest::post("/", &body)
            .header("content-type", JSON_1_1_CONTENT_TYPE)
            .header("x-amz-target", LIST_ENDPOINTS_TARGET);

        let (_, body) = self.transport.send_unary(&service_request).await?;

        serde_json::from_slice(&body).map_err(|e| {
            InferenceError::Stream(StreamError::ParseError {
                message: format!("Failed to parse ListEndpoints response: {}", e),
            })
        })
    }
}

impl std::fmt::Debug for SageMakerClientImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SageMakerClientImpl")
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

/// SageMaker Runtime client over signed HTTP.
pub struct SageMakerRuntimeClientImpl {
    transport: ServiceTransport,
}

impl SageMakerRuntimeClientImpl {
    /// Create a client with the given configuration and credentials.
    pub fn new(
        config: &InferenceConfig,
        credentials_provider: Arc<dyn CredentialsProvider>,
    ) -> Result<Self, InferenceError> {
        Ok(Self {
            transport: ServiceTransport::new(AwsService::SageMakerRuntime, config, credentials_provider)?,
        })
    }
}

#[async_trait]
impl SageMakerRuntimeClient for SageMakerRuntimeClientImpl {
    #[instrument(skip(self, request), fields(endpoint_name = %request.endpoint_name))]
    async fn invoke_endpoint(&self, request: InvokeEndpointRequest) -> Result<InvokeEndpointResponse, InferenceError> {
        if request.endpoint_name.is_empty() {
            return Err(InferenceError::Request(RequestError::InvalidParameter {
                parameter: "endpoint_name".to_string(),
                message: "Endpoint name must not be empty".to_string(),
            }));
        }

        debug!(body_size = request.body.len(), content_type = %request.content_type, "Invoking endpoint");

        let path = format!("/endpoints/{}/invocations", urlencoding::encode(&request.endpoint_name));
        let mut service_request = ServiceRequest::post(path, &request.body)
            .header("content-type", request.content_type.as_str())
            .resource(&request.endpoint_name);

        let optional_headers = [
            ("accept", &request.accept),
            ("x-amzn-sagemaker-custom-attributes", &request.custom_attributes),
            ("x-amzn-sagemaker-target-model", &request.target_model),
            ("x-amzn-sagemaker-target-variant", &request.target_variant),
        ];
        for (name, value) in optional_headers {
            if let Some(value) = value {
                service_request = service_request.header(name, value.as_str());
            }
        }

        let (headers, body) = self.transport.send_unary(&service_request).await?;

        Ok(InvokeEndpointResponse {
            content_type: headers.get("content-type").cloned(),
            invoked_production_variant: headers.get("x-amzn-invoked-production-variant").cloned(),
            custom_attributes: headers.get("x-amzn-sagemaker-custom-attributes").cloned(),
            request_id: headers.get(REQUEST_ID_HEADER).cloned(),
            body,
        })
    }
}

impl std::fmt::Debug for SageMakerRuntimeClientImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SageMakerRuntimeClientImpl")
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}
