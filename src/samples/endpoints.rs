//! Discover SageMaker endpoints and send them text.

use crate::client::ClientBuilder;
use crate::error::InferenceError;
use crate::sagemaker::{
    EndpointSummary, InvokeEndpointRequest, ListEndpointsRequest, SageMakerClient,
    SageMakerRuntimeClient,
};
use std::sync::Arc;
use tracing::{error, info};

/// Input sent when the caller gives none.
pub const DEFAULT_INPUT_TEXT: &str = "Default query text";

/// Lists endpoints and invokes them with plain text.
pub struct EndpointHandler {
    sagemaker: Arc<dyn SageMakerClient>,
    runtime: Arc<dyn SageMakerRuntimeClient>,
}

impl EndpointHandler {
    /// Create a handler over existing clients.
    pub fn new(sagemaker: Arc<dyn SageMakerClient>, runtime: Arc<dyn SageMakerRuntimeClient>) -> Self {
        Self { sagemaker, runtime }
    }

    /// Create both clients from a builder.
    pub fn from_builder(builder: &ClientBuilder) -> Result<Self, InferenceError> {
        Ok(Self::new(
            Arc::new(builder.sagemaker()?),
            Arc::new(builder.sagemaker_runtime()?),
        ))
    }

    /// List the first page of endpoints, logging each name.
    pub async fn list_endpoints(&self) -> Result<Vec<EndpointSummary>, InferenceError> {
        let response = self
            .sagemaker
            .list_endpoints(ListEndpointsRequest::new())
            .await
            .map_err(|e| {
                error!("Error listing SageMaker endpoints: {}", e);
                e
            })?;

        info!("Found {} endpoints", response.endpoints.len());
        for endpoint in &response.endpoints {
            info!("Endpoint: {}", endpoint.endpoint_name);
        }

        Ok(response.endpoints)
    }

    /// Send `input_text` as `text/plain` and return the response body as text.
    pub async fn invoke_endpoint(&self, endpoint_name: &str, input_text: &str) -> Result<String, InferenceError> {
        let request = InvokeEndpointRequest::new(endpoint_name, input_text.to_string());
        let response = self.runtime.invoke_endpoint(request).await.map_err(|e| {
            error!(endpoint_name, "Error invoking SageMaker endpoint: {}", e);
            e
        })?;

        let body = response.body_text();
        info!("SageMaker endpoint response: {}", body);
        Ok(body)
    }

    /// Invoke an endpoint, filling in defaults.
    ///
    /// A missing or empty name selects the first listed endpoint; a missing
    /// or empty input becomes [`DEFAULT_INPUT_TEXT`]. Failures are logged and
    /// yield `None`.
    pub async fn send_request(&self, endpoint_name: Option<&str>, input_text: Option<&str>) -> Option<String> {
        let endpoint_name = match endpoint_name.filter(|name| !name.is_empty()) {
            Some(name) => name.to_string(),
            None => {
                let endpoints = self.list_endpoints().await.ok()?;
                match endpoints.into_iter().next() {
                    Some(endpoint) => {
                        info!("Using first available endpoint: {}", endpoint.endpoint_name);
                        endpoint.endpoint_name
                    }
                    None => {
                        error!("No endpoints available");
                        return None;
                    }
                }
            }
        };

        let input_text = match input_text.filter(|text| !text.is_empty()) {
            Some(text) => text,
            None => {
                info!("Using default input text: {}", DEFAULT_INPUT_TEXT);
                DEFAULT_INPUT_TEXT
            }
        };

        match self.invoke_endpoint(&endpoint_name, input_text).await {
            Ok(response) => {
                info!("Received response from endpoint {}: {}", endpoint_name, response);
                Some(response)
            }
            Err(e) => {
                error!("Error sending request to endpoint {}: {}", endpoint_name, e);
                None
            }
        }
    }
}

impl std::fmt::Debug for EndpointHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointHandler").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::mocks::endpoint_summary_json;
    use crate::sagemaker::{InvokeEndpointResponse, ListEndpointsResponse};
    use async_trait::async_trait;
    use bytes::Bytes;
    use parking_lot::Mutex;

    struct StubSageMaker {
        names: Vec<&'static str>,
    }

    #[async_trait]
    impl SageMakerClient for StubSageMaker {
        async fn list_endpoints(&self, _request: ListEndpointsRequest) -> Result<ListEndpointsResponse, InferenceError> {
            let endpoints = self
                .names
                .iter()
                .map(|name| serde_json::from_value(endpoint_summary_json(name, "InService")).unwrap())
                .collect();
            Ok(ListEndpointsResponse {
                endpoints,
                next_token: None,
            })
        }
    }

    #[derive(Default)]
    struct RecordingRuntime {
        calls: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl SageMakerRuntimeClient for RecordingRuntime {
        async fn invoke_endpoint(&self, request: InvokeEndpointRequest) -> Result<InvokeEndpointResponse, InferenceError> {
            let body = String::from_utf8_lossy(&request.body).into_owned();
            self.calls.lock().push((request.endpoint_name.clone(), body.clone()));
            if self.fail {
                return Err(InferenceError::Model(ModelError::NotFound {
                    resource: request.endpoint_name,
                    request_id: None,
                }));
            }
            Ok(InvokeEndpointResponse {
                body: Bytes::from(format!("echo: {}", body)),
                content_type: Some("text/plain".to_string()),
                invoked_production_variant: None,
                custom_attributes: None,
                request_id: None,
            })
        }
    }

    fn handler(names: Vec<&'static str>, runtime: Arc<RecordingRuntime>) -> EndpointHandler {
        EndpointHandler::new(Arc::new(StubSageMaker { names }), runtime)
    }

    #[tokio::test]
    async fn test_defaults_to_first_endpoint_and_default_text() {
        let runtime = Arc::new(RecordingRuntime::default());
        let handler = handler(vec!["first", "second"], runtime.clone());

        let response = handler.send_request(None, Some("")).await;

        assert_eq!(response.as_deref(), Some("echo: Default query text"));
        assert_eq!(
            runtime.calls.lock().clone(),
            vec![("first".to_string(), DEFAULT_INPUT_TEXT.to_string())]
        );
    }

    #[tokio::test]
    async fn test_explicit_endpoint_skips_listing() {
        let runtime = Arc::new(RecordingRuntime::default());
        let handler = handler(vec![], runtime.clone());

        let response = handler.send_request(Some("your-endpoint-name"), Some("Custom query text")).await;

        assert_eq!(response.as_deref(), Some("echo: Custom query text"));
        assert_eq!(runtime.calls.lock()[0].0, "your-endpoint-name");
    }

    #[tokio::test]
    async fn test_no_endpoints_returns_none() {
        let runtime = Arc::new(RecordingRuntime::default());
        let handler = handler(vec![], runtime.clone());

        assert!(handler.send_request(None, None).await.is_none());
        assert!(runtime.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_invoke_failure_is_swallowed() {
        let runtime = Arc::new(RecordingRuntime {
            fail: true,
            ..Default::default()
        });
        let handler = handler(vec!["only"], runtime.clone());

        assert!(handler.send_request(None, Some("Another custom query")).await.is_none());
        assert_eq!(runtime.calls.lock().len(), 1);
    }
}
