//! SageMaker request and response types.

use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Request for `ListEndpoints`. All filters are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListEndpointsRequest {
    /// Substring the endpoint name must contain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_contains: Option<String>,
    /// Only endpoints in this status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_equals: Option<EndpointStatus>,
    /// Sort field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<EndpointSortKey>,
    /// Sort direction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    /// Page size (1-100).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
    /// Continuation token from a previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl ListEndpointsRequest {
    /// Request with no filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by name substring.
    pub fn with_name_contains(mut self, name: impl Into<String>) -> Self {
        self.name_contains = Some(name.into());
        self
    }

    /// Filter by status.
    pub fn with_status(mut self, status: EndpointStatus) -> Self {
        self.status_equals = Some(status);
        self
    }

    /// Set sort field and direction.
    pub fn with_sort(mut self, sort_by: EndpointSortKey, sort_order: SortOrder) -> Self {
        self.sort_by = Some(sort_by);
        self.sort_order = Some(sort_order);
        self
    }

    /// Set the page size.
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Continue from a previous page.
    pub fn with_next_token(mut self, token: impl Into<String>) -> Self {
        self.next_token = Some(token.into());
        self
    }
}

/// Endpoint lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
#[allow(missing_docs)]
pub enum EndpointStatus {
    OutOfService,
    Creating,
    Updating,
    SystemUpdating,
    RollingBack,
    InService,
    Deleting,
    Failed,
    UpdateRollbackFailed,
    /// A status this crate does not know yet.
    Other(String),
}

impl EndpointStatus {
    /// Wire value.
    pub fn as_str(&self) -> &str {
        match self {
            EndpointStatus::OutOfService => "OutOfService",
            EndpointStatus::Creating => "Creating",
            EndpointStatus::Updating => "Updating",
            EndpointStatus::SystemUpdating => "SystemUpdating",
            EndpointStatus::RollingBack => "RollingBack",
            EndpointStatus::InService => "InService",
            EndpointStatus::Deleting => "Deleting",
            EndpointStatus::Failed => "Failed",
            EndpointStatus::UpdateRollbackFailed => "UpdateRollbackFailed",
            EndpointStatus::Other(s) => s,
        }
    }
}

impl From<String> for EndpointStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "OutOfService" => EndpointStatus::OutOfService,
            "Creating" => EndpointStatus::Creating,
            "Updating" => EndpointStatus::Updating,
            "SystemUpdating" => EndpointStatus::SystemUpdating,
            "RollingBack" => EndpointStatus::RollingBack,
            "InService" => EndpointStatus::InService,
            "Deleting" => EndpointStatus::Deleting,
            "Failed" => EndpointStatus::Failed,
            "UpdateRollbackFailed" => EndpointStatus::UpdateRollbackFailed,
            _ => EndpointStatus::Other(s),
        }
    }
}

impl From<EndpointStatus> for String {
    fn from(status: EndpointStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `ListEndpoints` sort field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum EndpointSortKey {
    Name,
    CreationTime,
    Status,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// One page of `ListEndpoints`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListEndpointsResponse {
    /// Endpoints on this page.
    #[serde(default)]
    pub endpoints: Vec<EndpointSummary>,
    /// Token for the next page; absent on the last one.
    #[serde(default)]
    pub next_token: Option<String>,
}

/// Summary of a hosted endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EndpointSummary {
    /// Endpoint name.
    pub endpoint_name: String,
    /// Endpoint ARN.
    pub endpoint_arn: String,
    /// When the endpoint was created.
    #[serde(deserialize_with = "epoch_seconds")]
    pub creation_time: DateTime<Utc>,
    /// When the endpoint was last modified.
    #[serde(deserialize_with = "epoch_seconds")]
    pub last_modified_time: DateTime<Utc>,
    /// Current status.
    pub endpoint_status: EndpointStatus,
}

/// JSON-1.1 timestamps are fractional epoch seconds.
fn epoch_seconds<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = f64::deserialize(deserializer)?;
    let millis = (seconds * 1000.0).round() as i64;
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {}", seconds)))
}

/// Request for `InvokeEndpoint`.
#[derive(Debug, Clone)]
pub struct InvokeEndpointRequest {
    /// Endpoint to invoke.
    pub endpoint_name: String,
    /// Raw request body, passed to the model container unchanged.
    pub body: Bytes,
    /// MIME type of the body.
    pub content_type: String,
    /// Desired MIME type of the response.
    pub accept: Option<String>,
    /// Opaque attributes forwarded to the container.
    pub custom_attributes: Option<String>,
    /// Model to invoke on a multi-model endpoint.
    pub target_model: Option<String>,
    /// Production variant to route to.
    pub target_variant: Option<String>,
}

impl InvokeEndpointRequest {
    /// Create a request with a `text/plain` body.
    pub fn new(endpoint_name: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            endpoint_name: endpoint_name.into(),
            body: body.into(),
            content_type: "text/plain".to_string(),
            accept: None,
            custom_attributes: None,
            target_model: None,
            target_variant: None,
        }
    }

    /// Set the body MIME type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Set the accepted response type.
    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// Set custom attributes.
    pub fn with_custom_attributes(mut self, attributes: impl Into<String>) -> Self {
        self.custom_attributes = Some(attributes.into());
        self
    }

    /// Route to a model of a multi-model endpoint.
    pub fn with_target_model(mut self, model: impl Into<String>) -> Self {
        self.target_model = Some(model.into());
        self
    }

    /// Route to a production variant.
    pub fn with_target_variant(mut self, variant: impl Into<String>) -> Self {
        self.target_variant = Some(variant.into());
        self
    }
}

/// Response from `InvokeEndpoint`.
#[derive(Debug, Clone)]
pub struct InvokeEndpointResponse {
    /// Raw response body from the container.
    pub body: Bytes,
    /// MIME type of the body.
    pub content_type: Option<String>,
    /// Variant that served the request.
    pub invoked_production_variant: Option<String>,
    /// Attributes returned by the container.
    pub custom_attributes: Option<String>,
    /// AWS request ID.
    pub request_id: Option<String>,
}

impl InvokeEndpointResponse {
    /// Body as text, replacing invalid UTF-8.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_list_request_wire_shape() {
        let request = ListEndpointsRequest::new()
            .with_name_contains("llm")
            .with_status(EndpointStatus::InService)
            .with_sort(EndpointSortKey::CreationTime, SortOrder::Descending)
            .with_max_results(10);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "NameContains": "llm",
                "StatusEquals": "InService",
                "SortBy": "CreationTime",
                "SortOrder": "Descending",
                "MaxResults": 10
            })
        );
        assert_eq!(serde_json::to_string(&ListEndpointsRequest::new()).unwrap(), "{}");
    }

    #[test]
    fn test_parse_list_response() {
        let body = json!({
            "Endpoints": [{
                "EndpointName": "my-endpoint",
                "EndpointArn": "arn:aws:sagemaker:us-east-1:123456789012:endpoint/my-endpoint",
                "CreationTime": 1700000000.5,
                "LastModifiedTime": 1700000100,
                "EndpointStatus": "InService"
            }],
            "NextToken": "page-2"
        });

        let response: ListEndpointsResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.next_token.as_deref(), Some("page-2"));

        let endpoint = &response.endpoints[0];
        assert_eq!(endpoint.endpoint_name, "my-endpoint");
        assert_eq!(endpoint.endpoint_status, EndpointStatus::InService);
        assert_eq!(endpoint.creation_time.timestamp_millis(), 1_700_000_000_500);
        assert_eq!(endpoint.last_modified_time.timestamp(), 1_700_000_100);
    }

    #[test]
    fn test_unknown_status_preserved() {
        let status: EndpointStatus = serde_json::from_value(json!("Hibernating")).unwrap();
        assert_eq!(status, EndpointStatus::Other("Hibernating".into()));
        assert_eq!(status.to_string(), "Hibernating");
    }

    #[test]
    fn test_invoke_request_defaults() {
        let request = InvokeEndpointRequest::new("ep", "hello");
        assert_eq!(request.content_type, "text/plain");
        assert!(request.accept.is_none());
    }
}
