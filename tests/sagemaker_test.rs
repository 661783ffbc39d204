//! Integration tests for the SageMaker clients.

mod common;

use aws_inference::mocks::endpoint_summary_json;
use aws_inference::{
    EndpointStatus, InferenceError, InvokeEndpointRequest, ListEndpointsRequest, ModelError,
    RequestError, SageMakerClient, SageMakerRuntimeClient,
};
use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, body_string, header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_list_endpoints() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("x-amz-target", "SageMaker.ListEndpoints"))
        .and(header("content-type", "application/x-amz-json-1.1"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Endpoints": [
                endpoint_summary_json("llm-endpoint", "InService"),
                endpoint_summary_json("staging", "Updating")
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = builder(&server, fast_retry(0)).sagemaker().unwrap();
    let response = client.list_endpoints(ListEndpointsRequest::new()).await.unwrap();

    assert_eq!(response.endpoints.len(), 2);
    assert_eq!(response.endpoints[0].endpoint_name, "llm-endpoint");
    assert_eq!(response.endpoints[0].endpoint_status, EndpointStatus::InService);
    assert_eq!(response.endpoints[1].endpoint_status, EndpointStatus::Updating);
    assert_eq!(response.endpoints[0].creation_time.timestamp(), 1_700_000_000);
    assert_eq!(response.next_token, None);
}

#[tokio::test]
async fn test_list_all_endpoints_follows_next_token() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(body_json(json!({"MaxResults": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Endpoints": [endpoint_summary_json("first", "InService")],
            "NextToken": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_json(json!({"MaxResults": 1, "NextToken": "page-2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Endpoints": [endpoint_summary_json("second", "Creating")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = builder(&server, fast_retry(0)).sagemaker().unwrap();
    let endpoints = client
        .list_all_endpoints(ListEndpointsRequest::new().with_max_results(1))
        .await
        .unwrap();

    let names: Vec<&str> = endpoints.iter().map(|e| e.endpoint_name.as_str()).collect();
    assert_eq!(names, vec!["first", "second"]);
}

#[tokio::test]
async fn test_list_endpoints_validation_error() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "__type": "com.amazonaws.sagemaker#ValidationException",
            "Message": "1 validation error detected"
        })))
        .mount(&server)
        .await;

    let client = builder(&server, fast_retry(0)).sagemaker().unwrap();
    let result = client.list_endpoints(ListEndpointsRequest::new()).await;

    match result {
        Err(InferenceError::Request(RequestError::Validation { message, .. })) => {
            assert_eq!(message, "1 validation error detected");
        }
        other => panic!("Expected Validation, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invoke_endpoint() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/endpoints/llm-endpoint/invocations"))
        .and(header("content-type", "text/plain"))
        .and(header("accept", "application/json"))
        .and(header("x-amzn-sagemaker-target-variant", "variant-a"))
        .and(body_string("Default query text"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .insert_header("x-amzn-invoked-production-variant", "variant-a")
                .insert_header("x-amzn-requestid", "req-sm")
                .set_body_string(r#"{"generated_text":"hello"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = builder(&server, fast_retry(0)).sagemaker_runtime().unwrap();
    let request = InvokeEndpointRequest::new("llm-endpoint", "Default query text")
        .with_accept("application/json")
        .with_target_variant("variant-a");

    let response = client.invoke_endpoint(request).await.unwrap();

    assert_eq!(response.body_text(), r#"{"generated_text":"hello"}"#);
    assert_eq!(response.content_type.as_deref(), Some("application/json"));
    assert_eq!(response.invoked_production_variant.as_deref(), Some("variant-a"));
    assert_eq!(response.request_id.as_deref(), Some("req-sm"));
}

#[tokio::test]
async fn test_invoke_endpoint_model_error() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/endpoints/broken/invocations"))
        .respond_with(
            ResponseTemplate::new(424)
                .insert_header("x-amzn-errortype", "ModelError:http://internal.amazon.com/coral/")
                .set_body_json(json!({
                    "ErrorCode": "CLIENT_ERROR_FROM_MODEL",
                    "Message": "Received client error (400) from primary",
                    "OriginalMessage": "unsupported input",
                    "OriginalStatusCode": 400
                })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = builder(&server, fast_retry(3)).sagemaker_runtime().unwrap();
    let result = client
        .invoke_endpoint(InvokeEndpointRequest::new("broken", "hi"))
        .await;

    match result {
        Err(InferenceError::Model(ModelError::InvocationFailed {
            original_status_code,
            original_message,
            ..
        })) => {
            assert_eq!(original_status_code, Some(400));
            assert_eq!(original_message.as_deref(), Some("unsupported input"));
        }
        other => panic!("Expected InvocationFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invoke_endpoint_not_found() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Endpoint missing not found."})))
        .mount(&server)
        .await;

    let client = builder(&server, fast_retry(0)).sagemaker_runtime().unwrap();
    let result = client
        .invoke_endpoint(InvokeEndpointRequest::new("missing", "hi"))
        .await;

    match result {
        Err(InferenceError::Model(ModelError::NotFound { resource, .. })) => {
            assert_eq!(resource, "missing");
        }
        other => panic!("Expected NotFound, got {:?}", other),
    }
}
