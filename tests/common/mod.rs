//! Shared setup for the wiremock-backed integration tests.

#![allow(dead_code)]

use aws_inference::mocks::MockCredentialsProvider;
use aws_inference::{ClientBuilder, InferenceConfig, RetryConfig};
use std::sync::Arc;
use std::time::Duration;
use wiremock::MockServer;

pub const EVENT_STREAM: &str = "application/vnd.amazon.eventstream";

/// Start a mock server standing in for every service.
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Retries with millisecond delays so tests stay fast.
pub fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        multiplier: 2.0,
        jitter: false,
    }
}

/// A builder pointing every service at the mock server.
pub fn builder(server: &MockServer, retry: RetryConfig) -> ClientBuilder {
    let config = InferenceConfig::builder()
        .region("us-east-1")
        .endpoint_url(server.uri())
        .timeout(Duration::from_secs(5))
        .stream_chunk_timeout(Duration::from_secs(5))
        .retry(retry)
        .build()
        .expect("valid test config");

    ClientBuilder::new()
        .config(config)
        .credentials_provider(Arc::new(MockCredentialsProvider::new()))
}
