//! Configuration for the Bedrock and SageMaker clients.

mod properties;

pub use properties::{
    default_path, Properties, ACCESS_KEY_ID_KEY, DEFAULT_PROPERTIES_FILE, PROPERTIES_PATH_ENV,
    REGION_KEY, SECRET_ACCESS_KEY_KEY, SESSION_TOKEN_KEY,
};

use crate::error::{ConfigurationError, InferenceError};
use std::collections::HashMap;
use std::time::Duration;

/// AWS services reached by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AwsService {
    /// Bedrock Runtime (model invocation, Converse).
    BedrockRuntime,
    /// SageMaker control plane (endpoint listing).
    SageMaker,
    /// SageMaker Runtime (endpoint invocation).
    SageMakerRuntime,
}

impl AwsService {
    /// Name used in the SigV4 credential scope.
    pub fn signing_name(&self) -> &'static str {
        match self {
            AwsService::BedrockRuntime => "bedrock",
            AwsService::SageMaker | AwsService::SageMakerRuntime => "sagemaker",
        }
    }

    /// Default regional endpoint.
    pub fn default_endpoint(&self, region: &str) -> String {
        match self {
            AwsService::BedrockRuntime => format!("https://bedrock-runtime.{}.amazonaws.com", region),
            AwsService::SageMaker => format!("https://api.sagemaker.{}.amazonaws.com", region),
            AwsService::SageMakerRuntime => {
                format!("https://runtime.sagemaker.{}.amazonaws.com", region)
            }
        }
    }

    /// Service-specific endpoint override variable.
    pub fn endpoint_env_var(&self) -> &'static str {
        match self {
            AwsService::BedrockRuntime => "AWS_ENDPOINT_URL_BEDROCK_RUNTIME",
            AwsService::SageMaker => "AWS_ENDPOINT_URL_SAGEMAKER",
            AwsService::SageMakerRuntime => "AWS_ENDPOINT_URL_SAGEMAKER_RUNTIME",
        }
    }

    const ALL: [AwsService; 3] = [
        AwsService::BedrockRuntime,
        AwsService::SageMaker,
        AwsService::SageMakerRuntime,
    ];
}

impl std::fmt::Display for AwsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AwsService::BedrockRuntime => write!(f, "bedrock-runtime"),
            AwsService::SageMaker => write!(f, "sagemaker"),
            AwsService::SageMakerRuntime => write!(f, "sagemaker-runtime"),
        }
    }
}

/// Client configuration shared by all services.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// AWS region.
    pub region: String,
    /// Endpoint override applied to every service (testing, LocalStack).
    pub endpoint_url: Option<String>,
    /// Per-service endpoint overrides; these win over `endpoint_url`.
    pub service_endpoints: HashMap<AwsService, String>,
    /// Request timeout.
    pub timeout: Duration,
    /// Retry settings for unary operations.
    pub retry: RetryConfig,
    /// Per-chunk timeout for streaming.
    pub stream_chunk_timeout: Duration,
}

impl InferenceConfig {
    /// Create a new config builder.
    pub fn builder() -> InferenceConfigBuilder {
        InferenceConfigBuilder::new()
    }

    /// Resolve the base URL for a service.
    pub fn endpoint(&self, service: AwsService) -> String {
        if let Some(url) = self.service_endpoints.get(&service) {
            return url.trim_end_matches('/').to_string();
        }
        if let Some(url) = &self.endpoint_url {
            return url.trim_end_matches('/').to_string();
        }
        service.default_endpoint(&self.region)
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            endpoint_url: None,
            service_endpoints: HashMap::new(),
            timeout: Duration::from_secs(60),
            retry: RetryConfig::default(),
            stream_chunk_timeout: Duration::from_secs(120),
        }
    }
}

/// Builder for InferenceConfig.
#[derive(Debug, Default)]
pub struct InferenceConfigBuilder {
    region: Option<String>,
    endpoint_url: Option<String>,
    service_endpoints: HashMap<AwsService, String>,
    timeout: Option<Duration>,
    retry: Option<RetryConfig>,
    max_retries: Option<u32>,
    stream_chunk_timeout: Option<Duration>,
}

impl InferenceConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the AWS region.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set an endpoint URL used for every service.
    pub fn endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    /// Set an endpoint URL for one service.
    pub fn service_endpoint(mut self, service: AwsService, url: impl Into<String>) -> Self {
        self.service_endpoints.insert(service, url.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set maximum retries.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Replace the retry configuration.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Set per-chunk timeout for streaming.
    pub fn stream_chunk_timeout(mut self, timeout: Duration) -> Self {
        self.stream_chunk_timeout = Some(timeout);
        self
    }

    /// Fill unset values from environment variables.
    pub fn from_env(mut self) -> Self {
        if self.region.is_none() {
            self.region = std::env::var("AWS_REGION")
                .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
                .ok();
        }

        for service in AwsService::ALL {
            if !self.service_endpoints.contains_key(&service) {
                if let Ok(url) = std::env::var(service.endpoint_env_var()) {
                    self.service_endpoints.insert(service, url);
                }
            }
        }

        if self.endpoint_url.is_none() {
            self.endpoint_url = std::env::var("AWS_ENDPOINT_URL").ok();
        }

        self
    }

    /// Fill the region from a properties file (`aws.region`).
    pub fn from_properties(mut self, properties: &Properties) -> Result<Self, InferenceError> {
        if self.region.is_none() {
            self.region = Some(properties.require(REGION_KEY)?.to_string());
        }
        Ok(self)
    }

    /// Build the configuration.
    pub fn build(self) -> Result<InferenceConfig, InferenceError> {
        let region = self
            .region
            .ok_or(InferenceError::Configuration(ConfigurationError::MissingRegion))?;

        if !is_valid_region(&region) {
            return Err(InferenceError::Configuration(ConfigurationError::InvalidRegion {
                region,
            }));
        }

        let mut retry = self.retry.unwrap_or_default();
        if let Some(max_retries) = self.max_retries {
            retry.max_retries = max_retries;
        }

        Ok(InferenceConfig {
            region,
            endpoint_url: self.endpoint_url,
            service_endpoints: self.service_endpoints,
            timeout: self.timeout.unwrap_or(Duration::from_secs(60)),
            retry,
            stream_chunk_timeout: self.stream_chunk_timeout.unwrap_or(Duration::from_secs(120)),
        })
    }
}

/// Validate AWS region format.
fn is_valid_region(region: &str) -> bool {
    // Basic validation: should match pattern like "us-east-1", "eu-west-2", etc.
    let parts: Vec<&str> = region.split('-').collect();
    if parts.len() < 3 {
        return region.starts_with("local") || region == "localhost";
    }

    let valid_prefixes = ["us", "eu", "ap", "sa", "ca", "me", "af", "cn", "il", "mx"];
    valid_prefixes.contains(&parts[0])
        && parts[parts.len() - 1].chars().all(|c| c.is_ascii_digit())
}

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries.
    pub max_retries: u32,
    /// Base delay before first retry.
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Exponential backoff multiplier.
    pub multiplier: f64,
    /// Add random jitter to delays.
    pub jitter: bool,
}

impl RetryConfig {
    /// A policy that never retries.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: true,
        }
    }
}
