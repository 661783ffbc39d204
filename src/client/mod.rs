//! Client construction.
//!
//! One builder resolves configuration and credentials once and hands out
//! clients for each service.

use crate::bedrock::BedrockRuntimeClientImpl;
use crate::config::{InferenceConfig, Properties};
use crate::credentials::{
    AwsCredentials, ChainCredentialsProvider, CredentialsProvider, PropertiesCredentialsProvider,
    StaticCredentialsProvider,
};
use crate::error::{ConfigurationError, InferenceError};
use crate::sagemaker::{SageMakerClientImpl, SageMakerRuntimeClientImpl};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Builder for Bedrock and SageMaker clients.
#[derive(Default)]
pub struct ClientBuilder {
    config: Option<InferenceConfig>,
    config_error: Option<ConfigurationError>,
    credentials_provider: Option<Arc<dyn CredentialsProvider>>,
}

impl ClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set configuration.
    pub fn config(mut self, config: InferenceConfig) -> Self {
        self.config = Some(config);
        self.config_error = None;
        self
    }

    /// Set credentials provider.
    pub fn credentials_provider(mut self, provider: Arc<dyn CredentialsProvider>) -> Self {
        self.credentials_provider = Some(provider);
        self
    }

    /// Set static credentials.
    pub fn credentials(mut self, credentials: AwsCredentials) -> Self {
        self.credentials_provider = Some(Arc::new(StaticCredentialsProvider::new(credentials)));
        self
    }

    /// Fill unset parts from environment variables and the default
    /// credentials chain.
    ///
    /// A configuration that fails to build is reported when a client is
    /// requested.
    pub fn from_env(mut self) -> Self {
        if self.config.is_none() {
            match InferenceConfig::builder().from_env().build() {
                Ok(config) => self.config = Some(config),
                Err(InferenceError::Configuration(e)) => {
                    debug!(error = %e, "No usable configuration in environment");
                    self.config_error = Some(e);
                }
                Err(e) => debug!(error = %e, "No usable configuration in environment"),
            }
        }
        if self.credentials_provider.is_none() {
            self.credentials_provider = Some(Arc::new(ChainCredentialsProvider::new()));
        }
        self
    }

    /// Fill unset parts from a `config.properties` file.
    ///
    /// The file must name the region and both credential keys; endpoint
    /// overrides still come from the environment.
    pub fn from_properties_file(mut self, path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let properties = Properties::load(path)?;

        if self.config.is_none() {
            let config = InferenceConfig::builder()
                .from_properties(&properties)?
                .from_env()
                .build()?;
            self.config = Some(config);
            self.config_error = None;
        }
        if self.credentials_provider.is_none() {
            let credentials = PropertiesCredentialsProvider::from_properties(&properties)?;
            self.credentials_provider = Some(Arc::new(StaticCredentialsProvider::new(credentials)));
        }

        debug!(source = properties.source(), "Loaded client settings from properties");
        Ok(self)
    }

    fn parts(&self) -> Result<(&InferenceConfig, Arc<dyn CredentialsProvider>), InferenceError> {
        let config = self.config.as_ref().ok_or_else(|| {
            InferenceError::Configuration(
                self.config_error
                    .clone()
                    .unwrap_or(ConfigurationError::MissingRegion),
            )
        })?;
        let provider = self
            .credentials_provider
            .clone()
            .ok_or(InferenceError::Configuration(ConfigurationError::MissingCredentials))?;
        Ok((config, provider))
    }

    /// Build a Bedrock Runtime client.
    pub fn bedrock_runtime(&self) -> Result<BedrockRuntimeClientImpl, InferenceError> {
        let (config, provider) = self.parts()?;
        BedrockRuntimeClientImpl::new(config, provider)
    }

    /// Build a SageMaker control plane client.
    pub fn sagemaker(&self) -> Result<SageMakerClientImpl, InferenceError> {
        let (config, provider) = self.parts()?;
        SageMakerClientImpl::new(config, provider)
    }

    /// Build a SageMaker Runtime client.
    pub fn sagemaker_runtime(&self) -> Result<SageMakerRuntimeClientImpl, InferenceError> {
        let (config, provider) = self.parts()?;
        SageMakerRuntimeClientImpl::new(config, provider)
    }
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("config", &self.config)
            .field(
                "credentials_provider",
                &self.credentials_provider.as_ref().map(|p| p.name()),
            )
            .finish()
    }
}
