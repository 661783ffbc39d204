//! AWS credentials for signing Bedrock and SageMaker requests.
//!
//! Providers follow the standard AWS credential chain, with an extra
//! provider that reads the `config.properties` file used by the samples.

use crate::config::{Properties, ACCESS_KEY_ID_KEY, SECRET_ACCESS_KEY_KEY, SESSION_TOKEN_KEY};
use crate::error::{CredentialsError, InferenceError};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, trace};

/// AWS credentials.
#[derive(Clone)]
pub struct AwsCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
    expiration: Option<DateTime<Utc>>,
}

impl AwsCredentials {
    /// Create new long-term credentials.
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
            expiration: None,
        }
    }

    /// Create credentials with session token.
    pub fn with_session_token(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Self {
        Self {
            session_token: Some(session_token.into()),
            ..Self::new(access_key_id, secret_access_key)
        }
    }

    /// Create temporary credentials with expiration.
    pub fn temporary(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
        expiration: DateTime<Utc>,
    ) -> Self {
        Self {
            expiration: Some(expiration),
            ..Self::with_session_token(access_key_id, secret_access_key, session_token)
        }
    }

    /// Get the access key ID.
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Get the secret access key.
    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    /// Get the session token if present.
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    /// Get the expiration time if present.
    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.expiration
    }

    /// Check if credentials are expired.
    pub fn is_expired(&self) -> bool {
        self.expiration.map(|exp| exp <= Utc::now()).unwrap_or(false)
    }

    /// Check if credentials will expire within the given duration.
    pub fn will_expire_within(&self, duration: Duration) -> bool {
        self.expiration
            .map(|exp| exp <= Utc::now() + duration)
            .unwrap_or(false)
    }

    fn from_parts(
        access_key_id: String,
        secret_access_key: String,
        session_token: Option<String>,
    ) -> Self {
        match session_token {
            Some(token) => Self::with_session_token(access_key_id, secret_access_key, token),
            None => Self::new(access_key_id, secret_access_key),
        }
    }
}

// Keep the secret out of logs.
impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Trait for credential providers.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    /// Get credentials.
    async fn get_credentials(&self) -> Result<AwsCredentials, InferenceError>;

    /// Refresh credentials (force reload).
    async fn refresh_credentials(&self) -> Result<AwsCredentials, InferenceError> {
        self.get_credentials().await
    }

    /// Provider name for debugging.
    fn name(&self) -> &'static str;
}

/// Static credentials provider.
pub struct StaticCredentialsProvider {
    credentials: AwsCredentials,
}

impl StaticCredentialsProvider {
    /// Create a new static credentials provider.
    pub fn new(credentials: AwsCredentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl CredentialsProvider for StaticCredentialsProvider {
    async fn get_credentials(&self) -> Result<AwsCredentials, InferenceError> {
        if self.credentials.is_expired() {
            return Err(InferenceError::Credentials(CredentialsError::Expired {
                expiration: self
                    .credentials
                    .expiration()
                    .map(|e| e.to_rfc3339())
                    .unwrap_or_default(),
            }));
        }
        Ok(self.credentials.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Environment credentials provider.
#[derive(Debug, Default)]
pub struct EnvCredentialsProvider;

impl EnvCredentialsProvider {
    /// Create a new environment credentials provider.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CredentialsProvider for EnvCredentialsProvider {
    async fn get_credentials(&self) -> Result<AwsCredentials, InferenceError> {
        let access_key = std::env::var("AWS_ACCESS_KEY_ID")
            .map_err(|_| InferenceError::Credentials(CredentialsError::NotFound))?;

        let secret_key = std::env::var("AWS_SECRET_ACCESS_KEY")
            .map_err(|_| InferenceError::Credentials(CredentialsError::NotFound))?;

        let session_token = std::env::var("AWS_SESSION_TOKEN").ok();

        Ok(AwsCredentials::from_parts(access_key, secret_key, session_token))
    }

    fn name(&self) -> &'static str {
        "environment"
    }
}

/// Reads `aws.accessKeyId` / `aws.secretAccessKey` from a properties file.
#[derive(Debug, Clone)]
pub struct PropertiesCredentialsProvider {
    path: PathBuf,
}

impl PropertiesCredentialsProvider {
    /// Use the default properties location.
    pub fn new() -> Self {
        Self {
            path: crate::config::default_path(),
        }
    }

    /// Use a specific properties file.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Extract credentials from already-loaded properties.
    pub fn from_properties(properties: &Properties) -> Result<AwsCredentials, InferenceError> {
        let access_key = properties.require(ACCESS_KEY_ID_KEY)?;
        let secret_key = properties.require(SECRET_ACCESS_KEY_KEY)?;
        let session_token = properties.get(SESSION_TOKEN_KEY).map(str::to_string);

        Ok(AwsCredentials::from_parts(
            access_key.to_string(),
            secret_key.to_string(),
            session_token,
        ))
    }
}

impl Default for PropertiesCredentialsProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialsProvider for PropertiesCredentialsProvider {
    async fn get_credentials(&self) -> Result<AwsCredentials, InferenceError> {
        if !self.path.exists() {
            return Err(InferenceError::Credentials(CredentialsError::NotFound));
        }
        let properties = Properties::load(&self.path)?;
        Self::from_properties(&properties)
    }

    fn name(&self) -> &'static str {
        "properties"
    }
}

/// Profile credentials provider (reads from ~/.aws/credentials).
#[derive(Debug, Clone)]
pub struct ProfileCredentialsProvider {
    profile: String,
}

impl ProfileCredentialsProvider {
    /// Create a new profile credentials provider with the default profile.
    pub fn new() -> Self {
        Self {
            profile: std::env::var("AWS_PROFILE").unwrap_or_else(|_| "default".to_string()),
        }
    }

    /// Create with a specific profile name.
    pub fn with_profile(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
        }
    }

    fn credentials_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("AWS_SHARED_CREDENTIALS_FILE") {
            return Some(PathBuf::from(path));
        }
        dirs::home_dir().map(|h| h.join(".aws").join("credentials"))
    }

    fn parse_credentials(&self, content: &str) -> Result<AwsCredentials, InferenceError> {
        let mut in_profile = false;
        let mut access_key: Option<String> = None;
        let mut secret_key: Option<String> = None;
        let mut session_token: Option<String> = None;

        let profile_header = format!("[{}]", self.profile);

        for line in content.lines() {
            let line = line.trim();

            if line.starts_with('[') {
                in_profile = line == profile_header;
                continue;
            }

            if !in_profile {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let value = value.trim().to_string();
                match key.trim() {
                    "aws_access_key_id" => access_key = Some(value),
                    "aws_secret_access_key" => secret_key = Some(value),
                    "aws_session_token" => session_token = Some(value),
                    _ => {}
                }
            }
        }

        match (access_key, secret_key) {
            (Some(ak), Some(sk)) => Ok(AwsCredentials::from_parts(ak, sk, session_token)),
            _ => Err(InferenceError::Credentials(CredentialsError::NotFound)),
        }
    }
}

impl Default for ProfileCredentialsProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialsProvider for ProfileCredentialsProvider {
    async fn get_credentials(&self) -> Result<AwsCredentials, InferenceError> {
        let path = Self::credentials_path()
            .ok_or(InferenceError::Credentials(CredentialsError::NotFound))?;

        if !path.exists() {
            return Err(InferenceError::Credentials(CredentialsError::NotFound));
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            InferenceError::Credentials(CredentialsError::Invalid {
                message: format!("Failed to read credentials file: {}", e),
            })
        })?;

        self.parse_credentials(&content)
    }

    fn name(&self) -> &'static str {
        "profile"
    }
}

/// Chained credentials provider that tries multiple sources.
pub struct ChainCredentialsProvider {
    providers: Vec<Arc<dyn CredentialsProvider>>,
    cached: RwLock<Option<CachedCredentials>>,
    refresh_buffer_seconds: i64,
}

struct CachedCredentials {
    credentials: AwsCredentials,
    provider_name: &'static str,
}

impl ChainCredentialsProvider {
    /// Environment, then properties file, then shared profile.
    pub fn new() -> Self {
        Self::with_providers(vec![
            Arc::new(EnvCredentialsProvider::new()),
            Arc::new(PropertiesCredentialsProvider::new()),
            Arc::new(ProfileCredentialsProvider::new()),
        ])
    }

    /// Create a chain with custom providers.
    pub fn with_providers(providers: Vec<Arc<dyn CredentialsProvider>>) -> Self {
        Self {
            providers,
            cached: RwLock::new(None),
            refresh_buffer_seconds: 300,
        }
    }

    /// Set the refresh buffer (seconds before expiration to refresh).
    pub fn with_refresh_buffer(mut self, seconds: i64) -> Self {
        self.refresh_buffer_seconds = seconds;
        self
    }

    /// Add a provider to the chain.
    pub fn add_provider(mut self, provider: Arc<dyn CredentialsProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    fn should_refresh(&self, creds: &AwsCredentials) -> bool {
        creds.is_expired() || creds.will_expire_within(Duration::seconds(self.refresh_buffer_seconds))
    }

    async fn try_providers(&self) -> Result<(AwsCredentials, &'static str), InferenceError> {
        let mut last_error: Option<InferenceError> = None;

        for provider in &self.providers {
            let name = provider.name();
            trace!("Trying credentials provider: {}", name);

            match provider.get_credentials().await {
                Ok(creds) => {
                    debug!("Credentials loaded from provider: {}", name);
                    return Ok((creds, name));
                }
                Err(e) => {
                    trace!("Provider {} failed: {}", name, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(InferenceError::Credentials(CredentialsError::NotFound)))
    }
}

impl Default for ChainCredentialsProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialsProvider for ChainCredentialsProvider {
    async fn get_credentials(&self) -> Result<AwsCredentials, InferenceError> {
        {
            let cache = self.cached.read();
            if let Some(cached) = cache.as_ref() {
                if !self.should_refresh(&cached.credentials) {
                    trace!("Using cached credentials from provider: {}", cached.provider_name);
                    return Ok(cached.credentials.clone());
                }
            }
        }

        let (creds, name) = self.try_providers().await?;

        *self.cached.write() = Some(CachedCredentials {
            credentials: creds.clone(),
            provider_name: name,
        });

        Ok(creds)
    }

    async fn refresh_credentials(&self) -> Result<AwsCredentials, InferenceError> {
        *self.cached.write() = None;
        self.get_credentials().await
    }

    fn name(&self) -> &'static str {
        "chain"
    }
}

impl std::fmt::Debug for ChainCredentialsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainCredentialsProvider")
            .field(
                "providers",
                &self.providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("refresh_buffer_seconds", &self.refresh_buffer_seconds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigurationError;

    #[test]
    fn test_credentials_new() {
        let creds = AwsCredentials::new("AKID", "SECRET");
        assert_eq!(creds.access_key_id(), "AKID");
        assert_eq!(creds.secret_access_key(), "SECRET");
        assert!(creds.session_token().is_none());
        assert!(!creds.is_expired());
    }

    #[test]
    fn test_credentials_expired() {
        let past = Utc::now() - Duration::hours(1);
        let creds = AwsCredentials::temporary("AKID", "SECRET", "TOKEN", past);
        assert!(creds.is_expired());
        assert_eq!(creds.session_token(), Some("TOKEN"));
    }

    #[test]
    fn test_credentials_will_expire_within() {
        let soon = Utc::now() + Duration::minutes(2);
        let creds = AwsCredentials::temporary("AKID", "SECRET", "TOKEN", soon);
        assert!(creds.will_expire_within(Duration::minutes(5)));
        assert!(!creds.will_expire_within(Duration::seconds(30)));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = AwsCredentials::with_session_token("AKID", "SECRET", "TOKEN");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("AKID"));
        assert!(!debug.contains("SECRET"));
        assert!(!debug.contains("TOKEN"));
    }

    #[tokio::test]
    async fn test_static_provider_rejects_expired() {
        let past = Utc::now() - Duration::hours(1);
        let provider =
            StaticCredentialsProvider::new(AwsCredentials::temporary("AKID", "SECRET", "T", past));
        assert!(matches!(
            provider.get_credentials().await,
            Err(InferenceError::Credentials(CredentialsError::Expired { .. }))
        ));
    }

    #[test]
    fn test_profile_parse() {
        let provider = ProfileCredentialsProvider::with_profile("default");
        let content = r#"
[default]
aws_access_key_id = AKID123
aws_secret_access_key = SECRET456

[other]
aws_access_key_id = OTHER
aws_secret_access_key = KEY
"#;

        let creds = provider.parse_credentials(content).unwrap();
        assert_eq!(creds.access_key_id(), "AKID123");
        assert_eq!(creds.secret_access_key(), "SECRET456");

        let other = ProfileCredentialsProvider::with_profile("other")
            .parse_credentials(content)
            .unwrap();
        assert_eq!(other.access_key_id(), "OTHER");
    }

    #[test]
    fn test_properties_credentials() {
        let props = Properties::parse(
            "config.properties",
            "aws.accessKeyId=AKID\naws.secretAccessKey=SECRET\naws.region=us-east-1",
        );
        let creds = PropertiesCredentialsProvider::from_properties(&props).unwrap();
        assert_eq!(creds.access_key_id(), "AKID");
        assert!(creds.session_token().is_none());

        let partial = Properties::parse("config.properties", "aws.accessKeyId=AKID");
        let err = PropertiesCredentialsProvider::from_properties(&partial).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::Configuration(ConfigurationError::MissingProperty { ref key, .. })
                if key == "aws.secretAccessKey"
        ));
    }

    #[tokio::test]
    async fn test_properties_provider_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.properties");
        std::fs::write(
            &path,
            "aws.accessKeyId=FILEKEY\naws.secretAccessKey=FILESECRET\naws.sessionToken=TOK\n",
        )
        .unwrap();

        let creds = PropertiesCredentialsProvider::with_path(&path)
            .get_credentials()
            .await
            .unwrap();
        assert_eq!(creds.access_key_id(), "FILEKEY");
        assert_eq!(creds.session_token(), Some("TOK"));

        let missing = PropertiesCredentialsProvider::with_path(dir.path().join("absent"));
        assert!(matches!(
            missing.get_credentials().await,
            Err(InferenceError::Credentials(CredentialsError::NotFound))
        ));
    }

    #[tokio::test]
    async fn test_chain_falls_through_and_caches() {
        let dir = tempfile::tempdir().unwrap();
        let chain = ChainCredentialsProvider::with_providers(vec![
            Arc::new(PropertiesCredentialsProvider::with_path(dir.path().join("absent"))),
            Arc::new(StaticCredentialsProvider::new(AwsCredentials::new("AKID", "SECRET"))),
        ]);

        let creds = chain.get_credentials().await.unwrap();
        assert_eq!(creds.access_key_id(), "AKID");
        assert!(chain.cached.read().is_some());
    }
}
