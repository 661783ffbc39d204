//! AWS Signature V4 request signing.
//!
//! One signer per service: Bedrock Runtime signs as `bedrock`, both SageMaker
//! APIs sign as `sagemaker`.

use crate::config::AwsService;
use crate::credentials::{AwsCredentials, CredentialsProvider};
use crate::error::InferenceError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

const AWS_ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// A signed request ready to be sent.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    /// HTTP method.
    pub method: String,
    /// Full URL including query string.
    pub url: Url,
    /// Headers to include.
    pub headers: HashMap<String, String>,
    /// Request body (if any).
    pub body: Option<bytes::Bytes>,
}

/// Trait for AWS request signers.
#[async_trait]
pub trait AwsSigner: Send + Sync {
    /// Sign a request with AWS Signature V4.
    async fn sign(
        &self,
        method: &str,
        url: &Url,
        headers: &HashMap<String, String>,
        body: Option<&[u8]>,
    ) -> Result<SignedRequest, InferenceError>;
}

/// SigV4 signer bound to one region and service.
pub struct RequestSigner {
    credentials_provider: Arc<dyn CredentialsProvider>,
    region: String,
    service: &'static str,
}

impl RequestSigner {
    /// Create a signer for the given service.
    pub fn new(
        credentials_provider: Arc<dyn CredentialsProvider>,
        region: impl Into<String>,
        service: AwsService,
    ) -> Self {
        Self {
            credentials_provider,
            region: region.into(),
            service: service.signing_name(),
        }
    }

    /// Signing name in the credential scope.
    pub fn service(&self) -> &str {
        self.service
    }

    fn build_signing_headers(
        url: &Url,
        original_headers: &HashMap<String, String>,
        timestamp: &DateTime<Utc>,
        payload_hash: &str,
    ) -> Vec<(String, String)> {
        let host = url.host_str().unwrap_or_default();
        let host_value = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let mut headers = vec![
            ("host".to_string(), host_value),
            ("x-amz-date".to_string(), format_datetime(timestamp)),
            ("x-amz-content-sha256".to_string(), payload_hash.to_string()),
        ];

        for (name, value) in original_headers {
            if !is_signing_header(name) {
                headers.push((name.clone(), value.clone()));
            }
        }

        headers
    }

    fn sign_at(
        &self,
        method: &str,
        url: &Url,
        headers: &HashMap<String, String>,
        body: Option<&[u8]>,
        credentials: &AwsCredentials,
        timestamp: &DateTime<Utc>,
    ) -> SignedRequest {
        let payload_hash = sha256_hex(body.unwrap_or_default());
        let signing_headers = Self::build_signing_headers(url, headers, timestamp, &payload_hash);

        let authorization = sign_request(
            method,
            url.path(),
            url.query().unwrap_or(""),
            &signing_headers,
            &payload_hash,
            credentials,
            &self.region,
            self.service,
            timestamp,
        );

        let mut final_headers = headers.clone();
        for (name, value) in &signing_headers {
            if is_signing_header(name) {
                final_headers.insert(name.clone(), value.clone());
            }
        }
        final_headers.insert("authorization".to_string(), authorization);

        if let Some(token) = credentials.session_token() {
            final_headers.insert("x-amz-security-token".to_string(), token.to_string());
        }

        SignedRequest {
            method: method.to_string(),
            url: url.clone(),
            headers: final_headers,
            body: body.map(bytes::Bytes::copy_from_slice),
        }
    }
}

#[async_trait]
impl AwsSigner for RequestSigner {
    async fn sign(
        &self,
        method: &str,
        url: &Url,
        headers: &HashMap<String, String>,
        body: Option<&[u8]>,
    ) -> Result<SignedRequest, InferenceError> {
        let credentials = self.credentials_provider.get_credentials().await?;
        Ok(self.sign_at(method, url, headers, body, &credentials, &Utc::now()))
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("region", &self.region)
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

fn is_signing_header(name: &str) -> bool {
    let name = name.to_lowercase();
    name == "host" || name == "x-amz-date" || name == "x-amz-content-sha256"
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

fn format_date_stamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%d").to_string()
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn derive_signing_key(secret_key: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{}", secret_key).as_bytes(), date_stamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

fn build_signed_headers(headers: &[(String, String)]) -> String {
    let mut names: Vec<String> = headers.iter().map(|(n, _)| n.to_lowercase()).collect();
    names.sort();
    names.join(";")
}

fn build_canonical_headers(headers: &[(String, String)]) -> String {
    let mut sorted: Vec<(String, String)> = headers
        .iter()
        .map(|(n, v)| (n.to_lowercase(), v.trim().to_string()))
        .collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    sorted
        .iter()
        .map(|(n, v)| format!("{}:{}\n", n, v))
        .collect()
}

/// SigV4 URI encoding. Non-S3 services expect the path encoded a second
/// time, so `%3A` in a model ID becomes `%253A` here.
fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut result = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            b'/' if !encode_slash => result.push('/'),
            _ => result.push_str(&format!("%{:02X}", byte)),
        }
    }
    result
}

fn build_canonical_query_string(query: &str) -> String {
    let mut params: Vec<(String, String)> = query
        .split('&')
        .filter(|p| !p.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (uri_encode(key, true), uri_encode(value, true))
        })
        .collect();

    params.sort();

    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn build_canonical_request(
    method: &str,
    path: &str,
    query: &str,
    headers: &[(String, String)],
    payload_hash: &str,
) -> String {
    let canonical_path = if path.is_empty() { "/" } else { path };

    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method,
        uri_encode(canonical_path, false),
        build_canonical_query_string(query),
        build_canonical_headers(headers),
        build_signed_headers(headers),
        payload_hash
    )
}

/// Sign the request and return the authorization header value.
#[allow(clippy::too_many_arguments)]
fn sign_request(
    method: &str,
    path: &str,
    query: &str,
    headers: &[(String, String)],
    payload_hash: &str,
    credentials: &AwsCredentials,
    region: &str,
    service: &str,
    timestamp: &DateTime<Utc>,
) -> String {
    let date_stamp = format_date_stamp(timestamp);
    let canonical_request = build_canonical_request(method, path, query, headers, payload_hash);
    let credential_scope = format!("{}/{}/{}/aws4_request", date_stamp, region, service);

    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        AWS_ALGORITHM,
        format_datetime(timestamp),
        credential_scope,
        sha256_hex(canonical_request.as_bytes())
    );

    let signing_key =
        derive_signing_key(credentials.secret_access_key(), &date_stamp, region, service);
    let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

    format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        AWS_ALGORITHM,
        credentials.access_key_id(),
        credential_scope,
        build_signed_headers(headers),
        signature
    )
}
