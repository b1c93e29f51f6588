//! Secret store backends.
//!
//! The external store is specified only at this boundary: a source turns
//! a logical identifier into a credential string or a [`SecretError`].
//! Errors carry no identifier and no store response body; the resolver
//! flattens them to a generic `config_error` anyway.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::collections::BTreeMap;
use std::env;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default AWS region when `AWS_REGION` is unset.
const DEFAULT_REGION: &str = "us-east-1";

/// Failure fetching a secret from its store.
#[derive(Debug, Error)]
pub enum SecretError {
    /// Store credentials are not configured in the environment.
    #[error("secret store credentials are not configured")]
    Credentials,
    /// The store could not be reached.
    #[error("secret store request failed")]
    Transport(#[source] reqwest::Error),
    /// The store answered with a non-success status.
    #[error("secret store returned status {0}")]
    Status(u16),
    /// The store response could not be interpreted.
    #[error("secret store returned an unusable response")]
    Malformed,
    /// The secret exists but has no usable value.
    #[error("secret value is missing or empty")]
    Empty,
    /// The identifier does not name a known secret.
    #[error("secret not found")]
    NotFound,
}

/// A backend that can fetch a secret value by logical identifier.
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Fetch the raw secret value for `secret_id`.
    async fn fetch(&self, secret_id: &str) -> Result<String, SecretError>;
}

/// Source backed by environment variables, for local runs and tests.
///
/// The identifier is used directly as the variable name.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecretSource;

#[async_trait]
impl SecretSource for EnvSecretSource {
    async fn fetch(&self, secret_id: &str) -> Result<String, SecretError> {
        env::var(secret_id).map_err(|_| SecretError::NotFound)
    }
}

/// Source backed by AWS Secrets Manager over its JSON HTTP API.
///
/// Requests are signed with AWS Signature Version 4 using credentials
/// from the standard `AWS_*` environment variables. The endpoint can be
/// overridden (private endpoints, tests) via
/// `AWS_SECRETSMANAGER_ENDPOINT`.
pub struct SecretsManagerSource {
    region: String,
    endpoint: String,
    access_key_id: String,
    secret_access_key: SecretString,
    session_token: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for SecretsManagerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsManagerSource")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl SecretsManagerSource {
    /// Build a source from the standard AWS environment variables.
    ///
    /// # Errors
    /// [`SecretError::Credentials`] if the access key pair is absent.
    pub fn from_env() -> Result<Self, SecretError> {
        let region = env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string());
        let access_key_id =
            env::var("AWS_ACCESS_KEY_ID").map_err(|_| SecretError::Credentials)?;
        let secret_access_key = env::var("AWS_SECRET_ACCESS_KEY")
            .map(SecretString::new)
            .map_err(|_| SecretError::Credentials)?;
        let session_token = env::var("AWS_SESSION_TOKEN").ok();
        let endpoint = env::var("AWS_SECRETSMANAGER_ENDPOINT")
            .unwrap_or_else(|_| format!("https://secretsmanager.{region}.amazonaws.com"));

        Ok(Self::new(
            region,
            endpoint,
            access_key_id,
            secret_access_key,
            session_token,
        ))
    }

    /// Build a source with explicit credentials and endpoint.
    #[must_use]
    pub fn new(
        region: impl Into<String>,
        endpoint: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: SecretString,
        session_token: Option<String>,
    ) -> Self {
        Self {
            region: region.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            access_key_id: access_key_id.into(),
            secret_access_key,
            session_token,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Sign a request with AWS Signature Version 4.
    fn sign_request(
        &self,
        method: &str,
        uri: &str,
        body: &[u8],
        headers: &mut BTreeMap<String, String>,
    ) -> Result<(), SecretError> {
        let now = chrono::Utc::now();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = now.format("%Y%m%d").to_string();

        let service = "secretsmanager";
        let region = &self.region;

        let parsed = url::Url::parse(uri).map_err(|_| SecretError::Malformed)?;
        let host = parsed.host_str().ok_or(SecretError::Malformed)?.to_string();
        let path = if parsed.path().is_empty() {
            "/".to_string()
        } else {
            parsed.path().to_string()
        };

        let payload_hash = hex::encode(sha256_hash(body));

        headers.insert("host".to_string(), host);
        headers.insert("x-amz-date".to_string(), amz_date.clone());
        headers.insert("x-amz-content-sha256".to_string(), payload_hash.clone());
        if let Some(ref token) = self.session_token {
            headers.insert("x-amz-security-token".to_string(), token.clone());
        }

        // BTreeMap keys are already in the sorted order SigV4 requires.
        let signed_headers_str = headers
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(";");

        let mut canonical_headers = String::new();
        for (header, value) in headers.iter() {
            canonical_headers.push_str(&format!("{}:{}\n", header, value.trim()));
        }

        let canonical_request = format!(
            "{}\n{}\n\n{}\n{}\n{}",
            method, path, canonical_headers, signed_headers_str, payload_hash
        );

        let algorithm = "AWS4-HMAC-SHA256";
        let credential_scope = format!("{date_stamp}/{region}/{service}/aws4_request");
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            algorithm,
            amz_date,
            credential_scope,
            hex::encode(sha256_hash(canonical_request.as_bytes()))
        );

        let secret_key = self.secret_access_key.expose_secret();
        let k_date = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date_stamp.as_bytes());
        let k_region = hmac_sha256(&k_date, region.as_bytes());
        let k_service = hmac_sha256(&k_region, service.as_bytes());
        let k_signing = hmac_sha256(&k_service, b"aws4_request");
        let signature = hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes()));

        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            algorithm, self.access_key_id, credential_scope, signed_headers_str, signature
        );
        headers.insert("authorization".to_string(), authorization);

        Ok(())
    }
}

#[async_trait]
impl SecretSource for SecretsManagerSource {
    async fn fetch(&self, secret_id: &str) -> Result<String, SecretError> {
        let body = serde_json::json!({ "SecretId": secret_id }).to_string();
        let body_bytes = body.into_bytes();

        let mut headers = BTreeMap::new();
        headers.insert(
            "content-type".to_string(),
            "application/x-amz-json-1.1".to_string(),
        );
        headers.insert(
            "x-amz-target".to_string(),
            "secretsmanager.GetSecretValue".to_string(),
        );

        self.sign_request("POST", &self.endpoint, &body_bytes, &mut headers)?;

        let mut request = self.client.post(&self.endpoint).body(body_bytes);
        for (name, value) in &headers {
            // reqwest sets host itself from the URL
            if name == "host" {
                continue;
            }
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(SecretError::Transport)?;
        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "secret store request rejected");
            return Err(SecretError::Status(status.as_u16()));
        }

        let payload: serde_json::Value =
            response.json().await.map_err(|_| SecretError::Malformed)?;
        match payload.get("SecretString").and_then(|v| v.as_str()) {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            _ => Err(SecretError::Empty),
        }
    }
}

/// Calculate SHA-256 hash.
fn sha256_hash(data: &[u8]) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Calculate HMAC-SHA256.
fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().into()
}
