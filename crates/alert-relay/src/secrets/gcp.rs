//! Google Cloud Secret Manager over REST.
//!
//! Access tokens come from the GCE metadata server, which is available on
//! Cloud Run, Cloud Functions, and GCE. Tokens are cached until shortly
//! before they expire.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use super::SecretStore;
use crate::error::SecretError;

/// Public Secret Manager endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://secretmanager.googleapis.com";

/// Metadata server base URL.
pub const DEFAULT_METADATA_URL: &str = "http://metadata.google.internal";

const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

/// Refresh tokens this long before they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Fully-qualified name of the latest version of a secret.
#[must_use]
pub fn latest_version_resource(project: &str, secret: &str) -> String {
    format!("projects/{project}/secrets/{secret}/versions/latest")
}

/// Secret Manager client for one project.
pub struct GcpSecretManager {
    project: String,
    endpoint: String,
    metadata_url: String,
    client: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl GcpSecretManager {
    /// Create a client for `project` against the public endpoints.
    #[must_use]
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            metadata_url: DEFAULT_METADATA_URL.to_string(),
            client: reqwest::Client::new(),
            token: Mutex::new(None),
        }
    }

    /// Override the Secret Manager endpoint (emulators, tests).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the metadata server base URL.
    #[must_use]
    pub fn with_metadata_url(mut self, url: impl Into<String>) -> Self {
        self.metadata_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Share an existing HTTP client.
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    async fn access_token(&self) -> Result<String, SecretError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let response = self
            .client
            .get(format!("{}{TOKEN_PATH}", self.metadata_url))
            .header("Metadata-Flavor", "Google")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SecretError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        debug!(expires_in = token.expires_in, "Fetched metadata access token");

        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(token.access_token)
    }
}

#[async_trait]
impl SecretStore for GcpSecretManager {
    fn name(&self) -> &'static str {
        "gcp-secret-manager"
    }

    async fn latest(&self, name: &str) -> Result<String, SecretError> {
        let resource = latest_version_resource(&self.project, name);
        let token = self.access_token().await?;

        debug!(secret = %resource, "Accessing secret version");

        let response = self
            .client
            .get(format!("{}/v1/{resource}:access", self.endpoint))
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(SecretError::NotFound(resource)),
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => {
                return Err(SecretError::PermissionDenied(resource))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                return Err(SecretError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
        }

        let version: AccessResponse = response.json().await?;
        let bytes = STANDARD
            .decode(version.payload.data.as_bytes())
            .map_err(|e| SecretError::Decode(e.to_string()))?;
        let value = String::from_utf8(bytes).map_err(|e| SecretError::Decode(e.to_string()))?;

        Ok(value.trim().to_string())
    }
}

// =============================================================================
// Secret Manager / metadata API types
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct AccessResponse {
    payload: SecretPayload,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    #[serde(default)]
    data: String,
}
