//! Configuration for the alert relay service.

use std::env;
use std::sync::Arc;
use thiserror::Error;

use crate::channels::SlackWebhook;
use crate::message::ThreadTokenEncoding;
use crate::relay::{AlertRelay, DEFAULT_SECRET_NAME};
use crate::secrets::gcp::{latest_version_resource, GcpSecretManager};
use crate::secrets::{EnvSecretStore, SecretStore};

/// Errors building the relay from configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GCLOUD_PROJECT or GOOGLE_CLOUD_PROJECT must be set for the gcp secret backend")]
    MissingProject,

    #[error("Unknown secret backend: {0}")]
    UnknownBackend(String),

    #[error("{0}")]
    ThreadToken(String),
}

/// Where the webhook URL is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretBackend {
    /// Google Cloud Secret Manager
    Gcp,
    /// Environment variable named after the secret
    Env,
}

impl std::str::FromStr for SecretBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gcp" | "secret-manager" => Ok(Self::Gcp),
            "env" => Ok(Self::Env),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Alert relay configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,
    /// Hosting project, used to address the secret.
    pub project: Option<String>,
    /// Name of the secret holding the webhook URL.
    pub secret_name: String,
    /// Secret backend name (`gcp` or `env`).
    pub secret_backend: String,
    /// Thread token encoding name (`digest` or `base64`).
    pub thread_token: String,
    /// Secret Manager endpoint override.
    pub secret_manager_endpoint: Option<String>,
    /// Metadata server host override (`GCE_METADATA_HOST`).
    pub metadata_host: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            project: env::var("GCLOUD_PROJECT")
                .or_else(|_| env::var("GOOGLE_CLOUD_PROJECT"))
                .ok()
                .filter(|s| !s.is_empty()),
            secret_name: env::var("RELAY_WEBHOOK_SECRET")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SECRET_NAME.to_string()),
            secret_backend: env::var("RELAY_SECRET_BACKEND").unwrap_or_else(|_| "gcp".to_string()),
            thread_token: env::var("RELAY_THREAD_TOKEN").unwrap_or_else(|_| "digest".to_string()),
            secret_manager_endpoint: env::var("SECRET_MANAGER_ENDPOINT")
                .ok()
                .filter(|s| !s.is_empty()),
            metadata_host: env::var("GCE_METADATA_HOST")
                .ok()
                .filter(|s| !s.is_empty()),
        }
    }
}

impl Config {
    /// Fully-qualified reference to the webhook secret, when a project is known.
    #[must_use]
    pub fn secret_resource(&self) -> Option<String> {
        self.project
            .as_deref()
            .map(|project| latest_version_resource(project, &self.secret_name))
    }

    pub fn backend(&self) -> Result<SecretBackend, ConfigError> {
        self.secret_backend.parse()
    }

    pub fn thread_tokens(&self) -> Result<ThreadTokenEncoding, ConfigError> {
        self.thread_token.parse().map_err(ConfigError::ThreadToken)
    }

    /// Metadata server base URL. A bare host gets an `http://` scheme.
    #[must_use]
    pub fn metadata_url(&self) -> Option<String> {
        self.metadata_host.as_ref().map(|host| {
            if host.contains("://") {
                host.clone()
            } else {
                format!("http://{host}")
            }
        })
    }

    /// Build the secret store this configuration selects.
    pub fn secret_store(&self) -> Result<Arc<dyn SecretStore>, ConfigError> {
        match self.backend()? {
            SecretBackend::Env => Ok(Arc::new(EnvSecretStore)),
            SecretBackend::Gcp => {
                let project = self.project.clone().ok_or(ConfigError::MissingProject)?;
                let mut store = GcpSecretManager::new(project);
                if let Some(endpoint) = &self.secret_manager_endpoint {
                    store = store.with_endpoint(endpoint.clone());
                }
                if let Some(url) = self.metadata_url() {
                    store = store.with_metadata_url(url);
                }
                Ok(Arc::new(store))
            }
        }
    }

    /// Build the relay handler: secret store, Slack webhook, and token encoding.
    pub fn build_relay(&self) -> Result<AlertRelay, ConfigError> {
        Ok(
            AlertRelay::new(self.secret_store()?, Arc::new(SlackWebhook::new()))
                .with_secret_name(self.secret_name.clone())
                .with_thread_tokens(self.thread_tokens()?),
        )
    }
}
