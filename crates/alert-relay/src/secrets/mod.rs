//! Secret store implementations.

pub mod gcp;

use async_trait::async_trait;

use crate::error::SecretError;

pub use gcp::GcpSecretManager;

/// Trait for stores that hold the webhook credential.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Get the name of this store.
    fn name(&self) -> &'static str;

    /// Fetch the latest version of the secret called `name`.
    async fn latest(&self, name: &str) -> Result<String, SecretError>;
}

/// Secret store backed by environment variables, for local runs.
///
/// The secret `SLACK_ALERT_WEBHOOK` is read from the variable of the same name.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretStore;

#[async_trait]
impl SecretStore for EnvSecretStore {
    fn name(&self) -> &'static str {
        "env"
    }

    async fn latest(&self, name: &str) -> Result<String, SecretError> {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| SecretError::NotFound(name.to_string()))
    }
}
