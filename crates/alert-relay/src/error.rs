//! Error types for the alert relay.

use thiserror::Error;

/// Errors that can occur when resolving a secret.
#[derive(Debug, Error)]
pub enum SecretError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Secret or version does not exist
    #[error("Secret not found: {0}")]
    NotFound(String),

    /// Caller may not access the secret
    #[error("Permission denied for secret: {0}")]
    PermissionDenied(String),

    /// Secret store returned an unexpected status
    #[error("Secret store returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Secret payload could not be decoded
    #[error("Failed to decode secret payload: {0}")]
    Decode(String),
}

/// Errors that can occur when posting to a chat webhook.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Webhook answered with a non-success status
    #[error("Webhook returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Errors that end one relay invocation. Never escapes [`crate::AlertRelay::handle`].
#[derive(Debug, Error)]
pub enum RelayError {
    /// Webhook URL could not be resolved; nothing was sent
    #[error("Failed to resolve webhook secret {secret}: {source}")]
    Credential {
        secret: String,
        #[source]
        source: SecretError,
    },

    /// Webhook delivery failed; the alert is dropped
    #[error("Failed to deliver alert: {0}")]
    Delivery(#[from] ChannelError),

    /// Anything else, including a panic inside the pipeline
    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl RelayError {
    /// Pipeline stage that failed, for log fields.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Credential { .. } => "resolve_credential",
            Self::Delivery(_) => "deliver",
            Self::Unexpected(_) => "unexpected",
        }
    }
}
