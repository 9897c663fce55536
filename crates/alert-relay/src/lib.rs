//! Alert relay for Pub/Sub heartbeat alerts.
//!
//! Each alert published to the alerts topic is pushed to this service,
//! formatted as a Slack Block Kit message, and posted to a Slack incoming
//! webhook whose URL lives in Secret Manager.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use alert_relay::{AlertEvent, AlertRelay, GcpSecretManager, SlackWebhook};
//!
//! # async fn run() {
//! // Built once, shared across alerts
//! let relay = AlertRelay::new(
//!     Arc::new(GcpSecretManager::new("my-project")),
//!     Arc::new(SlackWebhook::new()),
//! );
//!
//! // Never fails; failures are logged
//! relay
//!     .handle(AlertEvent::new(r#"{"policyName":"DiskAlert","severity":"critical"}"#))
//!     .await;
//! # }
//! ```
//!
//! # Configuration
//!
//! The service binary is configured via environment variables:
//!
//! - `GCLOUD_PROJECT` / `GOOGLE_CLOUD_PROJECT`: project holding the secret
//! - `RELAY_WEBHOOK_SECRET`: secret name (default `SLACK_ALERT_WEBHOOK`)
//! - `RELAY_SECRET_BACKEND`: `gcp` (default) or `env`
//! - `RELAY_THREAD_TOKEN`: `digest` (default) or `base64`
//! - `PORT`: listen port (default 8080)
//!
//! # Architecture
//!
//! - [`SecretStore`] resolves the webhook URL ([`GcpSecretManager`], [`EnvSecretStore`])
//! - [`ChatWebhook`] posts a [`ChatMessage`] ([`SlackWebhook`])
//! - [`AlertRelay`] runs one alert through parse, classify, format, deliver

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod channels;
pub mod config;
pub mod error;
pub mod message;
pub mod payload;
pub mod pubsub;
pub mod relay;
pub mod secrets;
pub mod server;
pub mod severity;

pub use channels::{ChatWebhook, SlackWebhook};
pub use config::Config;
pub use error::{ChannelError, RelayError, SecretError};
pub use message::{ChatMessage, ThreadTokenEncoding};
pub use payload::{AlertEvent, AlertPayload};
pub use relay::{AlertRelay, RelayOutcome};
pub use secrets::{EnvSecretStore, GcpSecretManager, SecretStore};
pub use severity::Severity;
