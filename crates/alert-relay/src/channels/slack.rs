//! Slack incoming-webhook channel.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::ChatWebhook;
use crate::error::ChannelError;
use crate::message::ChatMessage;

/// Slack incoming-webhook channel.
///
/// The webhook URL is supplied per call since it is resolved from the secret
/// store for every alert.
#[derive(Clone, Default)]
pub struct SlackWebhook {
    client: reqwest::Client,
}

impl SlackWebhook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a channel sharing an existing HTTP client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatWebhook for SlackWebhook {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn post(&self, url: &str, message: &ChatMessage) -> Result<(), ChannelError> {
        debug!(
            channel = "slack",
            title = %message.title(),
            thread_ts = %message.thread_ts(),
            "Posting alert"
        );

        let response = self.client.post(url).json(message).send().await?;

        let status = response.status();
        if status.is_success() {
            debug!(channel = "slack", status = %status, "Alert posted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();

        warn!(
            channel = "slack",
            status = %status,
            body = %body,
            "Slack webhook request failed"
        );

        Err(ChannelError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
