//! Chat webhook channel implementations.

pub mod slack;

pub use slack::SlackWebhook;

use async_trait::async_trait;

use crate::error::ChannelError;
use crate::message::ChatMessage;

/// Trait for chat webhooks that accept one formatted message per POST.
#[async_trait]
pub trait ChatWebhook: Send + Sync {
    /// Get the name of this channel.
    fn name(&self) -> &'static str;

    /// Post `message` to the webhook at `url`.
    async fn post(&self, url: &str, message: &ChatMessage) -> Result<(), ChannelError>;
}
