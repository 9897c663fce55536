//! The alert relay handler: decode, resolve credential, format, deliver.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::channels::ChatWebhook;
use crate::error::RelayError;
use crate::message::{ChatMessage, ThreadTokenEncoding};
use crate::payload::{AlertEvent, AlertPayload};
use crate::secrets::SecretStore;
use crate::severity::Severity;

/// Secret holding the webhook URL unless configured otherwise.
pub const DEFAULT_SECRET_NAME: &str = "SLACK_ALERT_WEBHOOK";

/// Result of one relay invocation.
#[derive(Debug)]
pub enum RelayOutcome {
    /// Message accepted by the webhook
    Delivered {
        severity: Severity,
        /// Lower-cased severity text the classification was made from
        label: String,
    },
    /// Alert dropped; the error has already been logged
    Failed(RelayError),
}

impl RelayOutcome {
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// Relays one alert event to the chat webhook.
///
/// Built once per process and shared across invocations. Holds no per-alert
/// state.
#[derive(Clone)]
pub struct AlertRelay {
    secrets: Arc<dyn SecretStore>,
    webhook: Arc<dyn ChatWebhook>,
    secret_name: String,
    thread_tokens: ThreadTokenEncoding,
}

impl AlertRelay {
    #[must_use]
    pub fn new(secrets: Arc<dyn SecretStore>, webhook: Arc<dyn ChatWebhook>) -> Self {
        Self {
            secrets,
            webhook,
            secret_name: DEFAULT_SECRET_NAME.to_string(),
            thread_tokens: ThreadTokenEncoding::default(),
        }
    }

    /// Use a different secret for the webhook URL.
    #[must_use]
    pub fn with_secret_name(mut self, name: impl Into<String>) -> Self {
        self.secret_name = name.into();
        self
    }

    /// Choose how thread keys become `thread_ts` tokens.
    #[must_use]
    pub const fn with_thread_tokens(mut self, encoding: ThreadTokenEncoding) -> Self {
        self.thread_tokens = encoding;
        self
    }

    #[must_use]
    pub fn secret_name(&self) -> &str {
        &self.secret_name
    }

    /// Relay one alert. Never fails and never panics.
    ///
    /// Every error, and any panic raised while relaying, is logged and
    /// reported as [`RelayOutcome::Failed`].
    pub async fn handle(&self, event: AlertEvent) -> RelayOutcome {
        let result = AssertUnwindSafe(self.relay(event))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(RelayError::Unexpected(panic_message(panic.as_ref()))));

        match result {
            Ok((severity, label)) => {
                info!(
                    severity = %label.to_uppercase(),
                    class = severity.as_str(),
                    "✅ Alert posted to Slack"
                );
                RelayOutcome::Delivered { severity, label }
            }
            Err(e) => {
                error!(stage = e.stage(), error = %e, "❌ Alert relay failed");
                RelayOutcome::Failed(e)
            }
        }
    }

    async fn relay(&self, event: AlertEvent) -> Result<(Severity, String), RelayError> {
        let raw = event.text();
        info!(raw = %raw, "📩 Incoming alert");

        let webhook_url = self
            .secrets
            .latest(&self.secret_name)
            .await
            .map_err(|source| RelayError::Credential {
                secret: self.secret_name.clone(),
                source,
            })?;

        let payload = AlertPayload::parse(&raw);
        let label = payload.severity_label();
        let message = ChatMessage::from_payload(&payload, self.thread_tokens);

        debug!(
            channel = self.webhook.name(),
            title = %message.title(),
            color = message.color(),
            thread_ts = %message.thread_ts(),
            has_link = message.link().is_some(),
            "Formatted alert"
        );

        self.webhook.post(&webhook_url, &message).await?;

        Ok((message.severity(), label))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ChannelError, SecretError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeSecrets {
        missing: bool,
    }

    #[async_trait]
    impl SecretStore for FakeSecrets {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn latest(&self, name: &str) -> Result<String, SecretError> {
            if self.missing {
                Err(SecretError::NotFound(name.to_string()))
            } else {
                Ok("https://hooks.example/T/B/X".to_string())
            }
        }
    }

    #[derive(Default)]
    struct RecordingWebhook {
        sent: Mutex<Vec<(String, ChatMessage)>>,
        reject: bool,
        panic: bool,
    }

    #[async_trait]
    impl ChatWebhook for RecordingWebhook {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn post(&self, url: &str, message: &ChatMessage) -> Result<(), ChannelError> {
            assert!(!self.panic, "webhook exploded");
            self.sent
                .lock()
                .unwrap()
                .push((url.to_string(), message.clone()));
            if self.reject {
                Err(ChannelError::Rejected {
                    status: 500,
                    body: "internal_error".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn relay(secrets: FakeSecrets, webhook: &Arc<RecordingWebhook>) -> AlertRelay {
        AlertRelay::new(Arc::new(secrets), webhook.clone())
    }

    #[tokio::test]
    async fn test_structured_alert_is_delivered() {
        let webhook = Arc::new(RecordingWebhook::default());
        let outcome = relay(FakeSecrets::default(), &webhook)
            .handle(AlertEvent::new(
                r#"{"policyName":"DiskAlert","text":"Disk 95% full","severity":"Critical","policyId":"disk-001"}"#,
            ))
            .await;

        match outcome {
            RelayOutcome::Delivered { severity, label } => {
                assert_eq!(severity, Severity::Critical);
                assert_eq!(label, "critical");
            }
            RelayOutcome::Failed(e) => panic!("unexpected failure: {e}"),
        }

        let sent = webhook.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (url, message) = &sent[0];
        assert_eq!(url, "https://hooks.example/T/B/X");
        assert_eq!(message.title(), "DiskAlert");
        assert_eq!(message.color(), "#FF0000");
        assert_eq!(
            message.thread_ts(),
            ThreadTokenEncoding::Digest.token("disk-001")
        );
    }

    #[tokio::test]
    async fn test_unstructured_alert_is_delivered_degraded() {
        let webhook = Arc::new(RecordingWebhook::default());
        let outcome = relay(FakeSecrets::default(), &webhook)
            .handle(AlertEvent::new("disk full on host A"))
            .await;

        assert!(outcome.is_delivered());
        let sent = webhook.sent.lock().unwrap();
        assert_eq!(sent[0].1.body(), "disk full on host A");
        assert_eq!(sent[0].1.title(), crate::payload::FALLBACK_TITLE);
    }

    #[tokio::test]
    async fn test_missing_secret_sends_nothing() {
        let webhook = Arc::new(RecordingWebhook::default());
        let outcome = relay(FakeSecrets { missing: true }, &webhook)
            .handle(AlertEvent::new("anything"))
            .await;

        assert!(matches!(
            outcome,
            RelayOutcome::Failed(RelayError::Credential { .. })
        ));
        assert!(webhook.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_delivery_is_single_attempt() {
        let webhook = Arc::new(RecordingWebhook {
            reject: true,
            ..Default::default()
        });
        let outcome = relay(FakeSecrets::default(), &webhook)
            .handle(AlertEvent::new("anything"))
            .await;

        match outcome {
            RelayOutcome::Failed(RelayError::Delivery(ChannelError::Rejected { status, body })) => {
                assert_eq!(status, 500);
                assert_eq!(body, "internal_error");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(webhook.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let webhook = Arc::new(RecordingWebhook {
            panic: true,
            ..Default::default()
        });
        let outcome = relay(FakeSecrets::default(), &webhook)
            .handle(AlertEvent::new("anything"))
            .await;

        match outcome {
            RelayOutcome::Failed(e @ RelayError::Unexpected(_)) => {
                assert_eq!(e.stage(), "unexpected");
                assert!(e.to_string().contains("webhook exploded"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_custom_secret_name_and_encoding() {
        let webhook = Arc::new(RecordingWebhook::default());
        let relay = relay(FakeSecrets::default(), &webhook)
            .with_secret_name("OTHER_HOOK")
            .with_thread_tokens(ThreadTokenEncoding::Base64Prefix);
        assert_eq!(relay.secret_name(), "OTHER_HOOK");

        relay.handle(AlertEvent::new("{}")).await;

        let sent = webhook.sent.lock().unwrap();
        assert_eq!(sent[0].1.thread_ts(), "aGVhcnRiZW");
    }
}
