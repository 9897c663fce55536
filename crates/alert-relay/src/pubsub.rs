//! Pub/Sub push delivery envelope.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::payload::AlertEvent;

/// Errors decoding a push envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Invalid push envelope: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message data is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Body of a Pub/Sub push request.
#[derive(Debug, Deserialize)]
pub struct PushEnvelope {
    pub message: PubsubMessage,
    #[serde(default)]
    pub subscription: Option<String>,
}

/// A single Pub/Sub message.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubsubMessage {
    /// Base64-encoded payload
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub publish_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl PushEnvelope {
    /// Parse a push request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Decode the message data into an alert event. Missing data is an empty event.
    pub fn into_event(self) -> Result<AlertEvent, EnvelopeError> {
        let data = match self.message.data {
            Some(data) => STANDARD.decode(data.trim())?,
            None => Vec::new(),
        };
        Ok(AlertEvent::new(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_push_envelope() {
        let body = json!({
            "message": {
                "data": STANDARD.encode(r#"{"policyName":"DiskAlert"}"#),
                "messageId": "136969346945",
                "publishTime": "2026-10-19T08:00:00.000Z",
                "attributes": { "origin": "monitoring" }
            },
            "subscription": "projects/demo/subscriptions/heartbeat-alerts-push"
        });

        let envelope = PushEnvelope::from_slice(body.to_string().as_bytes()).unwrap();
        assert_eq!(envelope.message.message_id.as_deref(), Some("136969346945"));
        assert_eq!(envelope.message.attributes["origin"], "monitoring");
        assert!(envelope.message.publish_time.is_some());

        let event = envelope.into_event().unwrap();
        assert_eq!(event.text(), r#"{"policyName":"DiskAlert"}"#);
    }

    #[test]
    fn test_missing_data_is_empty_event() {
        let envelope = PushEnvelope::from_slice(br#"{"message":{}}"#).unwrap();
        assert_eq!(envelope.into_event().unwrap().text(), "");
    }

    #[test]
    fn test_invalid_base64() {
        let envelope = PushEnvelope::from_slice(br#"{"message":{"data":"@@@"}}"#).unwrap();
        assert!(matches!(envelope.into_event(), Err(EnvelopeError::Base64(_))));
    }

    #[test]
    fn test_invalid_envelope() {
        assert!(matches!(
            PushEnvelope::from_slice(b"not json"),
            Err(EnvelopeError::Json(_))
        ));
    }
}
