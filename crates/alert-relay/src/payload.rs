//! Inbound alert events and the loosely-typed payload they carry.

use serde_json::{Map, Value};
use tracing::debug;

/// Title used when the alert names neither a policy nor a title.
pub const FALLBACK_TITLE: &str = "Gemini Cloud Heartbeat Alert ⚠️";

/// Body used when the alert carries no text.
pub const FALLBACK_BODY: &str = "An unspecified alert was received from Gemini Cloud.";

/// Severity label used when the alert carries neither severity nor status.
pub const DEFAULT_SEVERITY: &str = "warning";

/// Thread key for alerts that are not tied to a policy.
pub const DEFAULT_THREAD_KEY: &str = "heartbeat-core";

/// Raw bytes of one alert as delivered by the event source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertEvent {
    data: Vec<u8>,
}

impl AlertEvent {
    /// Wrap raw event bytes.
    #[must_use]
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    /// Decode the event as UTF-8. Invalid sequences become U+FFFD.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

/// Parsed alert payload. Every field is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertPayload {
    fields: Map<String, Value>,
}

impl AlertPayload {
    /// Parse decoded event text.
    ///
    /// Text that is not a JSON object degrades to a payload whose only field is
    /// `text`, holding the raw string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(fields)) => Self { fields },
            Ok(_) => {
                debug!("Alert payload is not a JSON object, relaying raw text");
                Self::raw(raw)
            }
            Err(e) => {
                debug!(error = %e, "Alert payload is not JSON, relaying raw text");
                Self::raw(raw)
            }
        }
    }

    /// Payload holding only the raw text as its body.
    #[must_use]
    pub fn raw(text: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("text".to_string(), Value::String(text.to_string()));
        Self { fields }
    }

    /// Display title: `policyName`, then `title`.
    #[must_use]
    pub fn title(&self) -> String {
        self.first_of(&["policyName", "title"])
            .unwrap_or_else(|| FALLBACK_TITLE.to_string())
    }

    /// Body text: `text`, then `message`, then `body`.
    #[must_use]
    pub fn body(&self) -> String {
        self.first_of(&["text", "message", "body"])
            .unwrap_or_else(|| FALLBACK_BODY.to_string())
    }

    /// Lower-cased `severity`, then `status`.
    #[must_use]
    pub fn severity_label(&self) -> String {
        self.first_of(&["severity", "status"])
            .map_or_else(|| DEFAULT_SEVERITY.to_string(), |s| s.to_lowercase())
    }

    /// Action link: `link`, then `url`.
    #[must_use]
    pub fn link(&self) -> Option<String> {
        self.first_of(&["link", "url"])
    }

    /// Grouping key: `policyId`, then `policy_name`.
    #[must_use]
    pub fn thread_key(&self) -> String {
        self.first_of(&["policyId", "policy_name"])
            .unwrap_or_else(|| DEFAULT_THREAD_KEY.to_string())
    }

    /// First present, non-empty value among `keys`.
    fn first_of(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|key| self.fields.get(*key).and_then(scalar_text))
            .find(|value| !value.is_empty())
    }
}

/// Render a scalar JSON value as text.
///
/// Falsy scalars (`false`, zero) are absent like null, arrays, and objects,
/// so the next key in a fallback chain is consulted.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        Value::Bool(false) | Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_text_is_lossy() {
        let event = AlertEvent::new(vec![b'o', b'k', 0xff]);
        assert_eq!(event.text(), "ok\u{fffd}");
    }

    #[test]
    fn test_unstructured_text_degrades_to_body() {
        let payload = AlertPayload::parse("disk full on host A");
        assert_eq!(payload.body(), "disk full on host A");
        assert_eq!(payload.title(), FALLBACK_TITLE);
        assert_eq!(payload.severity_label(), DEFAULT_SEVERITY);
        assert_eq!(payload.thread_key(), DEFAULT_THREAD_KEY);
        assert_eq!(payload.link(), None);
    }

    #[test]
    fn test_non_object_json_degrades_to_body() {
        let payload = AlertPayload::parse("[1, 2]");
        assert_eq!(payload.body(), "[1, 2]");
    }

    #[test]
    fn test_structured_fields() {
        let payload = AlertPayload::parse(
            r#"{"policyName":"DiskAlert","text":"Disk 95% full","severity":"Critical","policyId":"disk-001"}"#,
        );
        assert_eq!(payload.title(), "DiskAlert");
        assert_eq!(payload.body(), "Disk 95% full");
        assert_eq!(payload.severity_label(), "critical");
        assert_eq!(payload.thread_key(), "disk-001");
    }

    #[test]
    fn test_fallback_order_skips_empty_values() {
        let payload = AlertPayload::parse(
            r#"{"policyName":"","title":"Heartbeat","text":"","message":null,"body":"late","severity":"","status":"RESOLVED","policy_name":"hb"}"#,
        );
        assert_eq!(payload.title(), "Heartbeat");
        assert_eq!(payload.body(), "late");
        assert_eq!(payload.severity_label(), "resolved");
        assert_eq!(payload.thread_key(), "hb");
    }

    #[test]
    fn test_missing_fields_use_fallbacks() {
        let payload = AlertPayload::parse("{}");
        assert_eq!(payload.title(), FALLBACK_TITLE);
        assert_eq!(payload.body(), FALLBACK_BODY);
    }

    #[test]
    fn test_link_prefers_link_over_url() {
        let payload = AlertPayload::parse(r#"{"link":"https://a.example","url":"https://b.example"}"#);
        assert_eq!(payload.link().as_deref(), Some("https://a.example"));

        let payload = AlertPayload::parse(r#"{"link":"","url":"https://b.example"}"#);
        assert_eq!(payload.link().as_deref(), Some("https://b.example"));
    }

    #[test]
    fn test_scalar_values_are_rendered() {
        let payload = AlertPayload::parse(r#"{"policyId":42,"text":true,"title":{"nested":1}}"#);
        assert_eq!(payload.thread_key(), "42");
        assert_eq!(payload.body(), "true");
        assert_eq!(payload.title(), FALLBACK_TITLE);
    }

    #[test]
    fn test_false_and_zero_fall_through() {
        let payload = AlertPayload::parse(
            r#"{"policyName":false,"title":"T","text":0,"message":"m","policyId":0,"policy_name":"p","link":0.0}"#,
        );
        assert_eq!(payload.title(), "T");
        assert_eq!(payload.body(), "m");
        assert_eq!(payload.thread_key(), "p");
        assert_eq!(payload.link(), None);

        let payload = AlertPayload::parse(r#"{"text":false,"policyId":-0}"#);
        assert_eq!(payload.body(), FALLBACK_BODY);
        assert_eq!(payload.thread_key(), DEFAULT_THREAD_KEY);
    }
}
