//! Slack message built from one alert.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::payload::AlertPayload;
use crate::severity::Severity;

/// Marker prepended to every header.
const TITLE_MARKER: &str = "🧠 ";

/// Label of the action button.
const BUTTON_LABEL: &str = "Open in Console";

/// Length of a [`ThreadTokenEncoding::Base64Prefix`] token.
const BASE64_TOKEN_LEN: usize = 10;

/// Length of a [`ThreadTokenEncoding::Digest`] token.
const DIGEST_TOKEN_LEN: usize = 16;

/// How a thread key is turned into the `thread_ts` grouping token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThreadTokenEncoding {
    /// First 16 hex chars of SHA-256 of the key.
    #[default]
    Digest,
    /// First 10 chars of the standard base64 encoding of the key.
    ///
    /// Matches tokens issued by the earlier relay. Keys sharing their first
    /// seven bytes map to the same token.
    Base64Prefix,
}

impl ThreadTokenEncoding {
    /// Derive the grouping token for `key`. Pure: same key, same token.
    #[must_use]
    pub fn token(self, key: &str) -> String {
        match self {
            Self::Digest => {
                let mut token = hex::encode(Sha256::digest(key.as_bytes()));
                token.truncate(DIGEST_TOKEN_LEN);
                token
            }
            Self::Base64Prefix => STANDARD
                .encode(key.as_bytes())
                .chars()
                .take(BASE64_TOKEN_LEN)
                .collect(),
        }
    }
}

impl std::str::FromStr for ThreadTokenEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "digest" | "sha256" => Ok(Self::Digest),
            "base64" | "base64-prefix" => Ok(Self::Base64Prefix),
            other => Err(format!("unknown thread token encoding: {other}")),
        }
    }
}

/// A formatted chat message, ready to post.
///
/// Serializes to the Slack webhook body: one colored attachment holding the
/// Block Kit blocks, plus `thread_ts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "SlackPayload")]
pub struct ChatMessage {
    title: String,
    body: String,
    severity: Severity,
    link: Option<String>,
    thread_ts: String,
}

impl ChatMessage {
    /// Format a parsed payload.
    #[must_use]
    pub fn from_payload(payload: &AlertPayload, encoding: ThreadTokenEncoding) -> Self {
        Self {
            title: payload.title(),
            body: payload.body(),
            severity: Severity::classify(&payload.severity_label()),
            link: payload.link(),
            thread_ts: encoding.token(&payload.thread_key()),
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub fn color(&self) -> &'static str {
        self.severity.color()
    }

    #[must_use]
    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    #[must_use]
    pub fn thread_ts(&self) -> &str {
        &self.thread_ts
    }

    fn blocks(&self) -> Vec<SlackBlock> {
        let mut blocks = vec![
            SlackBlock::Header {
                text: SlackText::plain(format!("{TITLE_MARKER}{}", self.title)),
            },
            SlackBlock::Section {
                text: SlackText::mrkdwn(self.body.clone()),
            },
        ];

        if let Some(url) = &self.link {
            blocks.push(SlackBlock::Actions {
                elements: vec![SlackElement::Button {
                    text: SlackText::plain(BUTTON_LABEL),
                    url: url.clone(),
                    style: "primary",
                }],
            });
        }

        blocks
    }
}

// =============================================================================
// Slack API types (Block Kit)
// =============================================================================

#[derive(Debug, Serialize)]
struct SlackPayload {
    attachments: Vec<SlackAttachment>,
    /// Grouping hint so recurring alerts land together
    thread_ts: String,
}

impl From<ChatMessage> for SlackPayload {
    fn from(message: ChatMessage) -> Self {
        Self {
            attachments: vec![SlackAttachment {
                color: message.color(),
                blocks: message.blocks(),
            }],
            thread_ts: message.thread_ts,
        }
    }
}

#[derive(Debug, Serialize)]
struct SlackAttachment {
    /// Hex color for the attachment strip
    color: &'static str,
    blocks: Vec<SlackBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SlackBlock {
    Header { text: SlackText },
    Section { text: SlackText },
    Actions { elements: Vec<SlackElement> },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SlackElement {
    Button {
        text: SlackText,
        url: String,
        style: &'static str,
    },
}

#[derive(Debug, Serialize)]
struct SlackText {
    #[serde(rename = "type")]
    text_type: &'static str,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    emoji: Option<bool>,
}

impl SlackText {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text_type: "plain_text",
            text: text.into(),
            emoji: Some(true),
        }
    }

    fn mrkdwn(text: impl Into<String>) -> Self {
        Self {
            text_type: "mrkdwn",
            text: text.into(),
            emoji: None,
        }
    }
}
