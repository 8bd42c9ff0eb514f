//! Message types for the intake conversation model.
//!
//! A transcript holds two roles: the user describing symptoms and the
//! assistant replying. Assistant content starts as streamed plain text and
//! may be frozen into a [`ClinicalReport`] — the two are mutually exclusive,
//! and the structured form is terminal.

use serde::{Deserialize, Serialize};

use crate::ids::MessageId;
use crate::report::ClinicalReport;

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person at the kiosk.
    User,
    /// The intake assistant.
    Assistant,
}

/// Message content — plain text or the terminal structured report.
///
/// Untagged on the wire: a string serializes as a JSON string, a report as a
/// JSON object, matching what the backend consumes and emits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Streamed (or typed) text.
    Text(String),
    /// Frozen clinical report.
    Structured(Box<ClinicalReport>),
}

impl MessageContent {
    /// Returns `true` for plain-text content.
    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Returns `true` for frozen structured content.
    #[must_use]
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    /// The text, if this content is still plain text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Structured(_) => None,
        }
    }

    /// The report, if this content has been frozen.
    #[must_use]
    pub fn as_report(&self) -> Option<&ClinicalReport> {
        match self {
            Self::Text(_) => None,
            Self::Structured(report) => Some(report),
        }
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// A transcript message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Session-unique, stable identifier.
    pub id: MessageId,
    /// Author role.
    pub role: Role,
    /// Text or frozen structured content.
    pub content: MessageContent,
    /// Total time from dispatch to turn end (assistant messages).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    /// Time to first readable chunk (assistant messages).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttfb_ms: Option<u64>,
    /// Transcription round-trip time (user messages entered by voice).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription_time_ms: Option<u64>,
}

impl Message {
    /// Create a user message.
    #[must_use]
    pub fn user(text: impl Into<String>, transcription_time_ms: Option<u64>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::User,
            content: MessageContent::Text(text.into()),
            response_time_ms: None,
            ttfb_ms: None,
            transcription_time_ms,
        }
    }

    /// Create an empty assistant placeholder, ready to receive deltas.
    #[must_use]
    pub fn assistant_placeholder() -> Self {
        Self {
            id: MessageId::new(),
            role: Role::Assistant,
            content: MessageContent::Text(String::new()),
            response_time_ms: None,
            ttfb_ms: None,
            transcription_time_ms: None,
        }
    }

    /// Returns `true` if this is a user message.
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    /// Returns `true` if this is an assistant message.
    #[must_use]
    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
