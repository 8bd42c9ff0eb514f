//! Chat endpoint client.
//!
//! One POST per turn: the bounded conversation window plus the session's
//! accumulated symptom list go up, a chunked `text/event-stream` body comes
//! back. The client stops at the byte-stream boundary — frame reassembly and
//! classification live in `triva-stream`, and the read loop belongs to the
//! session.

use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use serde::Serialize;
use tracing::debug;

use triva_core::messages::{Message, MessageContent, Role};

use crate::errors::ClientError;

/// Default backend base URL (the kiosk's local service).
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Boxed byte stream of the chat response body.
pub type ChatByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ClientError>> + Send>>;

/// Configuration for [`ChatClient`].
#[derive(Clone, Debug)]
pub struct ChatClientConfig {
    /// Backend base URL, without a trailing slash.
    pub base_url: String,
    /// Optional whole-request timeout applied at the HTTP layer.
    pub request_timeout: Option<Duration>,
}

impl Default for ChatClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            request_timeout: None,
        }
    }
}

/// Wire format of one conversation message: role and content only.
///
/// Content serializes untagged — plain text as a JSON string, a frozen
/// report as a JSON object — which is exactly what the backend consumes.
#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: &'a MessageContent,
}

/// Request body for the chat endpoint.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: Vec<WireMessage<'a>>,
    accumulated_symptoms: &'a [String],
}

/// Client for the streaming chat endpoint.
#[derive(Clone, Debug)]
pub struct ChatClient {
    http: reqwest::Client,
    config: ChatClientConfig,
}

impl ChatClient {
    /// Build a client from configuration.
    pub fn new(config: ChatClientConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self { http, config })
    }

    /// Dispatch one turn and return the response body as a byte stream.
    ///
    /// `messages` is the already-bounded conversation window, most recent
    /// last; `symptoms` is the session accumulator sent back verbatim.
    pub async fn stream_chat(
        &self,
        messages: &[Message],
        symptoms: &[String],
    ) -> Result<ChatByteStream, ClientError> {
        let body = ChatRequest {
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role,
                    content: &m.content,
                })
                .collect(),
            accumulated_symptoms: symptoms,
        };

        debug!(
            messages = body.messages.len(),
            symptoms = symptoms.len(),
            "dispatching chat turn"
        );

        let response = self
            .http
            .post(format!("{}/chat", self.config.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(Box::pin(response.bytes_stream().map_err(ClientError::Http)))
    }

    /// The configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// The underlying HTTP client, shared with sibling clients.
    #[must_use]
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
