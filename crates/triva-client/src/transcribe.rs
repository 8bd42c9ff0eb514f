//! Transcription endpoint client.
//!
//! The kiosk records audio on the host side; this client only uploads the
//! finished blob and hands back the recognized text. The measured round-trip
//! time travels with the text so the session can stamp it onto the next
//! outgoing user message as `transcription_time_ms`.

use std::time::Instant;

use serde::Deserialize;
use tracing::debug;

use crate::chat::ChatClient;
use crate::errors::ClientError;

/// Transcribed text plus the measured service round-trip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transcription {
    /// The recognized text. Empty when the service heard nothing.
    pub text: String,
    /// Wall time from upload start to parsed response, in milliseconds.
    pub elapsed_ms: u64,
}

/// Response body of the transcription endpoint.
#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    #[serde(default)]
    text: String,
}

/// Client for the audio transcription endpoint.
#[derive(Clone, Debug)]
pub struct TranscribeClient {
    inner: ChatClient,
}

impl TranscribeClient {
    /// Build from an existing [`ChatClient`], sharing its HTTP connection
    /// pool and base URL.
    #[must_use]
    pub fn new(chat: ChatClient) -> Self {
        Self { inner: chat }
    }

    /// Upload one audio blob and return the transcription.
    ///
    /// `file_name` and `mime_type` describe the recording container
    /// (e.g. `"recording.webm"`, `"audio/webm"`).
    #[allow(clippy::cast_possible_truncation)]
    pub async fn transcribe(
        &self,
        audio: Vec<u8>,
        file_name: &str,
        mime_type: &str,
    ) -> Result<Transcription, ClientError> {
        let started = Instant::now();

        let part = reqwest::multipart::Part::bytes(audio)
            .file_name(file_name.to_owned())
            .mime_str(mime_type)
            .map_err(ClientError::Http)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .inner
            .http()
            .post(format!("{}/transcribe_vosk", self.inner.base_url()))
            .multipart(form)
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

        let parsed: TranscribeResponse =
            response
                .json()
                .await
                .map_err(|e| ClientError::UnexpectedResponse {
                    message: e.to_string(),
                })?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        debug!(elapsed_ms, chars = parsed.text.len(), "transcription complete");

        Ok(Transcription {
            text: parsed.text,
            elapsed_ms,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
