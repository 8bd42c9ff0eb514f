//! Client error types.

use thiserror::Error;

/// Errors from the backend HTTP clients.
///
/// These are the transport-level failures that fail a whole turn. Everything
/// that happens after a body is obtained — malformed frames, shape
/// mismatches — is handled downstream and never surfaces here.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, TLS, or protocol failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or status text.
        message: String,
    },

    /// The transcription response did not carry the expected JSON shape.
    #[error("unexpected transcription response: {message}")]
    UnexpectedResponse {
        /// What was wrong.
        message: String,
    },
}
