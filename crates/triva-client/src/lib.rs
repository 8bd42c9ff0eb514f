//! # triva-client
//!
//! Thin `reqwest` clients for the two backend endpoints:
//!
//! - [`ChatClient`]: POSTs the conversation window plus the accumulated
//!   symptom list and hands back the chunked response body as a byte stream
//! - [`TranscribeClient`]: uploads an audio blob and returns the transcribed
//!   text with its measured round-trip time
//!
//! Audio capture, encoding, and rendering are host concerns; this crate only
//! moves bytes.

#![deny(unsafe_code)]

pub mod chat;
pub mod errors;
pub mod transcribe;

pub use chat::{ChatByteStream, ChatClient, ChatClientConfig};
pub use errors::ClientError;
pub use transcribe::{TranscribeClient, Transcription};
