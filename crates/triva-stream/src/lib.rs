//! # triva-stream
//!
//! Incremental decoding and classification of the chat backend's streamed
//! response.
//!
//! Two layers, used in sequence by the session's read loop:
//!
//! - [`FrameDecoder`]: reassembles blank-line-delimited frames from raw byte
//!   chunks, carrying partial frames (and split multi-byte characters) intact
//!   across arbitrary read boundaries
//! - [`interpret`]: classifies one frame payload into a [`ChatEvent`] —
//!   terminator, metadata replacement, text delta, terminal structured
//!   report, or noise

#![deny(unsafe_code)]

pub mod frames;
pub mod interpreter;

pub use frames::{FrameDecoder, FrameDecoderOptions};
pub use interpreter::{interpret, ChatEvent};
