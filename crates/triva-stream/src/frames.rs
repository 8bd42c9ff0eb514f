//! Incremental frame decoder for the chat stream.
//!
//! The backend responds with a chunked text stream of blank-line-delimited
//! frames, each carrying a `data: ` payload. Network reads split that stream
//! at arbitrary byte boundaries — mid-frame, mid-line, even mid-character —
//! so the decoder keeps one growable buffer and only yields frames whose
//! terminating blank line has fully arrived. A multi-byte UTF-8 sequence
//! split across reads stays buffered until complete; splitting only ever
//! happens at newline bytes, so sequences are never corrupted.
//!
//! Frames that do not begin with the `data:` prefix (comments, other SSE
//! fields, noise) are silently skipped. The `[DONE]` sentinel passes through
//! as an ordinary payload; classifying it is the interpreter's job.

use bytes::BytesMut;
use tracing::{debug, warn};

/// Options controlling end-of-stream behavior.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameDecoderOptions {
    /// Whether [`FrameDecoder::finish`] delivers an unterminated trailing
    /// frame instead of discarding it.
    ///
    /// Default `false`: a frame whose blank-line terminator never arrives is
    /// dropped at end-of-stream, matching what existing backends expect of
    /// their clients. Hosts that prefer recovery over compatibility opt in.
    pub flush_on_close: bool,
}

/// Stateful decoder turning raw byte chunks into frame payloads.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: BytesMut,
    options: FrameDecoderOptions,
}

impl FrameDecoder {
    /// Create a decoder with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(FrameDecoderOptions::default())
    }

    /// Create a decoder with explicit options.
    #[must_use]
    pub fn with_options(options: FrameDecoderOptions) -> Self {
        Self {
            buffer: BytesMut::with_capacity(8192),
            options,
        }
    }

    /// Feed one chunk of raw bytes and drain every frame it completes.
    ///
    /// Returns zero, one, or several payloads (prefix stripped, non-data
    /// frames skipped) in stream order. Whatever trails the last complete
    /// frame is retained for the next read.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some((frame_end, separator_len)) = find_frame_boundary(&self.buffer) {
            let frame_bytes = self.buffer.split_to(frame_end + separator_len);
            let frame_bytes = &frame_bytes[..frame_end];

            let Ok(frame) = std::str::from_utf8(frame_bytes) else {
                warn!(len = frame_bytes.len(), "skipping non-UTF-8 frame");
                continue;
            };
            if let Some(payload) = extract_frame_payload(frame) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Handle end-of-stream.
    ///
    /// The default discards any unterminated trailing frame. With
    /// [`FrameDecoderOptions::flush_on_close`] set, a trailing data frame is
    /// delivered instead.
    pub fn finish(&mut self) -> Option<String> {
        let remaining = self.buffer.split();
        if remaining.is_empty() {
            return None;
        }
        if !self.options.flush_on_close {
            debug!(
                len = remaining.len(),
                "discarding unterminated trailing frame"
            );
            return None;
        }
        let Ok(frame) = std::str::from_utf8(&remaining) else {
            warn!(len = remaining.len(), "trailing frame is not UTF-8");
            return None;
        };
        extract_frame_payload(frame)
    }

    /// Bytes currently held waiting for a frame terminator.
    #[must_use]
    pub fn residual_len(&self) -> usize {
        self.buffer.len()
    }
}

/// Find the next blank-line frame boundary.
///
/// Returns `(frame_end, separator_len)` for the first `\n\n` (or the CRLF
/// form `\n\r\n`) whose bytes have fully arrived. A trailing lone `\n` is
/// not a boundary yet — the next read decides.
fn find_frame_boundary(buf: &[u8]) -> Option<(usize, usize)> {
    for i in 0..buf.len() {
        if buf[i] != b'\n' {
            continue;
        }
        if buf.get(i + 1) == Some(&b'\n') {
            return Some((i, 2));
        }
        if buf.get(i + 1) == Some(&b'\r') && buf.get(i + 2) == Some(&b'\n') {
            return Some((i, 3));
        }
    }
    None
}

/// Extract the data payload from one complete frame.
///
/// Returns `None` for comments, other SSE fields, and empty payloads.
fn extract_frame_payload(frame: &str) -> Option<String> {
    let trimmed = frame.trim();

    if trimmed.is_empty() || trimmed.starts_with(':') {
        return None;
    }

    let data = trimmed
        .strip_prefix("data: ")
        .or_else(|| trimmed.strip_prefix("data:"))?;

    let data = data.trim();
    if data.is_empty() {
        return None;
    }

    Some(data.to_owned())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
