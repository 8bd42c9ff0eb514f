//! Classification of decoded frame payloads.
//!
//! Each payload coming out of the [`FrameDecoder`](crate::frames::FrameDecoder)
//! is one of several shapes the backend interleaves on the same stream: the
//! `[DONE]` sentinel, an out-of-band metadata packet, an OpenAI-style delta
//! chunk, or a delta whose text is itself the terminal clinical report.
//! [`interpret`] tells them apart; the session applies the result.
//!
//! Parse failures are noise, not errors — one malformed frame never fails a
//! turn.

use serde_json::Value;
use tracing::{debug, warn};

use triva_core::report::ClinicalReport;
use triva_core::text::truncate_str;

/// The stream's end-of-turn sentinel. Advisory only: the read loop ends on
/// end-of-stream, not on seeing this.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Marker value of the metadata packet's `type` field.
const METADATA_TYPE: &str = "final_metadata";

/// One classified stream event.
#[derive(Clone, Debug, PartialEq)]
pub enum ChatEvent {
    /// The `[DONE]` sentinel.
    Terminator,
    /// Out-of-band replacement of the session's symptom accumulator.
    /// Never touches message content.
    Metadata {
        /// The full replacement list (replace, not merge).
        symptoms: Vec<String>,
    },
    /// An incremental fragment of assistant text.
    Delta {
        /// Text to append to the active assistant message.
        text: String,
    },
    /// A terminal clinical report: replaces the running content wholesale
    /// and freezes the message.
    Structured {
        /// The parsed report.
        report: Box<ClinicalReport>,
    },
    /// Payload that failed to parse as JSON. Skipped, non-fatal.
    Malformed,
    /// Parsed payload with nothing to apply (missing delta path, empty
    /// delta). A shape mismatch is a no-op, not an error.
    Ignored,
}

/// Classify one frame payload (prefix already stripped).
#[must_use]
pub fn interpret(payload: &str) -> ChatEvent {
    if payload == DONE_SENTINEL {
        return ChatEvent::Terminator;
    }

    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(error) => {
            warn!(
                payload = truncate_str(payload, 100),
                %error,
                "skipping malformed frame"
            );
            return ChatEvent::Malformed;
        }
    };

    if let Some(symptoms) = metadata_symptoms(&value) {
        return ChatEvent::Metadata { symptoms };
    }

    let Some(text) = delta_content(&value) else {
        return ChatEvent::Ignored;
    };
    if text.is_empty() {
        return ChatEvent::Ignored;
    }

    // The delta text may itself be JSON: the backend sends the terminal
    // report as one big delta. Only an object with clinical keys counts —
    // prose that merely parses as JSON (a bare string, a number) stays a
    // plain delta. The protocol carries no event-kind tag, so this shape
    // heuristic is the strongest check available.
    if let Ok(inner) = serde_json::from_str::<Value>(text) {
        if ClinicalReport::matches_shape(&inner) {
            match serde_json::from_value::<ClinicalReport>(inner) {
                Ok(report) => {
                    debug!("delta classified as terminal clinical report");
                    return ChatEvent::Structured {
                        report: Box::new(report),
                    };
                }
                Err(error) => {
                    warn!(%error, "clinically-shaped delta failed to deserialize; treating as text");
                }
            }
        }
    }

    ChatEvent::Delta {
        text: text.to_owned(),
    }
}

/// Extract the replacement symptom list from a metadata packet.
///
/// Requires `type == "final_metadata"` and an `accumulated_symptoms` array;
/// non-string entries are dropped rather than failing the frame.
fn metadata_symptoms(value: &Value) -> Option<Vec<String>> {
    if value.get("type").and_then(Value::as_str) != Some(METADATA_TYPE) {
        return None;
    }
    let entries = value.get("accumulated_symptoms")?.as_array()?;
    Some(
        entries
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
    )
}

/// Extract delta text at the conventional path: `choices[0].delta.content`.
fn delta_content(value: &Value) -> Option<&str> {
    value
        .get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
