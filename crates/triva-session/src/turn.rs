//! The streaming read loop of one turn.
//!
//! Each transport read is a suspension point: read a chunk, decode whatever
//! frames it completes, interpret them strictly in decode order, mutate the
//! transcript and session accumulators, repeat. No other transcript mutation
//! happens between reads. Cancellation is checked before each read (biased,
//! so a pending abort wins over a ready chunk), and an optional injected
//! deadline bounds every read for transports that have no timeout of their
//! own.

use std::time::Duration;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use triva_client::{ChatByteStream, ClientError};
use triva_core::ids::MessageId;
use triva_core::transcript::Transcript;
use triva_stream::{interpret, ChatEvent, FrameDecoder};

use crate::events::{EventEmitter, SessionEvent};
use crate::gate::SessionGate;
use crate::metrics::TurnMetrics;

/// Terminal state of a finished turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// End-of-stream reached (with or without the advisory terminator).
    Completed,
    /// Transport failure or deadline expiry; the assistant slot carries the
    /// fixed error text.
    Errored,
    /// Host abort; partial content already appended is retained.
    Aborted,
}

/// What the host gets back after a turn finalizes.
#[derive(Clone, Debug)]
pub struct TurnReport {
    /// The user message that opened the turn.
    pub user_id: MessageId,
    /// The assistant message the turn streamed into.
    pub assistant_id: MessageId,
    /// Terminal state.
    pub outcome: TurnOutcome,
    /// Time to first readable chunk, if any chunk arrived.
    pub ttfb_ms: Option<u64>,
    /// Total turn duration, recorded on success and failure alike.
    pub response_time_ms: u64,
    /// Whether the advisory `[DONE]` sentinel was observed.
    pub saw_terminator: bool,
    /// Whether a structured report froze the assistant message.
    pub frozen: bool,
}

/// How the streaming phase ended.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum StreamEnd {
    /// The transport reported end-of-stream.
    EndOfStream,
    /// An unrecoverable read error.
    TransportError(String),
    /// The injected read deadline expired.
    DeadlineExpired,
    /// The cancellation token fired.
    Aborted,
}

/// Mutable turn-scoped state threaded through the read loop.
///
/// Explicit and stack-owned: there are no ambient buffers. The decoder's
/// residual buffer and the accumulating assistant text (inside the
/// transcript) die with this struct at finalize.
pub(crate) struct TurnContext<'a> {
    pub transcript: &'a mut Transcript,
    pub symptoms: &'a mut Vec<String>,
    pub gate: &'a mut SessionGate,
    pub emitter: &'a EventEmitter,
    pub metrics: &'a mut TurnMetrics,
    pub assistant_id: MessageId,
    pub decoder: FrameDecoder,
    pub saw_terminator: bool,
    pub frozen: bool,
}

impl TurnContext<'_> {
    /// Interpret one frame payload and apply its event.
    fn apply_payload(&mut self, payload: &str) {
        match interpret(payload) {
            ChatEvent::Terminator => {
                // Advisory only; the loop ends on end-of-stream.
                self.saw_terminator = true;
                debug!("terminator sentinel observed");
            }
            ChatEvent::Metadata { symptoms } => {
                // Wholesale replacement, never a merge. No transcript change.
                *self.symptoms = symptoms.clone();
                let _ = self.emitter.emit(SessionEvent::SymptomsReplaced { symptoms });
            }
            ChatEvent::Delta { text } => {
                if self.transcript.apply_delta(&self.assistant_id, &text) {
                    let _ = self.emitter.emit(SessionEvent::AssistantDelta {
                        id: self.assistant_id.clone(),
                        delta: text,
                    });
                }
            }
            ChatEvent::Structured { report } => {
                if self.transcript.freeze_as_structured(&self.assistant_id, *report) {
                    self.frozen = true;
                    self.gate.note_completion();
                    let _ = self.emitter.emit(SessionEvent::AssistantFrozen {
                        id: self.assistant_id.clone(),
                    });
                }
            }
            ChatEvent::Malformed | ChatEvent::Ignored => {}
        }
    }
}

/// Drive the streaming phase until end-of-stream, error, deadline, or abort.
pub(crate) async fn drive_stream(
    stream: &mut ChatByteStream,
    cancel: &CancellationToken,
    read_deadline: Option<Duration>,
    ctx: &mut TurnContext<'_>,
) -> StreamEnd {
    loop {
        // biased: a pending abort wins over a ready chunk
        let item = tokio::select! {
            biased;
            () = cancel.cancelled() => return StreamEnd::Aborted,
            item = read_with_deadline(stream, read_deadline) => item,
        };

        match item {
            Err(_elapsed) => {
                warn!("read deadline expired mid-stream");
                return StreamEnd::DeadlineExpired;
            }
            Ok(None) => {
                // End-of-stream. An unterminated trailing frame is discarded
                // unless the decoder was configured to flush it.
                if let Some(payload) = ctx.decoder.finish() {
                    ctx.apply_payload(&payload);
                }
                return StreamEnd::EndOfStream;
            }
            Ok(Some(Err(error))) => {
                warn!(%error, "unrecoverable stream read error");
                return StreamEnd::TransportError(error.to_string());
            }
            Ok(Some(Ok(chunk))) => {
                if ctx.metrics.mark_first_chunk() {
                    if let Some(ttfb) = ctx.metrics.ttfb_ms() {
                        ctx.transcript.attach_ttfb(&ctx.assistant_id, ttfb);
                    }
                }
                for payload in ctx.decoder.feed(&chunk) {
                    ctx.apply_payload(&payload);
                }
            }
        }
    }
}

/// One read, bounded by the injected deadline when configured.
async fn read_with_deadline(
    stream: &mut ChatByteStream,
    deadline: Option<Duration>,
) -> Result<Option<Result<bytes::Bytes, ClientError>>, tokio::time::error::Elapsed> {
    match deadline {
        Some(limit) => tokio::time::timeout(limit, stream.next()).await,
        None => Ok(stream.next().await),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
