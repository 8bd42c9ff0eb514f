//! Session controller — the turn lifecycle state machine.
//!
//! One controller per conversation. It owns the session-scoped state (the
//! bounded transcript, the symptom accumulator, the sticky gate) and drives
//! each turn through `Idle → Sending → Streaming → {Completed, Errored} →
//! Idle`, with abort as a third terminal outcome. At most one turn is active
//! at a time: `send` takes `&mut self`, so the exclusive borrow is the
//! concurrency model — no locks, no ambient globals.
//!
//! Pre-flight guard violations are the only `Err` surface. Once a turn is
//! dispatched, every failure terminates in a defined outcome with the
//! finalize step applied exactly once, and nothing escapes to the host.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use triva_client::{ChatClient, ChatClientConfig};
use triva_core::constants::{EMPTY_TURN_PLACEHOLDER, TRANSPORT_FAILURE_TEXT};
use triva_core::ids::{MessageId, SessionId};
use triva_core::messages::Message;
use triva_core::transcript::Transcript;
use triva_stream::{FrameDecoder, FrameDecoderOptions};

use crate::errors::SessionError;
use crate::events::{EventEmitter, SessionEvent};
use crate::gate::SessionGate;
use crate::metrics::TurnMetrics;
use crate::turn::{drive_stream, StreamEnd, TurnContext, TurnOutcome, TurnReport};

/// Where the controller is in the turn lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// No turn in flight.
    Idle,
    /// Request dispatched, waiting for a readable body.
    Sending,
    /// Consuming the response stream.
    Streaming,
    /// Last turn ended at end-of-stream (terminal, about to finalize).
    Completed,
    /// Last turn ended in a transport failure (terminal, about to finalize).
    Errored,
}

/// Host-supplied session configuration.
#[derive(Clone, Debug, Default)]
pub struct SessionConfig {
    /// Chat endpoint configuration.
    pub chat: ChatClientConfig,
    /// Injected per-read deadline for transports without their own timeout.
    /// Expiry moves the turn to the errored outcome.
    pub read_deadline: Option<Duration>,
    /// End-of-stream behavior of the frame decoder.
    pub decoder: FrameDecoderOptions,
}

/// The session controller.
#[derive(Debug)]
pub struct SessionController {
    id: SessionId,
    config: SessionConfig,
    client: ChatClient,
    transcript: Transcript,
    symptoms: Vec<String>,
    gate: SessionGate,
    phase: SessionPhase,
    emitter: EventEmitter,
}

impl SessionController {
    /// Create a controller with an empty transcript and accumulator.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        let client = ChatClient::new(config.chat.clone())?;
        Ok(Self {
            id: SessionId::new(),
            config,
            client,
            transcript: Transcript::new(),
            symptoms: Vec::new(),
            gate: SessionGate::Open,
            phase: SessionPhase::Idle,
            emitter: EventEmitter::new(),
        })
    }

    /// Run one turn to completion.
    pub async fn send(
        &mut self,
        input: &str,
        transcription_time_ms: Option<u64>,
    ) -> Result<TurnReport, SessionError> {
        let cancel = CancellationToken::new();
        self.send_with_cancel(input, transcription_time_ms, &cancel)
            .await
    }

    /// Run one turn to completion, abortable through `cancel`.
    ///
    /// Cancelling mid-stream retains whatever content already streamed in
    /// and finalizes the turn with [`TurnOutcome::Aborted`].
    pub async fn send_with_cancel(
        &mut self,
        input: &str,
        transcription_time_ms: Option<u64>,
        cancel: &CancellationToken,
    ) -> Result<TurnReport, SessionError> {
        // Pre-flight guards: all rejections happen before any network call.
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        if self.gate.limit_reached() {
            return Err(SessionError::LimitReached);
        }
        if self.gate.completed() {
            return Err(SessionError::ConversationComplete);
        }

        // User message lands synchronously; the window snapshot for the
        // request is taken before the placeholder joins the transcript.
        let user_id = self.transcript.append_user(trimmed, transcription_time_ms);
        let evicted = self.transcript.enforce_capacity();
        self.note_eviction(evicted);
        let window: Vec<Message> = self.transcript.snapshot();

        let assistant_id = self.transcript.append_assistant_placeholder();
        let evicted = self.transcript.enforce_capacity();
        self.note_eviction(evicted);
        let _ = self.emitter.emit(SessionEvent::TurnStarted {
            user_id: user_id.clone(),
            assistant_id: assistant_id.clone(),
        });

        self.phase = SessionPhase::Sending;
        let mut metrics = TurnMetrics::start();

        let mut stream = match self.client.stream_chat(&window, &self.symptoms).await {
            Ok(stream) => stream,
            Err(error) => {
                warn!(%error, "chat dispatch failed before streaming");
                self.phase = SessionPhase::Errored;
                return Ok(self.finalize_turn(
                    user_id,
                    assistant_id,
                    &metrics,
                    TurnOutcome::Errored,
                    false,
                    false,
                    Some(error.to_string()),
                ));
            }
        };

        self.phase = SessionPhase::Streaming;
        let mut ctx = TurnContext {
            transcript: &mut self.transcript,
            symptoms: &mut self.symptoms,
            gate: &mut self.gate,
            emitter: &self.emitter,
            metrics: &mut metrics,
            assistant_id: assistant_id.clone(),
            decoder: FrameDecoder::with_options(self.config.decoder),
            saw_terminator: false,
            frozen: false,
        };
        let end = drive_stream(&mut stream, cancel, self.config.read_deadline, &mut ctx).await;
        let saw_terminator = ctx.saw_terminator;
        let frozen = ctx.frozen;
        drop(ctx);

        let (outcome, error) = match end {
            StreamEnd::EndOfStream => {
                self.phase = SessionPhase::Completed;
                (TurnOutcome::Completed, None)
            }
            StreamEnd::Aborted => {
                debug!("turn aborted by host; retaining partial content");
                self.phase = SessionPhase::Completed;
                (TurnOutcome::Aborted, None)
            }
            StreamEnd::TransportError(message) => {
                self.phase = SessionPhase::Errored;
                (TurnOutcome::Errored, Some(message))
            }
            StreamEnd::DeadlineExpired => {
                self.phase = SessionPhase::Errored;
                (TurnOutcome::Errored, Some("read deadline expired".to_owned()))
            }
        };

        Ok(self.finalize_turn(
            user_id,
            assistant_id,
            &metrics,
            outcome,
            saw_terminator,
            frozen,
            error,
        ))
    }

    /// The finalize step. Runs exactly once on every path out of a
    /// dispatched turn — success, failure, and abort all pass through here.
    #[allow(clippy::too_many_arguments)]
    fn finalize_turn(
        &mut self,
        user_id: MessageId,
        assistant_id: MessageId,
        metrics: &TurnMetrics,
        outcome: TurnOutcome,
        saw_terminator: bool,
        frozen: bool,
        error: Option<String>,
    ) -> TurnReport {
        // Duration-to-failure is recorded the same as duration-to-success;
        // the outcome is what tags it.
        let response_time_ms = metrics.elapsed_ms();

        if outcome == TurnOutcome::Errored {
            // replace_text refuses frozen content, so an error after a
            // freeze leaves the report intact.
            let _ = self.transcript.replace_text(&assistant_id, TRANSPORT_FAILURE_TEXT);
        }

        // An assistant message never persists as the empty string.
        if self
            .transcript
            .get(&assistant_id)
            .and_then(|m| m.content.as_text())
            == Some("")
        {
            let _ = self
                .transcript
                .replace_text(&assistant_id, EMPTY_TURN_PLACEHOLDER);
        }

        self.transcript
            .attach_response_time(&assistant_id, response_time_ms);

        let _ = self.emitter.emit(match outcome {
            TurnOutcome::Completed => SessionEvent::TurnCompleted {
                id: assistant_id.clone(),
                response_time_ms,
            },
            TurnOutcome::Errored => SessionEvent::TurnFailed {
                id: assistant_id.clone(),
                error: error.unwrap_or_default(),
            },
            TurnOutcome::Aborted => SessionEvent::TurnAborted {
                id: assistant_id.clone(),
            },
        });

        // Per-turn state (decoder buffer, metrics) died with the turn scope;
        // the controller returns to Idle for the next send.
        self.phase = SessionPhase::Idle;

        TurnReport {
            user_id,
            assistant_id,
            outcome,
            ttfb_ms: metrics.ttfb_ms(),
            response_time_ms,
            saw_terminator,
            frozen,
        }
    }

    /// Latch the sticky limit condition on the first eviction.
    fn note_eviction(&mut self, evicted: usize) {
        if evicted == 0 {
            return;
        }
        self.gate.note_eviction();
        let _ = self
            .emitter
            .emit(SessionEvent::TranscriptTruncated { evicted });
    }

    /// Session identifier.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.id
    }

    /// The transcript, for direct inspection.
    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// An owned copy of the current messages.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Message> {
        self.transcript.snapshot()
    }

    /// The session's symptom accumulator.
    #[must_use]
    pub fn symptoms(&self) -> &[String] {
        &self.symptoms
    }

    /// The sticky send gate.
    #[must_use]
    pub fn gate(&self) -> SessionGate {
        self.gate
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Subscribe to mutation notifications.
    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SessionEvent> {
        self.emitter.subscribe()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
