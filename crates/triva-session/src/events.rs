//! Session mutation notifications.
//!
//! Every transcript or accumulator mutation fans out as a [`SessionEvent`]
//! over a `tokio::sync::broadcast` channel. Hosts subscribe to drive their
//! rendering; the session never waits on them — emission is fire-and-forget
//! and a lagging or absent subscriber cannot stall or fail a turn.

use tokio::sync::broadcast;

use triva_core::ids::MessageId;

/// Buffered events per subscriber before the oldest are dropped.
const CHANNEL_CAPACITY: usize = 256;

/// A session mutation, in the order it happened.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    /// A turn passed its guards: user message and assistant placeholder are
    /// both appended, the network call is about to start.
    TurnStarted {
        /// The appended user message.
        user_id: MessageId,
        /// The pending assistant message.
        assistant_id: MessageId,
    },
    /// Delta text was appended to the active assistant message.
    AssistantDelta {
        /// Target message.
        id: MessageId,
        /// The appended fragment.
        delta: String,
    },
    /// The active assistant message froze into a structured report.
    AssistantFrozen {
        /// Target message.
        id: MessageId,
    },
    /// The symptom accumulator was replaced wholesale.
    SymptomsReplaced {
        /// The new list.
        symptoms: Vec<String>,
    },
    /// The transcript dropped its oldest messages to stay at capacity.
    TranscriptTruncated {
        /// How many messages were evicted.
        evicted: usize,
    },
    /// The turn reached end-of-stream and finalized.
    TurnCompleted {
        /// The assistant message of the turn.
        id: MessageId,
        /// Total turn duration.
        response_time_ms: u64,
    },
    /// The turn failed at the transport level and finalized.
    TurnFailed {
        /// The assistant message of the turn.
        id: MessageId,
        /// What went wrong.
        error: String,
    },
    /// The turn was aborted by the host and finalized; partial content is
    /// retained.
    TurnAborted {
        /// The assistant message of the turn.
        id: MessageId,
    },
}

/// Broadcast fan-out for [`SessionEvent`]s.
#[derive(Debug)]
pub struct EventEmitter {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventEmitter {
    /// Create an emitter with the standard buffer size.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Open a new subscription. Events emitted before this call are not
    /// replayed.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Emit one event to all current subscribers.
    ///
    /// Returns the subscriber count, or an error when there are none —
    /// callers ignore the result (`let _ =`), since observation is optional.
    pub fn emit(
        &self,
        event: SessionEvent,
    ) -> Result<usize, broadcast::error::SendError<SessionEvent>> {
        self.tx.send(event)
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
