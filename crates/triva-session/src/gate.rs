//! The session send gate.
//!
//! Two sticky conditions can shut a conversation: the transcript hit its
//! capacity at least once, and a structured report froze a message. Modeling
//! them as one enum instead of two booleans makes the invalid combinations
//! unrepresentable and keeps the stickiness in one place — there is no
//! transition out of a closed state.

/// Send gate over the session's sticky conditions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionGate {
    /// No sticky condition yet; sends pass.
    #[default]
    Open,
    /// The transcript evicted at least once. Never clears.
    LimitReached,
    /// A structured report completed the conversation. Never clears.
    Completed,
    /// Both conditions hold.
    CompletedAtLimit,
}

impl SessionGate {
    /// Whether a new turn may start.
    #[must_use]
    pub fn allows_send(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Whether the capacity limit was ever hit.
    #[must_use]
    pub fn limit_reached(&self) -> bool {
        matches!(self, Self::LimitReached | Self::CompletedAtLimit)
    }

    /// Whether a structured report completed the conversation.
    #[must_use]
    pub fn completed(&self) -> bool {
        matches!(self, Self::Completed | Self::CompletedAtLimit)
    }

    /// Record a transcript eviction. Sticky.
    pub fn note_eviction(&mut self) {
        *self = match self {
            Self::Open | Self::LimitReached => Self::LimitReached,
            Self::Completed | Self::CompletedAtLimit => Self::CompletedAtLimit,
        };
    }

    /// Record a structured-report freeze. Sticky.
    pub fn note_completion(&mut self) {
        *self = match self {
            Self::Open | Self::Completed => Self::Completed,
            Self::LimitReached | Self::CompletedAtLimit => Self::CompletedAtLimit,
        };
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
