//! # triva-session
//!
//! The turn lifecycle for the Triva intake assistant.
//!
//! [`SessionController`] owns the session-scoped state — the bounded
//! transcript, the symptom accumulator, and the sticky [`SessionGate`] — and
//! drives each turn through its phases: pre-flight guards, user append,
//! placeholder append, dispatch, the incremental read loop, and a finalize
//! step that runs exactly once on every path.
//!
//! Observation happens through [`EventEmitter`] broadcasts and transcript
//! snapshots; no rendering assumptions live here.

#![deny(unsafe_code)]

pub mod controller;
pub mod errors;
pub mod events;
pub mod gate;
pub mod metrics;
pub mod turn;

pub use controller::{SessionConfig, SessionController, SessionPhase};
pub use errors::SessionError;
pub use events::{EventEmitter, SessionEvent};
pub use gate::SessionGate;
pub use metrics::TurnMetrics;
pub use turn::{TurnOutcome, TurnReport};
