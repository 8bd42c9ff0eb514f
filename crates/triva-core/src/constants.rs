//! Package-level constants.

/// Current version of the Triva core (sourced from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum number of messages retained in a transcript.
///
/// On overflow the oldest messages are dropped until the transcript is back
/// at this size; the session records a sticky limit-reached condition the
/// first time that happens.
pub const TRANSCRIPT_CAPACITY: usize = 20;

/// Content substituted into an assistant message when its turn fails at the
/// transport level.
pub const TRANSPORT_FAILURE_TEXT: &str = "Error fetching response.";

/// Content substituted into an assistant message whose turn ended with no
/// streamed text and no structured result. An assistant message never
/// persists as the empty string.
pub const EMPTY_TURN_PLACEHOLDER: &str = "[Response ended without content]";
