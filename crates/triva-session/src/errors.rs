//! Session error types.
//!
//! Only pre-flight rejections and construction failures surface as `Err`
//! from the controller. Mid-turn transport failures terminate the turn in a
//! defined errored state with the finalize step applied — they are reported
//! through the [`TurnReport`](crate::turn::TurnReport), never thrown past
//! the turn.

use thiserror::Error;

use triva_client::ClientError;

/// Errors returned before any network call is made.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The input was empty or whitespace-only.
    #[error("cannot send an empty message")]
    EmptyInput,

    /// The transcript hit its capacity; the session accepts no further turns.
    #[error("conversation limit reached")]
    LimitReached,

    /// A structured report already completed the conversation.
    #[error("conversation already completed")]
    ConversationComplete,

    /// Client construction failed.
    #[error(transparent)]
    Client(#[from] ClientError),
}
