//! Error types for lifecycle operations.

use database::{ConversationStatus, DatabaseError};
use thiserror::Error;

/// Errors that can occur during lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The requested edge is not in the transition graph. No side effect
    /// was performed.
    #[error("invalid transition for conversation {conversation_id}: {} -> {}", from.as_str(), to.as_str())]
    InvalidTransition {
        conversation_id: String,
        from: ConversationStatus,
        to: ConversationStatus,
    },

    /// Another operator claimed the conversation first.
    #[error("conversation {conversation_id} is already claimed")]
    AlreadyClaimed { conversation_id: String },

    /// The underlying store failed; no partial state was left behind.
    #[error("persistence error: {0}")]
    Persistence(#[from] DatabaseError),

    /// The outbound messaging gateway failed or was unreachable.
    #[error("send failed for conversation {conversation_id}: {reason}")]
    Send {
        conversation_id: String,
        reason: String,
    },
}
