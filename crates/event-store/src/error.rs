use thiserror::Error;

use crate::Revision;

/// Errors that can occur when interacting with envelope storage.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// The lower bound of a revision range exceeds its upper bound.
    #[error("`from` must be less than or equal `to` (from {from}, to {to})")]
    InvalidRange { from: Revision, to: Revision },

    /// An explicitly revisioned envelope would break the ascending store order.
    #[error("Envelope revision {revision} must be greater than the last stored revision {last}")]
    RevisionConflict { revision: Revision, last: Revision },

    /// No revision follows the given one.
    #[error("Revision {0} has no successor")]
    RevisionOverflow(Revision),

    /// An event can never be routed or dispatched.
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;
