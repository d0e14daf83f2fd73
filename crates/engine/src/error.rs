//! Engine error types.

use common::AggregateId;
use event_store::EventStoreError;
use thiserror::Error;

/// Errors that can occur while raising, committing or restoring events.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A raised event carries no tag.
    #[error("`event` is required")]
    EventRequired,

    /// The aggregate has no identity and cannot generate one.
    #[error("identity is unknown")]
    IdentityUnknown,

    /// An identity was assigned to an aggregate that already has a different one.
    #[error("`id` is already set as \"{current}\" (attempted \"{attempted}\")")]
    IdentityAlreadySet {
        current: AggregateId,
        attempted: AggregateId,
    },

    /// An empty identity was supplied.
    #[error("`id` is required")]
    IdentityRequired,

    /// A provider that no longer exists was registered.
    #[error("`provider` is required")]
    ProviderRequired,

    /// No live aggregate is registered under the identity.
    #[error("could not locate provider with id \"{0}\"")]
    ProviderNotFound(AggregateId),

    /// A restore was started while another one is still running.
    #[error("a restore is already in progress")]
    RestoreInProgress,

    /// An event handler tried to apply events to its own aggregate.
    #[error("aggregate \"{0}\" is already applying an event")]
    Reentrant(AggregateId),

    /// An application event handler failed.
    #[error("{0}")]
    Handler(Box<dyn std::error::Error>),

    /// An error occurred in the storage.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Wraps a failure raised by an application event handler.
    pub fn handler(error: impl Into<Box<dyn std::error::Error>>) -> Self {
        Self::Handler(error.into())
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_error_displays_message_verbatim() {
        let err = EngineError::handler("i have fooed");
        assert_eq!(err.to_string(), "i have fooed");
    }

    #[test]
    fn identity_already_set_names_both_values() {
        let err = EngineError::IdentityAlreadySet {
            current: AggregateId::from("a"),
            attempted: AggregateId::from("b"),
        };
        assert_eq!(err.to_string(), "`id` is already set as \"a\" (attempted \"b\")");
    }
}
