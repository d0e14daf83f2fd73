//! Write-once aggregate identity.

use common::AggregateId;

use crate::error::{EngineError, Result};

/// How an identity without a value comes into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    /// Generated on first use.
    Generated,
    /// Must be supplied with [`Identity::set`].
    Deferred,
}

/// The identity of one aggregate.
///
/// Either supplied up front, generated lazily on first use, or deferred until
/// the application assigns it. Once a value exists it never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    value: Option<AggregateId>,
    source: Source,
}

impl Identity {
    /// An identity generated the first time it is read.
    pub fn generated() -> Self {
        Self {
            value: None,
            source: Source::Generated,
        }
    }

    /// An identity supplied at construction.
    pub fn known(id: impl Into<AggregateId>) -> Self {
        Self {
            value: Some(id.into()),
            source: Source::Deferred,
        }
    }

    /// An identity that must be assigned before use.
    pub fn deferred() -> Self {
        Self {
            value: None,
            source: Source::Deferred,
        }
    }

    /// True once a value has been supplied or generated.
    ///
    /// A generated identity that has never been read has no value yet.
    pub fn has_identity(&self) -> bool {
        self.value.is_some()
    }

    /// Returns the value without generating one.
    pub fn get(&self) -> Option<&AggregateId> {
        self.value.as_ref()
    }

    /// Returns the identity, generating it on first use when allowed.
    pub fn id(&mut self) -> Result<AggregateId> {
        if let Some(id) = &self.value {
            return Ok(id.clone());
        }
        match self.source {
            Source::Generated => {
                let id = AggregateId::new();
                self.value = Some(id.clone());
                Ok(id)
            }
            Source::Deferred => Err(EngineError::IdentityUnknown),
        }
    }

    /// Assigns the identity.
    ///
    /// Returns `Ok(true)` when the value was newly established and `Ok(false)`
    /// when the same value was already set. A different value fails.
    pub fn set(&mut self, id: AggregateId) -> Result<bool> {
        if id.is_empty() {
            return Err(EngineError::IdentityRequired);
        }
        match &self.value {
            Some(current) if *current == id => Ok(false),
            Some(current) => Err(EngineError::IdentityAlreadySet {
                current: current.clone(),
                attempted: id,
            }),
            None => {
                self.value = Some(id);
                Ok(true)
            }
        }
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::generated()
    }
}
