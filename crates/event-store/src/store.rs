use crate::{Envelope, EventStoreError, Result, Revision, RevisionRange, StampedEvent};

/// A lazy, forward-only sequence of stored events.
///
/// Each call to [`Storage::events`] produces a fresh stream.
pub type EventStream = Box<dyn Iterator<Item = StampedEvent>>;

/// Core trait for envelope storage.
///
/// Storage is append-only and revision-ordered. Implementations use interior
/// mutability: the engine is single-threaded and shares one storage between
/// its unit of work and its owner.
pub trait Storage {
    /// Appends an envelope to the store.
    ///
    /// Assigns the next store revision when the envelope has none and returns
    /// the envelope as stored.
    fn store(&self, envelope: Envelope) -> Result<Envelope>;

    /// Streams the events of every envelope whose revision lies in `range`.
    ///
    /// Fails with `InvalidRange` when `range.from > range.to`. Events are
    /// yielded in store order, each envelope's batch in its original order.
    fn events(&self, range: RevisionRange) -> Result<EventStream>;

    /// Returns the last revision assigned by the store.
    fn revision(&self) -> Revision;

    /// Removes every envelope. Destructive; meant for tests and resets.
    fn clear(&self) {}
}

/// Extension trait providing convenience methods for storages.
pub trait StorageExt: Storage {
    /// Streams the full history.
    fn all_events(&self) -> Result<EventStream> {
        self.events(RevisionRange::all())
    }

    /// Wraps a batch of events in a new envelope and stores it.
    fn store_events(&self, events: Vec<StampedEvent>) -> Result<Envelope> {
        self.store(Envelope::new(events))
    }
}

// Blanket implementation for all Storage implementations
impl<T: Storage + ?Sized> StorageExt for T {}

/// Validates an envelope before storing it.
///
/// Every event must carry a tag and an identity, otherwise it could never be
/// dispatched during replay.
pub fn validate_envelope(envelope: &Envelope) -> Result<()> {
    for event in &envelope.events {
        if !event.event.is_tagged() {
            return Err(EventStoreError::InvalidEvent(
                "`event` is required".to_string(),
            ));
        }
        if event.id.is_empty() {
            return Err(EventStoreError::InvalidEvent(format!(
                "event \"{}\" has no aggregate id",
                event.tag()
            )));
        }
    }
    Ok(())
}
