use crate::{
    Envelope, Result, Revision, RevisionRange,
    store::{EventStream, Storage},
};

/// Storage that keeps nothing.
///
/// For callers that want aggregate and event-application behavior without
/// persistence. Every operation is a no-op and the history is always empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStorage;

impl NullStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Storage for NullStorage {
    fn store(&self, envelope: Envelope) -> Result<Envelope> {
        Ok(envelope)
    }

    fn events(&self, _range: RevisionRange) -> Result<EventStream> {
        Ok(Box::new(std::iter::empty()))
    }

    fn revision(&self) -> Revision {
        Revision::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Event, StorageExt};

    #[test]
    fn null_storage_keeps_nothing() {
        let storage = NullStorage::new();
        let envelope = Envelope::builder()
            .stamp("a", 2u64, Event::new("foo"))
            .build();

        let stored = storage.store(envelope).unwrap();
        assert!(stored.revision.is_none());
        assert_eq!(storage.all_events().unwrap().count(), 0);
        assert_eq!(storage.revision(), Revision::initial());
        storage.clear();
    }
}
