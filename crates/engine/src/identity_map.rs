//! Identity → live aggregate routing used while replaying.

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use common::AggregateId;
use event_store::StampedEvent;

use crate::applied::Applied;
use crate::error::{EngineError, Result};

/// An aggregate as seen by the replay engine: something events can be routed to.
pub trait EventProvider {
    /// Returns the provider's identity, generating it when allowed.
    fn provider_id(&self) -> Result<AggregateId>;

    /// Applies a batch of stamped events in order.
    fn apply_events(self: Rc<Self>, events: Vec<StampedEvent>) -> Result<Applied>;
}

/// Transient registry of live aggregates, scoped to one unit-of-work cycle.
///
/// Entries are back-references, not ownership: dropping an aggregate makes
/// its entry unresolvable and [`release`](IdentityMap::release) never
/// touches the aggregates themselves.
pub trait IdentityMap {
    /// Maps `id` to `provider`, replacing any previous mapping.
    fn register(&mut self, id: &AggregateId, provider: Weak<dyn EventProvider>) -> Result<()>;

    /// Resolves the live provider registered under `id`.
    fn get(&self, id: &AggregateId) -> Result<Rc<dyn EventProvider>>;

    /// Forgets every mapping.
    fn release(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Hash map backed identity map.
#[derive(Default)]
pub struct HashIdentityMap {
    providers: HashMap<AggregateId, Weak<dyn EventProvider>>,
}

impl HashIdentityMap {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityMap for HashIdentityMap {
    fn register(&mut self, id: &AggregateId, provider: Weak<dyn EventProvider>) -> Result<()> {
        if id.is_empty() {
            return Err(EngineError::IdentityRequired);
        }
        if provider.strong_count() == 0 {
            return Err(EngineError::ProviderRequired);
        }
        tracing::trace!(%id, "provider registered");
        self.providers.insert(id.clone(), provider);
        Ok(())
    }

    fn get(&self, id: &AggregateId) -> Result<Rc<dyn EventProvider>> {
        if id.is_empty() {
            return Err(EngineError::IdentityRequired);
        }
        self.providers
            .get(id)
            .and_then(Weak::upgrade)
            .ok_or_else(|| EngineError::ProviderNotFound(id.clone()))
    }

    fn release(&mut self) {
        self.providers.clear();
    }

    fn len(&self) -> usize {
        self.providers.len()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    /// Records the tags it is asked to apply.
    struct RecordingProvider {
        id: AggregateId,
        seen: RefCell<Vec<String>>,
    }

    impl RecordingProvider {
        fn new(id: &str) -> Rc<Self> {
            Rc::new(Self {
                id: AggregateId::from(id),
                seen: RefCell::new(Vec::new()),
            })
        }
    }

    impl EventProvider for RecordingProvider {
        fn provider_id(&self) -> Result<AggregateId> {
            Ok(self.id.clone())
        }

        fn apply_events(self: Rc<Self>, events: Vec<StampedEvent>) -> Result<Applied> {
            let mut seen = self.seen.borrow_mut();
            seen.extend(events.into_iter().map(|e| e.event.tag));
            Ok(Applied::Ready)
        }
    }

    fn weak(provider: &Rc<RecordingProvider>) -> Weak<dyn EventProvider> {
        let provider: Rc<dyn EventProvider> = provider.clone();
        Rc::downgrade(&provider)
    }

    #[test]
    fn register_and_get() {
        let mut map = HashIdentityMap::new();
        let provider = RecordingProvider::new("a");
        map.register(&provider.id, weak(&provider)).unwrap();

        let found = map.get(&AggregateId::from("a")).unwrap();
        assert_eq!(found.provider_id().unwrap(), AggregateId::from("a"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn register_overwrites_previous_mapping() {
        let mut map = HashIdentityMap::new();
        let first = RecordingProvider::new("first");
        let second = RecordingProvider::new("second");
        let id = AggregateId::from("shared");

        map.register(&id, weak(&first)).unwrap();
        map.register(&id, weak(&second)).unwrap();

        let found = map.get(&id).unwrap();
        assert_eq!(found.provider_id().unwrap(), AggregateId::from("second"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn register_requires_id_and_live_provider() {
        let mut map = HashIdentityMap::new();
        let provider = RecordingProvider::new("a");
        assert!(matches!(
            map.register(&AggregateId::from(""), weak(&provider)),
            Err(EngineError::IdentityRequired)
        ));

        let dropped = weak(&RecordingProvider::new("gone"));
        assert!(matches!(
            map.register(&AggregateId::from("gone"), dropped),
            Err(EngineError::ProviderRequired)
        ));
    }

    #[test]
    fn get_unmapped_id_fails() {
        let map = HashIdentityMap::new();
        let err = map.get(&AggregateId::from("missing")).err().unwrap();
        assert_eq!(err.to_string(), "could not locate provider with id \"missing\"");
    }

    #[test]
    fn get_dropped_provider_fails() {
        let mut map = HashIdentityMap::new();
        let provider = RecordingProvider::new("a");
        map.register(&provider.id, weak(&provider)).unwrap();
        drop(provider);

        assert!(matches!(
            map.get(&AggregateId::from("a")),
            Err(EngineError::ProviderNotFound(_))
        ));
    }

    #[test]
    fn release_clears_entries_but_not_providers() {
        let mut map = HashIdentityMap::new();
        let provider = RecordingProvider::new("a");
        map.register(&provider.id, weak(&provider)).unwrap();

        map.release();

        assert!(map.is_empty());
        assert!(map.get(&provider.id).is_err());
        let provider_dyn: Rc<dyn EventProvider> = provider.clone();
        assert!(provider_dyn.apply_events(vec![]).unwrap().is_ready());
        assert!(provider.seen.borrow().is_empty());
    }
}
