//! The embeddable engine: one storage, one unit of work.

use std::rc::Rc;

use event_store::{Envelope, InMemoryStorage, Revision, RevisionRange, Storage};

use crate::aggregate::{Aggregate, Eventable, EventableFactory};
use crate::applied::Applied;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::identity_map::{HashIdentityMap, IdentityMap};
use crate::unit_of_work::UnitOfWork;

/// An event-sourcing engine instance.
///
/// Owns the storage and the unit of work that every aggregate created through
/// [`eventable`](Engine::eventable) records into and is restored by.
pub struct Engine {
    storage: Rc<dyn Storage>,
    uow: Rc<UnitOfWork>,
}

impl Engine {
    /// Creates an atomic engine backed by in-memory storage.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Creates an in-memory engine from configuration.
    pub fn from_config(config: EngineConfig) -> Self {
        Self::builder().config(config).build()
    }

    /// Returns the factory for aggregates bound to this engine.
    pub fn eventable(&self) -> EventableFactory {
        EventableFactory::new(Rc::clone(&self.uow))
    }

    /// Flushes pending events into one envelope.
    #[tracing::instrument(skip(self))]
    pub fn commit(&self) -> Result<Option<Envelope>> {
        self.uow.commit()
    }

    /// Stores a pre-built envelope directly, e.g. to seed history.
    #[tracing::instrument(skip(self, envelope), fields(revision = ?envelope.revision, events = envelope.len()))]
    pub fn mount(&self, envelope: Envelope) -> Result<Envelope> {
        Ok(self.storage.store(envelope)?)
    }

    /// Restores `root`, and every aggregate its handlers create, from the
    /// envelopes whose revision lies in `range` (inclusive).
    ///
    /// Returns `Applied::Ready` when every handler ran synchronously;
    /// otherwise the replay finishes when the returned value is awaited.
    pub fn restore<A: Aggregate>(
        &self,
        root: &Eventable<A>,
        range: impl Into<RevisionRange>,
    ) -> Result<Applied> {
        self.uow.restore(root.as_provider(), range.into())
    }

    /// Returns the storage's current revision.
    pub fn revision(&self) -> Revision {
        self.storage.revision()
    }

    pub fn unit_of_work(&self) -> &Rc<UnitOfWork> {
        &self.uow
    }

    pub fn storage(&self) -> &Rc<dyn Storage> {
        &self.storage
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Engine`]. Unset collaborators default to
/// [`InMemoryStorage`] and [`HashIdentityMap`].
#[derive(Default)]
pub struct EngineBuilder {
    storage: Option<Rc<dyn Storage>>,
    identity_map: Option<Box<dyn IdentityMap>>,
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn storage(mut self, storage: impl Storage + 'static) -> Self {
        self.storage = Some(Rc::new(storage));
        self
    }

    pub fn identity_map(mut self, identity_map: impl IdentityMap + 'static) -> Self {
        self.identity_map = Some(Box::new(identity_map));
        self
    }

    /// `false` queues events until [`Engine::commit`].
    pub fn atomic(mut self, atomic: bool) -> Self {
        self.config.atomic = atomic;
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Engine {
        let storage = self
            .storage
            .unwrap_or_else(|| Rc::new(InMemoryStorage::new()));
        let identity_map = self
            .identity_map
            .unwrap_or_else(|| Box::new(HashIdentityMap::new()));
        tracing::debug!(atomic = self.config.atomic, "engine created");

        let uow = UnitOfWork::new(Rc::clone(&storage), identity_map, self.config.atomic);
        Engine {
            storage,
            uow: Rc::new(uow),
        }
    }
}
