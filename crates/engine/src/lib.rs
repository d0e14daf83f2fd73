//! Embeddable event-sourcing engine.
//!
//! This crate provides the runtime that lets application objects record their
//! state changes as events and rebuild themselves by replaying them:
//! - `Aggregate` trait and the `Eventable` handle for raising and applying events
//! - `UnitOfWork` state machine switching between recording and replaying
//! - `IdentityMap` routing replayed events to live aggregates
//! - `Engine` facade tying storage, unit of work and aggregate factory together
//!
//! The engine is single-threaded. Handlers may defer work by returning a
//! pending [`Applied`]; everything else runs synchronously.

pub mod aggregate;
pub mod applied;
pub mod config;
pub mod engine;
pub mod error;
pub mod identity;
pub mod identity_map;
mod replay;
pub mod unit_of_work;

pub use aggregate::{Aggregate, Eventable, EventableFactory, Handler, HandlerResult, IntoBatch};
pub use applied::{Applied, PendingApply};
pub use config::EngineConfig;
pub use engine::{Engine, EngineBuilder};
pub use error::{EngineError, Result};
pub use identity::Identity;
pub use identity_map::{EventProvider, HashIdentityMap, IdentityMap};
pub use unit_of_work::{Mode, UnitOfWork};

pub use common::AggregateId;
pub use event_store::{
    Envelope, Event, InMemoryStorage, NullStorage, Revision, RevisionRange, StampedEvent, Storage,
};
