pub mod error;
pub mod event;
pub mod memory;
pub mod null;
pub mod query;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{Envelope, EnvelopeBuilder, Event, Revision, StampedEvent};
pub use memory::InMemoryStorage;
pub use null::NullStorage;
pub use query::RevisionRange;
pub use store::{EventStream, Storage, StorageExt};
