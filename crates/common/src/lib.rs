//! Shared types used across the event-sourcing engine crates.

mod types;

pub use types::AggregateId;
