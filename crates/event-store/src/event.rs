use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{AggregateId, EventStoreError, Result};

/// Monotonically increasing sequence number.
///
/// Used twice: as the local revision of an aggregate (stamped onto every
/// event it raises) and as the global revision of a stored envelope (used
/// for range queries). Both counters start at [`Revision::initial`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Revision(u64);

impl Revision {
    /// Lowest possible revision, the default lower bound of a range.
    pub const MIN: Revision = Revision(0);

    /// Highest possible revision, the default upper bound of a range.
    pub const MAX: Revision = Revision(u64::MAX);

    /// Creates a revision from a raw value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the starting revision (1) of a fresh aggregate or store.
    pub fn initial() -> Self {
        Self(1)
    }

    /// Returns the next revision, saturating at [`Revision::MAX`].
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Returns the next revision, or `RevisionOverflow` past [`Revision::MAX`].
    pub fn checked_next(&self) -> Result<Self> {
        self.0
            .checked_add(1)
            .map(Self)
            .ok_or(EventStoreError::RevisionOverflow(*self))
    }

    /// Returns the raw revision value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Revision {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Revision> for u64 {
    fn from(revision: Revision) -> Self {
        revision.0
    }
}

/// A tagged record describing one state change.
///
/// Serialized as `{"event": <tag>, ...payload}`. A record without a tag does
/// not deserialize, and an empty tag is rejected when the event is raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// The event tag, which selects the handler on the receiving aggregate.
    #[serde(rename = "event")]
    pub tag: String,

    /// The remaining fields of the record.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Event {
    /// Creates an event with an empty payload.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            payload: Map::new(),
        }
    }

    /// Adds a payload field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Creates an event whose payload is the serialized form of `payload`.
    ///
    /// The payload must serialize to a JSON object.
    pub fn with_payload<T: Serialize>(tag: impl Into<String>, payload: &T) -> Result<Self> {
        match serde_json::to_value(payload)? {
            Value::Object(payload) => Ok(Self {
                tag: tag.into(),
                payload,
            }),
            other => Err(EventStoreError::InvalidEvent(format!(
                "payload must be an object, got {other}"
            ))),
        }
    }

    /// Parses a tagged record.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Returns true when the event carries a non-empty tag.
    pub fn is_tagged(&self) -> bool {
        !self.tag.is_empty()
    }

    /// Returns a payload field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}

/// An event stamped with the identity and revision of the aggregate that
/// raised it. Stamps are assigned by the engine, never by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampedEvent {
    /// Identity of the aggregate the event belongs to.
    pub id: AggregateId,

    /// Local revision of that aggregate after the event.
    pub revision: Revision,

    #[serde(flatten)]
    pub event: Event,
}

impl StampedEvent {
    pub fn new(id: AggregateId, revision: Revision, event: Event) -> Self {
        Self {
            id,
            revision,
            event,
        }
    }

    pub fn tag(&self) -> &str {
        &self.event.tag
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.event.get(key)
    }

    /// Deserializes the payload into a concrete type.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(
            self.event.payload.clone(),
        ))?)
    }
}

/// A revision-stamped batch of events, the unit of one store append.
///
/// The revision is `None` until the store assigns one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<Revision>,

    /// When the envelope was created.
    #[serde(default = "Utc::now")]
    pub recorded_at: DateTime<Utc>,

    pub events: Vec<StampedEvent>,
}

impl Envelope {
    /// Wraps a batch of events; the store assigns the revision.
    pub fn new(events: Vec<StampedEvent>) -> Self {
        Self {
            revision: None,
            recorded_at: Utc::now(),
            events,
        }
    }

    /// Creates an envelope builder.
    pub fn builder() -> EnvelopeBuilder {
        EnvelopeBuilder::default()
    }

    /// Parses an envelope from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the envelope to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Builder for envelopes, mostly used to seed a store.
#[derive(Debug, Default)]
pub struct EnvelopeBuilder {
    revision: Option<Revision>,
    recorded_at: Option<DateTime<Utc>>,
    events: Vec<StampedEvent>,
}

impl EnvelopeBuilder {
    /// Sets the envelope revision. If not set, the store assigns one.
    pub fn revision(mut self, revision: impl Into<Revision>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    /// Sets the timestamp. If not set, the current time will be used.
    pub fn recorded_at(mut self, recorded_at: DateTime<Utc>) -> Self {
        self.recorded_at = Some(recorded_at);
        self
    }

    /// Appends an already stamped event.
    pub fn event(mut self, event: StampedEvent) -> Self {
        self.events.push(event);
        self
    }

    /// Stamps and appends an event.
    pub fn stamp(
        self,
        id: impl Into<AggregateId>,
        revision: impl Into<Revision>,
        event: Event,
    ) -> Self {
        self.event(StampedEvent::new(id.into(), revision.into(), event))
    }

    pub fn build(self) -> Envelope {
        Envelope {
            revision: self.revision,
            recorded_at: self.recorded_at.unwrap_or_else(Utc::now),
            events: self.events,
        }
    }
}
