use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Unique identity token of an aggregate.
///
/// Generated identities are UUID v4 strings, but any non-empty token supplied
/// by the application (or found in stored events) is accepted. The token is
/// immutable: once an aggregate has observed its identity it never changes.
///
/// Serializes as a plain string; integer tokens are accepted when
/// deserializing so hand-written seed data can use `"id": 1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AggregateId(String);

impl AggregateId {
    /// Generates a new collision-resistant identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps an externally supplied token.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the token is empty, which no aggregate may carry.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Token {
    Text(String),
    Number(u64),
}

impl<'de> Deserialize<'de> for AggregateId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Token::deserialize(deserializer)? {
            Token::Text(text) => Self(text),
            Token::Number(number) => Self(number.to_string()),
        })
    }
}

impl Default for AggregateId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AggregateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AggregateId {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl From<String> for AggregateId {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<Uuid> for AggregateId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid.to_string())
    }
}

impl From<u64> for AggregateId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for AggregateId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
