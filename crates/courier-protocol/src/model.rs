//! Data carried inside events and commands.
//!
//! Display fields of members and metadata of messages are opaque to the
//! router; they are preserved as raw JSON maps so they survive a round trip
//! to the UI untouched.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Identifier of a user, as assigned by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// Create a new user ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Connectivity status of a roster member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    /// Member has at least one live connection.
    Online,
    /// Member is not connected.
    #[default]
    Offline,
}

impl PresenceStatus {
    /// Whether this status is [`PresenceStatus::Online`].
    #[must_use]
    pub fn is_online(self) -> bool {
        self == Self::Online
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Online => write!(f, "online"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

/// A roster entry.
///
/// `status` is never trusted from the wire: it is recomputed from the
/// online-id list on every presence event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// User identifier.
    pub id: UserId,
    /// Derived connectivity status. Whatever the wire carries is dropped.
    #[serde(default, deserialize_with = "discard_status")]
    pub status: PresenceStatus,
    /// Display fields (nickname, avatar, unread counters, ...).
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

impl Member {
    /// Create a member with no display fields.
    #[must_use]
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            status: PresenceStatus::Offline,
            profile: Map::new(),
        }
    }

    /// Attach a display field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.profile.insert(key.into(), value.into());
        self
    }
}

/// A chat message between two users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the message.
    pub sender_id: UserId,
    /// Recipient of the message.
    pub receiver_id: UserId,
    /// Message body.
    #[serde(default)]
    pub content: String,
    /// Server metadata (id, timestamps, read flag).
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl Message {
    /// Create a message with no metadata.
    #[must_use]
    pub fn new(sender_id: UserId, receiver_id: UserId, content: impl Into<String>) -> Self {
        Self {
            sender_id,
            receiver_id,
            content: content.into(),
            metadata: Map::new(),
        }
    }

    /// Whether `peer` is either party of this message.
    #[must_use]
    pub fn involves(&self, peer: UserId) -> bool {
        self.sender_id == peer || self.receiver_id == peer
    }
}

/// The part of a message a read receipt refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadTarget {
    /// Peer whose conversation was read.
    pub receiver_id: UserId,
}

/// The parties of a typing signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingPeers {
    /// User who is typing.
    pub sender_id: UserId,
    /// User being typed to.
    pub receiver_id: UserId,
}

/// Deserialize a list that the server may send as `null`.
pub(crate) fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Consume any wire `status` and start from offline.
fn discard_status<'de, D>(deserializer: D) -> Result<PresenceStatus, D::Error>
where
    D: Deserializer<'de>,
{
    IgnoredAny::deserialize(deserializer)?;
    Ok(PresenceStatus::Offline)
}
