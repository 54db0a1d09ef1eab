//! Inbound events fanned out by the broker.
//!
//! Every event is a JSON object with a `type` discriminator. The set of
//! types is closed: anything unrecognized decodes to
//! [`InboundEvent::Ignored`] so the "ignore unknown" policy stays visible
//! at the call site instead of being an implicit fall-through.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::fmt;

use crate::model::{nullable_vec, Member, Message, ReadTarget, TypingPeers, UserId};

/// Event type identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Users,
    StatusUpdate,
    Read,
    Error,
    Ping,
    Typing,
    NewMessage,
    Ignored,
}

impl EventKind {
    /// Wire name of the event type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Users => "users",
            EventKind::StatusUpdate => "status_update",
            EventKind::Read => "read",
            EventKind::Error => "error",
            EventKind::Ping => "ping",
            EventKind::Typing => "typing",
            EventKind::NewMessage => "new_message",
            EventKind::Ignored => "ignored",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A full roster together with the ids that are currently online.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RosterSnapshot {
    /// Roster in server order.
    #[serde(default, deserialize_with = "nullable_vec")]
    pub members: Vec<Member>,
    /// Ids with a live connection.
    #[serde(
        default,
        rename = "data",
        alias = "online_ids",
        alias = "onlineIds",
        deserialize_with = "nullable_vec"
    )]
    pub online: Vec<UserId>,
}

impl RosterSnapshot {
    /// Create a snapshot.
    #[must_use]
    pub fn new(members: Vec<Member>, online: Vec<UserId>) -> Self {
        Self { members, online }
    }
}

/// An event received from the broker.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// Reply to a roster request.
    Users(RosterSnapshot),

    /// Someone connected or disconnected.
    StatusUpdate(RosterSnapshot),

    /// The peer read our messages.
    Read {
        /// Conversation the receipt refers to.
        message: ReadTarget,
    },

    /// The last send was not delivered.
    Error,

    /// Keepalive probe; must be answered with a `pong`.
    Ping,

    /// A peer started or stopped typing.
    Typing {
        /// Who is typing to whom.
        message: TypingPeers,
        /// New typing state.
        is_typing: bool,
    },

    /// A chat message was stored by the server.
    NewMessage {
        /// The message.
        message: Message,
        /// Roster attached to the message, if the server sent one.
        roster: Option<RosterSnapshot>,
    },

    /// Event type this client does not know about.
    Ignored {
        /// The unrecognized `type` value.
        kind: String,
    },
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(flatten)]
    body: Map<String, Value>,
}

#[derive(Deserialize)]
struct ReadBody {
    message: ReadTarget,
}

#[derive(Deserialize)]
struct TypingBody {
    message: TypingPeers,
    #[serde(default)]
    is_typing: bool,
}

#[derive(Deserialize)]
struct NewMessageBody {
    message: Message,
    #[serde(default)]
    members: Option<Vec<Member>>,
    #[serde(
        default,
        rename = "data",
        alias = "online_ids",
        alias = "onlineIds",
        deserialize_with = "nullable_vec"
    )]
    online: Vec<UserId>,
}

impl InboundEvent {
    /// Get the event type.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            InboundEvent::Users(_) => EventKind::Users,
            InboundEvent::StatusUpdate(_) => EventKind::StatusUpdate,
            InboundEvent::Read { .. } => EventKind::Read,
            InboundEvent::Error => EventKind::Error,
            InboundEvent::Ping => EventKind::Ping,
            InboundEvent::Typing { .. } => EventKind::Typing,
            InboundEvent::NewMessage { .. } => EventKind::NewMessage,
            InboundEvent::Ignored { .. } => EventKind::Ignored,
        }
    }

    /// Create a Typing event.
    #[must_use]
    pub fn typing(sender_id: UserId, receiver_id: UserId, is_typing: bool) -> Self {
        InboundEvent::Typing {
            message: TypingPeers {
                sender_id,
                receiver_id,
            },
            is_typing,
        }
    }

    /// Create a NewMessage event without an attached roster.
    #[must_use]
    pub fn new_message(message: Message) -> Self {
        InboundEvent::NewMessage {
            message,
            roster: None,
        }
    }

    /// Create a Read event.
    #[must_use]
    pub fn read(receiver_id: UserId) -> Self {
        InboundEvent::Read {
            message: ReadTarget { receiver_id },
        }
    }

    fn from_envelope(envelope: Envelope) -> Result<Self, serde_json::Error> {
        let body = Value::Object(envelope.body);

        let event = match envelope.kind.as_str() {
            "users" => InboundEvent::Users(serde_json::from_value(body)?),
            "status_update" => InboundEvent::StatusUpdate(serde_json::from_value(body)?),
            "read" => {
                let ReadBody { message } = serde_json::from_value(body)?;
                InboundEvent::Read { message }
            }
            "error" => InboundEvent::Error,
            "ping" => InboundEvent::Ping,
            "typing" => {
                let TypingBody { message, is_typing } = serde_json::from_value(body)?;
                InboundEvent::Typing { message, is_typing }
            }
            "new_message" => {
                let NewMessageBody {
                    message,
                    members,
                    online,
                } = serde_json::from_value(body)?;
                InboundEvent::NewMessage {
                    message,
                    roster: members.map(|members| RosterSnapshot::new(members, online)),
                }
            }
            _ => InboundEvent::Ignored {
                kind: envelope.kind,
            },
        };

        Ok(event)
    }
}

impl<'de> Deserialize<'de> for InboundEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let envelope = Envelope::deserialize(deserializer)?;
        InboundEvent::from_envelope(envelope).map_err(D::Error::custom)
    }
}
