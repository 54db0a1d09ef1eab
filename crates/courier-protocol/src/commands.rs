//! Outbound commands posted to the broker.

use serde::{Deserialize, Serialize};

use crate::model::{Message, ReadTarget, TypingPeers, UserId};

/// Payload forwarded by the broker to the server inside a `send` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientPayload {
    /// Read receipt for a conversation.
    Read {
        /// Conversation that was read.
        message: ReadTarget,
    },

    /// Local user started or stopped typing.
    Typing {
        /// Who is typing to whom.
        message: TypingPeers,
        /// New typing state.
        is_typing: bool,
    },

    /// Chat message to deliver.
    NewMessage {
        /// The message.
        message: Message,
    },

    /// Ask the server for the roster and online list.
    Users,
}

impl ClientPayload {
    /// Create a read receipt payload.
    #[must_use]
    pub fn read(receiver_id: UserId) -> Self {
        ClientPayload::Read {
            message: ReadTarget { receiver_id },
        }
    }

    /// Create a typing payload.
    #[must_use]
    pub fn typing(sender_id: UserId, receiver_id: UserId, is_typing: bool) -> Self {
        ClientPayload::Typing {
            message: TypingPeers {
                sender_id,
                receiver_id,
            },
            is_typing,
        }
    }
}

/// A command posted to the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Attach this client context to the shared connection.
    Connect,

    /// Detach this client context.
    Close,

    /// Forward a payload to the server.
    Send {
        /// Payload to forward.
        payload: ClientPayload,
    },

    /// Dedicated read receipt channel.
    Read {
        /// Receipt payload.
        payload: ClientPayload,
    },

    /// Keepalive answer to a `ping`.
    Pong,
}

impl Command {
    /// Wire name of the command type.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Command::Connect => "connect",
            Command::Close => "close",
            Command::Send { .. } => "send",
            Command::Read { .. } => "read",
            Command::Pong => "pong",
        }
    }

    /// Create a Send command.
    #[must_use]
    pub fn send(payload: ClientPayload) -> Self {
        Command::Send { payload }
    }
}
