//! # courier-protocol
//!
//! Wire types exchanged between a Courier client context and the broker
//! process that owns the shared network connection.
//!
//! ## Directions
//!
//! - [`InboundEvent`] - server events fanned out by the broker
//!   (`users`, `status_update`, `read`, `error`, `ping`, `typing`, `new_message`)
//! - [`Command`] - client commands posted to the broker
//!   (`connect`, `close`, `send`, `users`, `read`, `pong`)
//!
//! ## Example
//!
//! ```rust
//! use courier_protocol::{codec, Command, EventKind};
//!
//! let line = codec::encode(&Command::Pong).unwrap();
//! assert_eq!(&line[..], b"{\"type\":\"pong\"}\n");
//!
//! let event = codec::decode(br#"{"type":"ping"}"#).unwrap();
//! assert_eq!(event.kind(), EventKind::Ping);
//! ```

pub mod codec;
pub mod commands;
pub mod events;
pub mod model;

pub use codec::{decode, encode, LineCodec, ProtocolError};
pub use commands::{ClientPayload, Command};
pub use events::{EventKind, InboundEvent, RosterSnapshot};
pub use model::{Member, Message, PresenceStatus, ReadTarget, TypingPeers, UserId};
