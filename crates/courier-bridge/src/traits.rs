//! Broker abstraction traits.
//!
//! A broker hands each client context one channel pair: a port to post
//! commands on and a receiver of inbound events.

use async_trait::async_trait;
use courier_core::{CommandSink, OutboxError};
use courier_protocol::{Command, InboundEvent, ProtocolError};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::trace;

/// Bridge errors.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The bridge has not been opened.
    #[error("Bridge is not open")]
    NotOpen,

    /// The broker already handed out its channel.
    #[error("Broker channel already attached")]
    AlreadyAttached,

    /// A command could not be posted.
    #[error("Post failed: {0}")]
    Post(#[from] OutboxError),

    /// Protocol error.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Sending half of a broker channel.
#[derive(Debug, Clone)]
pub struct BrokerPort {
    tx: mpsc::UnboundedSender<Command>,
}

impl BrokerPort {
    /// Wrap a command sender.
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<Command>) -> Self {
        Self { tx }
    }

    /// Whether the broker still accepts commands.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }
}

impl CommandSink for BrokerPort {
    fn post(&self, command: Command) -> Result<(), OutboxError> {
        trace!(command = command.name(), "Posting command");
        self.tx.send(command).map_err(|_| OutboxError::Closed)
    }
}

/// A channel pair handed out by a broker.
#[derive(Debug)]
pub struct BrokerChannel {
    /// Where commands are posted.
    pub port: BrokerPort,
    /// Where inbound events arrive, in delivery order.
    pub events: mpsc::UnboundedReceiver<InboundEvent>,
}

impl BrokerChannel {
    /// Create a channel from its halves.
    #[must_use]
    pub fn new(
        commands: mpsc::UnboundedSender<Command>,
        events: mpsc::UnboundedReceiver<InboundEvent>,
    ) -> Self {
        Self {
            port: BrokerPort::new(commands),
            events,
        }
    }
}

/// A broker a client context can attach to.
///
/// Brokers own the real network connection, reconnect it, and fan server
/// events out to every attached context.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Attach this client context and get its channel pair.
    async fn attach(&self) -> Result<BrokerChannel, BridgeError>;

    /// Get the broker name (e.g., "local", "stream").
    fn name(&self) -> &'static str;
}
