//! In-process broker.
//!
//! The other end of the channel is a [`BrokerHandle`] held by whoever plays
//! the broker role: an embedding application, or a test.

use async_trait::async_trait;
use courier_protocol::{Command, InboundEvent};
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::traits::{BridgeError, Broker, BrokerChannel};

/// A broker living in the same process as the client.
pub struct LocalBroker {
    channel: Mutex<Option<BrokerChannel>>,
}

/// The broker side of a [`LocalBroker`] channel.
#[derive(Debug)]
pub struct BrokerHandle {
    events: mpsc::UnboundedSender<InboundEvent>,
    commands: mpsc::UnboundedReceiver<Command>,
}

impl LocalBroker {
    /// Create a broker and the handle that drives it.
    #[must_use]
    pub fn new() -> (Self, BrokerHandle) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let broker = Self {
            channel: Mutex::new(Some(BrokerChannel::new(command_tx, event_rx))),
        };
        let handle = BrokerHandle {
            events: event_tx,
            commands: command_rx,
        };
        (broker, handle)
    }
}

#[async_trait]
impl Broker for LocalBroker {
    async fn attach(&self) -> Result<BrokerChannel, BridgeError> {
        let channel = self
            .channel
            .lock()
            .await
            .take()
            .ok_or(BridgeError::AlreadyAttached)?;
        debug!("Local broker attached");
        Ok(channel)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

impl BrokerHandle {
    /// Deliver an event to the client.
    ///
    /// Returns `false` if the client dropped its receiver.
    pub fn deliver(&self, event: InboundEvent) -> bool {
        self.events.send(event).is_ok()
    }

    /// Wait for the next command from the client.
    pub async fn next_command(&mut self) -> Option<Command> {
        self.commands.recv().await
    }

    /// Take every command posted so far.
    pub fn drain_commands(&mut self) -> Vec<Command> {
        let mut commands = Vec::new();
        while let Ok(command) = self.commands.try_recv() {
            commands.push(command);
        }
        commands
    }

    /// Stop delivering events; the client's run loop ends once drained.
    pub fn hang_up(self) -> mpsc::UnboundedReceiver<Command> {
        self.commands
    }
}
