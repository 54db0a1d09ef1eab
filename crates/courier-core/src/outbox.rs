//! Outbound command framing.
//!
//! Every client action is fire-and-forget: success or failure comes back
//! later as an inbound `new_message`, `users` or `error` event.

use courier_protocol::{ClientPayload, Command, Message, UserId};
use thiserror::Error;
use tracing::trace;

/// Outbox errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutboxError {
    /// The bridge has not been opened.
    #[error("Bridge is not open")]
    NotOpen,

    /// The broker dropped its end of the channel.
    #[error("Broker channel closed")]
    Closed,
}

/// Something commands can be posted to.
pub trait CommandSink {
    /// Post a command without waiting for any acknowledgement.
    fn post(&self, command: Command) -> Result<(), OutboxError>;
}

impl<T: CommandSink + ?Sized> CommandSink for &T {
    fn post(&self, command: Command) -> Result<(), OutboxError> {
        (**self).post(command)
    }
}

impl<T: CommandSink> CommandSink for Option<T> {
    fn post(&self, command: Command) -> Result<(), OutboxError> {
        match self {
            Some(sink) => sink.post(command),
            None => Err(OutboxError::NotOpen),
        }
    }
}

/// Frames client actions as broker commands.
pub struct Outbox<'a, S: ?Sized> {
    sink: &'a S,
}

impl<'a, S: CommandSink + ?Sized> Outbox<'a, S> {
    /// Create an outbox posting to `sink`.
    #[must_use]
    pub fn new(sink: &'a S) -> Self {
        Self { sink }
    }

    /// Forward a payload to the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the command could not be handed to the broker.
    pub fn send_message(&self, payload: ClientPayload) -> Result<(), OutboxError> {
        self.sink.post(Command::send(payload))
    }

    /// Request the roster and online list from the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the command could not be handed to the broker.
    pub fn get_users(&self) -> Result<(), OutboxError> {
        self.send_message(ClientPayload::Users)
    }

    /// Acknowledge that the conversation with `receiver_id` was read.
    ///
    /// The receipt goes out twice: inside a `send` and as a dedicated `read`.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered; the second post is still attempted.
    pub fn mark_read(&self, receiver_id: UserId) -> Result<(), OutboxError> {
        trace!(peer = %receiver_id, "Marking conversation read");
        let via_send = self.send_message(ClientPayload::read(receiver_id));
        let via_read = self.sink.post(Command::Read {
            payload: ClientPayload::read(receiver_id),
        });
        via_send.and(via_read)
    }

    /// Answer a keepalive ping.
    ///
    /// # Errors
    ///
    /// Returns an error if the command could not be handed to the broker.
    pub fn pong(&self) -> Result<(), OutboxError> {
        self.sink.post(Command::Pong)
    }

    /// Tell `peer` that `from` started or stopped typing.
    ///
    /// # Errors
    ///
    /// Returns an error if the command could not be handed to the broker.
    pub fn send_typing(
        &self,
        from: UserId,
        peer: UserId,
        is_typing: bool,
    ) -> Result<(), OutboxError> {
        self.send_message(ClientPayload::typing(from, peer, is_typing))
    }

    /// Send a chat message from `from` to `peer`.
    ///
    /// # Errors
    ///
    /// Returns an error if the command could not be handed to the broker.
    pub fn send_chat(
        &self,
        from: UserId,
        peer: UserId,
        content: impl Into<String>,
    ) -> Result<(), OutboxError> {
        let message = Message::new(from, peer, content);
        self.send_message(ClientPayload::NewMessage { message })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Sink that keeps every posted command.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) commands: RefCell<Vec<Command>>,
    }

    impl RecordingSink {
        pub(crate) fn take(&self) -> Vec<Command> {
            self.commands.take()
        }
    }

    impl CommandSink for RecordingSink {
        fn post(&self, command: Command) -> Result<(), OutboxError> {
            self.commands.borrow_mut().push(command);
            Ok(())
        }
    }

    #[test]
    fn test_get_users() {
        let sink = RecordingSink::default();
        Outbox::new(&sink).get_users().unwrap();

        let commands = sink.take();
        assert_eq!(commands, vec![Command::send(ClientPayload::Users)]);
        assert_eq!(
            serde_json::to_value(&commands[0]).unwrap(),
            serde_json::json!({"type": "send", "payload": {"type": "users"}})
        );
    }

    #[test]
    fn test_mark_read_posts_both_channels() {
        let sink = RecordingSink::default();
        Outbox::new(&sink).mark_read(UserId(7)).unwrap();

        assert_eq!(
            sink.take(),
            vec![
                Command::send(ClientPayload::read(UserId(7))),
                Command::Read {
                    payload: ClientPayload::read(UserId(7))
                },
            ]
        );
    }

    #[test]
    fn test_send_typing_and_chat() {
        let sink = RecordingSink::default();
        let outbox = Outbox::new(&sink);
        outbox.send_typing(UserId(1), UserId(2), true).unwrap();
        outbox.send_chat(UserId(1), UserId(2), "hey").unwrap();

        let commands = sink.take();
        assert_eq!(
            commands[0],
            Command::send(ClientPayload::typing(UserId(1), UserId(2), true))
        );
        match &commands[1] {
            Command::Send {
                payload: ClientPayload::NewMessage { message },
            } => assert_eq!(message.content, "hey"),
            other => panic!("Expected chat message, got {:?}", other),
        }
    }

    #[test]
    fn test_unopened_sink() {
        let sink: Option<RecordingSink> = None;
        assert_eq!(Outbox::new(&sink).pong(), Err(OutboxError::NotOpen));
    }
}
