//! Per-client-context state the dispatcher reads and updates.
//!
//! The composition root owns the session and passes it to the dispatcher
//! on every call, so tests can build one directly.

use courier_protocol::UserId;
use std::time::Duration;
use tracing::debug;

use crate::typing::TypingDebouncer;

/// Active conversation and typing state of one client context.
#[derive(Debug, Clone, Default)]
pub struct Session {
    active_peer: Option<UserId>,
    typing: TypingDebouncer,
}

impl Session {
    /// Create a session with the given typing paint delay.
    #[must_use]
    pub fn new(typing_delay: Duration) -> Self {
        Self {
            active_peer: None,
            typing: TypingDebouncer::new(typing_delay),
        }
    }

    /// Peer of the conversation currently displayed.
    #[must_use]
    pub fn active_peer(&self) -> Option<UserId> {
        self.active_peer
    }

    /// Whether `peer` is the conversation currently displayed.
    #[must_use]
    pub fn is_active(&self, peer: UserId) -> bool {
        self.active_peer == Some(peer)
    }

    /// Switch the displayed conversation to `peer`.
    ///
    /// A pending typing paint for the previous peer is cancelled so it
    /// never lands on a detached indicator.
    pub fn open_conversation(&mut self, peer: UserId) {
        if self.active_peer == Some(peer) {
            return;
        }
        self.switch(Some(peer));
    }

    /// Leave the displayed conversation.
    pub fn close_conversation(&mut self) {
        if self.active_peer.is_some() {
            self.switch(None);
        }
    }

    /// Typing debouncer for the active peer.
    #[must_use]
    pub fn typing(&self) -> &TypingDebouncer {
        &self.typing
    }

    /// Mutable typing debouncer for the active peer.
    pub fn typing_mut(&mut self) -> &mut TypingDebouncer {
        &mut self.typing
    }

    fn switch(&mut self, peer: Option<UserId>) {
        if self.typing.cancel() {
            debug!(from = ?self.active_peer, to = ?peer, "Cancelled pending typing paint");
        }
        self.active_peer = peer;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn test_switch_cancels_pending_paint() {
        let mut session = Session::default();
        session.open_conversation(UserId(7));

        let now = Instant::now();
        session.typing_mut().signal(UserId(7), true, now);
        assert!(session.typing().deadline().is_some());

        session.open_conversation(UserId(8));
        assert!(session.typing().deadline().is_none());
        assert!(session.is_active(UserId(8)));
    }

    #[test]
    fn test_reopening_same_peer_keeps_paint() {
        let mut session = Session::default();
        session.open_conversation(UserId(7));
        session
            .typing_mut()
            .signal(UserId(7), true, Instant::now());

        session.open_conversation(UserId(7));
        assert_eq!(session.typing().pending_peer(), Some(UserId(7)));

        session.close_conversation();
        assert!(session.typing().pending_peer().is_none());
        assert_eq!(session.active_peer(), None);
    }
}
