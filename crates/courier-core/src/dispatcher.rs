//! Inbound event dispatch.
//!
//! The dispatcher classifies each event from the broker and applies its
//! effects to the UI, the session and the outbox. Dispatch is synchronous:
//! every effect of an event, including the `pong` for a `ping`, happens
//! before [`Dispatcher::dispatch`] returns.

use courier_protocol::{EventKind, InboundEvent, Message, RosterSnapshot, UserId};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::outbox::{CommandSink, Outbox};
use crate::presence::Roster;
use crate::session::Session;
use crate::typing::Paint;
use crate::ui::UiSurface;

/// Notice shown when the server reports a failed send.
pub const SEND_FAILED_NOTICE: &str = "message was not sent, try again!";

/// Dispatcher statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Events dispatched, including ignored ones.
    pub events: u64,
    /// Events with an unrecognized type.
    pub ignored: u64,
    /// Pongs posted.
    pub pongs: u64,
    /// Read receipts issued.
    pub receipts: u64,
    /// Typing paints applied.
    pub paints: u64,
}

/// Routes inbound events to their effects.
pub struct Dispatcher<U> {
    ui: U,
    stats: DispatchStats,
}

impl<U: UiSurface> Dispatcher<U> {
    /// Create a dispatcher painting on `ui`.
    #[must_use]
    pub fn new(ui: U) -> Self {
        Self {
            ui,
            stats: DispatchStats::default(),
        }
    }

    /// Get the UI surface.
    #[must_use]
    pub fn ui(&self) -> &U {
        &self.ui
    }

    /// Get the UI surface mutably.
    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    /// Take back the UI surface.
    #[must_use]
    pub fn into_ui(self) -> U {
        self.ui
    }

    /// Get dispatcher statistics.
    #[must_use]
    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Handle one inbound event.
    ///
    /// Returns the event's classification. Never fails: missing UI targets
    /// and commands the broker could not take are logged and skipped.
    pub fn dispatch<S: CommandSink + ?Sized>(
        &mut self,
        session: &mut Session,
        sink: &S,
        event: InboundEvent,
        now: Instant,
    ) -> EventKind {
        let kind = event.kind();
        self.stats.events += 1;
        trace!(kind = %kind, "Dispatching event");

        match event {
            InboundEvent::Users(snapshot) | InboundEvent::StatusUpdate(snapshot) => {
                self.render_presence(snapshot);
            }

            InboundEvent::Read { message } => {
                if !self.ui.hide_unread(message.receiver_id) {
                    trace!(peer = %message.receiver_id, "No unread indicator to hide");
                }
            }

            InboundEvent::Error => {
                self.ui.notice(SEND_FAILED_NOTICE);
            }

            InboundEvent::Ping => match Outbox::new(sink).pong() {
                Ok(()) => self.stats.pongs += 1,
                Err(e) => warn!(error = %e, "Failed to answer ping"),
            },

            InboundEvent::Typing { message, is_typing } => {
                let sender = message.sender_id;
                self.ui.set_typing_attr(sender, is_typing);

                if session.is_active(sender) {
                    let due = session.typing_mut().signal(sender, is_typing, now);
                    trace!(peer = %sender, is_typing, ?due, "Typing paint scheduled");
                }
            }

            InboundEvent::NewMessage { message, roster } => {
                if let Some(snapshot) = roster {
                    self.render_presence(snapshot);
                }
                self.route_message(session, sink, &message);
            }

            InboundEvent::Ignored { kind } => {
                self.stats.ignored += 1;
                trace!(kind = %kind, "Ignoring unknown event type");
            }
        }

        kind
    }

    /// Apply the pending typing paint if it is due at `now`.
    pub fn fire_due(&mut self, session: &mut Session, now: Instant) -> Option<Paint> {
        let paint = session.typing_mut().poll(now)?;
        self.stats.paints += 1;

        if !self.ui.paint_typing(paint.peer, paint.opacity) {
            trace!(peer = %paint.peer, "Typing indicator missing at paint time");
        }
        Some(paint)
    }

    fn render_presence(&mut self, snapshot: RosterSnapshot) {
        let roster = Roster::merge(snapshot);
        self.ui.render_roster(roster.members());
    }

    fn route_message<S: CommandSink + ?Sized>(
        &mut self,
        session: &Session,
        sink: &S,
        message: &Message,
    ) {
        let Some(active) = session.active_peer() else {
            return;
        };
        if !message.involves(active) {
            return;
        }

        self.ui.append_message(message, false, true);

        if message.sender_id == active {
            self.issue_receipt(sink, message.sender_id);
        }
    }

    fn issue_receipt<S: CommandSink + ?Sized>(&mut self, sink: &S, peer: UserId) {
        match Outbox::new(sink).mark_read(peer) {
            Ok(()) => {
                self.stats.receipts += 1;
                debug!(peer = %peer, "Read receipt issued");
            }
            Err(e) => warn!(peer = %peer, error = %e, "Failed to issue read receipt"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbox::tests::RecordingSink;
    use crate::typing::Opacity;
    use crate::ui::HeadlessUi;
    use courier_protocol::{ClientPayload, Command, Member, PresenceStatus};
    use std::time::Duration;

    const ME: UserId = UserId(1);
    const PEER: UserId = UserId(7);

    struct Harness {
        dispatcher: Dispatcher<HeadlessUi>,
        session: Session,
        sink: RecordingSink,
        start: Instant,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                dispatcher: Dispatcher::new(HeadlessUi::new()),
                session: Session::default(),
                sink: RecordingSink::default(),
                start: Instant::now(),
            }
        }

        fn with_active(peer: UserId) -> Self {
            let mut h = Self::new();
            h.session.open_conversation(peer);
            h.dispatcher.ui_mut().open_conversation(peer);
            h
        }

        fn at(&self, ms: u64) -> Instant {
            self.start + Duration::from_millis(ms)
        }

        fn dispatch_at(&mut self, ms: u64, event: InboundEvent) -> EventKind {
            let now = self.at(ms);
            self.dispatcher.dispatch(&mut self.session, &self.sink, event, now)
        }

        fn dispatch(&mut self, event: InboundEvent) -> EventKind {
            self.dispatch_at(0, event)
        }

        fn fire_at(&mut self, ms: u64) -> Option<Paint> {
            let now = self.at(ms);
            self.dispatcher.fire_due(&mut self.session, now)
        }
    }

    fn roster(ids: &[i64], online: &[i64]) -> RosterSnapshot {
        RosterSnapshot::new(
            ids.iter().map(|id| Member::new(UserId(*id))).collect(),
            online.iter().map(|id| UserId(*id)).collect(),
        )
    }

    fn receipt_commands(peer: UserId) -> Vec<Command> {
        vec![
            Command::send(ClientPayload::read(peer)),
            Command::Read {
                payload: ClientPayload::read(peer),
            },
        ]
    }

    #[test]
    fn test_users_renders_merged_roster() {
        let mut h = Harness::new();
        let kind = h.dispatch(InboundEvent::Users(roster(&[3, 1, 2], &[2])));

        assert_eq!(kind, EventKind::Users);
        let rows = h.dispatcher.ui().rows();
        let statuses: Vec<_> = rows
            .iter()
            .map(|r| (r.member.id.get(), r.member.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                (3, PresenceStatus::Offline),
                (1, PresenceStatus::Offline),
                (2, PresenceStatus::Online),
            ]
        );
    }

    #[test]
    fn test_status_update_re_merges() {
        let mut h = Harness::new();
        h.dispatch(InboundEvent::Users(roster(&[1, 2], &[2])));
        h.dispatch(InboundEvent::StatusUpdate(roster(&[1, 2], &[1])));

        let ui = h.dispatcher.ui();
        assert!(ui.row(UserId(1)).unwrap().member.status.is_online());
        assert!(!ui.row(UserId(2)).unwrap().member.status.is_online());
    }

    #[test]
    fn test_ping_posts_exactly_one_pong() {
        let mut h = Harness::new();
        assert_eq!(h.dispatch(InboundEvent::Ping), EventKind::Ping);

        assert_eq!(h.sink.take(), vec![Command::Pong]);
        assert_eq!(h.dispatcher.stats().pongs, 1);
    }

    #[test]
    fn test_read_hides_only_that_peer() {
        let mut h = Harness::new();
        h.dispatch(InboundEvent::Users(roster(&[2, 3], &[])));
        h.dispatch(InboundEvent::read(UserId(3)));

        let ui = h.dispatcher.ui();
        assert!(ui.row(UserId(2)).unwrap().unread_visible);
        assert!(!ui.row(UserId(3)).unwrap().unread_visible);
    }

    #[test]
    fn test_read_without_indicator_is_noop() {
        let mut h = Harness::new();
        assert_eq!(h.dispatch(InboundEvent::read(UserId(42))), EventKind::Read);
        assert!(h.dispatcher.ui().rows().is_empty());
        assert!(h.sink.take().is_empty());
    }

    #[test]
    fn test_error_shows_notice_without_retry() {
        let mut h = Harness::new();
        h.dispatch(InboundEvent::Error);

        assert_eq!(h.dispatcher.ui().notices(), [SEND_FAILED_NOTICE]);
        assert!(h.sink.take().is_empty());
    }

    #[test]
    fn test_message_from_active_peer_is_appended_and_read() {
        let mut h = Harness::with_active(PEER);
        h.dispatch(InboundEvent::new_message(Message::new(PEER, ME, "hi")));

        let conversation = h.dispatcher.ui().conversation();
        assert_eq!(conversation.len(), 1);
        assert!(!conversation[0].outgoing);
        assert!(conversation[0].incoming);
        assert_eq!(h.sink.take(), receipt_commands(PEER));
        assert_eq!(h.dispatcher.stats().receipts, 1);
    }

    #[test]
    fn test_message_to_active_peer_is_appended_without_receipt() {
        let mut h = Harness::with_active(PEER);
        h.dispatch(InboundEvent::new_message(Message::new(ME, PEER, "echo")));

        assert_eq!(h.dispatcher.ui().conversation().len(), 1);
        assert!(h.sink.take().is_empty());
    }

    #[test]
    fn test_message_from_other_peer_is_not_appended() {
        let mut h = Harness::with_active(PEER);
        h.dispatch(InboundEvent::new_message(Message::new(UserId(9), ME, "psst")));

        assert!(h.dispatcher.ui().conversation().is_empty());
        assert!(h.sink.take().is_empty());
    }

    #[test]
    fn test_message_without_open_conversation() {
        let mut h = Harness::new();
        h.dispatch(InboundEvent::new_message(Message::new(PEER, ME, "hi")));

        assert!(h.dispatcher.ui().conversation().is_empty());
        assert!(h.sink.take().is_empty());
    }

    #[test]
    fn test_message_with_roster_re_renders() {
        let mut h = Harness::with_active(PEER);
        h.dispatch(InboundEvent::NewMessage {
            message: Message::new(PEER, ME, "hi"),
            roster: Some(roster(&[7, 9], &[7])),
        });

        let ui = h.dispatcher.ui();
        assert_eq!(ui.rows().len(), 2);
        assert!(ui.row(PEER).unwrap().member.status.is_online());
    }

    #[test]
    fn test_message_without_roster_keeps_rows() {
        let mut h = Harness::with_active(PEER);
        h.dispatch(InboundEvent::Users(roster(&[7, 9], &[])));
        h.dispatch(InboundEvent::new_message(Message::new(PEER, ME, "hi")));

        assert_eq!(h.dispatcher.ui().rows().len(), 2);
    }

    #[test]
    fn test_typing_start_then_stop_paints_once() {
        let mut h = Harness::with_active(PEER);
        h.dispatch_at(0, InboundEvent::typing(PEER, ME, true));
        h.dispatch_at(50, InboundEvent::typing(PEER, ME, false));

        assert!(h.fire_at(300).is_none());
        assert_eq!(
            h.fire_at(350),
            Some(Paint {
                peer: PEER,
                opacity: Opacity::Hidden
            })
        );
        assert!(h.fire_at(1000).is_none());
        assert_eq!(h.dispatcher.stats().paints, 1);
        assert_eq!(h.dispatcher.ui().indicator(PEER), Some(Opacity::Hidden));
    }

    #[test]
    fn test_typing_shows_indicator_within_delay() {
        let mut h = Harness::with_active(PEER);
        h.dispatch_at(0, InboundEvent::typing(PEER, ME, true));

        assert!(h.fire_at(300).is_some());
        assert_eq!(h.dispatcher.ui().indicator(PEER), Some(Opacity::Visible));
    }

    #[test]
    fn test_typing_from_other_peer_only_sets_row_attribute() {
        let mut h = Harness::with_active(PEER);
        h.dispatch(InboundEvent::Users(roster(&[7, 9], &[7, 9])));
        h.dispatch(InboundEvent::typing(UserId(9), ME, true));

        assert!(h.dispatcher.ui().row(UserId(9)).unwrap().typing);
        assert!(h.session.typing().deadline().is_none());
        assert!(h.fire_at(1000).is_none());
    }

    #[test]
    fn test_peer_switch_drops_stale_paint() {
        let mut h = Harness::with_active(PEER);
        h.dispatch_at(0, InboundEvent::typing(PEER, ME, true));

        h.session.open_conversation(UserId(9));
        h.dispatcher.ui_mut().open_conversation(UserId(9));

        assert!(h.fire_at(300).is_none());
        assert_eq!(h.dispatcher.ui().indicator(PEER), None);
        assert_eq!(h.dispatcher.ui().indicator(UserId(9)), Some(Opacity::Hidden));
    }

    #[test]
    fn test_unknown_event_is_ignored() {
        let mut h = Harness::with_active(PEER);
        let kind = h.dispatch(InboundEvent::Ignored {
            kind: "reaction".to_string(),
        });

        assert_eq!(kind, EventKind::Ignored);
        assert_eq!(h.dispatcher.stats().ignored, 1);
        assert!(h.sink.take().is_empty());
        assert!(h.dispatcher.ui().conversation().is_empty());
    }

    #[test]
    fn test_failed_pong_is_not_fatal() {
        let mut dispatcher = Dispatcher::new(HeadlessUi::new());
        let mut session = Session::default();
        let unopened: Option<RecordingSink> = None;

        let kind =
            dispatcher.dispatch(&mut session, &unopened, InboundEvent::Ping, Instant::now());
        assert_eq!(kind, EventKind::Ping);
        assert_eq!(dispatcher.stats().pongs, 0);
    }
}
