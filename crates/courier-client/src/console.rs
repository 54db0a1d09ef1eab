//! Console surface.
//!
//! Keeps the page model in a [`HeadlessUi`] and reports every visible
//! change through `tracing`, so a terminal shows what a rendered page would.

use courier_core::{HeadlessUi, Opacity, UiSurface};
use courier_protocol::{Member, Message, UserId};
use tracing::{debug, info, warn};

/// A [`UiSurface`] that logs what it paints.
#[derive(Debug, Default)]
pub struct ConsoleUi {
    page: HeadlessUi,
}

impl ConsoleUi {
    /// Create an empty console surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the conversation with `peer`.
    pub fn open_conversation(&mut self, peer: UserId) {
        info!(peer = %peer, "Conversation opened");
        self.page.open_conversation(peer);
    }

    /// The underlying page model.
    #[must_use]
    pub fn page(&self) -> &HeadlessUi {
        &self.page
    }
}

/// Best-effort display label for a member.
fn label(member: &Member) -> String {
    ["username", "name", "nickname"]
        .iter()
        .find_map(|key| member.profile.get(*key).and_then(|v| v.as_str()))
        .map_or_else(|| member.id.to_string(), str::to_owned)
}

impl UiSurface for ConsoleUi {
    fn render_roster(&mut self, members: &[Member]) {
        let online = members.iter().filter(|m| m.status.is_online()).count();
        info!(members = members.len(), online, "Roster updated");
        for member in members {
            debug!(peer = %member.id, name = %label(member), status = %member.status, "Roster row");
        }
        self.page.render_roster(members);
    }

    fn hide_unread(&mut self, peer: UserId) -> bool {
        let found = self.page.hide_unread(peer);
        if found {
            debug!(peer = %peer, "Unread indicator hidden");
        }
        found
    }

    fn set_typing_attr(&mut self, peer: UserId, is_typing: bool) -> bool {
        self.page.set_typing_attr(peer, is_typing)
    }

    fn paint_typing(&mut self, peer: UserId, opacity: Opacity) -> bool {
        let found = self.page.paint_typing(peer, opacity);
        if found {
            match opacity {
                Opacity::Visible => info!(peer = %peer, "Peer is typing"),
                Opacity::Hidden => info!(peer = %peer, "Peer stopped typing"),
            }
        }
        found
    }

    fn notice(&mut self, text: &str) {
        warn!("{}", text);
        self.page.notice(text);
    }

    fn append_message(&mut self, message: &Message, outgoing: bool, incoming: bool) {
        info!(
            from = %message.sender_id,
            to = %message.receiver_id,
            "{}",
            message.content
        );
        self.page.append_message(message, outgoing, incoming);
    }
}
