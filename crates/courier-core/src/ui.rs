//! The surface the dispatcher paints on.
//!
//! Element lookups can miss (a peer without a rendered row, an indicator
//! that was detached when the conversation changed). Methods that target a
//! specific element report whether it existed; callers treat a miss as a
//! silent no-op.

use courier_protocol::{Member, Message, UserId};
use serde_json::Value;
use std::collections::HashMap;
use tracing::trace;

use crate::typing::Opacity;

/// UI collaborator driven by the dispatcher.
pub trait UiSurface {
    /// Replace the roster with an annotated member list.
    fn render_roster(&mut self, members: &[Member]);

    /// Hide the unread indicator on `peer`'s roster row.
    ///
    /// Returns `false` if no such indicator exists.
    fn hide_unread(&mut self, peer: UserId) -> bool;

    /// Set the "is typing" attribute on `peer`'s roster row.
    ///
    /// Returns `false` if no such row exists.
    fn set_typing_attr(&mut self, peer: UserId, is_typing: bool) -> bool;

    /// Apply an opacity to `peer`'s typing indicator.
    ///
    /// Returns `false` if no such indicator exists.
    fn paint_typing(&mut self, peer: UserId, opacity: Opacity) -> bool;

    /// Show a transient notice to the user.
    fn notice(&mut self, text: &str);

    /// Append a message to the visible conversation.
    fn append_message(&mut self, message: &Message, outgoing: bool, incoming: bool);
}

/// A rendered roster row.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterRow {
    /// The annotated member.
    pub member: Member,
    /// Whether the unread indicator is shown.
    pub unread_visible: bool,
    /// Value of the row's typing attribute.
    pub typing: bool,
}

/// A message appended to the conversation view.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendedMessage {
    pub message: Message,
    pub outgoing: bool,
    pub incoming: bool,
}

/// In-memory UI model with no display attached.
///
/// Keeps the same element structure a rendered page would: one row per
/// roster member, and a typing indicator only for the open conversation.
#[derive(Debug, Default)]
pub struct HeadlessUi {
    rows: Vec<RosterRow>,
    indicators: HashMap<UserId, Opacity>,
    conversation: Vec<AppendedMessage>,
    notices: Vec<String>,
}

impl HeadlessUi {
    /// Create an empty surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the conversation with `peer`, detaching the previous one.
    pub fn open_conversation(&mut self, peer: UserId) {
        self.indicators.clear();
        self.indicators.insert(peer, Opacity::Hidden);
        self.conversation.clear();
    }

    /// Rendered roster rows.
    #[must_use]
    pub fn rows(&self) -> &[RosterRow] {
        &self.rows
    }

    /// Row for `peer`, if rendered.
    #[must_use]
    pub fn row(&self, peer: UserId) -> Option<&RosterRow> {
        self.rows.iter().find(|r| r.member.id == peer)
    }

    /// Opacity of `peer`'s typing indicator, if attached.
    #[must_use]
    pub fn indicator(&self, peer: UserId) -> Option<Opacity> {
        self.indicators.get(&peer).copied()
    }

    /// Messages appended since the conversation was opened.
    #[must_use]
    pub fn conversation(&self) -> &[AppendedMessage] {
        &self.conversation
    }

    /// Notices shown so far.
    #[must_use]
    pub fn notices(&self) -> &[String] {
        &self.notices
    }
}

/// Display fields that may carry a member's unread state.
const UNREAD_FIELDS: [&str; 3] = ["unread", "unread_count", "unreadCount"];

/// Unread state carried in the member's display fields, if any.
///
/// A count shows the indicator when nonzero; a boolean is taken as is.
fn unread_hint(member: &Member) -> Option<bool> {
    UNREAD_FIELDS
        .iter()
        .filter_map(|key| member.profile.get(*key))
        .find_map(|value| match value {
            Value::Bool(flag) => Some(*flag),
            Value::Number(n) => Some(n.as_f64().is_some_and(|n| n > 0.0)),
            _ => None,
        })
}

impl UiSurface for HeadlessUi {
    fn render_roster(&mut self, members: &[Member]) {
        // Without server data a row keeps the unread state it already had
        let previous: HashMap<UserId, bool> = self
            .rows
            .iter()
            .map(|row| (row.member.id, row.unread_visible))
            .collect();

        self.rows = members
            .iter()
            .map(|member| RosterRow {
                member: member.clone(),
                unread_visible: unread_hint(member)
                    .or_else(|| previous.get(&member.id).copied())
                    .unwrap_or(true),
                typing: false,
            })
            .collect();
    }

    fn hide_unread(&mut self, peer: UserId) -> bool {
        match self.rows.iter_mut().find(|r| r.member.id == peer) {
            Some(row) => {
                row.unread_visible = false;
                true
            }
            None => false,
        }
    }

    fn set_typing_attr(&mut self, peer: UserId, is_typing: bool) -> bool {
        match self.rows.iter_mut().find(|r| r.member.id == peer) {
            Some(row) => {
                row.typing = is_typing;
                true
            }
            None => false,
        }
    }

    fn paint_typing(&mut self, peer: UserId, opacity: Opacity) -> bool {
        match self.indicators.get_mut(&peer) {
            Some(current) => {
                *current = opacity;
                true
            }
            None => {
                trace!(peer = %peer, "No typing indicator attached");
                false
            }
        }
    }

    fn notice(&mut self, text: &str) {
        self.notices.push(text.to_string());
    }

    fn append_message(&mut self, message: &Message, outgoing: bool, incoming: bool) {
        self.conversation.push(AppendedMessage {
            message: message.clone(),
            outgoing,
            incoming,
        });
    }
}
