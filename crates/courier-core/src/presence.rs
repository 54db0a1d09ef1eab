//! Presence merging for the roster.
//!
//! The server sends the roster and the online-id list separately; the
//! roster's own `status` field is never authoritative and is recomputed
//! here on every presence event.

use courier_protocol::{Member, PresenceStatus, RosterSnapshot, UserId};
use std::collections::HashSet;
use tracing::debug;

/// Annotate each member with its connectivity status.
///
/// Output has the same length and order as `members`; a member is online
/// iff its id appears in `online`.
#[must_use]
pub fn merge_presence(members: Vec<Member>, online: &[UserId]) -> Vec<Member> {
    let online: HashSet<UserId> = online.iter().copied().collect();

    members
        .into_iter()
        .map(|mut member| {
            member.status = if online.contains(&member.id) {
                PresenceStatus::Online
            } else {
                PresenceStatus::Offline
            };
            member
        })
        .collect()
}

/// A roster whose statuses have been merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    members: Vec<Member>,
}

impl Roster {
    /// Merge a server snapshot into a roster.
    #[must_use]
    pub fn merge(snapshot: RosterSnapshot) -> Self {
        let members = merge_presence(snapshot.members, &snapshot.online);
        let roster = Self { members };
        debug!(
            members = roster.len(),
            online = roster.online_count(),
            "Presence merged"
        );
        roster
    }

    /// Members in server order.
    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Get a member by id.
    #[must_use]
    pub fn get(&self, id: UserId) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    /// Number of online members.
    #[must_use]
    pub fn online_count(&self) -> usize {
        self.members.iter().filter(|m| m.status.is_online()).count()
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Take the merged members.
    #[must_use]
    pub fn into_members(self) -> Vec<Member> {
        self.members
    }
}
