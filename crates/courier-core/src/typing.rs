//! Typing indicator debouncing.
//!
//! Each typing signal from the active peer records a target opacity and
//! (re)schedules a single trailing paint. When the paint comes due it
//! applies whatever target is recorded at that moment, so a burst of
//! start/stop signals collapses into one paint of the last state.
//!
//! The debouncer only decides *when* and *what* to paint; performing the
//! paint is left to [`crate::UiSurface::paint_typing`].

use courier_protocol::UserId;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Default delay between the last typing signal and the paint.
pub const DEFAULT_TYPING_DELAY: Duration = Duration::from_millis(300);

/// Opacity of the typing indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Opacity {
    /// Indicator hidden (opacity 0).
    #[default]
    Hidden,
    /// Indicator shown (opacity 1).
    Visible,
}

impl Opacity {
    /// Opacity matching a typing flag.
    #[must_use]
    pub fn for_typing(is_typing: bool) -> Self {
        if is_typing {
            Opacity::Visible
        } else {
            Opacity::Hidden
        }
    }

    /// CSS value of this opacity.
    #[must_use]
    pub fn as_css(self) -> &'static str {
        match self {
            Opacity::Hidden => "0",
            Opacity::Visible => "1",
        }
    }
}

/// Whether the indicator is currently painted as shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingState {
    Idle,
    Active,
}

/// A paint that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paint {
    /// Peer whose indicator is painted.
    pub peer: UserId,
    /// Opacity to apply.
    pub opacity: Opacity,
}

#[derive(Debug, Clone, Copy)]
struct PendingPaint {
    peer: UserId,
    due: Instant,
}

/// Trailing-edge debouncer for the typing indicator.
#[derive(Debug, Clone)]
pub struct TypingDebouncer {
    delay: Duration,
    target: Opacity,
    painted: Opacity,
    pending: Option<PendingPaint>,
}

impl Default for TypingDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_TYPING_DELAY)
    }
}

impl TypingDebouncer {
    /// Create a debouncer with the given paint delay.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            target: Opacity::Hidden,
            painted: Opacity::Hidden,
            pending: None,
        }
    }

    /// Paint delay.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a typing signal and reschedule the paint.
    ///
    /// Any pending paint is replaced, never accumulated. Returns the
    /// instant the new paint is due.
    pub fn signal(&mut self, peer: UserId, is_typing: bool, now: Instant) -> Instant {
        if let Some(prev) = self.pending.take() {
            trace!(peer = %prev.peer, "Typing paint rescheduled");
        }

        self.target = Opacity::for_typing(is_typing);
        let due = now + self.delay;
        self.pending = Some(PendingPaint { peer, due });
        due
    }

    /// Instant of the pending paint, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.due)
    }

    /// Peer targeted by the pending paint, if any.
    #[must_use]
    pub fn pending_peer(&self) -> Option<UserId> {
        self.pending.map(|p| p.peer)
    }

    /// Opacity the next paint will apply.
    #[must_use]
    pub fn target(&self) -> Opacity {
        self.target
    }

    /// Current state, as last painted.
    #[must_use]
    pub fn state(&self) -> TypingState {
        match self.painted {
            Opacity::Hidden => TypingState::Idle,
            Opacity::Visible => TypingState::Active,
        }
    }

    /// Take the pending paint if it is due at `now`.
    ///
    /// The paint carries the target recorded at firing time.
    pub fn poll(&mut self, now: Instant) -> Option<Paint> {
        let pending = self.pending?;
        if pending.due > now {
            return None;
        }

        self.pending = None;
        self.painted = self.target;
        Some(Paint {
            peer: pending.peer,
            opacity: self.target,
        })
    }

    /// Drop the pending paint without firing it.
    ///
    /// Returns `true` if a paint was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }
}
