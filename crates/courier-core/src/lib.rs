//! # courier-core
//!
//! Event dispatch and UI state reconciliation for a Courier client context.
//!
//! This crate provides the pieces that sit between the broker channel and
//! the user interface:
//!
//! - **Presence** - annotate a roster with online/offline status
//! - **Typing** - debounce the "is typing" indicator with a trailing paint
//! - **Dispatcher** - classify inbound events and apply their effects
//! - **Outbox** - frame client actions as broker commands
//! - **Ui** - the surface the dispatcher paints on
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Broker    │────▶│ Dispatcher  │────▶│ UiSurface   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        ▲               │        │
//!        │               ▼        ▼
//! ┌─────────────┐  ┌──────────┐ ┌──────────┐
//! │   Outbox    │◀─│ Presence │ │  Typing  │
//! └─────────────┘  └──────────┘ └──────────┘
//! ```

pub mod dispatcher;
pub mod outbox;
pub mod presence;
pub mod session;
pub mod typing;
pub mod ui;

pub use dispatcher::{DispatchStats, Dispatcher, SEND_FAILED_NOTICE};
pub use outbox::{CommandSink, Outbox, OutboxError};
pub use presence::{merge_presence, Roster};
pub use session::Session;
pub use typing::{Opacity, Paint, TypingDebouncer, TypingState, DEFAULT_TYPING_DELAY};
pub use ui::{HeadlessUi, UiSurface};
