//! # courier-bridge
//!
//! Connection bridge between a Courier client context and the broker that
//! owns the shared network connection.
//!
//! The bridge is the only component that talks to the broker: it posts
//! commands through a [`BrokerPort`] and feeds every inbound event to the
//! [`courier_core::Dispatcher`].
//!
//! - **LocalBroker** - in-process broker, for embedding and tests
//! - **StreamBroker** - line-delimited JSON over any byte stream
//!
//! ```rust,ignore
//! use courier_bridge::{Bridge, StreamBroker};
//! use courier_core::{Dispatcher, HeadlessUi, Session};
//!
//! let mut bridge = Bridge::new(StreamBroker::stdio());
//! bridge.open().await?;
//! bridge.outbox().get_users()?;
//! bridge.run(&mut Dispatcher::new(HeadlessUi::new()), &mut Session::default()).await?;
//! ```

pub mod bridge;
pub mod local;
pub mod stream;
pub mod traits;

pub use bridge::{Bridge, Step};
pub use local::{BrokerHandle, LocalBroker};
pub use stream::StreamBroker;
pub use traits::{BridgeError, Broker, BrokerChannel, BrokerPort};
