//! The connection bridge.
//!
//! One bridge per client context. It attaches to the broker on [`Bridge::open`],
//! posts every outbound command, and is the single reader of inbound events:
//! [`Bridge::next`] hands each event to the dispatcher in delivery order and
//! fires the typing paint when its deadline passes.

use courier_core::{CommandSink, DispatchStats, Dispatcher, Outbox, Paint, Session, UiSurface};
use courier_protocol::{Command, EventKind, InboundEvent};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::traits::{BridgeError, Broker, BrokerPort};

/// One unit of work done by the run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// An inbound event was dispatched.
    Event(EventKind),
    /// A typing paint came due and was applied.
    Paint(Paint),
}

/// Bridge between the dispatcher and a broker.
pub struct Bridge<B> {
    broker: B,
    port: Option<BrokerPort>,
    events: Option<mpsc::UnboundedReceiver<InboundEvent>>,
}

impl<B: Broker> Bridge<B> {
    /// Create a bridge for `broker`. Nothing is attached until [`Bridge::open`].
    #[must_use]
    pub fn new(broker: B) -> Self {
        Self {
            broker,
            port: None,
            events: None,
        }
    }

    /// Attach to the broker and announce this context with `connect`.
    ///
    /// Idempotent: a bridge that is already open stays as it is.
    ///
    /// # Errors
    ///
    /// Returns an error if the broker refuses the attach or the `connect`
    /// command cannot be posted.
    pub async fn open(&mut self) -> Result<(), BridgeError> {
        if self.port.is_some() {
            debug!(broker = self.broker.name(), "Bridge already open");
            return Ok(());
        }

        let channel = self.broker.attach().await?;
        channel.port.post(Command::Connect)?;

        self.port = Some(channel.port);
        self.events = Some(channel.events);

        info!(broker = self.broker.name(), "Bridge open");
        Ok(())
    }

    /// Detach from the broker with a `close` command.
    ///
    /// Does nothing if the bridge was never opened. Events the broker has
    /// already delivered are still drained by the run loop.
    ///
    /// Returns whether a `close` command reached the broker.
    pub fn close(&mut self) -> bool {
        let Some(port) = self.port.take() else {
            debug!("Close before open ignored");
            return false;
        };

        let posted = match port.post(Command::Close) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to post close");
                false
            }
        };
        info!(broker = self.broker.name(), "Bridge closed");
        posted
    }

    /// Whether the bridge can post commands.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    /// Outbound command sender for UI actions.
    #[must_use]
    pub fn outbox(&self) -> Outbox<'_, Option<BrokerPort>> {
        Outbox::new(&self.port)
    }

    /// Wait for and perform the next unit of work.
    ///
    /// Once the broker stops delivering events, a paint that is still
    /// pending fires at its deadline; after that this returns `None`. It
    /// also returns `None` if the bridge was never opened.
    pub async fn next<U: UiSurface>(
        &mut self,
        dispatcher: &mut Dispatcher<U>,
        session: &mut Session,
    ) -> Option<Step> {
        loop {
            let deadline = session.typing().deadline();

            let Some(events) = self.events.as_mut() else {
                sleep_until(deadline?).await;
                return dispatcher.fire_due(session, Instant::now()).map(Step::Paint);
            };

            let event = tokio::select! {
                biased;

                event = events.recv() => event,

                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some(paint) = dispatcher.fire_due(session, Instant::now()) {
                        return Some(Step::Paint(paint));
                    }
                    continue;
                }
            };

            match event {
                Some(event) => {
                    let kind = dispatcher.dispatch(session, &self.port, event, Instant::now());
                    return Some(Step::Event(kind));
                }
                None => {
                    debug!(broker = self.broker.name(), "Broker stopped delivering events");
                    self.events = None;
                }
            }
        }
    }

    /// Run until the broker stops delivering events and no paint is pending.
    ///
    /// # Errors
    ///
    /// Returns an error if the bridge was never opened, or was already run
    /// to completion.
    pub async fn run<U: UiSurface>(
        &mut self,
        dispatcher: &mut Dispatcher<U>,
        session: &mut Session,
    ) -> Result<DispatchStats, BridgeError> {
        if self.events.is_none() {
            return Err(BridgeError::NotOpen);
        }

        while self.next(dispatcher, session).await.is_some() {}

        let stats = dispatcher.stats();
        debug!(?stats, "Bridge run complete");
        Ok(stats)
    }
}
