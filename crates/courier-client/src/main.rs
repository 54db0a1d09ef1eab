//! # Courier Client
//!
//! Routes events from a broker process to a console surface.
//!
//! The broker speaks line-delimited JSON: events arrive on stdin and
//! commands leave on stdout. Logs go to stderr.
//!
//! ## Usage
//!
//! ```bash
//! # Run with default settings
//! broker | courier
//!
//! # Run with a custom config
//! COURIER_CONFIG=/path/to/courier.toml courier
//!
//! # Run with environment variables
//! COURIER_USER_ID=1 COURIER_ACTIVE_PEER=7 courier
//! ```

mod config;
mod console;
mod metrics;

use anyhow::{Context, Result};
use courier_bridge::{Bridge, Broker, StreamBroker, Step};
use courier_core::{Dispatcher, Session};
use courier_protocol::LineCodec;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::console::ConsoleUi;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; stdout belongs to the broker
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courier=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = config::Config::load()?;

    tracing::info!(
        user = ?config.user_id,
        peer = ?config.active_peer,
        "Starting Courier client"
    );

    metrics::init_metrics();
    if config.metrics.enabled {
        metrics::start_metrics_server(config.metrics.port)?;
    }

    let codec = LineCodec::new(config.codec.max_frame_size);
    let broker = StreamBroker::with_codec(tokio::io::stdin(), tokio::io::stdout(), codec);
    run_client(Bridge::new(broker), &config).await
}

/// Drive one client context until the broker hangs up or Ctrl+C.
async fn run_client<B: Broker>(mut bridge: Bridge<B>, config: &config::Config) -> Result<()> {
    let mut session = Session::new(config.typing.delay());
    let mut dispatcher = Dispatcher::new(ConsoleUi::new());

    bridge.open().await.context("Failed to open bridge")?;
    metrics::record_command("connect");

    if let Some(peer) = config.active_peer {
        session.open_conversation(peer);
        dispatcher.ui_mut().open_conversation(peer);
    }

    bridge
        .outbox()
        .get_users()
        .context("Failed to request roster")?;
    metrics::record_command("send");

    loop {
        let before = dispatcher.stats();

        let step = tokio::select! {
            step = bridge.next(&mut dispatcher, &mut session) => step,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        };

        match step {
            Some(Step::Event(kind)) => metrics::record_event(kind),
            Some(Step::Paint(_)) => metrics::record_paint(),
            None => break,
        }
        metrics::record_dispatched_commands(before, dispatcher.stats());
    }

    if bridge.close() {
        metrics::record_command("close");
    }

    let stats = dispatcher.stats();
    tracing::info!(
        events = stats.events,
        ignored = stats.ignored,
        receipts = stats.receipts,
        paints = stats.paints,
        shown = dispatcher.ui().page().conversation().len(),
        "Courier client stopped"
    );
    Ok(())
}
