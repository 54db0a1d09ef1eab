//! Metrics collection and export for the Courier client.
//!
//! Uses the `metrics` crate for instrumentation and exports
//! to Prometheus format.

use anyhow::{Context, Result};
use courier_core::DispatchStats;
use courier_protocol::EventKind;
use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// Metric names.
pub mod names {
    pub const EVENTS_TOTAL: &str = "courier_events_total";
    pub const COMMANDS_TOTAL: &str = "courier_commands_total";
    pub const TYPING_PAINTS_TOTAL: &str = "courier_typing_paints_total";
}

/// Initialize the metrics system.
pub fn init_metrics() {
    metrics::describe_counter!(names::EVENTS_TOTAL, "Inbound events dispatched, by type");
    metrics::describe_counter!(
        names::COMMANDS_TOTAL,
        "Outbound commands posted to the broker, by type"
    );
    metrics::describe_counter!(names::TYPING_PAINTS_TOTAL, "Typing indicator paints applied");

    info!("Metrics initialized");
}

/// Start the Prometheus metrics server on localhost.
///
/// # Errors
///
/// Returns an error if the exporter cannot be installed.
pub fn start_metrics_server(port: u16) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;

    info!("Metrics server listening on {}", addr);
    Ok(())
}

/// Record a dispatched inbound event.
pub fn record_event(kind: EventKind) {
    counter!(names::EVENTS_TOTAL, "type" => kind.as_str()).increment(1);
}

/// Record an outbound command.
pub fn record_command(name: &'static str) {
    counter!(names::COMMANDS_TOTAL, "type" => name).increment(1);
}

/// Record an applied typing paint.
pub fn record_paint() {
    counter!(names::TYPING_PAINTS_TOTAL).increment(1);
}

/// Record the commands the dispatcher posted between two stats snapshots.
///
/// Every pong is one `pong` command and every read receipt is one `send`
/// plus one `read` command.
pub fn record_dispatched_commands(before: DispatchStats, after: DispatchStats) {
    let pongs = after.pongs.saturating_sub(before.pongs);
    let receipts = after.receipts.saturating_sub(before.receipts);

    if pongs > 0 {
        counter!(names::COMMANDS_TOTAL, "type" => "pong").increment(pongs);
    }
    if receipts > 0 {
        counter!(names::COMMANDS_TOTAL, "type" => "send").increment(receipts);
        counter!(names::COMMANDS_TOTAL, "type" => "read").increment(receipts);
    }
}
