//! Broker reached over a byte stream.
//!
//! Events arrive as line-delimited JSON on the reader and commands leave
//! as line-delimited JSON on the writer. The typical pairing is the stdio
//! of a broker process, but any `AsyncRead`/`AsyncWrite` pair works.

use async_trait::async_trait;
use bytes::BytesMut;
use courier_protocol::{Command, InboundEvent, LineCodec};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, Stdin, Stdout};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::traits::{BridgeError, Broker, BrokerChannel};

/// Initial read buffer capacity.
const READ_BUFFER_CAPACITY: usize = 4096;

/// A broker speaking line-delimited JSON over a reader/writer pair.
pub struct StreamBroker<R, W> {
    io: Mutex<Option<(R, W)>>,
    codec: LineCodec,
}

impl StreamBroker<Stdin, Stdout> {
    /// Broker on this process's stdin/stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> StreamBroker<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Create a broker over the given streams.
    #[must_use]
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_codec(reader, writer, LineCodec::default())
    }

    /// Create a broker with a custom codec.
    #[must_use]
    pub fn with_codec(reader: R, writer: W, codec: LineCodec) -> Self {
        Self {
            io: Mutex::new(Some((reader, writer))),
            codec,
        }
    }
}

#[async_trait]
impl<R, W> Broker for StreamBroker<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn attach(&self) -> Result<BrokerChannel, BridgeError> {
        let (reader, writer) = self
            .io
            .lock()
            .await
            .take()
            .ok_or(BridgeError::AlreadyAttached)?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        tokio::spawn(read_events(reader, event_tx, self.codec));
        tokio::spawn(write_commands(writer, command_rx, self.codec));

        info!(
            max_frame_size = self.codec.max_frame_size(),
            "Stream broker attached"
        );
        Ok(BrokerChannel::new(command_tx, event_rx))
    }

    fn name(&self) -> &'static str {
        "stream"
    }
}

/// Decode events from `reader` until EOF or the client goes away.
async fn read_events<R>(mut reader: R, tx: mpsc::UnboundedSender<InboundEvent>, codec: LineCodec)
where
    R: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(READ_BUFFER_CAPACITY);

    loop {
        match reader.read_buf(&mut buf).await {
            Ok(0) => {
                debug!("Broker stream ended");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Broker read failed");
                break;
            }
        }

        loop {
            match codec.decode_from(&mut buf) {
                Ok(Some(event)) => {
                    if tx.send(event).is_err() {
                        return;
                    }
                }
                Ok(None) => break,
                Err(e) => warn!(error = %e, "Skipping undecodable event"),
            }
        }
    }

    // A final line without a trailing newline still counts
    if !buf.trim_ascii().is_empty() {
        match codec.decode(&buf) {
            Ok(event) => {
                let _ = tx.send(event);
            }
            Err(e) => warn!(error = %e, "Skipping undecodable event"),
        }
    }
}

/// Encode commands onto `writer` until every port is dropped.
async fn write_commands<W>(
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<Command>,
    codec: LineCodec,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(command) = rx.recv().await {
        let data = match codec.encode(&command) {
            Ok(data) => data,
            Err(e) => {
                warn!(command = command.name(), error = %e, "Failed to encode command");
                continue;
            }
        };

        if let Err(e) = writer.write_all(&data).await {
            warn!(error = %e, "Broker write failed");
            break;
        }
        if let Err(e) = writer.flush().await {
            warn!(error = %e, "Broker flush failed");
            break;
        }
    }

    if let Err(e) = writer.shutdown().await {
        debug!(error = %e, "Broker writer shutdown failed");
    }
}
