//! Codec for line-delimited JSON frames.
//!
//! Each frame is one JSON object terminated by `\n`. Commands are encoded,
//! events are decoded; a broker speaking over a byte stream uses
//! [`decode_from`] to pull whole lines out of its read buffer.

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::commands::Command;
use crate::events::InboundEvent;

/// Default maximum frame size (1 MiB).
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Frame terminator.
pub const DELIMITER: u8 = b'\n';

/// Protocol errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame exceeds maximum size.
    #[error("Frame size {0} exceeds maximum")]
    FrameTooLarge(usize),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid frame data.
    #[error("Invalid frame: {0}")]
    Invalid(String),
}

/// Encode a command to a newline-terminated JSON line.
///
/// # Errors
///
/// Returns an error if the command is too large or encoding fails.
pub fn encode(command: &Command) -> Result<Bytes, ProtocolError> {
    LineCodec::default().encode(command)
}

/// Encode a command into an existing buffer.
///
/// # Errors
///
/// Returns an error if the command is too large or encoding fails.
pub fn encode_into(command: &Command, buf: &mut BytesMut) -> Result<(), ProtocolError> {
    LineCodec::default().encode_into(command, buf)
}

/// Decode a single event from one line (the trailing newline is optional).
///
/// # Errors
///
/// Returns an error if the line is empty, too large, or not a valid event.
pub fn decode(data: &[u8]) -> Result<InboundEvent, ProtocolError> {
    LineCodec::default().decode(data)
}

/// Try to decode an event from a buffer, advancing it past the consumed line.
///
/// Returns `Ok(Some(event))` if a complete line was decoded, `Ok(None)` if
/// more data is needed. A line that fails to decode is still consumed, so
/// the caller can report the error and keep reading.
///
/// # Errors
///
/// Returns an error if a line is too large or invalid.
pub fn decode_from(buf: &mut BytesMut) -> Result<Option<InboundEvent>, ProtocolError> {
    LineCodec::default().decode_from(buf)
}

/// Line codec with a configurable frame limit.
#[derive(Debug, Clone, Copy)]
pub struct LineCodec {
    max_frame_size: usize,
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new(MAX_FRAME_SIZE)
    }
}

impl LineCodec {
    /// Create a codec accepting frames up to `max_frame_size` bytes.
    #[must_use]
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    /// Maximum accepted frame size.
    #[must_use]
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Encode a command to bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode(&self, command: &Command) -> Result<Bytes, ProtocolError> {
        let mut buf = BytesMut::new();
        self.encode_into(command, &mut buf)?;
        Ok(buf.freeze())
    }

    /// Encode a command into an existing buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode_into(&self, command: &Command, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        let payload = serde_json::to_vec(command)?;

        if payload.len() > self.max_frame_size {
            return Err(ProtocolError::FrameTooLarge(payload.len()));
        }

        buf.reserve(payload.len() + 1);
        buf.extend_from_slice(&payload);
        buf.put_u8(DELIMITER);

        Ok(())
    }

    /// Decode one line.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails.
    pub fn decode(&self, data: &[u8]) -> Result<InboundEvent, ProtocolError> {
        if data.len() > self.max_frame_size + 1 {
            return Err(ProtocolError::FrameTooLarge(data.len()));
        }

        let line = data.trim_ascii();
        if line.is_empty() {
            return Err(ProtocolError::Invalid("empty frame".to_string()));
        }

        Ok(serde_json::from_slice(line)?)
    }

    /// Try to decode the next non-blank line from a buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is too large or invalid.
    pub fn decode_from(&self, buf: &mut BytesMut) -> Result<Option<InboundEvent>, ProtocolError> {
        loop {
            let Some(pos) = buf.iter().position(|b| *b == DELIMITER) else {
                if buf.len() > self.max_frame_size {
                    let size = buf.len();
                    buf.clear();
                    return Err(ProtocolError::FrameTooLarge(size));
                }
                return Ok(None);
            };

            let line = buf.split_to(pos + 1);
            if line.trim_ascii().is_empty() {
                continue;
            }

            return self.decode(&line).map(Some);
        }
    }
}
