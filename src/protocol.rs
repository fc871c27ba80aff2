//! Command and telemetry frame codec
//!
//! Parses fixed-length command frames out of the raw serial byte stream and
//! packs outbound telemetry frames. Radio payloads are already delimited by
//! the modem, so they skip the start/ID framing entirely.
//!
//! A command frame over serial is:
//!
//! ```text
//! ---------------------------------------------------------
//! | Byte position |     0      |    1    |   2    |   3   |
//! | Description   | Start byte | ID byte | Opcode |  Arg  |
//! ---------------------------------------------------------
//! ```
//!
//! Over radio only the opcode and argument bytes are carried.

use heapless::{Deque, Vec};

use crate::config::{DATA_LEN, DECODE_QUEUE_LEN, FRAME_LEN, START_BYTE, TELEMETRY_MAX_LEN, TERMINATOR};
use crate::telemetry::TelemetryFrame;
use crate::types::{CommandFrame, FrameSource};

/// Incremental serial frame decoder
///
/// Bytes from the serial receive path are queued here and consumed
/// strictly left-to-right, exactly once. Garbage in front of a valid
/// frame is shed one prefix at a time, so a corrupted stream
/// resynchronizes on a later call without losing the frame behind it.
pub struct FrameDecoder {
    queue: Deque<u8, DECODE_QUEUE_LEN>,
}

impl FrameDecoder {
    /// Create an empty decoder
    #[must_use]
    pub const fn new() -> Self {
        Self { queue: Deque::new() }
    }

    /// Queue received bytes for decoding
    ///
    /// Returns how many bytes were accepted; bytes beyond the queue
    /// capacity are dropped.
    pub fn push(&mut self, bytes: &[u8]) -> usize {
        let mut accepted = 0;
        for &byte in bytes {
            if self.queue.push_back(byte).is_err() {
                break;
            }
            accepted += 1;
        }
        accepted
    }

    /// Number of bytes waiting in the queue
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Check whether the queue is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop all queued bytes
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Try to extract one command frame from the head of the queue
    ///
    /// - Fewer than a full frame buffered: nothing is consumed, retry
    ///   once more bytes arrive.
    /// - Head byte is not the start marker: that single byte is
    ///   discarded (resynchronization) and no frame is produced.
    /// - Start marker followed by an unrecognized ID: both bytes are
    ///   discarded and no frame is produced.
    /// - Otherwise the payload is consumed and the frame returned.
    pub fn decode(&mut self) -> Option<CommandFrame> {
        if self.queue.len() < FRAME_LEN {
            return None;
        }

        if *self.queue.front()? != START_BYTE {
            let _ = self.queue.pop_front();
            return None;
        }

        let id = *self.queue.iter().nth(1)?;
        let Some(source) = FrameSource::from_id(id) else {
            let _ = self.queue.pop_front();
            let _ = self.queue.pop_front();
            return None;
        };

        // Head matches a full frame: consume it
        let _ = self.queue.pop_front();
        let _ = self.queue.pop_front();
        let mut data = [0u8; DATA_LEN];
        for slot in &mut data {
            *slot = self.queue.pop_front()?;
        }
        Some(CommandFrame::new(source, data))
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a radio payload into a command frame
///
/// The modem guarantees message boundaries, so the payload bytes are
/// taken verbatim. Payloads shorter than a command are malformed and
/// dropped.
#[must_use]
pub fn decode_radio(payload: &[u8]) -> Option<CommandFrame> {
    if payload.len() < DATA_LEN {
        return None;
    }
    let mut data = [0u8; DATA_LEN];
    data.copy_from_slice(&payload[..DATA_LEN]);
    Some(CommandFrame::new(FrameSource::Radio, data))
}

/// Pack a telemetry frame into its wire representation
///
/// The same byte sequence is sent on both transports: status byte,
/// signed RSSI MSB-first, battery readings MSB-first, terminator.
#[must_use]
pub fn encode_telemetry(frame: &TelemetryFrame) -> Vec<u8, TELEMETRY_MAX_LEN> {
    let mut out = Vec::new();
    // Capacity is sized for the full frame, pushes cannot fail
    let _ = out.push(frame.status.pack());
    let _ = out.extend_from_slice(&frame.rssi.to_be_bytes());
    for reading in &frame.battery {
        let _ = out.extend_from_slice(&reading.to_be_bytes());
    }
    let _ = out.extend_from_slice(&TERMINATOR);
    out
}
