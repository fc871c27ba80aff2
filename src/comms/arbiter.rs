//! Transport arbiter
//!
//! Polls the radio first, then the serial decoder, yielding at most one
//! validated command per control-loop tick. Radio priority is deliberate:
//! the remote operator channel must not be starved by a chatty local
//! console. The serial buffer keeps whatever it holds for the next tick
//! whenever the radio wins.

use crate::config::RADIO_POLL_TIMEOUT_MS;
use crate::protocol::{decode_radio, FrameDecoder};
use crate::types::CommandFrame;

use super::link::{LinkStatus, RadioLink, SerialLink};

/// Dual-transport command source and telemetry sink
pub struct Arbiter<R, S> {
    radio: R,
    serial: S,
    decoder: FrameDecoder,
    status: LinkStatus,
}

impl<R: RadioLink, S: SerialLink> Arbiter<R, S> {
    /// Wrap the two transports, latching the radio init status
    ///
    /// A radio that failed to initialize stays out of the rotation for
    /// the whole session; every poll falls through to serial.
    pub fn new(radio: R, serial: S) -> Self {
        let radio_ready = radio.is_ready();
        Self {
            radio,
            serial,
            decoder: FrameDecoder::new(),
            status: LinkStatus::new(radio_ready),
        }
    }

    /// Poll both transports for one validated command
    ///
    /// The radio gets a bounded wait first. A radio message consumes the
    /// tick even when its payload turns out malformed (dropped, not an
    /// error); serial is only read after the radio wait lapses.
    pub fn poll(&mut self) -> Option<CommandFrame> {
        if self.status.radio_ready {
            if let Some(payload) = self.radio.recv(RADIO_POLL_TIMEOUT_MS) {
                self.status.last_rssi = self.radio.last_rssi();
                return decode_radio(&payload);
            }
        }

        let mut buf = [0u8; 16];
        loop {
            let n = self.serial.read(&mut buf);
            if n == 0 {
                break;
            }
            self.decoder.push(&buf[..n]);
        }
        self.decoder.decode()
    }

    /// Send a telemetry payload to every live transport
    pub fn send(&mut self, payload: &[u8]) {
        if self.status.radio_ready {
            self.radio.send(payload);
        }
        self.serial.send(payload);
    }

    /// Current link health snapshot
    #[must_use]
    pub fn link_status(&self) -> &LinkStatus {
        &self.status
    }

    /// Record fresh battery readings for the next telemetry frame
    pub fn set_battery(&mut self, readings: &[i16]) {
        self.status.battery.clear();
        for &reading in readings.iter().take(self.status.battery.capacity()) {
            let _ = self.status.battery.push(reading);
        }
    }
}
