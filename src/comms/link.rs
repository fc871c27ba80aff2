//! Transport seams and link health
//!
//! The traits here are the boundary between the portable control core and
//! the board support code. The embedded build implements them over the
//! LoRa driver and the UART; host tests substitute scripted fakes.

use heapless::Vec;

use crate::config::{MAX_BATTERY_INPUTS, RADIO_MAX_PAYLOAD};

/// One received radio message
pub type RadioPayload = Vec<u8, RADIO_MAX_PAYLOAD>;

/// LoRa radio transport
///
/// All waits are bounded: a stuck modem stalls one tick, never the loop.
pub trait RadioLink {
    /// Whether the modem initialized at startup
    ///
    /// Sampled once when the arbiter is built; a failed init is permanent
    /// for the session and is never retried.
    fn is_ready(&self) -> bool;

    /// Wait up to `timeout_ms` for one received message
    fn recv(&mut self, timeout_ms: u64) -> Option<RadioPayload>;

    /// Transmit a payload, waiting (bounded) for completion
    fn send(&mut self, payload: &[u8]);

    /// RSSI of the most recently received packet, in dBm
    fn last_rssi(&self) -> i16;
}

/// Wired serial transport
pub trait SerialLink {
    /// Drain buffered receive bytes into `buf`, returning the count
    ///
    /// Returns 0 when no bytes are pending; never blocks.
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Transmit a payload
    fn send(&mut self, payload: &[u8]);
}

/// Per-transport health, refreshed every tick
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkStatus {
    /// Radio modem initialized and usable
    pub radio_ready: bool,
    /// RSSI of the last radio packet, in dBm
    pub last_rssi: i16,
    /// Battery voltage readings in millivolts
    pub battery: Vec<i16, MAX_BATTERY_INPUTS>,
}

impl LinkStatus {
    /// Status at startup, before any packet has been received
    #[must_use]
    pub const fn new(radio_ready: bool) -> Self {
        Self {
            radio_ready,
            last_rssi: 0,
            battery: Vec::new(),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for LinkStatus {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Link(radio={}, rssi={}dBm)", self.radio_ready, self.last_rssi);
    }
}
