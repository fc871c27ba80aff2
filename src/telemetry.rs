//! Telemetry frame assembly
//!
//! Builds the outbound status report from the actuator state and link
//! health. The frame is a pure projection: rebuilt for every send, never
//! cached, and sent after every processed command whether it was applied,
//! rejected, or unknown, so the operator console always sees ground truth.

use heapless::Vec;

use crate::comms::LinkStatus;
use crate::config::MAX_BATTERY_INPUTS;
use crate::control::PadState;

/// Bit position of the filling flag in the status byte
pub const BIT_FILLING: u8 = 0;
/// Bit position of the venting flag
pub const BIT_VENTING: u8 = 1;
/// Bit position of the armed flag
pub const BIT_ARMED: u8 = 2;
/// Bit position of the firing flag
pub const BIT_FIRING: u8 = 3;
/// Bit position of the telemetry-enabled flag
pub const BIT_TELEMETRY: u8 = 4;
/// Bit position of the safe-mode flag
pub const BIT_SAFE_MODE: u8 = 5;

/// Boolean state flags packed into the first telemetry byte
///
/// Bit positions are fixed and shared with the command protocol
/// documentation; changing them breaks every operator console.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct StatusBits {
    /// Fill solenoid open
    pub filling: bool,
    /// Vent solenoid open
    pub venting: bool,
    /// Ignition armed
    pub armed: bool,
    /// Ignition circuit energized
    pub firing: bool,
    /// Rocket telemetry transmitters enabled
    pub telemetry_enabled: bool,
    /// Safe mode engaged
    pub safe_mode: bool,
}

impl StatusBits {
    /// Capture the flags of an actuator state snapshot
    #[must_use]
    pub const fn from_state(state: &PadState) -> Self {
        Self {
            filling: state.is_filling(),
            venting: state.is_venting(),
            armed: state.is_armed(),
            firing: state.is_firing(),
            telemetry_enabled: state.is_telemetry_enabled(),
            safe_mode: state.is_safe_mode(),
        }
    }

    /// Pack the flags into the wire byte
    #[must_use]
    pub const fn pack(&self) -> u8 {
        (self.filling as u8) << BIT_FILLING
            | (self.venting as u8) << BIT_VENTING
            | (self.armed as u8) << BIT_ARMED
            | (self.firing as u8) << BIT_FIRING
            | (self.telemetry_enabled as u8) << BIT_TELEMETRY
            | (self.safe_mode as u8) << BIT_SAFE_MODE
    }

    /// Recover the flags from a wire byte
    #[must_use]
    pub const fn unpack(byte: u8) -> Self {
        Self {
            filling: byte & (1 << BIT_FILLING) != 0,
            venting: byte & (1 << BIT_VENTING) != 0,
            armed: byte & (1 << BIT_ARMED) != 0,
            firing: byte & (1 << BIT_FIRING) != 0,
            telemetry_enabled: byte & (1 << BIT_TELEMETRY) != 0,
            safe_mode: byte & (1 << BIT_SAFE_MODE) != 0,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for StatusBits {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Status({:#04x})", self.pack());
    }
}

/// One outbound telemetry report
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TelemetryFrame {
    /// Packed actuator state flags
    pub status: StatusBits,
    /// RSSI of the last radio packet, 0 while the radio link is down
    pub rssi: i16,
    /// Battery voltage readings in millivolts
    pub battery: Vec<i16, MAX_BATTERY_INPUTS>,
}

impl TelemetryFrame {
    /// Assemble a report from the current state and link health
    #[must_use]
    pub fn build(state: &PadState, link: &LinkStatus) -> Self {
        Self {
            status: StatusBits::from_state(state),
            rssi: if link.radio_ready { link.last_rssi } else { 0 },
            battery: link.battery.clone(),
        }
    }
}
