//! Servo pulse computation
//!
//! Maps clamped deflection angles onto the 50 Hz hobby-servo pulse
//! window. The PWM peripheral consumes these through the
//! `embedded-hal` duty-cycle trait.

use crate::config::{SERVO_MAX_ANGLE, SERVO_MAX_PULSE_US, SERVO_MIN_PULSE_US};
use crate::types::ServoAngle;

/// Servo PWM frame period in microseconds (50 Hz)
pub const SERVO_PERIOD_US: u16 = 20_000;

/// One servo pulse width
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ServoPulse(u16);

impl ServoPulse {
    /// Pulse width for a deflection angle, linear between the endpoints
    #[must_use]
    pub fn from_angle(angle: ServoAngle) -> Self {
        let span = u32::from(SERVO_MAX_PULSE_US - SERVO_MIN_PULSE_US);
        let offset = span * u32::from(angle.degrees()) / u32::from(SERVO_MAX_ANGLE);
        Self(SERVO_MIN_PULSE_US + offset as u16)
    }

    /// Pulse width in microseconds
    #[must_use]
    pub const fn as_us(self) -> u16 {
        self.0
    }
}

impl defmt::Format for ServoPulse {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}us", self.0);
    }
}
