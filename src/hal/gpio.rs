//! GPIO Abstractions
//!
//! Type-safe GPIO wrappers for the controller board.

use embassy_stm32::gpio::Output;

/// Status LED state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LedState {
    /// LED is off
    #[default]
    Off,
    /// LED is on
    On,
}

impl LedState {
    /// Toggle the LED state
    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Off => Self::On,
            Self::On => Self::Off,
        }
    }
}

impl defmt::Format for LedState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Off => defmt::write!(f, "OFF"),
            Self::On => defmt::write!(f, "ON"),
        }
    }
}

/// Status LED driver
///
/// Lit while the radio link is down, the one-time report of a failed
/// modem bring-up.
pub struct StatusLed<'d> {
    pin: Output<'d>,
    state: LedState,
}

impl<'d> StatusLed<'d> {
    /// Create a new status LED (initially off)
    #[must_use]
    pub fn new(pin: Output<'d>) -> Self {
        Self {
            pin,
            state: LedState::Off,
        }
    }

    /// Turn LED on
    pub fn on(&mut self) {
        self.pin.set_high();
        self.state = LedState::On;
    }

    /// Turn LED off
    pub fn off(&mut self) {
        self.pin.set_low();
        self.state = LedState::Off;
    }

    /// Toggle LED state
    pub fn toggle(&mut self) {
        match self.state {
            LedState::Off => self.on(),
            LedState::On => self.off(),
        }
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> LedState {
        self.state
    }
}
