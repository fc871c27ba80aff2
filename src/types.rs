//! Shared types used across the launchpad controller firmware
//!
//! This module defines domain-specific types that enforce invariants
//! at compile time and provide type safety throughout the codebase.

use core::fmt;

use crate::config::{DATA_LEN, SERVO_MAX_ANGLE, SOURCE_ID_CONTROLLER, SOURCE_ID_GATEWAY};

/// Origin of a validated command frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameSource {
    /// LoRa radio link (message boundaries handled by the modem)
    Radio,
    /// Wired serial link, frame addressed to the controller
    SerialController,
    /// Wired serial link, frame addressed through the gateway
    SerialGateway,
}

impl FrameSource {
    /// Map a serial ID byte to a source, `None` for unrecognized IDs
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            SOURCE_ID_CONTROLLER => Some(Self::SerialController),
            SOURCE_ID_GATEWAY => Some(Self::SerialGateway),
            _ => None,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for FrameSource {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Radio => defmt::write!(f, "radio"),
            Self::SerialController => defmt::write!(f, "serial/c"),
            Self::SerialGateway => defmt::write!(f, "serial/g"),
        }
    }
}

/// A validated command frame
///
/// Frames are values: produced by the codec, consumed by dispatch,
/// never stored.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame {
    /// Transport the frame arrived on
    pub source: FrameSource,
    /// Payload bytes: opcode followed by its argument
    pub data: [u8; DATA_LEN],
}

impl CommandFrame {
    /// Create a frame from a source and payload
    #[must_use]
    pub const fn new(source: FrameSource, data: [u8; DATA_LEN]) -> Self {
        Self { source, data }
    }

    /// The opcode byte
    #[must_use]
    pub const fn opcode(&self) -> u8 {
        self.data[0]
    }

    /// The opcode-specific argument byte
    #[must_use]
    pub const fn arg(&self) -> u8 {
        self.data[1]
    }
}

impl fmt::Debug for CommandFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CommandFrame({:?}, {:#04x} {:#04x})",
            self.source, self.data[0], self.data[1]
        )
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for CommandFrame {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Frame({}, {:#04x} {:#04x})", self.source, self.data[0], self.data[1]);
    }
}

/// Servo deflection in degrees, clamped to the mechanical range
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ServoAngle(u8);

impl ServoAngle {
    /// Create from a raw argument byte, clamping to the supported range
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        if raw > SERVO_MAX_ANGLE {
            Self(SERVO_MAX_ANGLE)
        } else {
            Self(raw)
        }
    }

    /// Deflection in degrees
    #[must_use]
    pub const fn degrees(self) -> u8 {
        self.0
    }
}

impl fmt::Debug for ServoAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServoAngle({}°)", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ServoAngle {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}°", self.0);
    }
}
