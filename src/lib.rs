//! Launchpad Ground-Support Controller Firmware Library
//!
//! This library provides the core functionality of the launchpad
//! controller: the board that sits at the pad, drives the fueling and
//! ignition actuators, and answers the operator consoles over a wired
//! serial link and a LoRa radio link.
//!
//! # Architecture
//!
//! The firmware is organized in layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    APPLICATION LAYER                         │
//! │  Control Loop  │  Interlock Machine  │  Telemetry Encoder    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    PROTOCOL LAYER                            │
//! │  Frame Codec  │  Transport Arbiter  │  Link Health           │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   HAL / DRIVER LAYER                         │
//! │  GPIO lines  │  Servo PWM  │  Battery ADC  │  RFM95 LoRa     │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    RTOS / SCHEDULER                          │
//! │           embassy-rs (async/await executor)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Single writer**: the actuator record is mutated only by the
//!   interlock machine's transition functions
//! - **Type-driven design**: custom types enforce invariants at compile time
//! - **No unsafe in application code**: all unsafe isolated in HAL/FFI layers
//! - **Bounded waits**: every blocking call carries an upper bound
//! - **Explicit error handling**: soft protocol failures are `Option`,
//!   driver failures are `Result`

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

/// Hardware Abstraction Layer
///
/// Safe wrappers over the controller board's peripherals.
#[cfg(feature = "embedded")]
pub mod hal;

/// Peripheral Drivers
///
/// High-level drivers for external ICs (RFM95 LoRa transceiver).
#[cfg(feature = "embedded")]
pub mod drivers;

/// Transport plumbing
///
/// Transport traits, link health, and the radio-first arbiter.
pub mod comms;

/// Actuator control logic
///
/// The interlock state machine and the output controller.
pub mod control;

/// Control loop pipeline
///
/// End-to-end tick: poll, dispatch, effect, report.
pub mod controller;

/// Power monitoring
///
/// Battery sense conversion for telemetry.
pub mod power;

/// Frame codec
///
/// Command frame decoding and telemetry frame packing.
pub mod protocol;

/// Telemetry assembly
///
/// Status bit packing and frame construction.
pub mod telemetry;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
#[cfg(feature = "embedded")]
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    // Common traits
    pub use embedded_hal::digital::OutputPin;

    // Embassy
    pub use embassy_time::{Duration, Instant, Timer};

    // Error handling
    pub use core::result::Result;

    // Logging
    pub use defmt::{debug, error, info, trace, warn};
}
