//! Dual-transport command and telemetry plumbing
//!
//! Wraps the two physical channels (LoRa radio, wired serial) behind
//! traits and arbitrates between them with a fixed priority order.

pub mod arbiter;
pub mod link;

pub use arbiter::Arbiter;
pub use link::{LinkStatus, RadioLink, RadioPayload, SerialLink};
