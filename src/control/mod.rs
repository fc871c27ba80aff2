//! Actuator control logic
//!
//! The interlock state machine and the output controller. All mutation of
//! the pad's actuator state happens inside [`state::apply`]; the rest of
//! the firmware only reads snapshots.

pub mod outputs;
pub mod state;

pub use outputs::{Level, Line, OutputController, OutputLines};
pub use state::{apply, Command, Effect, Outcome, PadState, RejectReason, Transition};
