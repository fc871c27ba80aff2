//! Control loop pipeline
//!
//! Glues the components into the per-tick sequence: arbiter poll, frame
//! decode, interlock dispatch, output effects, telemetry send. One tick
//! handles at most one inbound command end-to-end. Malformed input never
//! halts the loop; availability of the actuator interface outranks
//! strictness of protocol parsing.

use crate::comms::{Arbiter, RadioLink, SerialLink};
use crate::control::{apply, Outcome, OutputController, OutputLines, PadState};
use crate::protocol::encode_telemetry;
use crate::telemetry::TelemetryFrame;

/// The launchpad controller
pub struct Controller<R, S, L> {
    state: PadState,
    arbiter: Arbiter<R, S>,
    outputs: OutputController<L>,
}

impl<R: RadioLink, S: SerialLink, L: OutputLines> Controller<R, S, L> {
    /// Assemble the controller around its transports and output lines
    ///
    /// The pad powers up in safe mode with every actuator released.
    pub fn new(radio: R, serial: S, lines: L) -> Self {
        Self {
            state: PadState::new(),
            arbiter: Arbiter::new(radio, serial),
            outputs: OutputController::new(lines),
        }
    }

    /// Run one control-loop tick
    ///
    /// `now_ms` is a monotonic millisecond timestamp supplied by the
    /// caller; the core never reads a clock itself. Returns the dispatch
    /// outcome when a command was processed this tick.
    pub fn tick(&mut self, now_ms: u64) -> Option<Outcome> {
        // Watchdog sweep runs whether or not a command arrives
        self.outputs.tick(now_ms);

        let frame = self.arbiter.poll()?;

        let transition = apply(self.state, &frame);
        self.state = transition.next;
        self.outputs.apply(&transition.effects, now_ms);

        // Every processed command answers with fresh telemetry, even a
        // rejected or unknown one: the console observes "state did not
        // change" instead of silence.
        self.send_telemetry();

        Some(transition.outcome)
    }

    /// Build and transmit one telemetry frame on both transports
    pub fn send_telemetry(&mut self) {
        let frame = TelemetryFrame::build(&self.state, self.arbiter.link_status());
        let bytes = encode_telemetry(&frame);
        self.arbiter.send(&bytes);
    }

    /// Record fresh battery readings for subsequent telemetry
    pub fn set_battery(&mut self, readings: &[i16]) {
        self.arbiter.set_battery(readings);
    }

    /// Snapshot of the actuator state
    #[must_use]
    pub fn state(&self) -> &PadState {
        &self.state
    }

    /// Whether the radio link survived initialization
    #[must_use]
    pub fn radio_ready(&self) -> bool {
        self.arbiter.link_status().radio_ready
    }

    /// Access the output controller (watchdog inspection in tests)
    #[must_use]
    pub fn outputs(&self) -> &OutputController<L> {
        &self.outputs
    }
}
