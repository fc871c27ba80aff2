//! Safety-interlock state machine
//!
//! Holds the single authoritative record of the pad's actuator state and
//! validates every requested transition against the interlock rules. Each
//! opcode maps to exactly one transition function; a transition either
//! mutates the state and emits line effects, or refuses and leaves the
//! state untouched. Transitions never panic.

use heapless::Vec;

use crate::config::{CALIBRATION_PULSE_MS, SAFE_EXIT_THRESHOLD};
use crate::types::{CommandFrame, ServoAngle};

use super::outputs::Line;

/// Command opcodes carried in the first payload byte
mod opcode {
    pub const FILL_START: u8 = 0x61; // 'a'
    pub const FILL_STOP: u8 = 0x62; // 'b'
    pub const VENT_START: u8 = 0x63; // 'c'
    pub const VENT_STOP: u8 = 0x64; // 'd'
    pub const ARM: u8 = 0x65; // 'e'
    pub const DISARM: u8 = 0x66; // 'f'
    pub const FIRE_START: u8 = 0x67; // 'g'
    pub const FIRE_STOP: u8 = 0x68; // 'h'
    pub const TM_ENABLE: u8 = 0x41; // 'A'
    pub const TM_DISABLE: u8 = 0x42; // 'B'
    pub const CA_TRIGGER: u8 = 0x43; // 'C'
    pub const SAFE_IN: u8 = 0x59; // 'Y'
    pub const SAFE_OUT: u8 = 0x5A; // 'Z'
    pub const AUX_OUTPUT1: u8 = 0x69; // 'i'
    pub const AUX_OUTPUT2: u8 = 0x6A; // 'j'
    pub const AUX_OUTPUT3: u8 = 0x6B; // 'k'
    pub const AUX_OUTPUT4: u8 = 0x6C; // 'l'
    pub const SERVO1: u8 = 0x73; // 's'
    pub const SERVO2: u8 = 0x74; // 't'
    pub const SERVO3: u8 = 0x75; // 'u'
}

/// The pad's actuator state
///
/// Exclusively owned by this module: the only writers are the transition
/// functions in [`apply`]. Everything else reads snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PadState {
    filling: bool,
    venting: bool,
    armed: bool,
    firing: bool,
    telemetry_enabled: bool,
    safe_mode: bool,
    safe_exit_count: u8,
}

impl PadState {
    /// Power-up state: safe mode engaged, rocket telemetry enabled
    #[must_use]
    pub const fn new() -> Self {
        Self {
            filling: false,
            venting: false,
            armed: false,
            firing: false,
            telemetry_enabled: true,
            safe_mode: true,
            safe_exit_count: 0,
        }
    }

    /// Fill solenoid open
    #[must_use]
    pub const fn is_filling(&self) -> bool {
        self.filling
    }

    /// Vent solenoid open
    #[must_use]
    pub const fn is_venting(&self) -> bool {
        self.venting
    }

    /// Ignition armed
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.armed
    }

    /// Ignition circuit energized
    #[must_use]
    pub const fn is_firing(&self) -> bool {
        self.firing
    }

    /// Rocket telemetry transmitters enabled
    #[must_use]
    pub const fn is_telemetry_enabled(&self) -> bool {
        self.telemetry_enabled
    }

    /// Safe mode engaged
    #[must_use]
    pub const fn is_safe_mode(&self) -> bool {
        self.safe_mode
    }

    /// Progress of the debounced safe-mode exit
    #[must_use]
    pub const fn safe_exit_count(&self) -> u8 {
        self.safe_exit_count
    }
}

impl Default for PadState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for PadState {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Pad(fill={} vent={} armed={} fire={} tm={} safe={})",
            self.filling,
            self.venting,
            self.armed,
            self.firing,
            self.telemetry_enabled,
            self.safe_mode
        );
    }
}

/// A decoded command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Open the fill solenoid
    FillStart,
    /// Close the fill solenoid
    FillStop,
    /// Open the vent solenoid
    VentStart,
    /// Close the vent solenoid
    VentStop,
    /// Arm the ignition circuit
    Arm,
    /// Disarm the ignition circuit (also stops firing)
    Disarm,
    /// Energize the ignition relay
    FireStart,
    /// De-energize the ignition relay
    FireStop,
    /// Enable the rocket telemetry transmitters
    TelemetryOn,
    /// Disable the rocket telemetry transmitters
    TelemetryOff,
    /// Pulse the sensor calibration ombilical
    Calibrate,
    /// Engage safe mode
    SafeEnter,
    /// One debounced attempt to leave safe mode
    SafeExit,
    /// Drive an auxiliary output
    AuxOutput {
        /// Output index, 0-based
        index: u8,
        /// Demanded level, taken from the low argument bit
        enable: bool,
    },
    /// Position a servo channel
    Servo {
        /// Servo index, 0-based
        index: u8,
        /// Demanded deflection
        angle: ServoAngle,
    },
}

impl Command {
    /// Decode a command frame, `None` for unrecognized opcodes
    #[must_use]
    pub fn decode(frame: &CommandFrame) -> Option<Self> {
        let cmd = match frame.opcode() {
            opcode::FILL_START => Self::FillStart,
            opcode::FILL_STOP => Self::FillStop,
            opcode::VENT_START => Self::VentStart,
            opcode::VENT_STOP => Self::VentStop,
            opcode::ARM => Self::Arm,
            opcode::DISARM => Self::Disarm,
            opcode::FIRE_START => Self::FireStart,
            opcode::FIRE_STOP => Self::FireStop,
            opcode::TM_ENABLE => Self::TelemetryOn,
            opcode::TM_DISABLE => Self::TelemetryOff,
            opcode::CA_TRIGGER => Self::Calibrate,
            opcode::SAFE_IN => Self::SafeEnter,
            opcode::SAFE_OUT => Self::SafeExit,
            op @ opcode::AUX_OUTPUT1..=opcode::AUX_OUTPUT4 => Self::AuxOutput {
                index: op - opcode::AUX_OUTPUT1,
                enable: frame.arg() & 0x01 != 0,
            },
            op @ opcode::SERVO1..=opcode::SERVO3 => Self::Servo {
                index: op - opcode::SERVO1,
                angle: ServoAngle::from_raw(frame.arg()),
            },
            _ => return None,
        };
        Some(cmd)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Command {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::FillStart => defmt::write!(f, "FillStart"),
            Self::FillStop => defmt::write!(f, "FillStop"),
            Self::VentStart => defmt::write!(f, "VentStart"),
            Self::VentStop => defmt::write!(f, "VentStop"),
            Self::Arm => defmt::write!(f, "Arm"),
            Self::Disarm => defmt::write!(f, "Disarm"),
            Self::FireStart => defmt::write!(f, "FireStart"),
            Self::FireStop => defmt::write!(f, "FireStop"),
            Self::TelemetryOn => defmt::write!(f, "TmOn"),
            Self::TelemetryOff => defmt::write!(f, "TmOff"),
            Self::Calibrate => defmt::write!(f, "Calibrate"),
            Self::SafeEnter => defmt::write!(f, "SafeEnter"),
            Self::SafeExit => defmt::write!(f, "SafeExit"),
            Self::AuxOutput { index, enable } => defmt::write!(f, "Aux{}={}", index + 1, enable),
            Self::Servo { index, angle } => defmt::write!(f, "Servo{}={}", index + 1, angle),
        }
    }
}

/// Physical side effect requested by an accepted transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Drive a named line active or inactive
    Line(Line, bool),
    /// Pulse a named line active for a fixed duration
    Pulse(Line, u32),
    /// Drive an auxiliary output
    Aux {
        /// Output index, 0-based
        index: u8,
        /// Demanded level
        on: bool,
    },
    /// Position a servo channel
    Servo {
        /// Servo index, 0-based
        index: u8,
        /// Demanded deflection
        angle: ServoAngle,
    },
}

/// Why a transition was refused
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// Safe mode inhibits this transition
    SafeMode,
    /// Fill solenoid is open
    Filling,
    /// Vent solenoid is open
    Venting,
    /// Ignition is armed
    Armed,
    /// Ignition is not armed
    NotArmed,
    /// Fueling or ignition actuators are still active
    ActuatorsActive,
}

#[cfg(feature = "embedded")]
impl defmt::Format for RejectReason {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::SafeMode => defmt::write!(f, "safe mode"),
            Self::Filling => defmt::write!(f, "filling"),
            Self::Venting => defmt::write!(f, "venting"),
            Self::Armed => defmt::write!(f, "armed"),
            Self::NotArmed => defmt::write!(f, "not armed"),
            Self::ActuatorsActive => defmt::write!(f, "actuators active"),
        }
    }
}

/// Result of dispatching one command frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Transition performed
    Applied,
    /// Interlock refused the transition, state unchanged
    Rejected(RejectReason),
    /// Opcode not recognized, state unchanged
    Unknown,
}

#[cfg(feature = "embedded")]
impl defmt::Format for Outcome {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Applied => defmt::write!(f, "applied"),
            Self::Rejected(reason) => defmt::write!(f, "rejected ({})", reason),
            Self::Unknown => defmt::write!(f, "unknown opcode"),
        }
    }
}

/// Upper bound of effects emitted by a single transition
pub const MAX_EFFECTS: usize = 2;

/// Outcome of [`apply`]: the next state and the effects to realize
#[derive(Clone, Debug)]
pub struct Transition {
    /// State after the transition (equal to the input on refusal)
    pub next: PadState,
    /// What happened
    pub outcome: Outcome,
    /// Line effects to hand to the output controller
    pub effects: Vec<Effect, MAX_EFFECTS>,
}

impl Transition {
    fn applied(next: PadState) -> Self {
        Self {
            next,
            outcome: Outcome::Applied,
            effects: Vec::new(),
        }
    }

    fn with_effect(mut self, effect: Effect) -> Self {
        // Capacity covers the largest transition, push cannot fail
        let _ = self.effects.push(effect);
        self
    }

    fn rejected(state: PadState, reason: RejectReason) -> Self {
        Self {
            next: state,
            outcome: Outcome::Rejected(reason),
            effects: Vec::new(),
        }
    }

    fn unknown(state: PadState) -> Self {
        Self {
            next: state,
            outcome: Outcome::Unknown,
            effects: Vec::new(),
        }
    }
}

/// Dispatch one command frame against the current state
///
/// Pure: the caller owns the returned state and effects. Refused and
/// unrecognized commands leave the state bit-identical so the telemetry
/// that follows makes the refusal observable.
#[must_use]
pub fn apply(state: PadState, frame: &CommandFrame) -> Transition {
    let Some(command) = Command::decode(frame) else {
        return Transition::unknown(state);
    };

    match command {
        Command::FillStart => fill_start(state),
        Command::FillStop => fill_stop(state),
        Command::VentStart => vent_start(state),
        Command::VentStop => vent_stop(state),
        Command::Arm => arm(state),
        Command::Disarm => disarm(state),
        Command::FireStart => fire_start(state),
        Command::FireStop => fire_stop(state),
        Command::TelemetryOn => telemetry_on(state),
        Command::TelemetryOff => telemetry_off(state),
        Command::Calibrate => calibrate(state),
        Command::SafeEnter => safe_enter(state),
        Command::SafeExit => safe_exit(state),
        Command::AuxOutput { index, enable } => aux_output(state, index, enable),
        Command::Servo { index, angle } => servo(state, index, angle),
    }
}

/// Open the fill solenoid, never while venting, armed, or safed
fn fill_start(mut state: PadState) -> Transition {
    if state.safe_mode {
        return Transition::rejected(state, RejectReason::SafeMode);
    }
    if state.venting {
        return Transition::rejected(state, RejectReason::Venting);
    }
    if state.armed {
        return Transition::rejected(state, RejectReason::Armed);
    }
    state.filling = true;
    Transition::applied(state).with_effect(Effect::Line(Line::Fill, true))
}

fn fill_stop(mut state: PadState) -> Transition {
    state.filling = false;
    Transition::applied(state).with_effect(Effect::Line(Line::Fill, false))
}

/// Open the vent solenoid, never while filling, armed, or safed
fn vent_start(mut state: PadState) -> Transition {
    if state.safe_mode {
        return Transition::rejected(state, RejectReason::SafeMode);
    }
    if state.filling {
        return Transition::rejected(state, RejectReason::Filling);
    }
    if state.armed {
        return Transition::rejected(state, RejectReason::Armed);
    }
    state.venting = true;
    Transition::applied(state).with_effect(Effect::Line(Line::Vent, true))
}

fn vent_stop(mut state: PadState) -> Transition {
    state.venting = false;
    Transition::applied(state).with_effect(Effect::Line(Line::Vent, false))
}

/// Arm the ignition circuit, only with both solenoids closed
fn arm(mut state: PadState) -> Transition {
    if state.safe_mode {
        return Transition::rejected(state, RejectReason::SafeMode);
    }
    if state.filling {
        return Transition::rejected(state, RejectReason::Filling);
    }
    if state.venting {
        return Transition::rejected(state, RejectReason::Venting);
    }
    state.armed = true;
    Transition::applied(state)
}

/// Disarm always also stops firing
fn disarm(mut state: PadState) -> Transition {
    state.armed = false;
    state.firing = false;
    Transition::applied(state).with_effect(Effect::Line(Line::Ignition, false))
}

fn fire_start(mut state: PadState) -> Transition {
    if !state.armed {
        return Transition::rejected(state, RejectReason::NotArmed);
    }
    state.firing = true;
    Transition::applied(state).with_effect(Effect::Line(Line::Ignition, true))
}

fn fire_stop(mut state: PadState) -> Transition {
    state.firing = false;
    Transition::applied(state).with_effect(Effect::Line(Line::Ignition, false))
}

fn telemetry_on(mut state: PadState) -> Transition {
    state.telemetry_enabled = true;
    Transition::applied(state).with_effect(Effect::Line(Line::TelemetryOmbilical, true))
}

fn telemetry_off(mut state: PadState) -> Transition {
    state.telemetry_enabled = false;
    Transition::applied(state).with_effect(Effect::Line(Line::TelemetryOmbilical, false))
}

fn calibrate(state: PadState) -> Transition {
    Transition::applied(state).with_effect(Effect::Pulse(
        Line::CalibrationOmbilical,
        CALIBRATION_PULSE_MS,
    ))
}

/// Safe mode may only engage from a fully quiescent pad
fn safe_enter(mut state: PadState) -> Transition {
    if state.filling || state.venting || state.armed || state.firing {
        return Transition::rejected(state, RejectReason::ActuatorsActive);
    }
    state.safe_mode = true;
    state.safe_exit_count = 0;
    Transition::applied(state)
}

/// Debounced safe-mode exit: one spurious command must not disarm safety
fn safe_exit(mut state: PadState) -> Transition {
    state.safe_exit_count = state.safe_exit_count.saturating_add(1);
    if state.safe_exit_count >= SAFE_EXIT_THRESHOLD {
        state.safe_exit_count = 0;
        state.safe_mode = false;
    }
    Transition::applied(state)
}

/// Aux outputs sit next to the armament wiring, safe mode gates them
fn aux_output(state: PadState, index: u8, enable: bool) -> Transition {
    if state.safe_mode {
        return Transition::rejected(state, RejectReason::SafeMode);
    }
    Transition::applied(state).with_effect(Effect::Aux { index, on: enable })
}

fn servo(state: PadState, index: u8, angle: ServoAngle) -> Transition {
    Transition::applied(state).with_effect(Effect::Servo { index, angle })
}
