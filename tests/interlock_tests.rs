//! Interlock State Machine Tests
//!
//! Tests the mutual-exclusion guards, the safe-mode debounce, and the
//! state invariants over randomized command sequences.

use launchpad_firmware::config::SAFE_EXIT_THRESHOLD;
use launchpad_firmware::control::{apply, Command, Effect, Line, Outcome, PadState, RejectReason};
use launchpad_firmware::types::{CommandFrame, FrameSource, ServoAngle};

// Command opcodes as they appear on the wire
const FILL_START: u8 = 0x61;
const FILL_STOP: u8 = 0x62;
const VENT_START: u8 = 0x63;
const VENT_STOP: u8 = 0x64;
const ARM: u8 = 0x65;
const DISARM: u8 = 0x66;
const FIRE_START: u8 = 0x67;
const FIRE_STOP: u8 = 0x68;
const TM_ENABLE: u8 = 0x41;
const TM_DISABLE: u8 = 0x42;
const CA_TRIGGER: u8 = 0x43;
const SAFE_IN: u8 = 0x59;
const SAFE_OUT: u8 = 0x5A;
const AUX_OUTPUT1: u8 = 0x69;
const SERVO1: u8 = 0x73;

fn frame(opcode: u8) -> CommandFrame {
    CommandFrame::new(FrameSource::SerialController, [opcode, 0x00])
}

fn frame_arg(opcode: u8, arg: u8) -> CommandFrame {
    CommandFrame::new(FrameSource::SerialController, [opcode, arg])
}

/// Run one command and return the next state, asserting it applied
fn applied(state: PadState, opcode: u8) -> PadState {
    let t = apply(state, &frame(opcode));
    assert_eq!(t.outcome, Outcome::Applied, "opcode {opcode:#04x} should apply");
    t.next
}

/// A pad with safe mode already disengaged
fn live_pad() -> PadState {
    let mut state = PadState::new();
    for _ in 0..SAFE_EXIT_THRESHOLD {
        state = applied(state, SAFE_OUT);
    }
    assert!(!state.is_safe_mode());
    state
}

// ============================================================================
// Default State
// ============================================================================

#[test]
fn powers_up_safed() {
    let state = PadState::new();
    assert!(state.is_safe_mode());
    assert!(state.is_telemetry_enabled());
    assert!(!state.is_filling());
    assert!(!state.is_venting());
    assert!(!state.is_armed());
    assert!(!state.is_firing());
    assert_eq!(state.safe_exit_count(), 0);
}

// ============================================================================
// Command Decoding
// ============================================================================

#[test]
fn decode_known_opcodes() {
    assert_eq!(Command::decode(&frame(FILL_START)), Some(Command::FillStart));
    assert_eq!(Command::decode(&frame(DISARM)), Some(Command::Disarm));
    assert_eq!(Command::decode(&frame(SAFE_IN)), Some(Command::SafeEnter));
    assert_eq!(Command::decode(&frame(CA_TRIGGER)), Some(Command::Calibrate));
}

#[test]
fn decode_unknown_opcode() {
    assert_eq!(Command::decode(&frame(0x00)), None);
    assert_eq!(Command::decode(&frame(0x7F)), None);
}

#[test]
fn decode_aux_output_range() {
    assert_eq!(
        Command::decode(&frame_arg(AUX_OUTPUT1, 0x01)),
        Some(Command::AuxOutput { index: 0, enable: true })
    );
    assert_eq!(
        Command::decode(&frame_arg(AUX_OUTPUT1 + 3, 0x00)),
        Some(Command::AuxOutput { index: 3, enable: false })
    );
}

#[test]
fn decode_aux_output_uses_low_bit_only() {
    assert_eq!(
        Command::decode(&frame_arg(AUX_OUTPUT1, 0xFE)),
        Some(Command::AuxOutput { index: 0, enable: false })
    );
}

#[test]
fn decode_servo_clamps_angle() {
    let cmd = Command::decode(&frame_arg(SERVO1, 250)).unwrap();
    assert_eq!(
        cmd,
        Command::Servo { index: 0, angle: ServoAngle::from_raw(180) }
    );
}

// ============================================================================
// Fill / Vent Exclusion
// ============================================================================

#[test]
fn fill_rejected_in_safe_mode() {
    let state = PadState::new();
    let t = apply(state, &frame(FILL_START));
    assert_eq!(t.outcome, Outcome::Rejected(RejectReason::SafeMode));
    assert_eq!(t.next, state);
    assert!(t.effects.is_empty());
}

#[test]
fn fill_then_vent_rejected() {
    let state = applied(live_pad(), FILL_START);
    assert!(state.is_filling());
    let t = apply(state, &frame(VENT_START));
    assert_eq!(t.outcome, Outcome::Rejected(RejectReason::Filling));
    assert!(!t.next.is_venting());
}

#[test]
fn vent_then_fill_rejected() {
    let state = applied(live_pad(), VENT_START);
    let t = apply(state, &frame(FILL_START));
    assert_eq!(t.outcome, Outcome::Rejected(RejectReason::Venting));
    assert!(!t.next.is_filling());
}

#[test]
fn stop_fill_always_accepted() {
    // Even in safe mode stopping a solenoid is allowed
    let t = apply(PadState::new(), &frame(FILL_STOP));
    assert_eq!(t.outcome, Outcome::Applied);
}

#[test]
fn fill_emits_line_effect() {
    let t = apply(live_pad(), &frame(FILL_START));
    assert_eq!(t.effects.as_slice(), &[Effect::Line(Line::Fill, true)]);
}

#[test]
fn vent_cycle_closes_line() {
    let state = applied(live_pad(), VENT_START);
    let t = apply(state, &frame(VENT_STOP));
    assert_eq!(t.effects.as_slice(), &[Effect::Line(Line::Vent, false)]);
    assert!(!t.next.is_venting());
}

// ============================================================================
// Arming and Firing
// ============================================================================

#[test]
fn arm_rejected_while_filling() {
    let state = applied(live_pad(), FILL_START);
    let t = apply(state, &frame(ARM));
    assert_eq!(t.outcome, Outcome::Rejected(RejectReason::Filling));
    assert!(!t.next.is_armed());
}

#[test]
fn arm_rejected_while_venting() {
    let state = applied(live_pad(), VENT_START);
    let t = apply(state, &frame(ARM));
    assert_eq!(t.outcome, Outcome::Rejected(RejectReason::Venting));
}

#[test]
fn arm_rejected_in_safe_mode() {
    let t = apply(PadState::new(), &frame(ARM));
    assert_eq!(t.outcome, Outcome::Rejected(RejectReason::SafeMode));
}

#[test]
fn fill_rejected_while_armed() {
    let state = applied(live_pad(), ARM);
    let t = apply(state, &frame(FILL_START));
    assert_eq!(t.outcome, Outcome::Rejected(RejectReason::Armed));
}

#[test]
fn vent_rejected_while_armed() {
    let state = applied(live_pad(), ARM);
    let t = apply(state, &frame(VENT_START));
    assert_eq!(t.outcome, Outcome::Rejected(RejectReason::Armed));
}

#[test]
fn fire_requires_arm() {
    let t = apply(live_pad(), &frame(FIRE_START));
    assert_eq!(t.outcome, Outcome::Rejected(RejectReason::NotArmed));
    assert!(!t.next.is_firing());
}

#[test]
fn fire_while_armed_energizes_ignition() {
    let state = applied(live_pad(), ARM);
    let t = apply(state, &frame(FIRE_START));
    assert_eq!(t.outcome, Outcome::Applied);
    assert!(t.next.is_firing());
    assert_eq!(t.effects.as_slice(), &[Effect::Line(Line::Ignition, true)]);
}

#[test]
fn disarm_always_stops_firing() {
    let mut state = applied(live_pad(), ARM);
    state = applied(state, FIRE_START);
    assert!(state.is_firing());

    let t = apply(state, &frame(DISARM));
    assert_eq!(t.outcome, Outcome::Applied);
    assert!(!t.next.is_armed());
    assert!(!t.next.is_firing());
    assert_eq!(t.effects.as_slice(), &[Effect::Line(Line::Ignition, false)]);
}

#[test]
fn disarm_is_idempotent() {
    let state = applied(live_pad(), DISARM);
    let again = applied(state, DISARM);
    assert!(!again.is_armed());
    assert!(!again.is_firing());
}

#[test]
fn fire_stop_deenergizes_without_disarming() {
    let mut state = applied(live_pad(), ARM);
    state = applied(state, FIRE_START);
    let t = apply(state, &frame(FIRE_STOP));
    assert!(!t.next.is_firing());
    assert!(t.next.is_armed());
}

// ============================================================================
// Safe Mode
// ============================================================================

#[test]
fn safe_exit_below_threshold_stays_safed() {
    let mut state = PadState::new();
    for attempt in 1..SAFE_EXIT_THRESHOLD {
        state = applied(state, SAFE_OUT);
        assert!(state.is_safe_mode(), "attempt {attempt} must not clear safe mode");
        assert_eq!(state.safe_exit_count(), attempt);
    }
}

#[test]
fn safe_exit_at_threshold_clears_and_resets() {
    let mut state = PadState::new();
    for _ in 0..SAFE_EXIT_THRESHOLD {
        state = applied(state, SAFE_OUT);
    }
    assert!(!state.is_safe_mode());
    assert_eq!(state.safe_exit_count(), 0);
}

#[test]
fn safe_enter_rejected_while_filling() {
    let state = applied(live_pad(), FILL_START);
    let t = apply(state, &frame(SAFE_IN));
    assert_eq!(t.outcome, Outcome::Rejected(RejectReason::ActuatorsActive));
    assert!(!t.next.is_safe_mode());
}

#[test]
fn safe_enter_rejected_while_armed() {
    let state = applied(live_pad(), ARM);
    let t = apply(state, &frame(SAFE_IN));
    assert_eq!(t.outcome, Outcome::Rejected(RejectReason::ActuatorsActive));
}

#[test]
fn safe_enter_from_quiescent_pad() {
    let state = applied(live_pad(), SAFE_IN);
    assert!(state.is_safe_mode());
}

#[test]
fn safe_reentry_restarts_exit_debounce() {
    let mut state = live_pad();
    state = applied(state, SAFE_IN);
    state = applied(state, SAFE_OUT);
    assert!(state.is_safe_mode());
    assert_eq!(state.safe_exit_count(), 1);
}

// ============================================================================
// Ancillary Commands
// ============================================================================

#[test]
fn telemetry_toggle() {
    let state = applied(PadState::new(), TM_DISABLE);
    assert!(!state.is_telemetry_enabled());
    let state = applied(state, TM_ENABLE);
    assert!(state.is_telemetry_enabled());
}

#[test]
fn calibration_pulses_without_state_change() {
    let before = PadState::new();
    let t = apply(before, &frame(CA_TRIGGER));
    assert_eq!(t.outcome, Outcome::Applied);
    assert_eq!(t.next, before);
    assert!(matches!(
        t.effects.as_slice(),
        &[Effect::Pulse(Line::CalibrationOmbilical, _)]
    ));
}

#[test]
fn aux_output_rejected_in_safe_mode() {
    let t = apply(PadState::new(), &frame_arg(AUX_OUTPUT1, 0x01));
    assert_eq!(t.outcome, Outcome::Rejected(RejectReason::SafeMode));
    assert!(t.effects.is_empty());
}

#[test]
fn aux_output_drives_line_when_live() {
    let t = apply(live_pad(), &frame_arg(AUX_OUTPUT1, 0x01));
    assert_eq!(t.outcome, Outcome::Applied);
    assert_eq!(t.effects.as_slice(), &[Effect::Aux { index: 0, on: true }]);
}

#[test]
fn servo_allowed_even_in_safe_mode() {
    let t = apply(PadState::new(), &frame_arg(SERVO1, 90));
    assert_eq!(t.outcome, Outcome::Applied);
    assert_eq!(
        t.effects.as_slice(),
        &[Effect::Servo { index: 0, angle: ServoAngle::from_raw(90) }]
    );
}

#[test]
fn unknown_opcode_is_noop() {
    let before = PadState::new();
    let t = apply(before, &frame(0x7F));
    assert_eq!(t.outcome, Outcome::Unknown);
    assert_eq!(t.next, before);
    assert!(t.effects.is_empty());
}

// ============================================================================
// Invariants Over Random Command Sequences
// ============================================================================

/// Check every interlock invariant of one state
fn assert_invariants(state: &PadState) {
    assert!(
        !(state.is_filling() && state.is_venting()),
        "filling and venting are mutually exclusive"
    );
    if state.is_safe_mode() {
        assert!(!state.is_armed(), "armed must be false in safe mode");
        assert!(!state.is_filling(), "filling must be false in safe mode");
        assert!(!state.is_venting(), "venting must be false in safe mode");
        assert!(!state.is_firing(), "firing must be false in safe mode");
    }
}

#[test]
fn invariants_hold_over_random_sequences() {
    // Deterministic xorshift so failures reproduce
    let mut rng: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut next = move || {
        rng ^= rng << 13;
        rng ^= rng >> 7;
        rng ^= rng << 17;
        rng
    };

    let mut state = PadState::new();
    for _ in 0..20_000 {
        let opcode = (next() & 0xFF) as u8;
        let arg = (next() & 0xFF) as u8;
        let t = apply(state, &frame_arg(opcode, arg));

        // Firing may only be set at the moment the pad is armed
        if t.next.is_firing() && !state.is_firing() {
            assert!(state.is_armed(), "firing set without arm");
        }

        state = t.next;
        assert_invariants(&state);
    }
}

#[test]
fn rejected_commands_never_mutate_state() {
    let mut rng: u64 = 0x0123_4567_89AB_CDEF;
    let mut next = move || {
        rng ^= rng << 13;
        rng ^= rng >> 7;
        rng ^= rng << 17;
        rng
    };

    let mut state = PadState::new();
    for _ in 0..20_000 {
        let opcode = (next() & 0xFF) as u8;
        let t = apply(state, &frame(opcode));
        match t.outcome {
            Outcome::Rejected(_) | Outcome::Unknown => {
                assert_eq!(t.next, state, "refused command changed state");
                assert!(t.effects.is_empty(), "refused command emitted effects");
            }
            Outcome::Applied => {}
        }
        state = t.next;
    }
}
