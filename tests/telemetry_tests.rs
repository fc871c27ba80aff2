//! Telemetry Encoder Tests
//!
//! Tests status bit packing, the state round-trip, and frame assembly
//! from state and link snapshots.

use launchpad_firmware::comms::LinkStatus;
use launchpad_firmware::config::SAFE_EXIT_THRESHOLD;
use launchpad_firmware::control::{apply, PadState};
use launchpad_firmware::telemetry::{
    StatusBits, TelemetryFrame, BIT_ARMED, BIT_FILLING, BIT_FIRING, BIT_SAFE_MODE, BIT_TELEMETRY,
    BIT_VENTING,
};
use launchpad_firmware::types::{CommandFrame, FrameSource};

// ============================================================================
// Status Bit Layout
// ============================================================================

#[test]
fn bit_positions_match_protocol_doc() {
    assert_eq!(BIT_FILLING, 0);
    assert_eq!(BIT_VENTING, 1);
    assert_eq!(BIT_ARMED, 2);
    assert_eq!(BIT_FIRING, 3);
    assert_eq!(BIT_TELEMETRY, 4);
    assert_eq!(BIT_SAFE_MODE, 5);
}

#[test]
fn pack_single_flags() {
    let mut bits = StatusBits::default();
    bits.filling = true;
    assert_eq!(bits.pack(), 0b0000_0001);

    let mut bits = StatusBits::default();
    bits.safe_mode = true;
    assert_eq!(bits.pack(), 0b0010_0000);
}

#[test]
fn pack_default_state_byte() {
    let bits = StatusBits::from_state(&PadState::new());
    // Telemetry enabled and safe mode set at power-up
    assert_eq!(bits.pack(), 0b0011_0000);
}

#[test]
fn unpack_ignores_reserved_bits() {
    let bits = StatusBits::unpack(0b1100_0000);
    assert_eq!(bits, StatusBits::default());
}

// ============================================================================
// Round-trip Property
// ============================================================================

#[test]
fn status_round_trip_every_combination() {
    // Six flags, exhaust all 64 combinations
    for raw in 0u8..64 {
        let bits = StatusBits::unpack(raw);
        assert_eq!(bits.pack(), raw, "byte {raw:#04x} did not round-trip");
    }
}

#[test]
fn state_round_trip_through_wire_byte() {
    let mut state = PadState::new();
    // Exit safe mode, open the fill valve
    for _ in 0..SAFE_EXIT_THRESHOLD {
        state = apply(state, &cmd(0x5A)).next;
    }
    state = apply(state, &cmd(0x61)).next;

    let packed = StatusBits::from_state(&state).pack();
    let recovered = StatusBits::unpack(packed);
    assert_eq!(recovered.filling, state.is_filling());
    assert_eq!(recovered.venting, state.is_venting());
    assert_eq!(recovered.armed, state.is_armed());
    assert_eq!(recovered.firing, state.is_firing());
    assert_eq!(recovered.telemetry_enabled, state.is_telemetry_enabled());
    assert_eq!(recovered.safe_mode, state.is_safe_mode());
}

fn cmd(opcode: u8) -> CommandFrame {
    CommandFrame::new(FrameSource::SerialController, [opcode, 0x00])
}

// ============================================================================
// Frame Assembly
// ============================================================================

#[test]
fn build_reflects_state() {
    let frame = TelemetryFrame::build(&PadState::new(), &LinkStatus::new(true));
    assert!(frame.status.safe_mode);
    assert!(frame.status.telemetry_enabled);
    assert!(!frame.status.armed);
}

#[test]
fn rssi_passed_through_while_radio_ready() {
    let mut link = LinkStatus::new(true);
    link.last_rssi = -87;
    let frame = TelemetryFrame::build(&PadState::new(), &link);
    assert_eq!(frame.rssi, -87);
}

#[test]
fn rssi_zeroed_while_radio_down() {
    let mut link = LinkStatus::new(false);
    link.last_rssi = -87;
    let frame = TelemetryFrame::build(&PadState::new(), &link);
    assert_eq!(frame.rssi, 0);
}

#[test]
fn battery_readings_carried_verbatim() {
    let mut link = LinkStatus::new(true);
    link.battery.push(12_600).unwrap();
    link.battery.push(8_150).unwrap();
    let frame = TelemetryFrame::build(&PadState::new(), &link);
    assert_eq!(frame.battery.as_slice(), &[12_600, 8_150]);
}

#[test]
fn build_is_pure_projection() {
    // Two builds from the same inputs are identical
    let link = LinkStatus::new(true);
    let state = PadState::new();
    assert_eq!(
        TelemetryFrame::build(&state, &link),
        TelemetryFrame::build(&state, &link)
    );
}
