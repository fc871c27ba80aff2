//! Physical output lines
//!
//! Board support implementation of the output-controller seam: relays
//! and ombilicals on GPIO, servo channels on 50 Hz PWM.

use embassy_stm32::gpio::Output;
use embassy_time::{block_for, Duration};
use embedded_hal::pwm::SetDutyCycle;

use crate::config::{NUM_AUX_OUTPUTS, NUM_SERVOS};
use crate::control::{Level, Line, OutputLines};
use crate::types::ServoAngle;

use super::servo::{ServoPulse, SERVO_PERIOD_US};

/// The controller board's output lines
pub struct PadLines<'d, P> {
    fill: Output<'d>,
    vent: Output<'d>,
    ignition: Output<'d>,
    telemetry: Output<'d>,
    calibration: Output<'d>,
    aux: [Output<'d>; NUM_AUX_OUTPUTS],
    servos: [P; NUM_SERVOS],
}

impl<'d, P: SetDutyCycle> PadLines<'d, P> {
    /// Bundle the board's output pins and servo PWM channels
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        fill: Output<'d>,
        vent: Output<'d>,
        ignition: Output<'d>,
        telemetry: Output<'d>,
        calibration: Output<'d>,
        aux: [Output<'d>; NUM_AUX_OUTPUTS],
        servos: [P; NUM_SERVOS],
    ) -> Self {
        Self {
            fill,
            vent,
            ignition,
            telemetry,
            calibration,
            aux,
            servos,
        }
    }

    fn pin(&mut self, line: Line) -> &mut Output<'d> {
        match line {
            Line::Fill => &mut self.fill,
            Line::Vent => &mut self.vent,
            Line::Ignition => &mut self.ignition,
            Line::TelemetryOmbilical => &mut self.telemetry,
            Line::CalibrationOmbilical => &mut self.calibration,
        }
    }
}

const fn pin_level(level: Level) -> embassy_stm32::gpio::Level {
    match level {
        Level::Low => embassy_stm32::gpio::Level::Low,
        Level::High => embassy_stm32::gpio::Level::High,
    }
}

impl<P: SetDutyCycle> OutputLines for PadLines<'_, P> {
    fn set_line(&mut self, line: Line, level: Level) {
        self.pin(line).set_level(pin_level(level));
    }

    fn pulse_line(&mut self, line: Line, duration_ms: u32) {
        let active = line.level_when_active();
        self.pin(line).set_level(pin_level(active));
        block_for(Duration::from_millis(u64::from(duration_ms)));
        self.pin(line).set_level(pin_level(active.inverted()));
    }

    fn set_aux(&mut self, index: u8, level: Level) {
        if let Some(pin) = self.aux.get_mut(usize::from(index)) {
            pin.set_level(pin_level(level));
        }
    }

    fn set_servo(&mut self, index: u8, angle: ServoAngle) {
        if let Some(channel) = self.servos.get_mut(usize::from(index)) {
            let pulse = ServoPulse::from_angle(angle);
            // Line writes are assumed to succeed, no retry path
            let _ = channel.set_duty_cycle_fraction(pulse.as_us(), SERVO_PERIOD_US);
        }
    }
}
