//! Output controller
//!
//! Realizes accepted transitions as physical line writes. Writes are
//! idempotent with respect to already-applied state: a level that is
//! already on the wire is not rewritten. Auxiliary outputs carry an
//! auto-off watchdog so a stuck-open actuator cannot outlive a lost link.

use crate::config::{AUX_AUTO_OFF_MS, NUM_AUX_OUTPUTS, NUM_SERVOS};
use crate::types::ServoAngle;

use super::state::Effect;

/// Dedicated output lines of the controller board
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Line {
    /// Fill solenoid relay
    Fill,
    /// Vent solenoid relay
    Vent,
    /// Ignition relay
    Ignition,
    /// Telemetry ombilical to the rocket
    TelemetryOmbilical,
    /// Calibration ombilical to the rocket
    CalibrationOmbilical,
}

impl Line {
    const COUNT: usize = 5;

    const fn index(self) -> usize {
        match self {
            Self::Fill => 0,
            Self::Vent => 1,
            Self::Ignition => 2,
            Self::TelemetryOmbilical => 3,
            Self::CalibrationOmbilical => 4,
        }
    }

    /// Electrical level for a logically active line
    ///
    /// The solenoid and ignition relays are wired active-low; the
    /// ombilicals idle high and are driven per their own polarity.
    #[must_use]
    pub const fn level_when_active(self) -> Level {
        match self {
            Self::Fill | Self::Vent | Self::Ignition | Self::CalibrationOmbilical => Level::Low,
            Self::TelemetryOmbilical => Level::High,
        }
    }

    /// Electrical level for a logically inactive line
    #[must_use]
    pub const fn level_when_inactive(self) -> Level {
        self.level_when_active().inverted()
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Line {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Fill => defmt::write!(f, "FILL"),
            Self::Vent => defmt::write!(f, "VENT"),
            Self::Ignition => defmt::write!(f, "FIRE"),
            Self::TelemetryOmbilical => defmt::write!(f, "OMBI-TM"),
            Self::CalibrationOmbilical => defmt::write!(f, "OMBI-CA"),
        }
    }
}

/// Electrical pin level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// Driven low
    Low,
    /// Driven high
    High,
}

impl Level {
    /// The opposite level
    #[must_use]
    pub const fn inverted(self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Level {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Low => defmt::write!(f, "LOW"),
            Self::High => defmt::write!(f, "HIGH"),
        }
    }
}

/// Hardware seam for the physical outputs
///
/// The embedded build drives GPIO and PWM behind this trait; host tests
/// substitute a recording mock. Writes are assumed to always succeed,
/// there is no retry path.
pub trait OutputLines {
    /// Drive a dedicated line to an electrical level
    fn set_line(&mut self, line: Line, level: Level);

    /// Pulse a dedicated line to its active level for a bounded duration
    fn pulse_line(&mut self, line: Line, duration_ms: u32);

    /// Drive an auxiliary output
    fn set_aux(&mut self, index: u8, level: Level);

    /// Position a servo channel
    fn set_servo(&mut self, index: u8, angle: ServoAngle);
}

/// Tracks one auxiliary output for the auto-off watchdog
#[derive(Clone, Copy, Debug, Default)]
struct AuxSlot {
    on: bool,
    /// Activation timestamp, monotonic milliseconds
    since_ms: u64,
}

/// Applies transition effects to the physical lines
pub struct OutputController<L> {
    lines: L,
    applied: [Option<Level>; Line::COUNT],
    aux: [AuxSlot; NUM_AUX_OUTPUTS],
    servo_applied: [Option<ServoAngle>; NUM_SERVOS],
}

impl<L: OutputLines> OutputController<L> {
    /// Take ownership of the lines and drive everything to its resting
    /// state: relays released, telemetry ombilical enabled, calibration
    /// ombilical idle, aux outputs off.
    pub fn new(mut lines: L) -> Self {
        lines.set_line(Line::Fill, Line::Fill.level_when_inactive());
        lines.set_line(Line::Vent, Line::Vent.level_when_inactive());
        lines.set_line(Line::Ignition, Line::Ignition.level_when_inactive());
        lines.set_line(Line::TelemetryOmbilical, Line::TelemetryOmbilical.level_when_active());
        lines.set_line(
            Line::CalibrationOmbilical,
            Line::CalibrationOmbilical.level_when_inactive(),
        );
        for index in 0..NUM_AUX_OUTPUTS {
            lines.set_aux(index as u8, Level::Low);
        }

        Self {
            lines,
            applied: [
                Some(Line::Fill.level_when_inactive()),
                Some(Line::Vent.level_when_inactive()),
                Some(Line::Ignition.level_when_inactive()),
                Some(Line::TelemetryOmbilical.level_when_active()),
                Some(Line::CalibrationOmbilical.level_when_inactive()),
            ],
            aux: [AuxSlot::default(); NUM_AUX_OUTPUTS],
            servo_applied: [None; NUM_SERVOS],
        }
    }

    /// Realize the effects of one transition
    pub fn apply(&mut self, effects: &[Effect], now_ms: u64) {
        for effect in effects {
            match *effect {
                Effect::Line(line, active) => self.write_line(line, active),
                Effect::Pulse(line, duration_ms) => self.lines.pulse_line(line, duration_ms),
                Effect::Aux { index, on } => self.write_aux(index, on, now_ms),
                Effect::Servo { index, angle } => self.write_servo(index, angle),
            }
        }
    }

    /// Watchdog sweep, run once per control-loop tick
    ///
    /// Forces off any auxiliary output that has been active longer than
    /// the auto-off duration, regardless of what switched it on.
    pub fn tick(&mut self, now_ms: u64) {
        for index in 0..NUM_AUX_OUTPUTS {
            let slot = self.aux[index];
            if slot.on && now_ms.saturating_sub(slot.since_ms) >= AUX_AUTO_OFF_MS {
                self.write_aux(index as u8, false, now_ms);
            }
        }
    }

    /// Whether an auxiliary output is currently driven on
    #[must_use]
    pub fn aux_active(&self, index: u8) -> bool {
        self.aux
            .get(usize::from(index))
            .map_or(false, |slot| slot.on)
    }

    /// Access the underlying lines (mock inspection in tests)
    #[must_use]
    pub fn lines(&self) -> &L {
        &self.lines
    }

    fn write_line(&mut self, line: Line, active: bool) {
        let level = if active {
            line.level_when_active()
        } else {
            line.level_when_inactive()
        };
        if self.applied[line.index()] == Some(level) {
            return;
        }
        self.lines.set_line(line, level);
        self.applied[line.index()] = Some(level);
    }

    fn write_aux(&mut self, index: u8, on: bool, now_ms: u64) {
        let Some(slot) = self.aux.get_mut(usize::from(index)) else {
            return;
        };
        if slot.on == on {
            return;
        }
        slot.on = on;
        slot.since_ms = now_ms;
        let level = if on { Level::High } else { Level::Low };
        self.lines.set_aux(index, level);
    }

    fn write_servo(&mut self, index: u8, angle: ServoAngle) {
        let Some(slot) = self.servo_applied.get_mut(usize::from(index)) else {
            return;
        };
        if *slot == Some(angle) {
            return;
        }
        *slot = Some(angle);
        self.lines.set_servo(index, angle);
    }
}
