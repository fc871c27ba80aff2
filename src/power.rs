//! Power monitoring
//!
//! Converts raw ADC samples from the pad battery sense inputs into the
//! millivolt readings carried in telemetry.

#[cfg(feature = "embedded")]
use micromath::F32Ext;

/// Battery voltage reading
#[derive(Clone, Copy, Debug)]
pub struct BatteryVoltage {
    /// Raw ADC reading (12-bit)
    raw: u16,
    /// Voltage divider ratio
    divider_ratio: f32,
    /// Reference voltage
    vref: f32,
}

impl BatteryVoltage {
    /// Create from ADC reading
    #[must_use]
    pub const fn from_adc(raw: u16, divider_ratio: f32, vref: f32) -> Self {
        Self {
            raw,
            divider_ratio,
            vref,
        }
    }

    /// Get voltage in volts
    #[must_use]
    pub fn voltage(&self) -> f32 {
        (f32::from(self.raw) / 4095.0) * self.vref * self.divider_ratio
    }

    /// Voltage in millivolts, as packed into the telemetry frame
    #[must_use]
    pub fn millivolts(&self) -> i16 {
        let mv = (self.voltage() * 1000.0).round();
        mv.clamp(0.0, f32::from(i16::MAX)) as i16
    }

    /// Get battery percentage (for `LiPo` 3.0-4.2V per cell)
    #[must_use]
    pub fn percentage(&self, cells: u8) -> u8 {
        let v = self.voltage();
        let v_per_cell = v / f32::from(cells);

        // LiPo discharge curve approximation
        let pct = if v_per_cell >= 4.2 {
            100.0
        } else if v_per_cell <= 3.0 {
            0.0
        } else {
            ((v_per_cell - 3.0) / 1.2) * 100.0
        };

        pct as u8
    }

    /// Check if battery is low
    #[must_use]
    pub fn is_low(&self, cells: u8) -> bool {
        self.voltage() / f32::from(cells) < 3.3
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for BatteryVoltage {
    fn format(&self, f: defmt::Formatter) {
        let v = self.voltage();
        let whole = v as u32;
        let frac = ((v - whole as f32) * 100.0) as u32;
        defmt::write!(f, "{}.{:02}V", whole, frac);
    }
}
