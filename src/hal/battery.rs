//! Battery sense ADC
//!
//! Samples the pad battery voltage dividers for telemetry.

use embassy_stm32::adc::{Adc, AdcChannel, SampleTime};
use embassy_stm32::peripherals::ADC1;

use crate::config::{ADC_VREF, BATTERY_DIVIDER_RATIO};
use crate::power::BatteryVoltage;

/// Battery sense driver over ADC1
pub struct BatterySense<'d> {
    adc: Adc<'d, ADC1>,
}

impl BatterySense<'_> {
    /// Create a new battery sense driver
    #[must_use]
    pub fn new(adc: ADC1) -> Self {
        let adc = Adc::new(adc);
        Self { adc }
    }

    /// Configure the ADC for slow, quiet sampling
    pub fn configure(&mut self) {
        self.adc.set_sample_time(SampleTime::CYCLES247_5);
    }

    /// Sample one battery input
    pub fn read<T: AdcChannel<ADC1>>(&mut self, channel: &mut T) -> BatteryVoltage {
        let raw = self.adc.blocking_read(channel);
        BatteryVoltage::from_adc(raw, BATTERY_DIVIDER_RATIO, ADC_VREF)
    }
}
