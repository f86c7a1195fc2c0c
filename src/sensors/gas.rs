//! FC-22 (MQ-series) gas sensor driver.
//!
//! Reads the analog output through an ADC channel, converts it to an
//! approximate concentration with a linear factor, and classifies it.
//! The module's on-board comparator output (DO, active high once the
//! trim-pot threshold is crossed) is sampled alongside.
//! The classifier has no temporal state.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the ADC via the oneshot API (initialised by hw_init)
//! and the comparator with `hw_init::gpio_read`.
//! On host/test: reads from static atomics for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use serde::{Deserialize, Serialize};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

#[cfg(not(target_os = "espidf"))]
static SIM_GAS_ADC: AtomicU16 = AtomicU16::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_gas_adc(raw: u16) {
    SIM_GAS_ADC.store(raw, Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
static SIM_GAS_DO: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_gas_comparator(high: bool) {
    SIM_GAS_DO.store(high, Ordering::Relaxed);
}

/// Classified gas concentration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GasLevel {
    Safe,
    Warning,
    Danger,
}

impl GasLevel {
    /// Two comparisons: anything below the warning threshold is `Safe`.
    pub fn classify(ppm: f32, thresholds: &GasThresholds) -> Self {
        if ppm >= thresholds.danger_ppm {
            Self::Danger
        } else if ppm >= thresholds.warning_ppm {
            Self::Warning
        } else {
            Self::Safe
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Warning => "WARNING",
            Self::Danger => "DANGER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasThresholds {
    pub warning_ppm: f32,
    pub danger_ppm: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasReading {
    pub raw: u16,
    pub ppm: f32,
    /// Comparator output was high.
    pub comparator: bool,
}

impl GasReading {
    /// Gas is present: the comparator tripped or the concentration is
    /// above `detect_ppm`.
    pub fn detected(&self, detect_ppm: f32) -> bool {
        self.comparator || self.ppm > detect_ppm
    }
}

pub struct GasSensor {
    ppm_per_count: f32,
    _adc_channel: u32,
    _digital_gpio: i32,
}

impl GasSensor {
    pub fn new(adc_channel: u32, digital_gpio: i32, ppm_per_count: f32) -> Self {
        Self {
            ppm_per_count,
            _adc_channel: adc_channel,
            _digital_gpio: digital_gpio,
        }
    }

    pub fn read(&mut self) -> GasReading {
        let raw = self.read_adc();
        GasReading {
            raw,
            ppm: raw_to_ppm(raw, self.ppm_per_count),
            comparator: self.read_comparator(),
        }
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> u16 {
        hw_init::adc1_read(self._adc_channel)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> u16 {
        SIM_GAS_ADC.load(Ordering::Relaxed)
    }

    #[cfg(target_os = "espidf")]
    fn read_comparator(&self) -> bool {
        hw_init::gpio_read(self._digital_gpio)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_comparator(&self) -> bool {
        SIM_GAS_DO.load(Ordering::Relaxed)
    }
}

/// Linear conversion; the factor depends on the sensor module.
pub fn raw_to_ppm(raw: u16, ppm_per_count: f32) -> f32 {
    f32::from(raw) * ppm_per_count
}
