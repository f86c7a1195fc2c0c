//! HC-SR04 ultrasonic range finder driver.
//!
//! Sends a 10 µs trigger pulse and times the echo.  The round-trip is
//! blocking and bounded by `echo_timeout_us`; a missing echo yields an
//! invalid [`DistanceSample`] rather than an error, so the classifier maps
//! it to `HazardZone::Error`.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the trigger pin and measures the echo with
//! `hw_init::pulse_in`.
//! On host/test: echo width comes from a static `AtomicU32` (0 = timeout).

use embedded_hal::delay::DelayNs;
use log::debug;

use crate::drivers::hw_init;
use crate::error::SensorError;
use crate::sensors::distance::DistanceSample;

/// Speed of sound, cm per µs (≈343 m/s at 20 °C).
const SOUND_CM_PER_US: f32 = 0.034;

/// Convert an echo pulse width to a one-way range.
pub fn echo_to_cm(pulse_us: u32) -> f32 {
    pulse_us as f32 * SOUND_CM_PER_US / 2.0
}

pub struct UltrasonicSensor {
    trig_gpio: i32,
    echo_gpio: i32,
    timeout_us: u32,
}

impl UltrasonicSensor {
    pub fn new(trig_gpio: i32, echo_gpio: i32, timeout_us: u32) -> Self {
        Self {
            trig_gpio,
            echo_gpio,
            timeout_us,
        }
    }

    /// Perform one blocking measurement.
    pub fn measure(&mut self, delay: &mut impl DelayNs, now_ms: u64) -> DistanceSample {
        hw_init::gpio_write(self.trig_gpio, false);
        delay.delay_us(2);
        hw_init::gpio_write(self.trig_gpio, true);
        delay.delay_us(10);
        hw_init::gpio_write(self.trig_gpio, false);

        match hw_init::pulse_in(self.echo_gpio, self.timeout_us) {
            Some(width_us) => DistanceSample::valid(echo_to_cm(width_us), now_ms),
            None => {
                debug!("ultrasonic: {} (>{}us)", SensorError::EchoTimeout, self.timeout_us);
                DistanceSample::timeout(now_ms)
            }
        }
    }
}
