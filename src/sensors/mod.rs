//! Sensor subsystem: individual drivers, the distance classifier, and
//! the aggregating [`SensorHub`].

pub mod distance;
pub mod gas;
pub mod ultrasonic;

use embedded_hal::delay::DelayNs;

use distance::DistanceSample;
use gas::{GasReading, GasSensor};
use ultrasonic::UltrasonicSensor;

/// Aggregates the sensor drivers.
pub struct SensorHub<D> {
    pub ultrasonic: UltrasonicSensor,
    pub gas: GasSensor,
    /// Microsecond delay used for the trigger pulse.
    delay: D,
}

impl<D: DelayNs> SensorHub<D> {
    /// Pass in pre-built drivers (built in main where pin ownership is
    /// established).
    pub fn new(ultrasonic: UltrasonicSensor, gas: GasSensor, delay: D) -> Self {
        Self {
            ultrasonic,
            gas,
            delay,
        }
    }

    /// One blocking distance round-trip.  Timeouts come back as invalid
    /// samples, never as errors.
    pub fn measure_distance(&mut self, now_ms: u64) -> DistanceSample {
        self.ultrasonic.measure(&mut self.delay, now_ms)
    }

    pub fn read_gas(&mut self) -> GasReading {
        self.gas.read()
    }
}
