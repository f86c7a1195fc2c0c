//! Hardware adapter. Bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`] and both actuator drivers, exposing them
//! through [`SensorPort`] and [`ActuatorPort`].  This is the only
//! module in the system that touches actual hardware.  On non-espidf
//! targets, the underlying drivers use cfg-gated simulation stubs.

use embedded_hal::delay::DelayNs;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::motor::{Drive, MotorDriver, MotorState};
use crate::drivers::servo::ServoDriver;
use crate::sensors::SensorHub;
use crate::sensors::distance::DistanceSample;
use crate::sensors::gas::GasReading;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<D> {
    sensor_hub: SensorHub<D>,
    motor: MotorDriver,
    servo: ServoDriver,
}

impl<D: DelayNs> HardwareAdapter<D> {
    pub fn new(sensor_hub: SensorHub<D>, motor: MotorDriver, servo: ServoDriver) -> Self {
        Self {
            sensor_hub,
            motor,
            servo,
        }
    }

    pub fn motor_state(&self) -> MotorState {
        self.motor.state()
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<D: DelayNs> SensorPort for HardwareAdapter<D> {
    fn measure_distance(&mut self, now_ms: u64) -> DistanceSample {
        self.sensor_hub.measure_distance(now_ms)
    }

    fn read_gas(&mut self) -> GasReading {
        self.sensor_hub.read_gas()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<D: DelayNs> ActuatorPort for HardwareAdapter<D> {
    fn set_motor_drive(&mut self, drive: Drive, speed_pct: u8) {
        self.motor.set(drive, speed_pct);
    }

    fn stop_motor(&mut self) {
        self.motor.stop();
    }

    fn set_steering_angle(&mut self, angle: u8) {
        self.servo.set_angle(angle);
    }

    fn steering_angle(&self) -> u8 {
        self.servo.angle()
    }
}
