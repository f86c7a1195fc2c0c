//! Mock hardware, delay and sink for integration tests.
//!
//! Records every actuator call so tests can assert on the full command
//! history without touching real GPIO/PWM registers.

use embedded_hal::delay::DelayNs;
use toxirover::app::events::AppEvent;
use toxirover::app::ports::{ActuatorPort, EventSink, SensorPort};
use toxirover::drivers::motor::Drive;
use toxirover::sensors::distance::DistanceSample;
use toxirover::sensors::gas::GasReading;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorCall {
    Drive { drive: Drive, speed_pct: u8 },
    Stop,
    Steer(u8),
}

// ── MockHardware ──────────────────────────────────────────────

/// Scripted sensors plus recording actuators.
pub struct MockHardware {
    /// `None` simulates an echo timeout.
    pub range_cm: Option<f32>,
    pub gas_ppm: f32,
    /// FC-22 digital output level.
    pub gas_comparator: bool,
    pub calls: Vec<ActuatorCall>,
    angle: u8,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            range_cm: Some(150.0),
            gas_ppm: 40.0,
            gas_comparator: false,
            calls: Vec::new(),
            angle: 90,
        }
    }

    pub fn drives(&self) -> Vec<(Drive, u8)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::Drive { drive, speed_pct } => Some((*drive, *speed_pct)),
                _ => None,
            })
            .collect()
    }

    /// Motor is running according to the latest drive/stop call.
    pub fn motor_running(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::Drive { speed_pct, .. } => Some(*speed_pct > 0),
                ActuatorCall::Stop => Some(false),
                ActuatorCall::Steer(_) => None,
            })
            .unwrap_or(false)
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn measure_distance(&mut self, now_ms: u64) -> DistanceSample {
        match self.range_cm {
            Some(cm) => DistanceSample::valid(cm, now_ms),
            None => DistanceSample::timeout(now_ms),
        }
    }

    fn read_gas(&mut self) -> GasReading {
        GasReading {
            raw: (self.gas_ppm / 2.0) as u16,
            ppm: self.gas_ppm,
            comparator: self.gas_comparator,
        }
    }
}

impl ActuatorPort for MockHardware {
    fn set_motor_drive(&mut self, drive: Drive, speed_pct: u8) {
        self.calls.push(ActuatorCall::Drive { drive, speed_pct });
    }

    fn stop_motor(&mut self) {
        self.calls.push(ActuatorCall::Stop);
    }

    fn set_steering_angle(&mut self, angle: u8) {
        self.angle = angle.min(180);
        self.calls.push(ActuatorCall::Steer(self.angle));
    }

    fn steering_angle(&self) -> u8 {
        self.angle
    }
}

// ── NoDelay ───────────────────────────────────────────────────

#[derive(Default)]
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
