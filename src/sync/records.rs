//! Records exchanged with the remote store.

use heapless::String as HString;
use serde::Serialize;
use serde_json::{Value, json};

use crate::app::commands::MotionCommand;
use crate::config::SystemConfig;
use crate::sensors::distance::HazardZone;
use crate::sensors::gas::GasLevel;

/// Longest motion request accepted from the store.
pub const MAX_MOTION_LEN: usize = 16;

pub type MotionRequest = HString<MAX_MOTION_LEN>;

// ── Connection ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
            Self::Error => "ERROR",
        }
    }
}

impl core::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Telemetry ────────────────────────────────────────────────

/// Write-only projection of the controller state, built once per push.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySnapshot {
    pub gas_ppm: f32,
    pub gas_level: GasLevel,
    pub gas_detected: bool,
    /// Last valid range, or `-1.0` before the first valid echo.
    pub distance_cm: f32,
    pub zone: HazardZone,
    pub obstacle_detected: bool,
    pub clear_path: bool,
    pub motion: MotionCommand,
    pub servo_angle: u8,
    pub timestamp_ms: u64,
}

/// Body of the `/sensor_data` aggregate node.
#[derive(Debug, Serialize)]
pub struct SensorDataRecord {
    pub gas_concentration: f32,
    pub gas_level: GasLevel,
    pub gas_detected: bool,
    pub distance: f32,
    pub distance_status: HazardZone,
    pub obstacle_detected: bool,
    pub clear_path: bool,
    pub motion: MotionCommand,
    pub servo_angle: u8,
    pub timestamp: u64,
}

impl From<&TelemetrySnapshot> for SensorDataRecord {
    fn from(s: &TelemetrySnapshot) -> Self {
        Self {
            gas_concentration: s.gas_ppm,
            gas_level: s.gas_level,
            gas_detected: s.gas_detected,
            distance: s.distance_cm,
            distance_status: s.zone,
            obstacle_detected: s.obstacle_detected,
            clear_path: s.clear_path,
            motion: s.motion,
            servo_angle: s.servo_angle,
            timestamp: s.timestamp_ms,
        }
    }
}

// ── Alerts ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    ObstacleDetected,
    HighGasLevel,
    EmergencyStop,
    SystemStartup,
    ConnectionLost,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ObstacleDetected => "OBSTACLE_DETECTED",
            Self::HighGasLevel => "HIGH_GAS_LEVEL",
            Self::EmergencyStop => "EMERGENCY_STOP",
            Self::SystemStartup => "SYSTEM_STARTUP",
            Self::ConnectionLost => "CONNECTION_LOST",
        }
    }
}

/// Append-only alert record.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub message: String,
    pub timestamp_ms: u64,
}

impl AlertEvent {
    pub fn new(kind: AlertKind, message: impl Into<String>, timestamp_ms: u64) -> Self {
        Self {
            kind,
            message: message.into(),
            timestamp_ms,
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "type": self.kind.as_str(),
            "message": self.message,
            "timestamp": self.timestamp_ms,
        })
    }
}

// ── Commands ─────────────────────────────────────────────────

/// Pending avoidance overrides from `/ultrasonic_servo/*`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AvoidanceTuning {
    pub obstacle_threshold_cm: Option<f32>,
    pub motor_speed_pct: Option<u8>,
    pub rotation_duration_ms: Option<u64>,
}

impl AvoidanceTuning {
    pub fn is_empty(&self) -> bool {
        self.obstacle_threshold_cm.is_none()
            && self.motor_speed_pct.is_none()
            && self.rotation_duration_ms.is_none()
    }

    /// One single-field tuning per present override.
    pub fn split(&self) -> impl Iterator<Item = AvoidanceTuning> {
        let threshold = self.obstacle_threshold_cm.map(|cm| Self {
            obstacle_threshold_cm: Some(cm),
            ..Self::default()
        });
        let speed = self.motor_speed_pct.map(|pct| Self {
            motor_speed_pct: Some(pct),
            ..Self::default()
        });
        let duration = self.rotation_duration_ms.map(|ms| Self {
            rotation_duration_ms: Some(ms),
            ..Self::default()
        });
        [threshold, speed, duration].into_iter().flatten()
    }

    /// `base` with the present overrides applied.  The result still has to
    /// pass [`SystemConfig::validate`].
    pub fn apply_to(&self, base: &SystemConfig) -> SystemConfig {
        let mut next = base.clone();
        if let Some(cm) = self.obstacle_threshold_cm {
            next.danger_threshold_cm = cm;
        }
        if let Some(pct) = self.motor_speed_pct {
            next.maneuver_speed_pct = pct;
        }
        if let Some(ms) = self.rotation_duration_ms {
            next.maneuver_duration_ms = ms;
        }
        next
    }
}

/// Everything surfaced by one command pull.  Each field was cleared
/// remotely (or is queued for clearing) before it was returned.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RemoteCommand {
    pub emergency_stop: bool,
    /// Upper-cased motion request; parsed by the control loop.
    pub motion_command: Option<MotionRequest>,
    pub servo_angle_request: Option<u8>,
    pub reset: bool,
    pub tuning: AvoidanceTuning,
}

impl RemoteCommand {
    pub fn is_empty(&self) -> bool {
        !self.emergency_stop
            && self.motion_command.is_none()
            && self.servo_angle_request.is_none()
            && !self.reset
            && self.tuning.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensor_data_field_names() {
        let snap = TelemetrySnapshot {
            gas_ppm: 120.0,
            gas_level: GasLevel::Safe,
            gas_detected: true,
            distance_cm: 42.0,
            zone: HazardZone::Warning,
            obstacle_detected: false,
            clear_path: false,
            motion: MotionCommand::Forward,
            servo_angle: 90,
            timestamp_ms: 7_000,
        };
        let v = serde_json::to_value(SensorDataRecord::from(&snap)).unwrap();
        assert_eq!(v["distance_status"], "WARNING");
        assert_eq!(v["motion"], "FORWARD");
        assert_eq!(v["servo_angle"], 90);
        assert_eq!(v["timestamp"], 7_000);
        assert_eq!(v["gas_level"], "SAFE");
        assert_eq!(v["gas_detected"], true);
    }

    #[test]
    fn alert_value_shape() {
        let a = AlertEvent::new(AlertKind::HighGasLevel, "gas 640ppm", 12);
        let v = a.to_value();
        assert_eq!(v["type"], "HIGH_GAS_LEVEL");
        assert_eq!(v["message"], "gas 640ppm");
        assert_eq!(v["timestamp"], 12);
    }

    #[test]
    fn tuning_overrides_only_present_fields() {
        let base = SystemConfig::default();
        let t = AvoidanceTuning {
            obstacle_threshold_cm: Some(30.0),
            ..Default::default()
        };
        let next = t.apply_to(&base);
        assert_eq!(next.danger_threshold_cm, 30.0);
        assert_eq!(next.maneuver_speed_pct, base.maneuver_speed_pct);
        assert_eq!(next.maneuver_duration_ms, base.maneuver_duration_ms);
    }

    #[test]
    fn split_yields_one_override_each() {
        let t = AvoidanceTuning {
            obstacle_threshold_cm: Some(50.0),
            motor_speed_pct: None,
            rotation_duration_ms: Some(800),
        };
        let parts: Vec<_> = t.split().collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].obstacle_threshold_cm, Some(50.0));
        assert_eq!(parts[0].rotation_duration_ms, None);
        assert_eq!(parts[1].rotation_duration_ms, Some(800));
        assert_eq!(parts[1].obstacle_threshold_cm, None);
        assert_eq!(AvoidanceTuning::default().split().count(), 0);
    }

    #[test]
    fn empty_command() {
        assert!(RemoteCommand::default().is_empty());
        let c = RemoteCommand {
            reset: true,
            ..Default::default()
        };
        assert!(!c.is_empty());
    }
}
