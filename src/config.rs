//! System configuration parameters
//!
//! All tunable parameters for the ToxiRover control layer.  Defaults match
//! the reference deployment.  Avoidance tuning can be overridden at runtime
//! by operator commands; every override must pass [`SystemConfig::validate`].

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sensors::distance::DistanceThresholds;
use crate::sensors::gas::GasThresholds;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Distance classification ---
    /// Below this range (cm) the zone is `Danger`.
    pub danger_threshold_cm: f32,
    /// Below this range (cm) the zone is `Warning`.
    pub warning_threshold_cm: f32,
    /// At or above this range (cm) the path ahead is reported clear.
    pub safe_confirm_cm: f32,
    /// Maximum echo wait before a sample is marked invalid (µs).
    pub echo_timeout_us: u32,

    // --- Avoidance maneuver ---
    /// Minimum interval between two maneuver triggers (ms).
    pub cooldown_ms: u64,
    /// How long the reverse/alert maneuver is held (ms).
    pub maneuver_duration_ms: u64,
    /// Motor speed during the maneuver (0-100%).
    pub maneuver_speed_pct: u8,
    /// Steering angle held during the maneuver (degrees).
    pub alert_angle: u8,
    /// Neutral steering angle (degrees).
    pub center_angle: u8,

    // --- Operator drive ---
    /// Motor speed applied to operator motion commands (0-100%).
    pub drive_speed_pct: u8,

    // --- Gas ---
    /// Linear ADC count → ppm factor.
    pub gas_ppm_per_count: f32,
    /// Concentration (ppm) above which gas counts as detected even with
    /// the comparator low.
    pub gas_detect_ppm: f32,
    /// Concentration (ppm) at which the level becomes `Warning`.
    pub gas_warning_ppm: f32,
    /// Concentration (ppm) at which the level becomes `Danger`.
    pub gas_danger_ppm: f32,

    // --- Timing ---
    /// Control loop period (ms).
    pub control_loop_interval_ms: u32,
    /// Telemetry push interval (ms).
    pub telemetry_interval_ms: u64,
    /// Operator command poll interval (ms).
    pub command_poll_interval_ms: u64,
    /// Interval between reconnect attempts while the link is down (ms).
    pub reconnect_interval_ms: u64,
    /// Fixed wait inside each reconnect attempt before probing (ms).
    pub reconnect_backoff_ms: u32,
    /// Per-request HTTP timeout for the remote store (ms).
    pub http_timeout_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Distance
            danger_threshold_cm: 20.0,
            warning_threshold_cm: 50.0,
            safe_confirm_cm: 100.0,
            echo_timeout_us: 30_000,

            // Avoidance
            cooldown_ms: 2_000,
            maneuver_duration_ms: 500,
            maneuver_speed_pct: 100,
            alert_angle: 180,
            center_angle: 90,

            // Operator drive
            drive_speed_pct: 80,

            // Gas
            gas_ppm_per_count: 2.0,
            gas_detect_ppm: 100.0,
            gas_warning_ppm: 300.0,
            gas_danger_ppm: 500.0,

            // Timing
            control_loop_interval_ms: 100,   // 10 Hz
            telemetry_interval_ms: 2_000,    // 0.5 Hz
            command_poll_interval_ms: 500,   // 2 Hz
            reconnect_interval_ms: 2_000,
            reconnect_backoff_ms: 1_000,
            http_timeout_ms: 5_000,
        }
    }
}

impl SystemConfig {
    /// Distance classification thresholds.
    pub fn distance_thresholds(&self) -> DistanceThresholds {
        DistanceThresholds {
            danger_cm: self.danger_threshold_cm,
            warning_cm: self.warning_threshold_cm,
            safe_confirm_cm: self.safe_confirm_cm,
        }
    }

    /// Gas classification thresholds.
    pub fn gas_thresholds(&self) -> GasThresholds {
        GasThresholds {
            warning_ppm: self.gas_warning_ppm,
            danger_ppm: self.gas_danger_ppm,
        }
    }

    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.danger_threshold_cm > 0.0) {
            return Err(ConfigError::Invalid("danger_threshold_cm must be positive"));
        }
        if self.danger_threshold_cm >= self.warning_threshold_cm {
            return Err(ConfigError::Invalid(
                "danger_threshold_cm must be below warning_threshold_cm",
            ));
        }
        if self.warning_threshold_cm > self.safe_confirm_cm {
            return Err(ConfigError::Invalid(
                "warning_threshold_cm must not exceed safe_confirm_cm",
            ));
        }
        if self.echo_timeout_us == 0 {
            return Err(ConfigError::Invalid("echo_timeout_us must be non-zero"));
        }
        if self.maneuver_duration_ms == 0 {
            return Err(ConfigError::Invalid("maneuver_duration_ms must be non-zero"));
        }
        if self.alert_angle > 180 || self.center_angle > 180 {
            return Err(ConfigError::Invalid("servo angles must be within 0..=180"));
        }
        if self.maneuver_speed_pct > 100 || self.drive_speed_pct > 100 {
            return Err(ConfigError::Invalid("speed percentages must be within 0..=100"));
        }
        if !(self.gas_ppm_per_count > 0.0) {
            return Err(ConfigError::Invalid("gas_ppm_per_count must be positive"));
        }
        if !(self.gas_detect_ppm < self.gas_warning_ppm) {
            return Err(ConfigError::Invalid(
                "gas_detect_ppm must be below gas_warning_ppm",
            ));
        }
        if self.gas_warning_ppm >= self.gas_danger_ppm {
            return Err(ConfigError::Invalid(
                "gas_warning_ppm must be below gas_danger_ppm",
            ));
        }
        if self.control_loop_interval_ms == 0
            || self.telemetry_interval_ms == 0
            || self.command_poll_interval_ms == 0
            || self.reconnect_interval_ms == 0
        {
            return Err(ConfigError::Invalid("intervals must be non-zero"));
        }
        if self.command_poll_interval_ms >= self.telemetry_interval_ms {
            return Err(ConfigError::Invalid(
                "command_poll_interval_ms must be tighter than telemetry_interval_ms",
            ));
        }
        Ok(())
    }
}
