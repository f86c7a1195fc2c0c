//! Remote store layout.

// ── Telemetry (device → store) ───────────────────────────────

pub const DISTANCE: &str = "/ultrasonic_distance";
pub const GAS_PPM: &str = "/gas_data/ppm";
pub const MOTION_CURRENT: &str = "/motion_command/current";
pub const SERVO_ANGLE: &str = "/servo/angle";
pub const SENSOR_DATA: &str = "/sensor_data";
pub const STATUS: &str = "/status";

// ── Alerts ───────────────────────────────────────────────────

pub const ALERTS: &str = "/alerts";
pub const ALERT_LAST_KIND: &str = "/alerts/last_alert";
pub const ALERT_LAST_MESSAGE: &str = "/alerts/last_message";
pub const ALERT_LAST_TIMESTAMP: &str = "/alerts/last_timestamp";

// ── Commands (operator → device, delete-after-read) ──────────

pub const EMERGENCY_STOP: &str = "/emergency_stop";
pub const MOTION_REQUEST: &str = "/motion_command/request";
pub const SERVO_REQUEST: &str = "/servo/request";
pub const AVOIDANCE_RESET: &str = "/ultrasonic_servo/reset";
pub const TUNING_THRESHOLD: &str = "/ultrasonic_servo/threshold";
pub const TUNING_MOTOR_SPEED: &str = "/ultrasonic_servo/motor_speed";
pub const TUNING_ROTATION_DURATION: &str = "/ultrasonic_servo/rotation_duration";

/// Connection probe sentinel.  An absent node still proves reachability.
pub const PROBE: &str = "/test";

/// Every delete-after-read path, in pull order.  Emergency stop first so
/// it is surfaced even if a later read fails.
pub const COMMAND_PATHS: [&str; 7] = [
    EMERGENCY_STOP,
    MOTION_REQUEST,
    SERVO_REQUEST,
    AVOIDANCE_RESET,
    TUNING_THRESHOLD,
    TUNING_MOTOR_SPEED,
    TUNING_ROTATION_DURATION,
];

pub const STATUS_ONLINE: &str = "ONLINE";
