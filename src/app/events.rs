//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::sensors::distance::HazardZone;
use crate::sensors::gas::GasLevel;
use crate::sync::records::{ConnectionState, TelemetrySnapshot};

use super::commands::AppCommand;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started (controller reset, actuators parked).
    Started,

    /// The hazard zone changed.
    ZoneChanged { from: HazardZone, to: HazardZone },

    /// An avoidance maneuver fired.
    ManeuverStarted { range_cm: f32 },

    /// The scheduled maneuver end was reached.
    ManeuverFinished,

    /// A `Safe` reading released the avoidance latch.
    LatchCleared,

    /// Emergency stop applied.
    EmergencyStop { interrupted_maneuver: bool },

    /// The gas classification changed.
    GasLevelChanged { from: GasLevel, to: GasLevel, ppm: f32 },

    /// The sync link changed state.
    LinkChanged { from: ConnectionState, to: ConnectionState },

    /// An operator command was applied.
    CommandApplied(AppCommand),

    /// An operator command was consumed but not applied.
    CommandIgnored { command: AppCommand, reason: &'static str },

    /// A telemetry snapshot was pushed.
    Telemetry(TelemetrySnapshot),
}
