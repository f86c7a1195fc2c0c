//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART / USB-CDC in production), one tagged line each.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | zone={} d={:.1}cm | gas={:.0}ppm ({}, detected={}) | motion={} \
                     servo={} | triggered={} clear={}",
                    t.zone,
                    t.distance_cm,
                    t.gas_ppm,
                    t.gas_level.as_str(),
                    t.gas_detected,
                    t.motion.as_str(),
                    t.servo_angle,
                    t.obstacle_detected,
                    t.clear_path,
                );
            }
            AppEvent::Started => info!("START | controller reset, actuators parked"),
            AppEvent::ZoneChanged { from, to } => info!("ZONE | {} -> {}", from, to),
            AppEvent::ManeuverStarted { range_cm } => {
                warn!("AVOID | maneuver started, obstacle at {:.1}cm", range_cm);
            }
            AppEvent::ManeuverFinished => info!("AVOID | maneuver finished"),
            AppEvent::LatchCleared => info!("AVOID | latch cleared"),
            AppEvent::EmergencyStop {
                interrupted_maneuver,
            } => {
                warn!("AVOID | emergency stop (interrupted={})", interrupted_maneuver);
            }
            AppEvent::GasLevelChanged { from, to, ppm } => {
                info!("GAS | {} -> {} at {:.0}ppm", from.as_str(), to.as_str(), ppm);
            }
            AppEvent::LinkChanged { from, to } => info!("SYNC | {} -> {}", from, to),
            AppEvent::CommandApplied(cmd) => info!("CMD | applied {:?}", cmd),
            AppEvent::CommandIgnored { command, reason } => {
                info!("CMD | ignored {:?}: {}", command, reason);
            }
        }
    }
}
