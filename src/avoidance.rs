//! Avoidance controller.
//!
//! Owns the cooldown timer and the one-shot maneuver state machine.  Each
//! tick classifies the latest [`DistanceSample`] and decides whether to
//! fire the reverse/alert maneuver.
//!
//! ```text
//!            Danger ∧ ¬triggered ∧ cooldown elapsed
//!   ┌──────┐ ─────────────────────────────────────▶ ┌─────────────┐
//!   │ Idle │                                         │ Maneuvering │
//!   └──────┘ ◀──────────────────────────────────── └─────────────┘
//!      │            now >= ends_at  (stop + center)        │
//!      │                                                   │
//!      └── Safe: triggered = false      emergency_stop ───┘
//! ```
//!
//! ## Latch lifecycle
//!
//! 1. A `Danger` reading fires the maneuver, sets `triggered` and stamps
//!    `last_action_at_ms`.
//! 2. The maneuver is held until its scheduled end; the loop keeps
//!    sensing and syncing meanwhile.
//! 3. Back in `Idle`, only a `Safe` reading clears `triggered`.  `Warning`
//!    and `Error` leave it set.  An echo timeout never clears the latch.
//! 4. Re-triggering needs the latch clear **and** the cooldown elapsed.

use heapless::Vec;
use log::{debug, info, warn};

use crate::app::ports::ActuatorPort;
use crate::config::SystemConfig;
use crate::drivers::motor::Drive;
use crate::sensors::distance::{DistanceSample, DistanceThresholds, HazardZone, classify};

/// Max events a single tick can produce (zone change, finish, latch, start).
pub const MAX_TICK_EVENTS: usize = 4;

/// The process-wide avoidance latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AvoidanceState {
    pub triggered: bool,
    pub last_action_at_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Maneuvering { ends_at_ms: u64 },
}

/// Things that happened during one [`AvoidanceController::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AvoidanceEvent {
    ZoneChanged { from: HazardZone, to: HazardZone },
    ManeuverStarted { range_cm: f32, at_ms: u64 },
    ManeuverFinished { at_ms: u64 },
    LatchCleared,
}

pub type TickEvents = Vec<AvoidanceEvent, MAX_TICK_EVENTS>;

/// Maneuver parameters, derived from [`SystemConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AvoidanceParams {
    pub thresholds: DistanceThresholds,
    pub cooldown_ms: u64,
    pub maneuver_duration_ms: u64,
    pub maneuver_speed_pct: u8,
    pub alert_angle: u8,
    pub center_angle: u8,
}

impl From<&SystemConfig> for AvoidanceParams {
    fn from(c: &SystemConfig) -> Self {
        Self {
            thresholds: c.distance_thresholds(),
            cooldown_ms: c.cooldown_ms,
            maneuver_duration_ms: c.maneuver_duration_ms,
            maneuver_speed_pct: c.maneuver_speed_pct,
            alert_angle: c.alert_angle,
            center_angle: c.center_angle,
        }
    }
}

pub struct AvoidanceController {
    params: AvoidanceParams,
    state: AvoidanceState,
    phase: Phase,
    zone: HazardZone,
    last_distance: Option<f32>,
    trigger_count: u32,
}

impl AvoidanceController {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            params: AvoidanceParams::from(config),
            state: AvoidanceState::default(),
            phase: Phase::Idle,
            // Nothing measured yet: report the conservative zone.
            zone: HazardZone::Error,
            last_distance: None,
            trigger_count: 0,
        }
    }

    /// Swap in new parameters.  Takes effect from the next tick; an
    /// in-flight maneuver keeps its scheduled end.
    pub fn reconfigure(&mut self, config: &SystemConfig) {
        self.params = AvoidanceParams::from(config);
        info!(
            "avoidance: reconfigured (danger<{}cm, speed={}%, hold={}ms)",
            self.params.thresholds.danger_cm,
            self.params.maneuver_speed_pct,
            self.params.maneuver_duration_ms
        );
    }

    /// Classify `sample` and advance the state machine.
    pub fn tick(
        &mut self,
        sample: &DistanceSample,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
    ) -> TickEvents {
        let mut events = TickEvents::new();

        let zone = classify(sample, &self.params.thresholds);
        if sample.valid {
            self.last_distance = Some(sample.range_cm);
        }
        if zone != self.zone {
            debug!("avoidance: zone {} -> {}", self.zone, zone);
            let _ = events.push(AvoidanceEvent::ZoneChanged {
                from: self.zone,
                to: zone,
            });
            self.zone = zone;
        }

        if let Phase::Maneuvering { ends_at_ms } = self.phase {
            if now_ms < ends_at_ms {
                return events;
            }
            self.finish_maneuver(hw);
            info!("avoidance: maneuver finished at {now_ms}ms");
            let _ = events.push(AvoidanceEvent::ManeuverFinished { at_ms: now_ms });
        }

        match zone {
            HazardZone::Safe if self.state.triggered => {
                self.state.triggered = false;
                info!("avoidance: path clear, latch released");
                let _ = events.push(AvoidanceEvent::LatchCleared);
            }
            HazardZone::Danger if self.can_fire(now_ms) => {
                self.start_maneuver(now_ms, hw);
                warn!(
                    "avoidance: obstacle at {:.1}cm, maneuver #{} until {}ms",
                    sample.range_cm,
                    self.trigger_count,
                    now_ms + self.params.maneuver_duration_ms
                );
                let _ = events.push(AvoidanceEvent::ManeuverStarted {
                    range_cm: sample.range_cm,
                    at_ms: now_ms,
                });
            }
            _ => {}
        }

        events
    }

    /// Stop everything, centre the servo and release the latch.  Stamps
    /// `last_action_at_ms` so the cooldown runs from now.  Returns whether a
    /// maneuver was interrupted.
    pub fn emergency_stop(&mut self, now_ms: u64, hw: &mut impl ActuatorPort) -> bool {
        let interrupted = self.is_maneuvering();
        self.finish_maneuver(hw);
        self.state.triggered = false;
        self.state.last_action_at_ms = now_ms;
        warn!("avoidance: EMERGENCY STOP at {now_ms}ms (interrupted={interrupted})");
        interrupted
    }

    /// Return to the boot state (no latch, no cooldown stamp).
    pub fn reset(&mut self, hw: &mut impl ActuatorPort) {
        self.finish_maneuver(hw);
        self.state = AvoidanceState::default();
        info!("avoidance: reset");
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn current_zone(&self) -> HazardZone {
        self.zone
    }

    /// Most recent valid range.  `None` until the first valid echo.
    pub fn last_distance(&self) -> Option<f32> {
        self.last_distance
    }

    pub fn is_triggered(&self) -> bool {
        self.state.triggered
    }

    pub fn is_maneuvering(&self) -> bool {
        matches!(self.phase, Phase::Maneuvering { .. })
    }

    pub fn state(&self) -> AvoidanceState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn trigger_count(&self) -> u32 {
        self.trigger_count
    }

    pub fn params(&self) -> &AvoidanceParams {
        &self.params
    }

    // ── Internal ──────────────────────────────────────────────

    fn can_fire(&self, now_ms: u64) -> bool {
        !self.state.triggered
            && now_ms.saturating_sub(self.state.last_action_at_ms) >= self.params.cooldown_ms
    }

    fn start_maneuver(&mut self, now_ms: u64, hw: &mut impl ActuatorPort) {
        self.state.triggered = true;
        self.state.last_action_at_ms = now_ms;
        self.trigger_count = self.trigger_count.saturating_add(1);
        hw.set_motor_drive(Drive::Reverse, self.params.maneuver_speed_pct);
        hw.set_steering_angle(self.params.alert_angle);
        self.phase = Phase::Maneuvering {
            ends_at_ms: now_ms + self.params.maneuver_duration_ms,
        };
    }

    fn finish_maneuver(&mut self, hw: &mut impl ActuatorPort) {
        hw.stop_motor();
        hw.set_steering_angle(self.params.center_angle);
        self.phase = Phase::Idle;
    }
}

// ═══════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════
