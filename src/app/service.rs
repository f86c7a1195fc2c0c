//! Application service, the hexagonal core.
//!
//! [`AppService`] owns the avoidance controller, the gas classifier state,
//! the operator motion state and the loop cadences.  It exposes a clean,
//! hardware-agnostic API.  All I/O flows through port traits injected at
//! call sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌─────────────────────────┐ ──▶ EventSink
//!                 │       AppService         │
//! ActuatorPort ◀──│  Avoidance · Gas · Cmds  │ ◀─▶ SyncClient ◀─▶ RemoteStore
//!                 └─────────────────────────┘
//! ```
//!
//! One [`tick`](AppService::tick) runs to completion: measure distance,
//! advance the avoidance controller, read gas, then the sync step.

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use log::{info, warn};

use crate::avoidance::{AvoidanceController, AvoidanceEvent};
use crate::config::SystemConfig;
use crate::error::TransportError;
use crate::scheduler::Cadence;
use crate::sensors::gas::{GasLevel, GasReading};
use crate::sync::client::{LinkUp, SyncClient};
use crate::sync::records::{
    AlertEvent, AlertKind, ConnectionState, RemoteCommand, TelemetrySnapshot,
};

use super::commands::{AppCommand, MotionCommand};
use super::events::AppEvent;
use super::ports::{ActuatorPort, EventSink, RemoteStore, SensorPort};

/// Alerts raised within one tick, flushed in its sync step.
const ALERT_QUEUE_DEPTH: usize = 8;

/// Operator commands derived from one pull.
const MAX_PULLED_COMMANDS: usize = 5;

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: SystemConfig,
    avoidance: AvoidanceController,
    gas_level: GasLevel,
    last_gas: Option<GasReading>,
    motion: MotionCommand,
    telemetry: Cadence,
    command_poll: Cadence,
    reconnect: Cadence,
    alerts: Vec<AlertEvent, ALERT_QUEUE_DEPTH>,
    link: ConnectionState,
    tick_count: u64,
}

impl AppService {
    /// Construct the service from a validated configuration.
    ///
    /// Does **not** touch hardware; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        let avoidance = AvoidanceController::new(&config);
        Self {
            telemetry: Cadence::new(config.telemetry_interval_ms),
            command_poll: Cadence::new(config.command_poll_interval_ms),
            reconnect: Cadence::new(config.reconnect_interval_ms),
            avoidance,
            gas_level: GasLevel::Safe,
            last_gas: None,
            motion: MotionCommand::Stop,
            alerts: Vec::new(),
            link: ConnectionState::Disconnected,
            tick_count: 0,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Park the actuators and reset the controller.
    pub fn start(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        self.avoidance.reset(hw);
        self.motion = MotionCommand::Stop;
        sink.emit(&AppEvent::Started);
        info!("AppService started");
    }

    /// Initial connection attempt.  Failure is not fatal: the loop keeps
    /// retrying on the reconnect cadence.
    pub fn connect<S: RemoteStore, D: DelayNs>(
        &mut self,
        sync: &mut SyncClient<S, D>,
        now_ms: u64,
        sink: &mut impl EventSink,
    ) {
        let result = sync.connect();
        self.on_link_attempt(result, now_ms);
        self.flush_alerts(sync);
        self.note_link(sync, sink);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`], which avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn tick<S: RemoteStore, D: DelayNs>(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        sync: &mut SyncClient<S, D>,
        now_ms: u64,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;

        // 1. Distance → avoidance
        let sample = hw.measure_distance(now_ms);
        let events = self.avoidance.tick(&sample, now_ms, hw);
        for event in &events {
            self.on_avoidance_event(*event, sync, now_ms, sink);
        }

        // 2. Gas
        let gas = hw.read_gas();
        self.on_gas_reading(gas, now_ms, sink);

        // 3. Sync
        self.sync_step(hw, sync, now_ms, sink);
    }

    fn sync_step<S: RemoteStore, D: DelayNs>(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        sync: &mut SyncClient<S, D>,
        now_ms: u64,
        sink: &mut impl EventSink,
    ) {
        if !sync.is_connected() && self.reconnect.due(now_ms) {
            let result = sync.reconnect();
            self.on_link_attempt(result, now_ms);
        }

        // Disconnected: publish_alert logs and drops.
        self.flush_alerts(sync);

        if sync.is_connected() && self.command_poll.due(now_ms) {
            if let Ok(remote) = sync.pull_commands() {
                for cmd in self.commands_from(remote, sync) {
                    self.handle_command(cmd, hw, sync, now_ms, sink);
                }
                // Emergency stop and friends raise alerts of their own.
                self.flush_alerts(sync);
            }
        }

        if sync.is_connected() && self.telemetry.due(now_ms) {
            let snap = self.build_telemetry(&*hw, now_ms);
            if sync.publish_telemetry(&snap).is_ok() {
                sink.emit(&AppEvent::Telemetry(snap));
            }
        }

        self.note_link(sync, sink);
    }

    // ── Command handling ──────────────────────────────────────

    /// Apply one operator command.
    pub fn handle_command<S: RemoteStore, D: DelayNs>(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl ActuatorPort,
        sync: &mut SyncClient<S, D>,
        now_ms: u64,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::EmergencyStop => {
                let interrupted = self.avoidance.emergency_stop(now_ms, hw);
                self.set_motion(MotionCommand::Stop, sync);
                sync.set_current_servo_angle(self.config.center_angle);
                sink.emit(&AppEvent::EmergencyStop {
                    interrupted_maneuver: interrupted,
                });
                self.queue_alert(AlertEvent::new(
                    AlertKind::EmergencyStop,
                    "Emergency stop activated",
                    now_ms,
                ));
            }
            AppCommand::ResetAvoidance => {
                self.avoidance.reset(hw);
                self.set_motion(MotionCommand::Stop, sync);
                sync.set_current_servo_angle(self.config.center_angle);
                sink.emit(&AppEvent::CommandApplied(cmd));
            }
            AppCommand::Tune(tuning) => {
                // Each override is validated on its own.
                for field in tuning.split() {
                    let next = field.apply_to(&self.config);
                    match next.validate() {
                        Ok(()) => {
                            self.config = next;
                            sink.emit(&AppEvent::CommandApplied(AppCommand::Tune(field)));
                        }
                        Err(e) => {
                            warn!("Tuning rejected: {e}");
                            sink.emit(&AppEvent::CommandIgnored {
                                command: AppCommand::Tune(field),
                                reason: "tuning fails validation",
                            });
                        }
                    }
                }
                self.avoidance.reconfigure(&self.config);
            }
            AppCommand::Motion(motion) => {
                if self.avoidance.is_maneuvering() {
                    sync.set_current_motion(self.motion);
                    sink.emit(&AppEvent::CommandIgnored {
                        command: cmd,
                        reason: "maneuver in progress",
                    });
                    return;
                }
                match motion.drive() {
                    Some(drive) => hw.set_motor_drive(drive, self.config.drive_speed_pct),
                    None => hw.stop_motor(),
                }
                self.set_motion(motion, sync);
                sink.emit(&AppEvent::CommandApplied(cmd));
            }
            AppCommand::SteerTo(angle) => {
                if self.avoidance.is_maneuvering() {
                    sync.set_current_servo_angle(hw.steering_angle());
                    sink.emit(&AppEvent::CommandIgnored {
                        command: cmd,
                        reason: "maneuver in progress",
                    });
                    return;
                }
                hw.set_steering_angle(angle);
                sync.set_current_servo_angle(hw.steering_angle());
                sink.emit(&AppEvent::CommandApplied(cmd));
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot from the current state.
    pub fn build_telemetry(&self, hw: &impl ActuatorPort, now_ms: u64) -> TelemetrySnapshot {
        let distance = self.avoidance.last_distance();
        let thresholds = self.config.distance_thresholds();
        TelemetrySnapshot {
            gas_ppm: self.last_gas.map_or(0.0, |g| g.ppm),
            gas_level: self.gas_level,
            gas_detected: self
                .last_gas
                .is_some_and(|g| g.detected(self.config.gas_detect_ppm)),
            distance_cm: distance.unwrap_or(-1.0),
            zone: self.avoidance.current_zone(),
            obstacle_detected: self.avoidance.is_triggered(),
            clear_path: distance.is_some_and(|d| thresholds.is_clear(d)),
            motion: self.motion,
            servo_angle: hw.steering_angle(),
            timestamp_ms: now_ms,
        }
    }

    pub fn avoidance(&self) -> &AvoidanceController {
        &self.avoidance
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn motion(&self) -> MotionCommand {
        self.motion
    }

    pub fn gas_level(&self) -> GasLevel {
        self.gas_level
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Internal ──────────────────────────────────────────────

    fn on_avoidance_event<S: RemoteStore, D: DelayNs>(
        &mut self,
        event: AvoidanceEvent,
        sync: &mut SyncClient<S, D>,
        now_ms: u64,
        sink: &mut impl EventSink,
    ) {
        match event {
            AvoidanceEvent::ZoneChanged { from, to } => {
                sink.emit(&AppEvent::ZoneChanged { from, to });
            }
            AvoidanceEvent::ManeuverStarted { range_cm, .. } => {
                sink.emit(&AppEvent::ManeuverStarted { range_cm });
                self.queue_alert(AlertEvent::new(
                    AlertKind::ObstacleDetected,
                    format!("Obstacle detected at {range_cm:.1}cm"),
                    now_ms,
                ));
            }
            AvoidanceEvent::ManeuverFinished { .. } => {
                self.set_motion(MotionCommand::Stop, sync);
                sync.set_current_servo_angle(self.config.center_angle);
                sink.emit(&AppEvent::ManeuverFinished);
            }
            AvoidanceEvent::LatchCleared => sink.emit(&AppEvent::LatchCleared),
        }
    }

    fn on_gas_reading(&mut self, gas: GasReading, now_ms: u64, sink: &mut impl EventSink) {
        self.last_gas = Some(gas);
        let level = GasLevel::classify(gas.ppm, &self.config.gas_thresholds());
        if level == self.gas_level {
            return;
        }
        sink.emit(&AppEvent::GasLevelChanged {
            from: self.gas_level,
            to: level,
            ppm: gas.ppm,
        });
        if level == GasLevel::Danger {
            self.queue_alert(AlertEvent::new(
                AlertKind::HighGasLevel,
                format!("High gas concentration: {:.0}ppm", gas.ppm),
                now_ms,
            ));
        }
        self.gas_level = level;
    }

    fn on_link_attempt(&mut self, result: Result<LinkUp, TransportError>, now_ms: u64) {
        match result {
            Ok(LinkUp::First) => {
                self.telemetry.reset();
                self.queue_alert(AlertEvent::new(
                    AlertKind::SystemStartup,
                    "ToxiRover online",
                    now_ms,
                ));
            }
            Ok(LinkUp::Recovered { failed_attempts }) => {
                self.telemetry.reset();
                self.queue_alert(AlertEvent::new(
                    AlertKind::ConnectionLost,
                    format!("Link restored after {failed_attempts} failed reconnect attempt(s)"),
                    now_ms,
                ));
            }
            Ok(LinkUp::Refreshed) => {}
            Err(e) => warn!("Sync link attempt failed: {e}"),
        }
    }

    /// Turn one pull into commands, most urgent first.
    fn commands_from<S: RemoteStore, D: DelayNs>(
        &self,
        remote: RemoteCommand,
        sync: &mut SyncClient<S, D>,
    ) -> Vec<AppCommand, MAX_PULLED_COMMANDS> {
        let mut cmds = Vec::new();
        if remote.emergency_stop {
            let _ = cmds.push(AppCommand::EmergencyStop);
        }
        if remote.reset {
            let _ = cmds.push(AppCommand::ResetAvoidance);
        }
        if !remote.tuning.is_empty() {
            let _ = cmds.push(AppCommand::Tune(remote.tuning));
        }
        if let Some(raw) = remote.motion_command {
            match raw.parse::<MotionCommand>() {
                Ok(motion) => {
                    let _ = cmds.push(AppCommand::Motion(motion));
                }
                Err(()) => {
                    warn!("Unknown motion request {raw:?}, ignored");
                    sync.set_current_motion(self.motion);
                }
            }
        }
        if let Some(angle) = remote.servo_angle_request {
            let _ = cmds.push(AppCommand::SteerTo(angle));
        }
        cmds
    }

    fn set_motion<S: RemoteStore, D: DelayNs>(
        &mut self,
        motion: MotionCommand,
        sync: &mut SyncClient<S, D>,
    ) {
        self.motion = motion;
        sync.set_current_motion(motion);
    }

    fn queue_alert(&mut self, alert: AlertEvent) {
        if let Err(dropped) = self.alerts.push(alert) {
            warn!("Alert queue full, dropping {}", dropped.kind.as_str());
        }
    }

    fn flush_alerts<S: RemoteStore, D: DelayNs>(&mut self, sync: &mut SyncClient<S, D>) {
        for alert in self.alerts.iter() {
            let _ = sync.publish_alert(alert);
        }
        self.alerts.clear();
    }

    fn note_link<S: RemoteStore, D: DelayNs>(
        &mut self,
        sync: &SyncClient<S, D>,
        sink: &mut impl EventSink,
    ) {
        let now = sync.state();
        if now != self.link {
            sink.emit(&AppEvent::LinkChanged {
                from: self.link,
                to: now,
            });
            self.link = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_store::MemoryStore;
    use crate::avoidance::tests::{Call, RecordingActuators};
    use crate::drivers::motor::Drive;
    use crate::sensors::distance::DistanceSample;
    use crate::sync::paths;
    use serde_json::json;

    struct NoDelay;
    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    #[derive(Default)]
    struct Sink(std::vec::Vec<AppEvent>);
    impl EventSink for Sink {
        fn emit(&mut self, event: &AppEvent) {
            self.0.push(event.clone());
        }
    }

    struct Rig {
        range_cm: Option<f32>,
        gas_ppm: f32,
        act: RecordingActuators,
    }

    impl SensorPort for Rig {
        fn measure_distance(&mut self, now_ms: u64) -> DistanceSample {
            match self.range_cm {
                Some(r) => DistanceSample::valid(r, now_ms),
                None => DistanceSample::timeout(now_ms),
            }
        }
        fn read_gas(&mut self) -> GasReading {
            GasReading {
                raw: (self.gas_ppm / 2.0) as u16,
                ppm: self.gas_ppm,
                comparator: false,
            }
        }
    }

    impl ActuatorPort for Rig {
        fn set_motor_drive(&mut self, drive: Drive, speed_pct: u8) {
            self.act.set_motor_drive(drive, speed_pct);
        }
        fn stop_motor(&mut self) {
            self.act.stop_motor();
        }
        fn set_steering_angle(&mut self, angle: u8) {
            self.act.set_steering_angle(angle);
        }
        fn steering_angle(&self) -> u8 {
            self.act.steering_angle()
        }
    }

    fn rig() -> Rig {
        Rig {
            range_cm: Some(150.0),
            gas_ppm: 50.0,
            act: RecordingActuators::default(),
        }
    }

    fn setup() -> (AppService, Rig, SyncClient<MemoryStore, NoDelay>, Sink) {
        let mut app = AppService::new(SystemConfig::default());
        let mut hw = rig();
        let mut sync = SyncClient::new(MemoryStore::new(), NoDelay, 0, 90);
        let mut sink = Sink::default();
        app.start(&mut hw, &mut sink);
        app.connect(&mut sync, 0, &mut sink);
        (app, hw, sync, sink)
    }

    #[test]
    fn startup_alert_published() {
        let (_, _, sync, _) = setup();
        assert_eq!(sync.last_alert(), Some(AlertKind::SystemStartup));
    }

    #[test]
    fn motion_command_ignored_during_maneuver() {
        let (mut app, mut hw, mut sync, mut sink) = setup();
        hw.range_cm = Some(10.0);
        app.tick(&mut hw, &mut sync, 10_000, &mut sink);
        assert!(app.avoidance().is_maneuvering());

        app.handle_command(
            AppCommand::Motion(MotionCommand::Forward),
            &mut hw,
            &mut sync,
            10_100,
            &mut sink,
        );
        assert_eq!(app.motion(), MotionCommand::Stop);
        assert!(!hw.act.calls.contains(&Call::Drive(Drive::Forward, 80)));
    }

    #[test]
    fn gas_danger_edge_raises_one_alert() {
        let (mut app, mut hw, mut sync, mut sink) = setup();
        hw.gas_ppm = 640.0;
        app.tick(&mut hw, &mut sync, 10_000, &mut sink);
        app.tick(&mut hw, &mut sync, 10_100, &mut sink);
        assert_eq!(app.gas_level(), GasLevel::Danger);
        assert_eq!(sync.store().pushed(paths::ALERTS).len(), 2); // startup + gas
        assert_eq!(sync.last_alert(), Some(AlertKind::HighGasLevel));
    }

    #[test]
    fn invalid_tuning_rejected() {
        let (mut app, mut hw, mut sync, mut sink) = setup();
        sync.store_mut().seed(paths::TUNING_THRESHOLD, json!(60));
        app.tick(&mut hw, &mut sync, 10_000, &mut sink);
        assert_eq!(app.config().danger_threshold_cm, 20.0);
        assert!(sink.0.iter().any(|e| matches!(e, AppEvent::CommandIgnored { .. })));
    }

    #[test]
    fn rejected_threshold_keeps_sibling_overrides() {
        let (mut app, mut hw, mut sync, mut sink) = setup();
        // 50 cm equals the warning threshold and fails validation.
        sync.store_mut().seed(paths::TUNING_THRESHOLD, json!(50));
        sync.store_mut().seed(paths::TUNING_MOTOR_SPEED, json!(128));
        sync.store_mut().seed(paths::TUNING_ROTATION_DURATION, json!(800));
        app.tick(&mut hw, &mut sync, 10_000, &mut sink);

        assert_eq!(app.config().danger_threshold_cm, 20.0);
        assert_eq!(app.config().maneuver_speed_pct, 50);
        assert_eq!(app.config().maneuver_duration_ms, 800);
        assert_eq!(app.avoidance().params().maneuver_speed_pct, 50);
        let applied = sink
            .0
            .iter()
            .filter(|e| matches!(e, AppEvent::CommandApplied(AppCommand::Tune(_))))
            .count();
        let ignored = sink
            .0
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    AppEvent::CommandIgnored {
                        command: AppCommand::Tune(_),
                        ..
                    }
                )
            })
            .count();
        assert_eq!((applied, ignored), (2, 1));
    }
}
