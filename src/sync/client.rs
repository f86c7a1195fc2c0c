//! Sync client: connection lifecycle, telemetry push and command pull.
//!
//! ```text
//!  Disconnected ──connect ok──▶ Connected ◀──reconnect ok── Connecting
//!       │                          │                          ▲
//!   connect fail            any transport failure             │
//!       ▼                          ▼                          │
//!     Error ─────────────────── Error ────── reconnect ───────┘
//! ```
//!
//! Only [`SyncClient::connect`] and [`SyncClient::reconnect`] move the link
//! into `Connected` or out of `Error`.  Every other operation returns
//! [`TransportError::NotConnected`] immediately while the link is down and
//! never blocks waiting for it.
//!
//! ## Delete-after-read
//!
//! Each command field is read, recorded locally, surfaced, and only then
//! deleted.  A delete that fails is remembered and retried before the next
//! read, so a command is delivered at most once even across an outage.

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use log::{debug, info, warn};
use serde_json::{Value, json};

use crate::app::commands::MotionCommand;
use crate::app::ports::RemoteStore;
use crate::drivers::servo::MAX_ANGLE;
use crate::error::{CommandError, TransportError};

use super::paths;
use super::records::{
    AlertEvent, AlertKind, AvoidanceTuning, ConnectionState, MotionRequest, RemoteCommand,
    SensorDataRecord, TelemetrySnapshot,
};

/// Result of a successful connect / reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkUp {
    /// First successful connection since boot.
    First,
    /// Back after an outage; `failed_attempts` attempts failed meanwhile.
    Recovered { failed_attempts: u32 },
    /// Explicit reconnect while the link was healthy.
    Refreshed,
}

/// How a fetched command value should be handled.
#[derive(Debug, Clone, PartialEq)]
enum Parsed<T> {
    /// New value: record, surface, then clear.
    Surface(T),
    /// Well-formed but nothing to deliver (duplicate, `false` flag): clear.
    Consume,
    /// Leave the node alone.
    Malformed(CommandError),
}

pub struct SyncClient<S, D> {
    store: S,
    delay: D,
    backoff_ms: u32,
    state: ConnectionState,

    /// Motion currently in effect; requests equal to it are not surfaced.
    last_motion: MotionRequest,
    last_servo_angle: u8,
    last_update_ms: Option<u64>,
    last_alert: Option<AlertKind>,

    ever_connected: bool,
    /// Set whenever the link drops to `Error`; cleared on the next success.
    outage: bool,
    failed_attempts: u32,
    /// Command paths whose delete failed after the value was surfaced.
    unacked: Vec<&'static str, { paths::COMMAND_PATHS.len() }>,
}

impl<S: RemoteStore, D: DelayNs> SyncClient<S, D> {
    pub fn new(store: S, delay: D, backoff_ms: u32, center_angle: u8) -> Self {
        Self {
            store,
            delay,
            backoff_ms,
            state: ConnectionState::Disconnected,
            last_motion: motion_request(MotionCommand::Stop),
            last_servo_angle: center_angle,
            last_update_ms: None,
            last_alert: None,
            ever_connected: false,
            outage: false,
            failed_attempts: 0,
            unacked: Vec::new(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// One immediate connection attempt (no backoff).
    pub fn connect(&mut self) -> Result<LinkUp, TransportError> {
        if self.state == ConnectionState::Connected {
            return Ok(LinkUp::Refreshed);
        }
        self.attempt()
    }

    /// `Connecting`, one fixed backoff wait, then exactly one attempt.
    pub fn reconnect(&mut self) -> Result<LinkUp, TransportError> {
        info!("sync: reconnecting in {}ms", self.backoff_ms);
        self.set_state(ConnectionState::Connecting);
        self.delay.delay_ms(self.backoff_ms);
        self.attempt()
    }

    fn attempt(&mut self) -> Result<LinkUp, TransportError> {
        if let Err(e) = self.store.get(paths::PROBE) {
            self.failed_attempts = self.failed_attempts.saturating_add(1);
            self.outage = self.ever_connected;
            self.set_state(ConnectionState::Error);
            warn!(
                "sync: probe failed ({e}), {} failed attempt(s)",
                self.failed_attempts
            );
            return Err(e);
        }

        self.set_state(ConnectionState::Connected);
        if let Err(e) = self
            .store
            .set(paths::STATUS, &Value::from(paths::STATUS_ONLINE))
        {
            self.failed_attempts = self.failed_attempts.saturating_add(1);
            return Err(self.demote(paths::STATUS, e));
        }

        let up = if !self.ever_connected {
            LinkUp::First
        } else if self.outage {
            LinkUp::Recovered {
                failed_attempts: self.failed_attempts,
            }
        } else {
            LinkUp::Refreshed
        };
        self.ever_connected = true;
        self.outage = false;
        self.failed_attempts = 0;
        Ok(up)
    }

    // ── Publishing ────────────────────────────────────────────

    /// Write every telemetry field independently.  A failed write is logged
    /// and the remaining writes still run; `last_update_ms` only moves on
    /// full success.
    pub fn publish_telemetry(&mut self, snap: &TelemetrySnapshot) -> Result<(), TransportError> {
        self.ensure_connected()?;
        let record = serde_json::to_value(SensorDataRecord::from(snap))
            .map_err(|_| TransportError::Malformed)?;

        let results = [
            self.write(paths::SENSOR_DATA, |s| s.update(paths::SENSOR_DATA, &record)),
            self.write(paths::GAS_PPM, |s| s.set(paths::GAS_PPM, &json!(snap.gas_ppm))),
            self.write(paths::DISTANCE, |s| {
                s.set(paths::DISTANCE, &json!(snap.distance_cm))
            }),
            self.write(paths::MOTION_CURRENT, |s| {
                s.set(paths::MOTION_CURRENT, &json!(snap.motion.as_str()))
            }),
            self.write(paths::SERVO_ANGLE, |s| {
                s.set(paths::SERVO_ANGLE, &json!(snap.servo_angle))
            }),
        ];

        let attempted = results.len() as u8;
        let failed = results.iter().filter(|r| r.is_err()).count() as u8;
        match results.into_iter().find_map(Result::err) {
            None => {
                self.last_update_ms = Some(snap.timestamp_ms);
                debug!("sync: telemetry pushed at {}ms", snap.timestamp_ms);
                Ok(())
            }
            Some(first) if failed == attempted => Err(first),
            Some(_) => Err(TransportError::Partial { failed, attempted }),
        }
    }

    /// Append to `/alerts` and overwrite the `last_*` convenience fields.
    pub fn publish_alert(&mut self, alert: &AlertEvent) -> Result<(), TransportError> {
        if let Err(e) = self.ensure_connected() {
            warn!("sync: alert {} dropped ({e})", alert.kind.as_str());
            return Err(e);
        }
        let record = alert.to_value();
        if let Err(e) = self.store.push(paths::ALERTS, &record) {
            return Err(self.demote(paths::ALERTS, e));
        }
        self.last_alert = Some(alert.kind);

        let results = [
            self.write(paths::ALERT_LAST_KIND, |s| {
                s.set(paths::ALERT_LAST_KIND, &json!(alert.kind.as_str()))
            }),
            self.write(paths::ALERT_LAST_MESSAGE, |s| {
                s.set(paths::ALERT_LAST_MESSAGE, &json!(alert.message))
            }),
            self.write(paths::ALERT_LAST_TIMESTAMP, |s| {
                s.set(paths::ALERT_LAST_TIMESTAMP, &json!(alert.timestamp_ms))
            }),
        ];
        info!("sync: alert {} sent", alert.kind.as_str());
        results.into_iter().find_map(Result::err).map_or(Ok(()), Err)
    }

    /// Overwrite the free-text `/status` node.
    pub fn publish_status(&mut self, text: &str) -> Result<(), TransportError> {
        self.ensure_connected()?;
        self.write(paths::STATUS, |s| s.set(paths::STATUS, &json!(text)))
    }

    // ── Command pull ──────────────────────────────────────────

    /// Fetch every pending operator command.
    ///
    /// A transport failure part-way demotes the link and ends the pull;
    /// fields surfaced before it are still returned so they are applied
    /// exactly once.
    pub fn pull_commands(&mut self) -> Result<RemoteCommand, TransportError> {
        self.ensure_connected()?;
        let mut cmd = RemoteCommand::default();

        while let Some(&path) = self.unacked.last() {
            match self.store.delete(path) {
                Ok(()) => {
                    self.unacked.pop();
                    debug!("sync: deferred clear of {path} done");
                }
                Err(e) => {
                    self.demote(path, e);
                    return Ok(cmd);
                }
            }
        }

        if self.fetch(paths::EMERGENCY_STOP, parse_flag).is_some() {
            cmd.emergency_stop = true;
            self.ack(paths::EMERGENCY_STOP);
        }
        if !self.is_connected() {
            return Ok(cmd);
        }

        let last_motion = self.last_motion.clone();
        if let Some(req) = self.fetch(paths::MOTION_REQUEST, |v| parse_motion(v, &last_motion)) {
            info!("sync: motion request {req}");
            self.last_motion = req.clone();
            cmd.motion_command = Some(req);
            self.ack(paths::MOTION_REQUEST);
        }
        if !self.is_connected() {
            return Ok(cmd);
        }

        let last_angle = self.last_servo_angle;
        if let Some(angle) = self.fetch(paths::SERVO_REQUEST, |v| parse_servo(v, last_angle)) {
            info!("sync: servo request {angle}");
            self.last_servo_angle = angle;
            cmd.servo_angle_request = Some(angle);
            self.ack(paths::SERVO_REQUEST);
        }
        if !self.is_connected() {
            return Ok(cmd);
        }

        if self.fetch(paths::AVOIDANCE_RESET, parse_flag).is_some() {
            cmd.reset = true;
            self.ack(paths::AVOIDANCE_RESET);
        }
        if !self.is_connected() {
            return Ok(cmd);
        }

        self.pull_tuning(&mut cmd.tuning);
        Ok(cmd)
    }

    fn pull_tuning(&mut self, tuning: &mut AvoidanceTuning) {
        if let Some(cm) = self.fetch(paths::TUNING_THRESHOLD, parse_threshold) {
            tuning.obstacle_threshold_cm = Some(cm);
            self.ack(paths::TUNING_THRESHOLD);
        }
        if !self.is_connected() {
            return;
        }
        if let Some(pct) = self.fetch(paths::TUNING_MOTOR_SPEED, parse_motor_speed) {
            tuning.motor_speed_pct = Some(pct);
            self.ack(paths::TUNING_MOTOR_SPEED);
        }
        if !self.is_connected() {
            return;
        }
        if let Some(ms) = self.fetch(paths::TUNING_ROTATION_DURATION, parse_rotation_duration) {
            tuning.rotation_duration_ms = Some(ms);
            self.ack(paths::TUNING_ROTATION_DURATION);
        }
    }

    // ── Local state hooks ─────────────────────────────────────

    /// Record the motion now in effect (operator-applied or forced by the
    /// controller).
    pub fn set_current_motion(&mut self, motion: MotionCommand) {
        self.last_motion = motion_request(motion);
    }

    pub fn set_current_servo_angle(&mut self, angle: u8) {
        self.last_servo_angle = angle;
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn last_update_ms(&self) -> Option<u64> {
        self.last_update_ms
    }

    pub fn last_alert(&self) -> Option<AlertKind> {
        self.last_alert
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    // ── Internal ──────────────────────────────────────────────

    fn ensure_connected(&self) -> Result<(), TransportError> {
        if self.is_connected() {
            Ok(())
        } else {
            debug!("sync: skipped, link {}", self.state);
            Err(TransportError::NotConnected)
        }
    }

    fn set_state(&mut self, next: ConnectionState) {
        if self.state != next {
            info!("sync: {} -> {}", self.state, next);
            self.state = next;
        }
    }

    /// Log a failed operation and drop the link to `Error`.
    fn demote(&mut self, path: &str, err: TransportError) -> TransportError {
        warn!("sync: {path} failed: {err}");
        if err.is_link_failure() && self.state != ConnectionState::Error {
            self.outage = self.ever_connected;
            self.set_state(ConnectionState::Error);
        }
        err
    }

    fn write(
        &mut self,
        path: &'static str,
        op: impl FnOnce(&mut S) -> Result<(), TransportError>,
    ) -> Result<(), TransportError> {
        op(&mut self.store).map_err(|e| self.demote(path, e))
    }

    fn fetch<T>(
        &mut self,
        path: &'static str,
        parse: impl FnOnce(&Value) -> Parsed<T>,
    ) -> Option<T> {
        let value = match self.store.get(path) {
            Ok(Some(v)) => v,
            Ok(None) => return None,
            Err(e) => {
                self.demote(path, e);
                return None;
            }
        };
        match parse(&value) {
            Parsed::Surface(t) => Some(t),
            Parsed::Consume => {
                debug!("sync: {path} holds nothing new, clearing");
                self.ack(path);
                None
            }
            Parsed::Malformed(err) => {
                warn!("sync: dropping {path} = {value}: {err}");
                None
            }
        }
    }

    /// Clear a consumed command node.  A failed clear is retried on the
    /// next pull, before anything is read.
    fn ack(&mut self, path: &'static str) {
        if let Err(e) = self.store.delete(path) {
            if !self.unacked.contains(&path) {
                let _ = self.unacked.push(path);
            }
            self.demote(path, e);
        }
    }
}

// ── Value parsers ─────────────────────────────────────────────

fn motion_request(motion: MotionCommand) -> MotionRequest {
    MotionRequest::try_from(motion.as_str()).unwrap_or_default()
}

fn parse_flag(v: &Value) -> Parsed<()> {
    match v.as_bool() {
        Some(true) => Parsed::Surface(()),
        Some(false) => Parsed::Consume,
        None => Parsed::Malformed(CommandError::WrongType("expected a boolean")),
    }
}

fn parse_motion(v: &Value, last: &MotionRequest) -> Parsed<MotionRequest> {
    let Some(raw) = v.as_str() else {
        return Parsed::Malformed(CommandError::WrongType("expected a string"));
    };
    let upper = raw.trim().to_ascii_uppercase();
    if upper.is_empty() || upper.as_str() == last.as_str() {
        return Parsed::Consume;
    }
    // No motion name is this long; consume it like any unknown motion.
    match MotionRequest::try_from(upper.as_str()) {
        Ok(req) => Parsed::Surface(req),
        Err(_) => {
            warn!("sync: unknown motion request ({} bytes) consumed", upper.len());
            Parsed::Consume
        }
    }
}

fn parse_servo(v: &Value, last: u8) -> Parsed<u8> {
    let Some(n) = v.as_i64() else {
        return Parsed::Malformed(CommandError::WrongType("expected an integer angle"));
    };
    match u8::try_from(n) {
        Ok(angle) if angle <= MAX_ANGLE => {
            if angle == last {
                Parsed::Consume
            } else {
                Parsed::Surface(angle)
            }
        }
        _ => Parsed::Malformed(CommandError::ServoAngleOutOfRange(n)),
    }
}

fn parse_threshold(v: &Value) -> Parsed<f32> {
    match v.as_f64() {
        Some(cm) if (1.0..=400.0).contains(&cm) => Parsed::Surface(cm as f32),
        Some(_) => Parsed::Malformed(CommandError::TuningOutOfRange("threshold")),
        None => Parsed::Malformed(CommandError::WrongType("expected a number")),
    }
}

/// Raw 8-bit PWM value (0–255) → percent.
fn parse_motor_speed(v: &Value) -> Parsed<u8> {
    match v.as_i64() {
        Some(raw @ 0..=255) => Parsed::Surface(((raw * 100 + 127) / 255) as u8),
        Some(_) => Parsed::Malformed(CommandError::TuningOutOfRange("motor_speed")),
        None => Parsed::Malformed(CommandError::WrongType("expected an integer")),
    }
}

fn parse_rotation_duration(v: &Value) -> Parsed<u64> {
    match v.as_i64() {
        Some(ms @ 1..=10_000) => Parsed::Surface(ms as u64),
        Some(_) => Parsed::Malformed(CommandError::TuningOutOfRange("rotation_duration")),
        None => Parsed::Malformed(CommandError::WrongType("expected an integer")),
    }
}

// ═══════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════
