//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService / SyncClient (domain)
//! ```
//!
//! Driven adapters (sensors, actuators, clock, remote store, event sinks)
//! implement these traits.  The domain consumes them via generics, so the
//! core never touches hardware or the network directly.

use serde_json::Value;

use crate::drivers::motor::Drive;
use crate::error::TransportError;
use crate::sensors::distance::DistanceSample;
use crate::sensors::gas::GasReading;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain sensor data.
pub trait SensorPort {
    /// One bounded distance round-trip.  A missing echo is an invalid
    /// sample, never an error.
    fn measure_distance(&mut self, now_ms: u64) -> DistanceSample;

    /// Current gas reading (raw ADC + converted ppm).
    fn read_gas(&mut self) -> GasReading;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command actuators.
pub trait ActuatorPort {
    /// Drive both motors in `drive` at `speed_pct` (0–100).
    fn set_motor_drive(&mut self, drive: Drive, speed_pct: u8);

    /// Immediately stop both motors.
    fn stop_motor(&mut self);

    /// Move the steering / sensor servo (0–180, clamped).
    fn set_steering_angle(&mut self, angle: u8);

    /// Last commanded steering angle.
    fn steering_angle(&self) -> u8;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic milliseconds since boot.
pub trait ClockPort {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Remote store port (driven adapter: domain ↔ network)
// ───────────────────────────────────────────────────────────────

/// Opaque path-addressed key-value store.
///
/// Every call is synchronous.  Paths are absolute (`/servo/request`).
/// Implementations report every failure as a [`TransportError`]; they never
/// retry on their own.
pub trait RemoteStore {
    /// Read the value at `path`.  `Ok(None)` means the node is absent.
    fn get(&mut self, path: &str) -> Result<Option<Value>, TransportError>;

    /// Overwrite the node at `path`.
    fn set(&mut self, path: &str, value: &Value) -> Result<(), TransportError>;

    /// Merge the children of `fields` (an object) into the node at `path`.
    fn update(&mut self, path: &str, fields: &Value) -> Result<(), TransportError>;

    /// Append `value` under `path` with a store-generated key; returns the key.
    fn push(&mut self, path: &str, value: &Value) -> Result<String, TransportError>;

    /// Remove the node at `path` and its children.  Deleting an absent
    /// node succeeds.
    fn delete(&mut self, path: &str) -> Result<(), TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
