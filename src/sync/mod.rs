//! Remote synchronisation. Mirrors controller state to the remote store
//! and pulls operator commands back.
//!
//! * [`client`]: connection lifecycle and the push/pull protocol.
//! * [`paths`]: remote store layout.
//! * [`records`]: telemetry, alert and command records.

pub mod client;
pub mod paths;
pub mod records;

pub use client::{LinkUp, SyncClient};
pub use records::{AlertEvent, AlertKind, ConnectionState, RemoteCommand, TelemetrySnapshot};
