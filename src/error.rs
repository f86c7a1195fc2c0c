//! Unified error types for the ToxiRover firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! control loop's error handling uniform.  All variants are `Copy` so they
//! can be passed through the avoidance controller and sync client without
//! allocation.
//!
//! Propagation policy: a missing echo degrades to the `Error` hazard zone
//! rather than an error value, transport failures demote the sync link,
//! malformed commands are dropped.  Only configuration and peripheral
//! init errors are fatal, and only at start-up.

use core::fmt;

use crate::drivers::hw_init::HwInitError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read.
    Sensor(SensorError),
    /// A remote store operation failed.
    Transport(TransportError),
    /// An operator command was malformed.
    Command(CommandError),
    /// Configuration is invalid.  Fatal at start-up.
    Config(ConfigError),
    /// Peripheral initialisation failed.  Fatal at start-up.
    Init(HwInitError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Init(e) => write!(f, "init: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The ultrasonic echo never returned within the timeout.
    EchoTimeout,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EchoTimeout => write!(f, "echo timeout"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Failures of the remote key-value store.
///
/// `NotConnected` is returned locally without touching the network and
/// never changes the connection state.  Every other variant is a real
/// transport failure and demotes the link to `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The operation was skipped because the link is not connected.
    NotConnected,
    /// The remote endpoint could not be reached (DNS, TCP, TLS, timeout).
    Unreachable,
    /// The remote rejected the request with the given HTTP status.
    Rejected(u16),
    /// The response body could not be decoded.
    Malformed,
    /// Some, but not all, writes of a multi-field publish failed.
    Partial { failed: u8, attempted: u8 },
}

impl TransportError {
    /// Whether this error reflects a real transport failure (as opposed to
    /// a local short-circuit while disconnected).
    pub fn is_link_failure(self) -> bool {
        !matches!(self, Self::NotConnected)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected"),
            Self::Unreachable => write!(f, "remote unreachable"),
            Self::Rejected(status) => write!(f, "rejected (HTTP {status})"),
            Self::Malformed => write!(f, "malformed response"),
            Self::Partial { failed, attempted } => {
                write!(f, "{failed} of {attempted} writes failed")
            }
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Servo angle request outside `0..=180`.
    ServoAngleOutOfRange(i64),
    /// A tuning value outside its accepted range.
    TuningOutOfRange(&'static str),
    /// The remote value had the wrong JSON type for the named field.
    WrongType(&'static str),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServoAngleOutOfRange(angle) => {
                write!(f, "servo angle {angle} outside 0..=180")
            }
            Self::TuningOutOfRange(field) => write!(f, "{field} out of range"),
            Self::WrongType(field) => write!(f, "{field} has the wrong type"),
        }
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Two logical pins share one physical GPIO.
    PinConflict {
        first: &'static str,
        second: &'static str,
        gpio: i32,
    },
    /// A configuration value failed range validation.
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PinConflict {
                first,
                second,
                gpio,
            } => write!(f, "{first} and {second} both assigned to GPIO {gpio}"),
            Self::Invalid(msg) => write!(f, "invalid: {msg}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
