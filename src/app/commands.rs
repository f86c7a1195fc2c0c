//! Inbound commands to the application service.
//!
//! These represent actions requested by the operator through the remote
//! store that the [`AppService`](super::service::AppService) interprets and
//! acts upon.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::drivers::motor::Drive;
use crate::sync::records::AvoidanceTuning;

/// Operator drive request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MotionCommand {
    Forward,
    Backward,
    Left,
    Right,
    #[default]
    Stop,
}

impl MotionCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "FORWARD",
            Self::Backward => "BACKWARD",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Stop => "STOP",
        }
    }

    /// Motor drive for this command; `None` means stop.
    pub fn drive(self) -> Option<Drive> {
        match self {
            Self::Forward => Some(Drive::Forward),
            Self::Backward => Some(Drive::Reverse),
            Self::Left => Some(Drive::TurnLeft),
            Self::Right => Some(Drive::TurnRight),
            Self::Stop => None,
        }
    }
}

impl FromStr for MotionCommand {
    type Err = ();

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        [
            Self::Forward,
            Self::Backward,
            Self::Left,
            Self::Right,
            Self::Stop,
        ]
        .into_iter()
        .find(|m| m.as_str().eq_ignore_ascii_case(s))
        .ok_or(())
    }
}

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppCommand {
    /// Stop everything, centre the servo, release the avoidance latch.
    EmergencyStop,

    /// Return the avoidance controller to its boot state.
    ResetAvoidance,

    /// Apply avoidance tuning overrides (validated before use).
    Tune(AvoidanceTuning),

    /// Operator drive request.
    Motion(MotionCommand),

    /// Operator steering request (0–180).
    SteerTo(u8),
}
