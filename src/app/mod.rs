//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the control-loop rules for ToxiRover: obstacle
//! avoidance orchestration, gas alerting, and operator command handling.
//! All interaction with hardware and the remote store happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
