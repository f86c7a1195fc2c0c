//! Drive motor driver (L298N dual H-bridge).
//!
//! Two DC motors, each with a pair of direction pins (IN1/IN2 left,
//! IN3/IN4 right) and an LEDC PWM enable (ENA/ENB, 8-bit).
//!
//! Turning is skid-steer: one side forward, the other reverse.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives real PWM and GPIO via hw_init helpers.
//! On host/test: the hw_init calls are no-ops; state is tracked in-memory.

use crate::drivers::hw_init;
use crate::pins::PinMap;

/// Requested drive direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drive {
    Forward,
    Reverse,
    TurnLeft,
    TurnRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorState {
    Stopped,
    Running { drive: Drive, speed_pct: u8 },
}

/// Direction pin levels for one side of the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Forward,
    Reverse,
    Coast,
}

impl Side {
    fn levels(self) -> (bool, bool) {
        match self {
            Self::Forward => (true, false),
            Self::Reverse => (false, true),
            Self::Coast => (false, false),
        }
    }
}

pub struct MotorDriver {
    in1: i32,
    in2: i32,
    in3: i32,
    in4: i32,
    state: MotorState,
}

impl MotorDriver {
    pub fn new(pins: &PinMap) -> Self {
        Self {
            in1: pins.motor_in1,
            in2: pins.motor_in2,
            in3: pins.motor_in3,
            in4: pins.motor_in4,
            state: MotorState::Stopped,
        }
    }

    pub fn set(&mut self, drive: Drive, speed_pct: u8) {
        let speed_pct = speed_pct.min(100);
        if speed_pct == 0 {
            self.stop();
            return;
        }

        let (left, right) = match drive {
            Drive::Forward => (Side::Forward, Side::Forward),
            Drive::Reverse => (Side::Reverse, Side::Reverse),
            Drive::TurnLeft => (Side::Reverse, Side::Forward),
            Drive::TurnRight => (Side::Forward, Side::Reverse),
        };
        self.set_sides_hw(left, right);
        self.set_duty_hw(speed_pct);

        self.state = MotorState::Running { drive, speed_pct };
    }

    /// Coast both motors and zero the enables.
    pub fn stop(&mut self) {
        self.set_duty_hw(0);
        self.set_sides_hw(Side::Coast, Side::Coast);
        self.state = MotorState::Stopped;
    }

    fn set_sides_hw(&self, left: Side, right: Side) {
        let (a, b) = left.levels();
        hw_init::gpio_write(self.in1, a);
        hw_init::gpio_write(self.in2, b);
        let (c, d) = right.levels();
        hw_init::gpio_write(self.in3, c);
        hw_init::gpio_write(self.in4, d);
    }

    fn set_duty_hw(&self, speed_pct: u8) {
        let duty = pct_to_duty(speed_pct);
        hw_init::ledc_set(hw_init::LEDC_CH_MOTOR_A, duty);
        hw_init::ledc_set(hw_init::LEDC_CH_MOTOR_B, duty);
    }

    pub fn state(&self) -> MotorState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        !matches!(self.state, MotorState::Stopped)
    }
}

/// Percentage → 8-bit LEDC duty.
pub fn pct_to_duty(speed_pct: u8) -> u32 {
    u32::from(speed_pct.min(100)) * 255 / 100
}
