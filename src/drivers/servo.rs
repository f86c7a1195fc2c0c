//! Steering / sensor servo on LEDC channel 2.
//!
//! 50 Hz frame, 14-bit resolution.  0°..180° maps linearly onto a
//! 500–2500 µs pulse.

use crate::drivers::hw_init;
use crate::pins::SERVO_PWM_RESOLUTION_BITS;

pub const MAX_ANGLE: u8 = 180;
const MIN_PULSE_US: u32 = 500;
const MAX_PULSE_US: u32 = 2_500;
const FRAME_US: u32 = 20_000;

/// Angle → raw 14-bit duty.  Angles above 180 are clamped.
pub fn angle_to_duty(angle: u8) -> u32 {
    let angle = u32::from(angle.min(MAX_ANGLE));
    let pulse_us = MIN_PULSE_US + (MAX_PULSE_US - MIN_PULSE_US) * angle / u32::from(MAX_ANGLE);
    let full_scale = 1u32 << SERVO_PWM_RESOLUTION_BITS;
    pulse_us * full_scale / FRAME_US
}

pub struct ServoDriver {
    angle: u8,
}

impl ServoDriver {
    /// The initial angle is only recorded; call [`set_angle`](Self::set_angle)
    /// to drive the output.
    pub fn new(initial_angle: u8) -> Self {
        Self {
            angle: initial_angle.min(MAX_ANGLE),
        }
    }

    pub fn set_angle(&mut self, angle: u8) {
        let angle = angle.min(MAX_ANGLE);
        hw_init::ledc_set(hw_init::LEDC_CH_SERVO, angle_to_duty(angle));
        self.angle = angle;
    }

    pub fn angle(&self) -> u8 {
        self.angle
    }
}
