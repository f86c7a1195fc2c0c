//! GPIO / peripheral pin assignments for the ToxiRover main board.
//!
//! Single source of truth: every driver references a [`PinMap`] rather
//! than hard-coding pin numbers.  The map is validated once at start-up;
//! two logical pins sharing a physical GPIO is fatal.

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Analog input
// ---------------------------------------------------------------------------

/// FC-22 gas sensor analog output, ADC1 channel 0.
pub const GAS_ADC_CHANNEL: u32 = 0;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC resolution for the motor enable channels (8-bit, 0 – 255).
pub const MOTOR_PWM_RESOLUTION_BITS: u32 = 8;
/// Motor PWM frequency (1 kHz suits the L298N).
pub const MOTOR_PWM_FREQ_HZ: u32 = 1_000;
/// LEDC resolution for the steering servo (14-bit for sub-degree steps).
pub const SERVO_PWM_RESOLUTION_BITS: u32 = 14;
/// Standard hobby-servo frame rate.
pub const SERVO_PWM_FREQ_HZ: u32 = 50;

// ---------------------------------------------------------------------------
// Pin map
// ---------------------------------------------------------------------------

/// Highest GPIO number on the ESP32 (34–39 are input-only).
pub const MAX_GPIO: i32 = 39;

/// Logical → physical GPIO assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMap {
    /// HC-SR04 trigger (output).
    pub ultrasonic_trig: i32,
    /// HC-SR04 echo (input).
    pub ultrasonic_echo: i32,
    /// Steering / sensor servo signal (LEDC).
    pub servo: i32,
    /// L298N left-motor enable (LEDC).
    pub motor_ena: i32,
    pub motor_in1: i32,
    pub motor_in2: i32,
    pub motor_in3: i32,
    pub motor_in4: i32,
    /// L298N right-motor enable (LEDC).
    pub motor_enb: i32,
    /// FC-22 gas sensor digital threshold output (input).
    pub gas_digital: i32,
}

impl Default for PinMap {
    /// Reference wiring.
    fn default() -> Self {
        Self {
            ultrasonic_trig: 4,
            ultrasonic_echo: 5,
            servo: 2,
            motor_ena: 14,
            motor_in1: 12,
            motor_in2: 13,
            motor_in3: 15,
            motor_in4: 3,
            motor_enb: 16,
            gas_digital: 0,
        }
    }
}

impl PinMap {
    /// Every logical pin with its name, in declaration order.
    pub fn assignments(&self) -> [(&'static str, i32); 10] {
        [
            ("ultrasonic_trig", self.ultrasonic_trig),
            ("ultrasonic_echo", self.ultrasonic_echo),
            ("servo", self.servo),
            ("motor_ena", self.motor_ena),
            ("motor_in1", self.motor_in1),
            ("motor_in2", self.motor_in2),
            ("motor_in3", self.motor_in3),
            ("motor_in4", self.motor_in4),
            ("motor_enb", self.motor_enb),
            ("gas_digital", self.gas_digital),
        ]
    }

    /// Reject maps with a GPIO outside the chip or where two logical pins
    /// share a GPIO.
    ///
    /// Reports the first conflict in declaration order.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pins = self.assignments();
        for (i, &(first, gpio)) in pins.iter().enumerate() {
            if !(0..=MAX_GPIO).contains(&gpio) {
                return Err(ConfigError::Invalid("GPIO number outside 0..=39"));
            }
            if let Some(&(second, _)) = pins[i + 1..].iter().find(|(_, other)| *other == gpio) {
                return Err(ConfigError::PinConflict {
                    first,
                    second,
                    gpio,
                });
            }
        }
        Ok(())
    }
}
