//! Distance classification.
//!
//! Turns a raw [`DistanceSample`] into a [`HazardZone`].  `classify` is a
//! pure function of `(sample, thresholds)`: no retained state, no side
//! effects.  Boundary values land in the *less* hazardous zone
//! (`range < danger` is `Danger`, `range == danger` is `Warning`).

use serde::{Deserialize, Serialize};

/// One ultrasonic measurement.  `range_cm` is meaningless when `!valid`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceSample {
    pub range_cm: f32,
    pub valid: bool,
    pub measured_at_ms: u64,
}

impl DistanceSample {
    pub fn valid(range_cm: f32, measured_at_ms: u64) -> Self {
        Self {
            range_cm,
            valid: true,
            measured_at_ms,
        }
    }

    /// Echo timeout.
    pub fn timeout(measured_at_ms: u64) -> Self {
        Self {
            range_cm: 0.0,
            valid: false,
            measured_at_ms,
        }
    }
}

/// Discretised hazard classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HazardZone {
    Error,
    Danger,
    Warning,
    Safe,
}

impl HazardZone {
    /// Wire/display name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Danger => "DANGER",
            Self::Warning => "WARNING",
            Self::Safe => "SAFE",
        }
    }

    /// Display severity (Error > Danger > Warning > Safe).
    ///
    /// Only for presentation; control decisions compare raw ranges.
    pub fn display_rank(self) -> u8 {
        match self {
            Self::Error => 3,
            Self::Danger => 2,
            Self::Warning => 1,
            Self::Safe => 0,
        }
    }
}

impl core::fmt::Display for HazardZone {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Range thresholds in centimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceThresholds {
    pub danger_cm: f32,
    pub warning_cm: f32,
    pub safe_confirm_cm: f32,
}

impl Default for DistanceThresholds {
    fn default() -> Self {
        Self {
            danger_cm: 20.0,
            warning_cm: 50.0,
            safe_confirm_cm: 100.0,
        }
    }
}

impl DistanceThresholds {
    /// Whether a range is far enough to report the path ahead as clear.
    /// Reporting only.
    pub fn is_clear(&self, range_cm: f32) -> bool {
        range_cm >= self.safe_confirm_cm
    }
}

/// Classify a sample against the given thresholds.
pub fn classify(sample: &DistanceSample, thresholds: &DistanceThresholds) -> HazardZone {
    if !sample.valid {
        return HazardZone::Error;
    }
    let range = sample.range_cm;
    if range < thresholds.danger_cm {
        HazardZone::Danger
    } else if range < thresholds.warning_cm {
        HazardZone::Warning
    } else {
        HazardZone::Safe
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(range: f32) -> HazardZone {
        classify(&DistanceSample::valid(range, 0), &DistanceThresholds::default())
    }

    #[test]
    fn invalid_sample_is_error() {
        let th = DistanceThresholds::default();
        assert_eq!(classify(&DistanceSample::timeout(10), &th), HazardZone::Error);
    }

    #[test]
    fn invalid_sample_ignores_stale_range() {
        let th = DistanceThresholds::default();
        let stale = DistanceSample {
            range_cm: 150.0,
            valid: false,
            measured_at_ms: 0,
        };
        assert_eq!(classify(&stale, &th), HazardZone::Error);
    }

    #[test]
    fn zones_by_range() {
        assert_eq!(zone(5.0), HazardZone::Danger);
        assert_eq!(zone(35.0), HazardZone::Warning);
        assert_eq!(zone(120.0), HazardZone::Safe);
    }

    #[test]
    fn boundaries_land_in_lower_zone() {
        assert_eq!(zone(19.999), HazardZone::Danger);
        assert_eq!(zone(20.0), HazardZone::Warning);
        assert_eq!(zone(49.999), HazardZone::Warning);
        assert_eq!(zone(50.0), HazardZone::Safe);
    }

    #[test]
    fn zero_range_is_danger() {
        assert_eq!(zone(0.0), HazardZone::Danger);
    }

    #[test]
    fn reconfigured_thresholds_apply() {
        let th = DistanceThresholds {
            danger_cm: 30.0,
            warning_cm: 80.0,
            safe_confirm_cm: 120.0,
        };
        assert_eq!(classify(&DistanceSample::valid(25.0, 0), &th), HazardZone::Danger);
        assert_eq!(classify(&DistanceSample::valid(60.0, 0), &th), HazardZone::Warning);
    }

    #[test]
    fn clear_path_uses_safe_confirm() {
        let th = DistanceThresholds::default();
        assert!(!th.is_clear(99.9));
        assert!(th.is_clear(100.0));
    }

    #[test]
    fn display_rank_orders_error_first() {
        assert!(HazardZone::Error.display_rank() > HazardZone::Danger.display_rank());
        assert!(HazardZone::Danger.display_rank() > HazardZone::Warning.display_rank());
        assert!(HazardZone::Warning.display_rank() > HazardZone::Safe.display_rank());
    }

    #[test]
    fn serialises_as_screaming_case() {
        assert_eq!(serde_json::to_string(&HazardZone::Danger).unwrap(), "\"DANGER\"");
    }
}
