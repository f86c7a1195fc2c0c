//! Fixed-interval cadences for the control loop.
//!
//! The loop itself runs at `control_loop_interval_ms`; slower duties
//! (telemetry, command polling, reconnects) each own a [`Cadence`] and run
//! on the ticks where it comes due.
//!
//! ```text
//!  tick ─▶ sense ─▶ avoid ─▶ gas ─┬─ link down? ─▶ reconnect cadence
//!                                  └─ link up ───▶ alerts ─▶ command cadence
//!                                                          ─▶ telemetry cadence
//! ```
//!
//! No catch-up: after a long stall a cadence fires once, not once per
//! missed interval.

/// One fixed-interval duty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    interval_ms: u64,
    last_fire_ms: Option<u64>,
}

impl Cadence {
    pub const fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_fire_ms: None,
        }
    }

    /// `true` on the first call, then once at least `interval_ms` has
    /// passed since the last `true`.
    pub fn due(&mut self, now_ms: u64) -> bool {
        let fire = match self.last_fire_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
        };
        if fire {
            self.last_fire_ms = Some(now_ms);
        }
        fire
    }

    /// Make the next [`due`](Self::due) fire immediately.
    pub fn reset(&mut self) {
        self.last_fire_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_first_then_at_interval() {
        let mut c = Cadence::new(500);
        assert!(c.due(0));
        assert!(!c.due(100));
        assert!(!c.due(499));
        assert!(c.due(500));
        assert!(!c.due(900));
        assert!(c.due(1_000));
    }

    #[test]
    fn no_catch_up_after_stall() {
        let mut c = Cadence::new(500);
        assert!(c.due(0));
        assert!(c.due(5_000));
        assert!(!c.due(5_100));
    }

    #[test]
    fn reset_forces_next_fire() {
        let mut c = Cadence::new(2_000);
        assert!(c.due(0));
        c.reset();
        assert!(c.due(10));
    }
}
