use serde::{Deserialize, Serialize};

/// The pickup kinds a run can spawn.
///
/// `DoubleJump` grants a stored charge (consumed by use, not by time),
/// `Life` applies instantly, and the rest arm a [`StatusTimer`] on the
/// player body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerupKind {
    DoubleJump,
    SlowFall,
    Fly,
    Shrink,
    Speed,
    Invincibility,
    Life,
}

/// Millisecond countdown for a temporary status effect.
///
/// Collecting the same pickup again extends the remaining time instead of
/// resetting it. `tick` reports expiry exactly once so the owner can run
/// the effect's teardown (restore dimensions, stop a sound loop) on the
/// frame it lapses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusTimer {
    remaining_ms: f32,
}

impl StatusTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> bool {
        self.remaining_ms > 0.0
    }

    pub fn remaining_ms(&self) -> f32 {
        self.remaining_ms
    }

    /// Add `ms` to the remaining time.
    pub fn extend(&mut self, ms: f32) {
        self.remaining_ms += ms;
    }

    /// Overwrite the remaining time.
    pub fn set(&mut self, ms: f32) {
        self.remaining_ms = ms.max(0.0);
    }

    pub fn clear(&mut self) {
        self.remaining_ms = 0.0;
    }

    /// Advance by `dt_ms`. Returns true on the tick the timer runs out.
    pub fn tick(&mut self, dt_ms: f32) -> bool {
        if self.remaining_ms <= 0.0 {
            return false;
        }
        self.remaining_ms -= dt_ms;
        if self.remaining_ms <= 0.0 {
            self.remaining_ms = 0.0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_inactive() {
        let t = StatusTimer::new();
        assert!(!t.active());
        assert_eq!(t.remaining_ms(), 0.0);
    }

    #[test]
    fn extend_activates_and_stacks() {
        let mut t = StatusTimer::new();
        t.extend(5000.0);
        assert!(t.active());
        t.extend(5000.0);
        assert_eq!(t.remaining_ms(), 10000.0);
    }

    #[test]
    fn tick_reports_expiry_exactly_once() {
        let mut t = StatusTimer::new();
        t.extend(100.0);
        assert!(!t.tick(60.0), "Still running, no expiry yet");
        assert!(t.tick(60.0), "Must report expiry on the tick it lapses");
        assert!(!t.tick(60.0), "Expired timer must stay silent");
        assert!(!t.active());
    }

    #[test]
    fn tick_on_inactive_is_noop() {
        let mut t = StatusTimer::new();
        assert!(!t.tick(16.0));
        assert_eq!(t.remaining_ms(), 0.0);
    }

    #[test]
    fn set_overwrites_clear_zeroes() {
        let mut t = StatusTimer::new();
        t.extend(8000.0);
        t.set(3000.0);
        assert_eq!(t.remaining_ms(), 3000.0);
        t.clear();
        assert!(!t.active());
        t.set(-50.0);
        assert!(!t.active(), "Negative set must clamp to zero");
    }
}
