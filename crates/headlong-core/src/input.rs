use serde::{Deserialize, Serialize};

/// Baseline frame duration the simulation is normalized against (60 Hz).
pub const FRAME_MS: f32 = 16.667;
/// Lower clamp on the normalized delta, so a long hitch cannot tunnel
/// bodies through geometry.
pub const MIN_DT_NORM: f32 = 0.25;
/// Upper clamp on the normalized delta.
pub const MAX_DT_NORM: f32 = 2.0;

/// Held-key state sampled once per tick.
///
/// The shell translates whatever raw input it has (keyboard, touch,
/// gamepad) into this snapshot; the simulation never sees input events.
/// `jump` doubles as the fly-thrust control while the fly effect is
/// active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub run: bool,
}

/// Everything a single simulation tick needs from the shell: the elapsed
/// wall time, the external time scale (slow-motion), and the input state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameContext {
    pub dt_ms: f32,
    pub time_scale: f32,
    pub input: InputSnapshot,
}

impl FrameContext {
    pub fn new(dt_ms: f32, input: InputSnapshot) -> Self {
        Self {
            dt_ms,
            time_scale: 1.0,
            input,
        }
    }

    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }

    /// False for the deltas the session refuses to simulate (zero,
    /// negative, or non-finite time).
    pub fn is_valid(&self) -> bool {
        self.dt_ms.is_finite()
            && self.dt_ms > 0.0
            && self.time_scale.is_finite()
            && self.time_scale > 0.0
    }

    /// Delta expressed in 60 Hz frames, clamped to `[MIN_DT_NORM, MAX_DT_NORM]`.
    pub fn dt_norm(&self) -> f32 {
        (self.dt_ms / FRAME_MS).clamp(MIN_DT_NORM, MAX_DT_NORM)
    }

    /// Normalized delta with the time scale applied; the multiplier every
    /// per-frame rate (velocity, gravity, decay) is integrated by.
    pub fn step(&self) -> f32 {
        self.time_scale * self.dt_norm()
    }

    /// Milliseconds of simulated time this tick (`dt_ms` slowed by the
    /// time scale). Countdown timers that should stretch under slow
    /// motion run on this clock.
    pub fn scaled_ms(&self) -> f32 {
        self.dt_ms * self.time_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dt_norm_is_one_at_baseline() {
        let ctx = FrameContext::new(FRAME_MS, InputSnapshot::default());
        assert!((ctx.dt_norm() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn dt_norm_clamps_extremes() {
        let hitch = FrameContext::new(500.0, InputSnapshot::default());
        assert_eq!(hitch.dt_norm(), MAX_DT_NORM);
        let fast = FrameContext::new(0.5, InputSnapshot::default());
        assert_eq!(fast.dt_norm(), MIN_DT_NORM);
    }

    #[test]
    fn step_applies_time_scale() {
        let ctx = FrameContext::new(FRAME_MS, InputSnapshot::default()).with_time_scale(0.15);
        assert!((ctx.step() - 0.15).abs() < 1e-4);
    }

    #[test]
    fn invalid_deltas_rejected() {
        let input = InputSnapshot::default();
        assert!(!FrameContext::new(0.0, input).is_valid());
        assert!(!FrameContext::new(-16.0, input).is_valid());
        assert!(!FrameContext::new(f32::NAN, input).is_valid());
        assert!(!FrameContext::new(16.0, input).with_time_scale(0.0).is_valid());
        assert!(FrameContext::new(16.0, input).is_valid());
    }
}
