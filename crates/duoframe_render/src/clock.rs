//! Fixed-step frame clock
//!
//! The cube's rotation is driven by frame count, not wall time: every tick
//! advances the clock by the same step regardless of how long the frame took.

/// Default advance per frame
pub const DEFAULT_TIME_STEP: f32 = 0.01;

/// Frame timing snapshot
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Clock value after this tick
    pub time: f32,
    /// Monotonic frame counter, starting at 0 for the first tick
    pub frame_index: u64,
}

/// Monotonically increasing scalar owned by the coordinator
#[derive(Debug, Clone)]
pub struct FrameClock {
    time: f32,
    step: f32,
    frame_index: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_step(DEFAULT_TIME_STEP)
    }

    /// Create a clock with a custom step.
    ///
    /// Non-finite or non-positive steps fall back to [`DEFAULT_TIME_STEP`],
    /// so the clock always moves forward.
    pub fn with_step(step: f32) -> Self {
        let step = if step.is_finite() && step > 0.0 {
            step
        } else {
            log::warn!("invalid frame step {}, using {}", step, DEFAULT_TIME_STEP);
            DEFAULT_TIME_STEP
        };
        Self {
            time: 0.0,
            step,
            frame_index: 0,
        }
    }

    /// Advance by one step and return the new snapshot
    pub fn tick(&mut self) -> FrameTime {
        self.time += self.step;
        let ft = FrameTime {
            time: self.time,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }

    /// Current clock value
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    /// Number of ticks so far
    pub fn frames(&self) -> u64 {
        self.frame_index
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick() {
        let mut clock = FrameClock::new();
        let ft = clock.tick();
        assert_eq!(ft.time, 0.01);
        assert_eq!(ft.frame_index, 0);
        assert_eq!(clock.frames(), 1);
    }

    #[test]
    fn test_monotonic() {
        let mut clock = FrameClock::with_step(0.5);
        let times: Vec<f32> = (0..5).map(|_| clock.tick().time).collect();
        assert_eq!(times, vec![0.5, 1.0, 1.5, 2.0, 2.5]);
        assert!(times.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_invalid_step_falls_back() {
        assert_eq!(FrameClock::with_step(0.0).step(), DEFAULT_TIME_STEP);
        assert_eq!(FrameClock::with_step(-1.0).step(), DEFAULT_TIME_STEP);
        assert_eq!(FrameClock::with_step(f32::NAN).step(), DEFAULT_TIME_STEP);
    }
}
