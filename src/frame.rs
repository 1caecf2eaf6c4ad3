//! Per-frame timing and the context threaded through update and draw.

use std::time::{Duration, Instant};

use crate::input::{KeyboardState, MouseState};

/// Longest frame step handed to the update, so a stall (window drag, breakpoint) does not
/// teleport the camera.
pub const MAX_DELTA: Duration = Duration::from_millis(250);

/// Measures the time between frames.
#[derive(Clone, Copy, Debug)]
pub struct FrameClock {
    last: Instant,
    frame: u64,
    elapsed: Duration,
}

impl FrameClock {
    pub fn new(now: Instant) -> Self {
        Self {
            last: now,
            frame: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Advances to `now` and returns the (capped) time since the previous tick in seconds.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let delta = now.saturating_duration_since(self.last).min(MAX_DELTA);
        self.last = now;
        self.frame += 1;
        self.elapsed += delta;
        delta.as_secs_f32()
    }

    /// Number of ticks so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Sum of all deltas returned so far.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Context provided to the update and draw phases of one frame.
pub struct FrameContext<'a> {
    pub keyboard: &'a KeyboardState,
    pub mouse: &'a MouseState,
    pub delta_time: f32,
    pub frame: u64,
    pub aspect_ratio: f32,
}

impl<'a> FrameContext<'a> {
    pub fn new(
        keyboard: &'a KeyboardState,
        mouse: &'a MouseState,
        clock: &FrameClock,
        delta_time: f32,
        aspect_ratio: f32,
    ) -> Self {
        Self {
            keyboard,
            mouse,
            delta_time,
            frame: clock.frame(),
            aspect_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_measures_deltas() {
        let start = Instant::now();
        let mut clock = FrameClock::new(start);
        let dt = clock.tick(start + Duration::from_millis(16));
        assert!((dt - 0.016).abs() < 1e-6);
        assert_eq!(clock.frame(), 1);

        clock.tick(start + Duration::from_millis(40));
        assert_eq!(clock.elapsed(), Duration::from_millis(40));
    }

    #[test]
    fn long_stalls_are_capped() {
        let start = Instant::now();
        let mut clock = FrameClock::new(start);
        let dt = clock.tick(start + Duration::from_secs(5));
        assert_eq!(dt, MAX_DELTA.as_secs_f32());
    }

    #[test]
    fn time_never_runs_backwards() {
        let start = Instant::now() + Duration::from_secs(1);
        let mut clock = FrameClock::new(start);
        assert_eq!(clock.tick(start - Duration::from_millis(10)), 0.0);
    }
}
