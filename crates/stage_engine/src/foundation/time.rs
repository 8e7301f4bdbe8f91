//! Time management utilities
//!
//! [`FrameTimer`] drives the frame loop either with a variable step (the
//! measured frame time) or a fixed step (`1 / hz` seconds, consumed from an
//! accumulator). Frame times are clamped so that a long stall does not make
//! a fixed-step loop spin through hundreds of updates to catch up.

use std::time::{Duration, Instant};

/// Longest frame time accepted before clamping, in seconds
pub const DEFAULT_MAX_FRAME_TIME: f32 = 0.25;

/// Frame timer with fixed or variable step
#[derive(Debug, Clone)]
pub struct FrameTimer {
    last_tick: Instant,
    fixed_step_hz: Option<u32>,
    max_frame_time: f32,
    accumulator: f32,
    frame_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimer {
    /// Create a variable-step timer
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
            fixed_step_hz: None,
            max_frame_time: DEFAULT_MAX_FRAME_TIME,
            accumulator: 0.0,
            frame_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Switch to fixed-step mode at `hz` updates per second.
    ///
    /// Resets the accumulator. A rate of zero switches back to variable step.
    pub fn set_fixed(&mut self, hz: u32) {
        self.fixed_step_hz = (hz > 0).then_some(hz);
        self.accumulator = 0.0;
        self.last_tick = Instant::now();
    }

    /// Switch to variable-step mode
    pub fn set_variable(&mut self) {
        self.fixed_step_hz = None;
        self.accumulator = 0.0;
        self.last_tick = Instant::now();
    }

    /// Override the frame time clamp
    pub fn set_max_frame_time(&mut self, seconds: f32) {
        self.max_frame_time = seconds.max(0.0);
    }

    /// Whether the timer is in fixed-step mode
    pub const fn is_fixed(&self) -> bool {
        self.fixed_step_hz.is_some()
    }

    /// Measure wall time since the previous tick and feed it to
    /// [`update_frame_time`](Self::update_frame_time)
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        self.update_frame_time(elapsed)
    }

    /// Record a frame of `elapsed` seconds and return the clamped frame time
    pub fn update_frame_time(&mut self, elapsed: f32) -> f32 {
        self.frame_time = elapsed.clamp(0.0, self.max_frame_time);
        self.total_time += self.frame_time;
        self.frame_count += 1;

        if self.is_fixed() {
            self.accumulator += self.frame_time;
        }

        self.frame_time
    }

    /// Whether another update should run this frame.
    ///
    /// Always true in variable mode (callers run exactly one update). In fixed
    /// mode each `true` consumes one step from the accumulator.
    pub fn can_update(&mut self) -> bool {
        let Some(step) = self.fixed_step() else {
            return true;
        };

        if self.accumulator >= step {
            self.accumulator -= step;
            true
        } else {
            false
        }
    }

    /// Length of one fixed step, if in fixed mode
    pub fn fixed_step(&self) -> Option<f32> {
        self.fixed_step_hz.map(|hz| 1.0 / hz as f32)
    }

    /// Time step to use for updates
    pub fn delta_time(&self) -> f32 {
        self.fixed_step().unwrap_or(self.frame_time)
    }

    /// Total (clamped) time recorded
    pub const fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Number of frames recorded
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Simple stopwatch for measuring elapsed time
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub const fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time.take() {
            self.elapsed += start.elapsed();
        }
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        self.elapsed + self.start_time.map_or(Duration::ZERO, |start| start.elapsed())
    }

    /// Check if the stopwatch is currently running
    pub const fn is_running(&self) -> bool {
        self.start_time.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_variable_step_uses_frame_time() {
        let mut timer = FrameTimer::new();
        timer.update_frame_time(0.016);
        assert!(timer.can_update());
        assert_relative_eq!(timer.delta_time(), 0.016);
    }

    #[test]
    fn test_frame_time_is_clamped() {
        let mut timer = FrameTimer::new();
        assert_relative_eq!(timer.update_frame_time(3.0), DEFAULT_MAX_FRAME_TIME);
    }

    #[test]
    fn test_fixed_step_consumes_accumulator() {
        let mut timer = FrameTimer::new();
        timer.set_fixed(10);
        timer.update_frame_time(0.25);

        let mut updates = 0;
        while timer.can_update() {
            updates += 1;
        }

        assert_eq!(updates, 2);
        assert_relative_eq!(timer.delta_time(), 0.1);

        // Leftover 0.05 plus another 0.06 makes one more step
        timer.update_frame_time(0.06);
        assert!(timer.can_update());
        assert!(!timer.can_update());
    }

    #[test]
    fn test_stopwatch_accumulates() {
        let mut watch = Stopwatch::start_new();
        assert!(watch.is_running());
        watch.stop();
        assert!(!watch.is_running());
        let first = watch.elapsed();
        assert_eq!(watch.elapsed(), first);
    }
}
