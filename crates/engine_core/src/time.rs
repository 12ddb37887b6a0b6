//! Frame timing for the tick loop.

use std::time::{Duration, Instant};

/// Tracks per-tick elapsed time.
///
/// `update` measures wall-clock time between frames; `advance` steps by a
/// fixed duration so headless runs and tests stay reproducible.
#[derive(Debug)]
pub struct Time {
    /// Time of the last wall-clock update.
    last_frame: Instant,
    /// Duration of the last tick.
    delta: Duration,
    /// Total simulated time.
    elapsed: Duration,
    /// Tick count since start.
    frame_count: u64,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    /// Create a new time manager.
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Update timing from the wall clock at the start of a new frame.
    pub fn update(&mut self) {
        let now = Instant::now();
        let delta = now - self.last_frame;
        self.last_frame = now;
        self.advance(delta);
    }

    /// Step by an explicit duration.
    pub fn advance(&mut self, delta: Duration) {
        self.delta = delta;
        self.elapsed += delta;
        self.frame_count += 1;
    }

    /// Get the delta time in seconds.
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Get the delta time in milliseconds. Locomotion speeds are tuned per millisecond.
    pub fn delta_millis(&self) -> f32 {
        self.delta.as_secs_f32() * 1000.0
    }

    /// Get total elapsed time in seconds.
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Get the current frame count.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_accumulates() {
        let mut time = Time::new();
        time.advance(Duration::from_millis(100));
        time.advance(Duration::from_millis(50));
        assert_eq!(time.frame_count(), 2);
        assert!((time.delta_millis() - 50.0).abs() < 1e-3);
        assert!((time.elapsed_seconds() - 0.15).abs() < 1e-5);
    }
}
