//! Frame timing for the redraw loop.

use std::time::{Duration, Instant};

/// Weight of the newest frame in the smoothed FPS estimate.
const FPS_SMOOTHING: f32 = 0.1;

/// Tracks elapsed time since startup and per-frame deltas.
///
/// The elapsed time drives shader animation; nothing else in the
/// frame depends on the previous one.
#[derive(Debug)]
pub struct Time {
    /// Time when the clock started.
    start_time: Instant,
    /// Time of the last frame.
    last_frame: Instant,
    /// Duration of the last frame.
    delta: Duration,
    /// Total elapsed time since start.
    elapsed: Duration,
    /// Frame count since start.
    frame_count: u64,
    /// Exponentially smoothed frames per second.
    smoothed_fps: f32,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    /// Start a new clock at the current instant.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Start a clock at a given instant.
    pub fn starting_at(now: Instant) -> Self {
        Self {
            start_time: now,
            last_frame: now,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
            smoothed_fps: 0.0,
        }
    }

    /// Update timing at the start of a new frame.
    pub fn update(&mut self) {
        self.update_at(Instant::now());
    }

    /// Update timing as if the frame started at `now`.
    pub fn update_at(&mut self, now: Instant) {
        self.delta = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        self.elapsed = now.saturating_duration_since(self.start_time);
        self.frame_count += 1;

        let dt = self.delta.as_secs_f32();
        if dt > 0.0 {
            let fps = 1.0 / dt;
            self.smoothed_fps = if self.smoothed_fps == 0.0 {
                fps
            } else {
                self.smoothed_fps + (fps - self.smoothed_fps) * FPS_SMOOTHING
            };
        }
    }

    /// Get total elapsed time in seconds.
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Get the current frame count.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Smoothed frames per second (0 until two frames have been seen).
    pub fn fps(&self) -> f32 {
        self.smoothed_fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_tracks_elapsed_and_frames() {
        let start = Instant::now();
        let mut time = Time::starting_at(start);
        time.update_at(start + Duration::from_millis(100));
        time.update_at(start + Duration::from_millis(150));

        assert_eq!(time.frame_count(), 2);
        assert!((time.elapsed_seconds() - 0.15).abs() < 1e-4);
        assert_eq!(time.delta, Duration::from_millis(50));
    }

    #[test]
    fn fps_starts_at_first_measurement_then_smooths() {
        let start = Instant::now();
        let mut time = Time::starting_at(start);
        assert_eq!(time.fps(), 0.0);

        time.update_at(start + Duration::from_millis(10));
        assert!((time.fps() - 100.0).abs() < 0.5);

        time.update_at(start + Duration::from_millis(30));
        // 100 + (50 - 100) * 0.1
        assert!((time.fps() - 95.0).abs() < 0.5);
    }

    #[test]
    fn instant_in_the_past_does_not_panic() {
        let start = Instant::now() + Duration::from_secs(1);
        let mut time = Time::starting_at(start);
        time.update_at(start - Duration::from_millis(5));
        assert_eq!(time.delta, Duration::ZERO);
        assert_eq!(time.fps(), 0.0);
    }
}
