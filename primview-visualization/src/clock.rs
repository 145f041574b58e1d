//! Frame rate measurement

use std::time::{Duration, Instant};

const SAMPLE_WINDOW: Duration = Duration::from_millis(500);

/// Averages the frame rate over half-second windows
#[derive(Debug, Clone)]
pub struct FrameClock {
    window_start: Instant,
    frames_in_window: u32,
    fps: f32,
    total_frames: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(now: Instant) -> Self {
        Self {
            window_start: now,
            frames_in_window: 0,
            fps: 0.0,
            total_frames: 0,
        }
    }

    /// Count a frame presented at `now`
    pub fn tick(&mut self, now: Instant) {
        self.frames_in_window += 1;
        self.total_frames += 1;

        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed >= SAMPLE_WINDOW {
            self.fps = self.frames_in_window as f32 / elapsed.as_secs_f32();
            self.frames_in_window = 0;
            self.window_start = now;
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
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
    use approx::assert_relative_eq;

    #[test]
    fn test_fps_over_window() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        for i in 1..=30 {
            clock.tick(start + Duration::from_millis(i * 1000 / 60));
        }
        assert_relative_eq!(clock.fps(), 60.0, epsilon = 0.5);
        assert_eq!(clock.total_frames(), 30);
    }

    #[test]
    fn test_fps_holds_within_window() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        clock.tick(start + Duration::from_millis(100));
        assert_eq!(clock.fps(), 0.0);
    }
}
