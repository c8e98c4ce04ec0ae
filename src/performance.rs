use std::time::{Duration, Instant};

/// Frames per second, recomputed once per update interval.
pub struct FpsCounter {
    window_start: Instant,
    update_interval: Duration,
    frames_in_window: u32,
    frame_count: u64,
    fps: u32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(now: Instant) -> Self {
        Self {
            window_start: now,
            update_interval: Duration::from_secs(1),
            frames_in_window: 0,
            frame_count: 0,
            fps: 0,
        }
    }

    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    pub fn tick_at(&mut self, now: Instant) {
        self.frames_in_window += 1;
        self.frame_count += 1;

        let elapsed = now.duration_since(self.window_start);
        if elapsed >= self.update_interval {
            self.fps = (self.frames_in_window as f32 / elapsed.as_secs_f32()).round() as u32;
            self.frames_in_window = 0;
            self.window_start = now;
        }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}
