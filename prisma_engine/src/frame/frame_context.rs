/// FrameContext - explicit per-frame timing value
///
/// Produced by `FrameClock::tick` (or built directly in tests with synthetic
/// time) and passed by value to everything that needs the frame time.

use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    /// Seconds since the previous frame
    pub delta_time: f32,
    /// Monotonic frame counter, starting at 0
    pub frame_index: u64,
    /// Seconds since the clock started
    pub total_time: f64,
}

impl FrameContext {
    pub fn new(delta_time: f32, frame_index: u64, total_time: f64) -> Self {
        Self { delta_time, frame_index, total_time }
    }
}

/// Turns wall-clock samples into `FrameContext` values
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last_sample: Option<f64>,
    next_index: u64,
    max_delta: f32,
}

impl FrameClock {
    /// `max_delta` caps the reported delta (debugger pauses, window drags)
    pub fn new(max_delta: f32) -> Self {
        Self { start: Instant::now(), last_sample: None, next_index: 0, max_delta }
    }

    /// Advance using an explicit sample time in seconds
    ///
    /// The first tick reports a zero delta. Samples going backwards are
    /// treated as a zero delta.
    pub fn tick(&mut self, now_seconds: f64) -> FrameContext {
        let delta = match self.last_sample {
            Some(last) => ((now_seconds - last).max(0.0) as f32).min(self.max_delta),
            None => 0.0,
        };
        self.last_sample = Some(now_seconds);

        let context = FrameContext {
            delta_time: delta,
            frame_index: self.next_index,
            total_time: now_seconds,
        };
        self.next_index += 1;
        context
    }

    /// Advance using the wall clock
    pub fn tick_now(&mut self) -> FrameContext {
        let now = self.start.elapsed().as_secs_f64();
        self.tick(now)
    }

    /// Frames produced so far
    pub fn frame_count(&self) -> u64 {
        self.next_index
    }
}

#[cfg(test)]
#[path = "frame_context_tests.rs"]
mod tests;
