//! Frame timing.
//!
//! The engine is driven by animation-frame timestamps supplied by the host
//! (milliseconds on a monotonic clock), not by reading the system clock
//! itself. [`FrameClock`] turns those timestamps into a clamped per-frame
//! delta, tracks elapsed time and frame count, and measures FPS.
//!
//! # Example
//!
//! ```ignore
//! use ringfx::clock::FrameClock;
//!
//! let mut clock = FrameClock::new();
//!
//! // In the frame callback:
//! let dt = clock.tick(timestamp_ms);
//!
//! println!("Elapsed: {:.2}s", clock.elapsed());
//! println!("Frame: {}", clock.frame());
//! println!("FPS: {:.1}", clock.fps());
//! ```

/// Largest delta a single frame may advance, in seconds.
///
/// A long gap (backgrounded tab, debugger pause) advances the simulation by
/// at most this much instead of jumping.
pub const MAX_FRAME_DELTA: f32 = 0.05;

/// Timestamp-driven frame clock.
#[derive(Debug, Clone)]
pub struct FrameClock {
    /// Timestamp of the previous tick, `None` until the first tick after a
    /// (re)start.
    last_timestamp: Option<f64>,
    /// Total simulated time in seconds.
    elapsed_secs: f32,
    /// Delta returned by the last tick.
    delta_secs: f32,
    /// Ticks since creation or reset.
    frame_count: u64,
    /// Measured frames per second.
    fps: f32,
    fps_frame_count: u64,
    fps_window_start: Option<f64>,
    /// How often FPS is recomputed, in milliseconds.
    fps_update_interval: f64,
    paused: bool,
    /// Upper bound on a single delta.
    max_delta: f32,
    /// Fixed delta for deterministic playback (optional).
    fixed_delta: Option<f32>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last_timestamp: None,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_window_start: None,
            fps_update_interval: 500.0,
            paused: false,
            max_delta: MAX_FRAME_DELTA,
            fixed_delta: None,
        }
    }

    /// Advance to `timestamp_ms` and return the frame delta in seconds.
    ///
    /// The first tick after creation, `reset` or `resume` returns 0. A
    /// timestamp earlier than the previous one also yields 0. While paused
    /// the delta is 0 and elapsed time does not move.
    pub fn tick(&mut self, timestamp_ms: f64) -> f32 {
        if self.paused || !timestamp_ms.is_finite() {
            self.delta_secs = 0.0;
            return 0.0;
        }

        let raw = match self.last_timestamp {
            Some(last) => ((timestamp_ms - last) / 1000.0).max(0.0) as f32,
            None => 0.0,
        };
        self.last_timestamp = Some(timestamp_ms);

        self.delta_secs = match self.fixed_delta {
            Some(fixed) => fixed,
            None => raw.min(self.max_delta),
        };
        self.elapsed_secs += self.delta_secs;
        self.frame_count += 1;

        match self.fps_window_start {
            None => {
                self.fps_window_start = Some(timestamp_ms);
                self.fps_frame_count = self.frame_count;
            }
            Some(start) => {
                let window = timestamp_ms - start;
                if window >= self.fps_update_interval {
                    let frames = self.frame_count - self.fps_frame_count;
                    self.fps = (frames as f64 / (window / 1000.0)) as f32;
                    self.fps_frame_count = self.frame_count;
                    self.fps_window_start = Some(timestamp_ms);
                }
            }
        }

        self.delta_secs
    }

    /// Simulated time in seconds (sum of returned deltas).
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn max_delta(&self) -> f32 {
        self.max_delta
    }

    /// Stop advancing. Ticks return 0 until [`FrameClock::resume`].
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume after a pause. The next tick returns 0 so the paused gap is
    /// never simulated.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.last_timestamp = None;
            self.fps_window_start = None;
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Set a fixed delta for deterministic playback. `None` uses real
    /// timestamps again.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta.map(|d| d.max(0.0));
    }

    /// Change the per-frame clamp. Non-positive values are ignored.
    pub fn set_max_delta(&mut self, max_delta: f32) {
        if max_delta > 0.0 {
            self.max_delta = max_delta;
        }
    }

    /// Forget all timing state, as if freshly created. The clamp and fixed
    /// delta settings are kept.
    pub fn reset(&mut self) {
        *self = Self {
            max_delta: self.max_delta,
            fixed_delta: self.fixed_delta,
            fps_update_interval: self.fps_update_interval,
            ..Self::new()
        };
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
    fn test_first_tick_is_zero() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick(1234.0), 0.0);
        assert_eq!(clock.frame(), 1);
        assert!((clock.tick(1250.0) - 0.016).abs() < 1e-6);
    }

    #[test]
    fn test_long_gap_is_clamped() {
        let mut clock = FrameClock::new();
        clock.tick(0.0);
        assert_eq!(clock.tick(5000.0), MAX_FRAME_DELTA);
        assert_eq!(clock.elapsed(), MAX_FRAME_DELTA);
    }

    #[test]
    fn test_backwards_timestamp() {
        let mut clock = FrameClock::new();
        clock.tick(100.0);
        assert_eq!(clock.tick(50.0), 0.0);
        assert!((clock.tick(66.0) - 0.016).abs() < 1e-6);
    }

    #[test]
    fn test_pause_and_resume() {
        let mut clock = FrameClock::new();
        clock.tick(0.0);
        clock.tick(16.0);
        let elapsed = clock.elapsed();

        clock.pause();
        assert!(clock.is_paused());
        assert_eq!(clock.tick(32.0), 0.0);
        assert_eq!(clock.elapsed(), elapsed);

        clock.resume();
        // the paused gap is skipped entirely
        assert_eq!(clock.tick(10_000.0), 0.0);
        assert!((clock.tick(10_016.0) - 0.016).abs() < 1e-6);
    }

    #[test]
    fn test_fixed_delta() {
        let mut clock = FrameClock::new();
        clock.set_fixed_delta(Some(1.0 / 60.0));
        clock.tick(0.0);
        assert!((clock.tick(900.0) - 1.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_fps_measurement() {
        let mut clock = FrameClock::new();
        for i in 0..=60 {
            clock.tick(i as f64 * 1000.0 / 60.0);
        }
        assert!((clock.fps() - 60.0).abs() < 1.0, "fps = {}", clock.fps());
    }

    #[test]
    fn test_reset_keeps_settings() {
        let mut clock = FrameClock::new();
        clock.set_max_delta(0.1);
        clock.tick(0.0);
        clock.tick(16.0);
        clock.reset();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.elapsed(), 0.0);
        assert_eq!(clock.max_delta(), 0.1);
        assert_eq!(clock.tick(500.0), 0.0);
        clock.set_max_delta(-1.0);
        assert_eq!(clock.max_delta(), 0.1);
    }
}
