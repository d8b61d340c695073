//! Breath timer.
//!
//! A [`BreathPattern`] is four segment durations in seconds. Sampling it at
//! a time gives the current [`BreathPhase`], progress through that segment
//! and a ring scale that grows on inhale, holds, shrinks on exhale and rests.
//! The engine only ever sees the phase and scale, never the timer itself.

use crate::preset::BreathPhase;
use serde::{Deserialize, Serialize};

/// Ring scale at the bottom of the breath.
pub const MIN_RING_SCALE: f32 = 1.0;
/// Ring scale at the top of the breath.
pub const MAX_RING_SCALE: f32 = 1.2;

/// Durations of one breathing cycle, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BreathPattern {
    pub inhale: f32,
    pub hold_top: f32,
    pub exhale: f32,
    pub hold_bottom: f32,
}

impl Default for BreathPattern {
    fn default() -> Self {
        Self {
            inhale: 4.0,
            hold_top: 4.0,
            exhale: 4.0,
            hold_bottom: 2.0,
        }
    }
}

/// Where in the cycle a moment falls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreathSample {
    pub phase: BreathPhase,
    /// Progress through the current segment in `[0, 1]`.
    pub progress: f32,
    /// Ring scale between [`MIN_RING_SCALE`] and [`MAX_RING_SCALE`].
    pub ring_scale: f32,
    /// Completed cycles before this moment.
    pub cycle: u64,
}

impl BreathPattern {
    pub fn new(inhale: f32, hold_top: f32, exhale: f32, hold_bottom: f32) -> Self {
        Self {
            inhale,
            hold_top,
            exhale,
            hold_bottom,
        }
    }

    /// Length of one cycle. Negative or non-finite segments count as zero.
    pub fn total(&self) -> f32 {
        self.segments().iter().map(|(_, d)| *d).sum()
    }

    fn segments(&self) -> [(BreathPhase, f32); 4] {
        let clean = |d: f32| if d.is_finite() { d.max(0.0) } else { 0.0 };
        [
            (BreathPhase::Inhale, clean(self.inhale)),
            (BreathPhase::HoldTop, clean(self.hold_top)),
            (BreathPhase::Exhale, clean(self.exhale)),
            (BreathPhase::HoldBottom, clean(self.hold_bottom)),
        ]
    }

    /// Sample the cycle at `t` seconds.
    ///
    /// Returns `None` when the cycle has no duration, so callers skip any
    /// phase-dependent work instead of dividing by zero.
    pub fn sample(&self, t: f32) -> Option<BreathSample> {
        let total = self.total();
        if total <= 0.0 || !t.is_finite() {
            return None;
        }

        let t = t.max(0.0);
        let cycle = (t / total).floor() as u64;
        let mut local = t.rem_euclid(total);

        let segments = self.segments();
        for (phase, duration) in segments {
            if duration <= 0.0 {
                continue;
            }
            if local < duration {
                let progress = (local / duration).clamp(0.0, 1.0);
                return Some(BreathSample {
                    phase,
                    progress,
                    ring_scale: ring_scale(phase, progress),
                    cycle,
                });
            }
            local -= duration;
        }

        // rounding left us past the last segment
        let (phase, _) = segments
            .iter()
            .rev()
            .find(|(_, d)| *d > 0.0)
            .copied()
            .unwrap_or((BreathPhase::Rest, 0.0));
        Some(BreathSample {
            phase,
            progress: 1.0,
            ring_scale: ring_scale(phase, 1.0),
            cycle,
        })
    }
}

fn ring_scale(phase: BreathPhase, progress: f32) -> f32 {
    let span = MAX_RING_SCALE - MIN_RING_SCALE;
    match phase {
        BreathPhase::Inhale => MIN_RING_SCALE + span * progress,
        BreathPhase::Hold | BreathPhase::HoldTop => MAX_RING_SCALE,
        BreathPhase::Exhale => MAX_RING_SCALE - span * progress,
        BreathPhase::HoldBottom | BreathPhase::Rest => MIN_RING_SCALE,
    }
}
