//! The particle engine.
//!
//! A [`ParticleEngine`] is one running effect: it owns the particle pool,
//! the resolved preset, the renderer, the frame clock and every cross-frame
//! flag (cycle direction, previous phase, current preset identity). Several
//! engines can run side by side; they share only the read-only catalog.
//!
//! # Frame order
//!
//! Each [`frame`](ParticleEngine::frame):
//!
//! 1. turns the host timestamp into a clamped delta
//! 2. follows the configured breath pattern, if any
//! 3. advances every particle
//! 4. clears the canvas and draws every visible particle
//!
//! # Example
//!
//! ```ignore
//! use ringfx::prelude::*;
//!
//! let mut engine = ParticleEngine::new(EngineConfig::new("Prana").with_seed(1));
//! let mut canvas = RasterCanvas::new(300, 300);
//!
//! for i in 0..60 {
//!     engine.frame(i as f64 * 16.0, &mut canvas);
//! }
//! canvas.save_png("prana.png", None)?;
//! ```

use crate::animation::{AnimationLoop, FrameHandle};
use crate::clock::{FrameClock, MAX_FRAME_DELTA};
use crate::color::ColorTransform;
use crate::config::EngineConfig;
use crate::motion::FrameContext;
use crate::particle::Particle;
use crate::pool::{advance_frame, init_pool};
use crate::preset::{BreathParams, BreathPhase, Preset};
use crate::registry;
use crate::render::{Canvas2d, DrawParams, Renderer};
use glam::Vec2;
use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Offset between the motion seed and the draw seed.
const RENDER_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// One live effect instance.
#[derive(Debug, Clone)]
pub struct ParticleEngine {
    config: EngineConfig,
    preset: Preset,
    pool: Vec<Particle>,
    renderer: Renderer,
    clock: FrameClock,
    animation: AnimationLoop,
    rng: SmallRng,
    /// Simulated seconds, the sum of every stepped delta.
    time: f32,
    /// +1 or -1, flipped once per breath cycle.
    direction: f32,
    /// Last reported phase, compared against the next one to detect the
    /// end of a cycle.
    phase: Option<BreathPhase>,
    ring_scale: f32,
    /// Identity, size and ring radius the pool was built for.
    built_for: PoolKey,
}

#[derive(Debug, Clone, PartialEq)]
struct PoolKey {
    identity: String,
    count: usize,
    size: f32,
    ring_radius: f32,
}

impl PoolKey {
    fn new(config: &EngineConfig, preset: &Preset) -> Self {
        Self {
            identity: config.preset_identity().to_string(),
            count: preset.particle_count,
            size: config.canvas_size(),
            ring_radius: config.base_ring_radius(),
        }
    }
}

impl ParticleEngine {
    /// Build an engine and its pool from `config`.
    pub fn new(config: EngineConfig) -> Self {
        let (mut rng, renderer) = match config.seed {
            Some(seed) => (
                SmallRng::seed_from_u64(seed),
                Renderer::seeded(seed ^ RENDER_SEED_SALT),
            ),
            None => (SmallRng::from_entropy(), Renderer::default()),
        };

        let preset = registry::resolve(&config.source);
        let built_for = PoolKey::new(&config, &preset);
        let pool = init_pool(&preset, built_for.size, built_for.ring_radius, &mut rng);
        let phase = parse_phase(&config.phase);

        log::info!(
            "Engine ready: preset '{}' ({} particles, {} / {})",
            preset.id,
            pool.len(),
            preset.particle_type,
            preset.motion_pattern
        );

        let mut animation = AnimationLoop::new();
        animation.set_active(config.is_active);

        let mut clock = FrameClock::new();
        if !config.is_active {
            clock.pause();
        }

        Self {
            ring_scale: config.effective_ring_scale(),
            config,
            preset,
            pool,
            renderer,
            clock,
            animation,
            rng,
            time: 0.0,
            direction: 1.0,
            phase,
            built_for,
        }
    }

    /// Apply a new configuration.
    ///
    /// The pool is rebuilt only when the preset identity, particle count,
    /// canvas size or base ring radius changes. Phase, ring scale, colors
    /// and intensity are continuous inputs and never rebuild. Any pending
    /// frame callback is cancelled and, if the engine is active, replaced.
    pub fn configure(&mut self, config: EngineConfig) -> Option<FrameHandle> {
        let preset = registry::resolve(&config.source);
        let key = PoolKey::new(&config, &preset);

        if key != self.built_for {
            log::debug!(
                "Rebuilding pool: '{}' x{} -> '{}' x{}",
                self.built_for.identity,
                self.built_for.count,
                key.identity,
                key.count
            );
            self.pool = init_pool(&preset, key.size, key.ring_radius, &mut self.rng);
            self.built_for = key;
            self.clock.reset();
            self.time = 0.0;
        }
        self.preset = preset;

        // a breath pattern owns phase and ring scale; the static inputs are ignored
        let breath_driven = config.breath.is_some();
        if !breath_driven {
            self.set_phase_name(&config.phase);
            self.ring_scale = config.effective_ring_scale();
        }
        self.config = config;
        if breath_driven {
            self.follow_breath();
        }
        self.set_active(self.config.is_active);

        self.animation.restart()
    }

    /// Report a new breath phase. `None` means an unknown phase; motion then
    /// uses the preset's `rest` parameters.
    ///
    /// The cycle direction flips when the breath leaves `exhale` for the
    /// end of the cycle (`rest` or `holdBottom`).
    pub fn set_phase(&mut self, phase: Option<BreathPhase>) {
        if phase == self.phase {
            return;
        }
        if self.phase == Some(BreathPhase::Exhale) && phase.map_or(false, BreathPhase::is_cycle_end) {
            self.direction = -self.direction;
            log::debug!("Cycle direction flipped to {}", self.direction);
        }
        self.phase = phase;
    }

    /// Report a breath phase by name. Unknown names fall back to `rest`
    /// parameters.
    pub fn set_phase_name(&mut self, name: &str) {
        self.set_phase(parse_phase(name));
        self.config.phase = name.to_string();
    }

    pub fn set_ring_scale(&mut self, ring_scale: f32) {
        self.config.ring_scale = ring_scale;
        self.ring_scale = self.config.effective_ring_scale();
    }

    /// Start or stop the animation. Stopping cancels the pending callback
    /// and freezes the clock; the first frame after restarting has a zero
    /// delta.
    pub fn set_active(&mut self, active: bool) {
        self.config.is_active = active;
        self.animation.set_active(active);
        if active {
            self.clock.resume();
        } else {
            self.clock.pause();
        }
    }

    /// Advance every particle by `dt` seconds without drawing.
    ///
    /// `dt` is clamped to `[0, MAX_FRAME_DELTA]`; non-finite values step by
    /// zero.
    pub fn step(&mut self, dt: f32) {
        let dt = if dt.is_finite() {
            dt.clamp(0.0, MAX_FRAME_DELTA)
        } else {
            0.0
        };
        self.time += dt;
        self.follow_breath();

        let size = self.built_for.size;
        let ctx = FrameContext {
            dt,
            center: Vec2::splat(size / 2.0),
            size,
            ring_radius: self.built_for.ring_radius * self.ring_scale,
            phase: self.phase,
            params: self.preset.breath_sync.get(self.phase),
            particle_size: self.preset.particle_size,
            direction: self.direction,
            now: self.time,
        };
        advance_frame(&mut self.pool, &self.preset, &ctx, &mut self.rng);
    }

    /// Clear `canvas` and draw the pool as it stands.
    pub fn draw<C: Canvas2d + ?Sized>(&mut self, canvas: &mut C) {
        let params = self.draw_params();
        self.renderer.draw_frame(canvas, &self.pool, &self.preset, &params);
    }

    /// Run one frame for a host timestamp in milliseconds. Returns the
    /// delta that was simulated.
    ///
    /// While inactive nothing moves and nothing is drawn.
    pub fn frame<C: Canvas2d + ?Sized>(&mut self, timestamp_ms: f64, canvas: &mut C) -> f32 {
        if !self.config.is_active {
            return 0.0;
        }
        let dt = self.clock.tick(timestamp_ms);
        self.step(dt);
        self.draw(canvas);
        dt
    }

    /// Schedule the next frame callback, if active.
    pub fn request_frame(&mut self) -> Option<FrameHandle> {
        self.animation.request()
    }

    /// Deliver a scheduled frame callback.
    ///
    /// Runs the frame only if `handle` is the one currently pending, then
    /// schedules and returns the next handle. Stale handles (from before a
    /// cancel or reconfiguration) do nothing and return `None`.
    pub fn on_frame<C: Canvas2d + ?Sized>(
        &mut self,
        handle: FrameHandle,
        timestamp_ms: f64,
        canvas: &mut C,
    ) -> Option<FrameHandle> {
        if !self.animation.fire(handle, timestamp_ms) {
            return None;
        }
        self.frame(timestamp_ms, canvas);
        self.animation.request()
    }

    /// Cancel the pending frame callback; the loop stays active.
    pub fn cancel_frame(&mut self) {
        self.animation.cancel();
    }

    fn follow_breath(&mut self) {
        let Some(pattern) = self.config.breath else {
            return;
        };
        // zero-length patterns carry no phase data; keep the last phase
        if let Some(sample) = pattern.sample(self.time) {
            self.set_phase(Some(sample.phase));
            self.ring_scale = sample.ring_scale;
        }
    }

    fn draw_params(&self) -> DrawParams {
        let params = self.params();
        DrawParams {
            accent: self.config.accent(),
            colors: ColorTransform::new(self.preset.color_modifier, self.config.is_light),
            intensity: self.config.effective_intensity(),
            glow: params.glow,
            direction: self.direction,
            meteor_phase: params.phase,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn pool(&self) -> &[Particle] {
        &self.pool
    }

    pub fn preset(&self) -> &Preset {
        &self.preset
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parameter bag for the current phase.
    pub fn params(&self) -> &BreathParams {
        self.preset.breath_sync.get(self.phase)
    }

    pub fn phase(&self) -> Option<BreathPhase> {
        self.phase
    }

    pub fn direction(&self) -> f32 {
        self.direction
    }

    pub fn ring_scale(&self) -> f32 {
        self.ring_scale
    }

    /// Ring radius in pixels after the ring scale.
    pub fn ring_radius(&self) -> f32 {
        self.built_for.ring_radius * self.ring_scale
    }

    /// Simulated seconds since the pool was built.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn is_active(&self) -> bool {
        self.config.is_active
    }
}

fn parse_phase(name: &str) -> Option<BreathPhase> {
    let phase = BreathPhase::parse(name);
    if phase.is_none() {
        log::warn!("Unknown breath phase '{}', using rest parameters", name);
    }
    phase
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DisplayList;

    fn engine(name: &str) -> ParticleEngine {
        ParticleEngine::new(EngineConfig::new(name).with_seed(42))
    }

    #[test]
    fn test_unknown_preset_uses_default() {
        let engine = engine("no-such-path");
        assert_eq!(engine.preset().id, registry::default_preset().id);
        assert_eq!(engine.pool().len(), registry::default_preset().particle_count);
    }

    #[test]
    fn test_direction_flips_on_cycle_end_only() {
        let mut engine = engine("meteor-shower-06");
        assert_eq!(engine.direction(), 1.0);

        engine.set_phase_name("inhale");
        engine.set_phase_name("holdTop");
        engine.set_phase_name("exhale");
        assert_eq!(engine.direction(), 1.0);
        engine.set_phase_name("holdBottom");
        assert_eq!(engine.direction(), -1.0);

        // rest after holdBottom is not a new transition out of exhale
        engine.set_phase_name("rest");
        assert_eq!(engine.direction(), -1.0);

        engine.set_phase_name("exhale");
        engine.set_phase_name("rest");
        assert_eq!(engine.direction(), 1.0);
    }

    #[test]
    fn test_unknown_phase_uses_rest_params() {
        let mut engine = engine("Prana");
        engine.set_phase_name("sneeze");
        assert_eq!(engine.phase(), None);
        assert_eq!(engine.params(), &engine.preset().breath_sync.rest);
        engine.step(0.016);
    }

    #[test]
    fn test_configure_rebuilds_only_on_identity_change() {
        let mut engine = engine("Soma");
        engine.step(0.016);
        let before = engine.pool()[0].pos;

        engine.configure(
            EngineConfig::new("Soma")
                .with_seed(42)
                .with_phase("inhale")
                .with_ring_scale(1.1)
                .with_intensity(0.9),
        );
        assert_eq!(engine.pool()[0].pos, before);
        assert_eq!(engine.ring_scale(), 1.1);

        engine.configure(EngineConfig::new("embers-03").with_seed(42));
        assert_eq!(engine.preset().id, "embers-03");
        assert_eq!(engine.pool().len(), engine.preset().particle_count);
    }

    #[test]
    fn test_step_clamps_delta() {
        let mut engine = engine("Soma");
        engine.step(5.0);
        assert_eq!(engine.time(), MAX_FRAME_DELTA);
        engine.step(f32::NAN);
        assert_eq!(engine.time(), MAX_FRAME_DELTA);
    }

    #[test]
    fn test_inactive_engine_does_not_draw() {
        let mut engine = ParticleEngine::new(EngineConfig::new("Soma").with_seed(1).with_active(false));
        let mut canvas = DisplayList::new(300, 300);
        assert!(engine.request_frame().is_none());
        assert_eq!(engine.frame(16.0, &mut canvas), 0.0);
        assert!(canvas.commands().is_empty());
    }

    #[test]
    fn test_stale_handle_after_reconfigure() {
        let mut engine = engine("Soma");
        let mut canvas = DisplayList::new(300, 300);
        let first = engine.request_frame().unwrap();
        let second = engine.configure(EngineConfig::new("Soma").with_seed(42)).unwrap();

        assert!(engine.on_frame(first, 0.0, &mut canvas).is_none());
        assert!(canvas.commands().is_empty());

        let third = engine.on_frame(second, 0.0, &mut canvas).unwrap();
        assert_ne!(third, second);
        assert!(!canvas.commands().is_empty());
    }

    #[test]
    fn test_breath_pattern_drives_phase_and_scale() {
        use crate::breath::BreathPattern;

        let config = EngineConfig::new("Soma")
            .with_seed(3)
            .with_breath(BreathPattern::new(0.1, 0.1, 0.1, 0.1));
        let mut engine = ParticleEngine::new(config);

        engine.step(0.05);
        assert_eq!(engine.phase(), Some(BreathPhase::Inhale));
        assert!(engine.ring_scale() > 1.0);

        for _ in 0..6 {
            engine.step(0.05);
        }
        // 0.35s in: exhale is over
        assert_eq!(engine.phase(), Some(BreathPhase::HoldBottom));
        assert_eq!(engine.direction(), -1.0);
    }

    #[test]
    fn test_reconfigure_keeps_breath_driven_phase() {
        use crate::breath::BreathPattern;

        let config = EngineConfig::new("Soma")
            .with_seed(3)
            .with_phase("rest")
            .with_breath(BreathPattern::new(0.1, 0.1, 0.1, 0.1));
        let mut engine = ParticleEngine::new(config.clone());

        for _ in 0..5 {
            engine.step(0.05);
        }
        // 0.25s in: mid exhale
        assert_eq!(engine.phase(), Some(BreathPhase::Exhale));
        let scale = engine.ring_scale();

        engine.configure(config.with_intensity(0.9));
        assert_eq!(engine.phase(), Some(BreathPhase::Exhale));
        assert_eq!(engine.direction(), 1.0);
        assert_eq!(engine.ring_scale(), scale);
    }
}
