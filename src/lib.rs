//! # ringfx - Breath-synchronized ring particle effects
//!
//! Procedural particle effects that orbit, flicker and arc around a ring,
//! each driven by a breathing cycle. Every effect is a [`Preset`]: a
//! particle count and size, a color modifier, a draw routine
//! ([`ParticleType`]), a motion routine ([`MotionPattern`]) and a table of
//! per-phase parameters ([`BreathSync`]).
//!
//! ## Quick Start
//!
//! ```ignore
//! use ringfx::prelude::*;
//!
//! fn main() -> Result<(), ExportError> {
//!     let config = EngineConfig::new("embers-03")
//!         .with_size(300.0)
//!         .with_seed(7)
//!         .with_breath(BreathPattern::default());
//!
//!     let mut engine = ParticleEngine::new(config);
//!     let mut canvas = RasterCanvas::new(300, 300);
//!
//!     for frame in 0..120 {
//!         engine.frame(frame as f64 * 1000.0 / 60.0, &mut canvas);
//!     }
//!     canvas.save_png("embers.png", Some(Rgb::new(10, 10, 18)))
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Presets
//!
//! The [`registry`] holds two read-only tables: one effect per practice path
//! (`Soma`, `Prana`, `Dhyana`, `Drishti`, `Jnana`, `Samyoga`) and the ring
//! effect library (`sun-rays-01` .. `breath-forest-24`). Unknown names
//! resolve to a neutral default, never to an error.
//!
//! ### Breath phases
//!
//! The host reports the current [`BreathPhase`] (`inhale`, `holdTop`,
//! `exhale`, `holdBottom`, `rest`). Motion routines read the preset's
//! parameter bag for that phase, falling back to `rest`, so every effect
//! responds to the breath without knowing about the timer. Hosts without a
//! timer can hand the engine a [`BreathPattern`] instead.
//!
//! ### Frames
//!
//! A [`ParticleEngine`] turns host timestamps into clamped deltas, advances
//! the pool in place and draws it to any [`Canvas2d`]. Every particle is
//! drawn inside a [`Scoped`] save/restore guard, so blend modes and
//! transforms never leak between particles.
//!
//! ## Backends
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`RasterCanvas`] | CPU rasterizer, PNG export, live viewer |
//! | [`DisplayList`] | Records draw calls for tests and benchmarks |
//!
//! ## Feature Flags
//!
//! - `viewer` (default): a winit + wgpu window that shows an engine live.

pub mod animation;
pub mod breath;
pub mod clock;
pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod motion;
pub mod particle;
pub mod pool;
pub mod preset;
pub mod registry;
pub mod render;
#[cfg(feature = "viewer")]
pub mod viewer;

pub use animation::{AnimationLoop, FrameHandle};
pub use breath::{BreathPattern, BreathSample};
pub use clock::FrameClock;
pub use color::{ColorTransform, ColorVariation, Rgb, Rgba};
pub use config::EngineConfig;
pub use engine::ParticleEngine;
pub use error::{ExportError, LoadError};
#[cfg(feature = "viewer")]
pub use error::ViewerError;
pub use glam::Vec2;
pub use particle::{Particle, PatternState};
pub use preset::{
    BreathParams, BreathPhase, BreathSync, ColorModifier, MeteorPhase, MotionPattern,
    ParticleType, Preset, PresetStatus, SizeRange, MAX_PARTICLE_COUNT, MAX_TRAIL_LENGTH,
};
pub use registry::PresetSource;
pub use render::{Canvas2d, DisplayList, RasterCanvas, Renderer, Scoped};

/// Convenient re-exports for common usage.
///
/// # Usage
///
/// ```ignore
/// use ringfx::prelude::*;
/// ```
///
/// This imports:
/// - [`ParticleEngine`] and [`EngineConfig`] - the engine and its inputs
/// - [`Preset`] and friends - the effect data model
/// - [`BreathPhase`], [`BreathPattern`] - breath inputs
/// - [`RasterCanvas`], [`DisplayList`], [`Canvas2d`] - render targets
/// - [`Rgb`], [`Vec2`] - color and vector types
pub mod prelude {
    pub use crate::animation::{AnimationLoop, FrameHandle};
    pub use crate::breath::{BreathPattern, BreathSample};
    pub use crate::clock::FrameClock;
    pub use crate::color::{ColorTransform, Rgb, Rgba};
    pub use crate::config::EngineConfig;
    pub use crate::engine::ParticleEngine;
    pub use crate::error::{ExportError, LoadError};
    pub use crate::preset::{
        BreathParams, BreathPhase, BreathSync, MotionPattern, ParticleType, Preset, PresetStatus,
    };
    pub use crate::registry::{self, PresetSource};
    pub use crate::render::{Canvas2d, DisplayList, RasterCanvas, Renderer};
    pub use crate::Vec2;
}
