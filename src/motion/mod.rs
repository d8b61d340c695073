//! Motion pattern library.
//!
//! Each [`MotionPattern`] maps to one update function. An update reads the
//! frame inputs in [`FrameContext`] (delta time, geometry, the current breath
//! phase's parameter bag) and mutates a single particle in place. No update
//! reads another particle, so pool order never changes the result.
//!
//! Patterns are grouped by family:
//!
//! - [`arcs`]: ring-locked noisy polylines (electric, plasma, chaos, ...)
//! - [`orbital`]: orbiting particles with wobble (orbit, burst, spirits, ...)
//! - [`recycle`]: spawn, travel, reset in place (embers, meteors, snow, ...)
//! - [`ambient`]: gentle fields anchored to a base position (stars, wisps, ...)
//!
//! # Example
//!
//! ```ignore
//! let ctx = FrameContext { dt: 0.016, params: preset.breath_sync.get(phase), ..frame };
//! for particle in pool.iter_mut() {
//!     motion::update(preset.motion_pattern, particle, &ctx, &mut rng);
//! }
//! ```

pub mod ambient;
pub mod arcs;
pub mod orbital;
pub mod recycle;

use crate::particle::{Particle, PatternState};
use crate::preset::{BreathParams, BreathPhase, MotionPattern, SizeRange};
use glam::Vec2;
use rand::rngs::SmallRng;

/// Inputs shared by every particle for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    /// Seconds since the previous frame, already clamped.
    pub dt: f32,
    pub center: Vec2,
    /// Canvas side length in pixels.
    pub size: f32,
    /// Ring radius after applying the ring scale.
    pub ring_radius: f32,
    /// `None` when the caller supplied an unknown phase name.
    pub phase: Option<BreathPhase>,
    pub params: &'a BreathParams,
    pub particle_size: SizeRange,
    /// Cycle direction, +1 or -1. Flips once per breath cycle.
    pub direction: f32,
    /// Engine clock in seconds, drives wall-clock style sway terms.
    pub now: f32,
}

impl FrameContext<'_> {
    /// Point at `angle` and `radius` around the canvas center.
    pub fn polar(&self, angle: f32, radius: f32) -> Vec2 {
        polar(self.center, angle, radius)
    }

    pub fn is_phase(&self, phase: BreathPhase) -> bool {
        self.phase == Some(phase)
    }
}

/// Point at `angle` and `radius` around `center`.
pub fn polar(center: Vec2, angle: f32, radius: f32) -> Vec2 {
    center + Vec2::from_angle(angle) * radius
}

/// Signature every motion pattern implements.
pub type UpdateFn = fn(&mut Particle, &FrameContext<'_>, &mut SmallRng);

/// Dispatch table from pattern tag to update routine.
pub fn update_fn(pattern: MotionPattern) -> UpdateFn {
    use MotionPattern as M;
    match pattern {
        M::HyperspaceRays => ambient::hyperspace_rays,
        M::StarfieldSmooth => ambient::starfield_smooth,
        M::WispDrift => ambient::wisp_drift,
        M::AetherFlow => ambient::aether_flow,
        M::VoidPulse => ambient::void_pulse,
        M::Drift => ambient::drift,

        M::ElectricVaried => arcs::electric_varied,
        M::PlasmaDirectional => arcs::plasma_directional,
        M::PlasmaRefined => arcs::plasma_refined,
        M::RibbonFlow => arcs::ribbon_flow,
        M::CircuitPulse => arcs::circuit_pulse,
        M::FlareTurbulence => arcs::flare_turbulence,
        M::ChaosElectric => arcs::chaos_electric,
        M::QuantumWave => arcs::quantum_wave,
        M::SingularityWarp => arcs::singularity_warp,
        M::CelestialOscillate => arcs::celestial_oscillate,
        M::DragonFlow => arcs::dragon_flow,

        M::OrbitSteady => orbital::orbit_steady,
        M::Burst => orbital::burst,
        M::OrbitalFire => orbital::orbital_fire,
        M::SpiritOrbit => orbital::spirit_orbit,
        M::PrismaticSplit => orbital::prismatic_split,

        M::EmberMixed => recycle::ember_mixed,
        M::MeteorCycle => recycle::meteor_cycle,
        M::SnowglobeActive => recycle::snowglobe_active,
        M::StardustDrift => recycle::stardust_drift,
        M::ForestDrift => recycle::forest_drift,

        // Path tags without a dedicated routine share the plain orbit.
        M::FallSettle | M::WaveDissolve | M::Converge | M::Other => orbital::plain_orbit,
    }
}

/// Advance one particle by one frame.
///
/// If the particle's extras belong to a different pattern (the pool was
/// built for another preset), they are reseeded first.
pub fn update(pattern: MotionPattern, particle: &mut Particle, ctx: &FrameContext<'_>, rng: &mut SmallRng) {
    if !particle.state.fits(pattern) {
        particle.state = PatternState::new(pattern, particle.id, particle.angle, ctx.ring_radius, rng);
    }
    update_fn(pattern)(particle, ctx, rng);
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::color::ColorVariation;
    use rand::SeedableRng;
    use std::collections::VecDeque;

    pub fn rng() -> SmallRng {
        SmallRng::seed_from_u64(7)
    }

    pub fn frame(params: &BreathParams) -> FrameContext<'_> {
        FrameContext {
            dt: 0.016,
            center: Vec2::splat(150.0),
            size: 300.0,
            ring_radius: 120.0,
            phase: Some(BreathPhase::Rest),
            params,
            particle_size: SizeRange::new(2.0, 5.0),
            direction: 1.0,
            now: 0.0,
        }
    }

    pub fn particle(pattern: MotionPattern, rng: &mut SmallRng) -> Particle {
        let pos = polar(Vec2::splat(150.0), 0.0, 100.0);
        Particle {
            id: 0,
            pos,
            base: pos,
            angle: 0.0,
            distance: 100.0,
            base_distance: 100.0,
            size: 3.0,
            display_size: None,
            speed: 0.6,
            phase: 0.4,
            opacity: 0.7,
            twinkle_phase: 0.0,
            pop_timer: 1.0,
            color_var: ColorVariation::default(),
            rotation_speed: 1.0,
            rotation_dir: 1.0,
            arc_length: 0.5,
            arc_segments: Vec::new(),
            secondary_arc: Vec::new(),
            trail: VecDeque::new(),
            state: PatternState::new(pattern, 0, 0.0, 120.0, rng),
        }
    }
}
