//! Particle pool.
//!
//! The pool is a plain `Vec<Particle>` sized to the preset's particle count.
//! It is built once per preset (see [`init_pool`]) and then advanced in place
//! every frame by [`advance_frame`]; particles are never added or removed.

use crate::color::ColorVariation;
use crate::motion::{self, polar, FrameContext};
use crate::particle::{Particle, PatternState};
use crate::preset::{MotionPattern, Preset};
use glam::Vec2;
use rand::Rng;
use rand::rngs::SmallRng;
use std::collections::VecDeque;
use std::f32::consts::TAU;

/// Minimum opacity for a particle to leave a trail sample.
const TRAIL_MIN_OPACITY: f32 = 0.1;

/// Allocate `preset.particle_count` particles placed the way the preset's
/// motion pattern expects to find them.
///
/// `ring_radius` is the unscaled ring radius in pixels.
pub fn init_pool(preset: &Preset, size: f32, ring_radius: f32, rng: &mut SmallRng) -> Vec<Particle> {
    let count = preset.particle_count;
    let center = Vec2::splat(size / 2.0);
    let pattern = preset.motion_pattern;

    log::debug!(
        "Building pool for '{}': {} particles, pattern {}",
        preset.id,
        count,
        pattern
    );

    (0..count)
        .map(|id| {
            let angle = id as f32 / count as f32 * TAU;
            let (pos, distance) = spawn_point(pattern, angle, center, size, ring_radius, rng);
            let state = PatternState::new(pattern, id, angle, ring_radius, rng);

            Particle {
                id,
                pos,
                base: pos,
                angle,
                distance,
                base_distance: distance,
                size: preset.particle_size.lerp(rng.gen()),
                display_size: None,
                speed: 0.3 + rng.gen::<f32>() * 0.7,
                phase: rng.gen::<f32>() * TAU,
                opacity: if pattern == MotionPattern::MeteorCycle {
                    0.0
                } else {
                    0.4 + rng.gen::<f32>() * 0.6
                },
                twinkle_phase: rng.gen::<f32>() * TAU,
                pop_timer: rng.gen::<f32>() * 2.0,
                color_var: ColorVariation::for_particle(id, count),
                rotation_speed: 0.5 + rng.gen::<f32>() * 1.5,
                rotation_dir: if rng.gen::<f32>() > 0.5 { 1.0 } else { -1.0 },
                arc_length: 0.3 + rng.gen::<f32>() * 0.4,
                arc_segments: Vec::new(),
                secondary_arc: Vec::new(),
                trail: VecDeque::new(),
                state,
            }
        })
        .collect()
}

/// Initial position and polar distance for particle at `angle`.
fn spawn_point(
    pattern: MotionPattern,
    angle: f32,
    center: Vec2,
    size: f32,
    ring: f32,
    rng: &mut SmallRng,
) -> (Vec2, f32) {
    use MotionPattern as M;
    match pattern {
        // embers hug the ring with a little angular scatter
        M::EmberMixed => {
            let jittered = angle + (rng.gen::<f32>() - 0.5) * 0.3;
            (polar(center, jittered, ring), ring)
        }
        M::ElectricVaried => (polar(center, angle, ring), ring),
        // meteors wait in a band above the top edge
        M::MeteorCycle => {
            let x = center.x + (rng.gen::<f32>() - 0.5) * size;
            let y = center.y - size * 0.5 - rng.gen::<f32>() * size * 0.15;
            (Vec2::new(x, y), 0.0)
        }
        M::SnowglobeActive => {
            let distance = rng.gen::<f32>() * ring * 1.1;
            (polar(center, angle, distance), distance)
        }
        M::HyperspaceRays => {
            let distance = ring * 1.2;
            (polar(center, angle, distance), distance)
        }
        M::StarfieldSmooth => {
            let distance = ring * (0.2 + rng.gen::<f32>() * 0.8);
            (polar(center, angle, distance), distance)
        }
        _ => {
            let distance = ring * (0.6 + rng.gen::<f32>() * 0.4);
            (polar(center, angle, distance), distance)
        }
    }
}

/// Number of trail samples kept for a preset trail length.
pub fn trail_capacity(trail_length: f32) -> usize {
    // small epsilon so 0.3 keeps 3 samples despite f32 rounding
    (10.0 * trail_length + 1e-4).floor().max(0.0) as usize
}

/// Whether the preset's particles record trails at all.
pub fn records_trail(preset: &Preset) -> bool {
    preset.trail_length > 0.0 && !preset.particle_type.is_arc()
}

/// Advance every particle by one frame and record trail samples.
///
/// Particles are updated in pool order. No update reads another particle.
pub fn advance_frame(pool: &mut [Particle], preset: &Preset, ctx: &FrameContext<'_>, rng: &mut SmallRng) {
    let trail_cap = if records_trail(preset) {
        trail_capacity(preset.trail_length)
    } else {
        0
    };

    for particle in pool.iter_mut() {
        motion::update(preset.motion_pattern, particle, ctx, rng);
        if trail_cap > 0 && particle.opacity > TRAIL_MIN_OPACITY {
            record_trail(particle, trail_cap);
        }
    }
}

/// Push the current position, dropping the oldest samples past `cap`.
pub fn record_trail(particle: &mut Particle, cap: usize) {
    particle.trail.push_back(particle.pos);
    while particle.trail.len() > cap {
        particle.trail.pop_front();
    }
}
