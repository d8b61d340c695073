//! Particle state.
//!
//! A [`Particle`] carries the kinematic fields every pattern shares plus a
//! [`PatternState`] holding the bookkeeping only its own motion pattern
//! reads (ember flicker phases, meteor layer, void pulse radius, ...).
//!
//! Particles are never created or destroyed mid-session. Patterns recycle a
//! particle in place when it reaches a terminal condition.

use crate::color::ColorVariation;
use crate::preset::MotionPattern;
use glam::Vec2;
use rand::Rng;
use std::collections::VecDeque;
use std::f32::consts::TAU;

/// One sample of a noisy ring polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcPoint {
    pub pos: Vec2,
    /// Parametric angle the point was generated at.
    pub angle: f32,
}

/// A single effect particle.
#[derive(Debug, Clone)]
pub struct Particle {
    /// Stable index in the pool.
    pub id: usize,
    pub pos: Vec2,
    /// Spawn anchor.
    pub base: Vec2,
    pub angle: f32,
    /// Polar offset from the canvas center.
    pub distance: f32,
    pub base_distance: f32,
    pub size: f32,
    /// Size the draw routine should use when the pattern animates it.
    pub display_size: Option<f32>,
    /// Per-particle speed factor in `[0.3, 1.0]`.
    pub speed: f32,
    /// Random phase offset in `[0, 2π)`.
    pub phase: f32,
    pub opacity: f32,
    pub twinkle_phase: f32,
    pub pop_timer: f32,
    pub color_var: ColorVariation,
    pub rotation_speed: f32,
    /// +1 or -1.
    pub rotation_dir: f32,
    pub arc_length: f32,
    /// Main ring polyline for arc-type effects, regenerated every frame.
    pub arc_segments: Vec<ArcPoint>,
    /// Second polyline (inner ripple, offset vein) for two-line effects.
    pub secondary_arc: Vec<ArcPoint>,
    /// Recent positions, oldest first.
    pub trail: VecDeque<Vec2>,
    pub state: PatternState,
}

impl Particle {
    /// Shape multiplier the ray routine stretches by.
    pub fn ray_length(&self) -> f32 {
        match self.state {
            PatternState::Rays { ray_length, .. } => ray_length,
            _ => 1.0,
        }
    }

    pub fn draw_size(&self) -> f32 {
        self.display_size.unwrap_or(self.size)
    }

    /// Hue offset an ember applies while burning.
    pub fn temperature_shift(&self) -> f32 {
        match self.state {
            PatternState::Ember { temperature_shift, .. } => temperature_shift,
            _ => 0.0,
        }
    }
}

/// Ray layer: outer rays are long and bright, inner ones shorter and dimmer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayLayer {
    Outer,
    Inner,
}

impl RayLayer {
    pub fn for_id(id: usize) -> Self {
        if id % 3 == 0 {
            RayLayer::Outer
        } else {
            RayLayer::Inner
        }
    }

    pub fn length_mult(self) -> f32 {
        match self {
            RayLayer::Outer => 1.4,
            RayLayer::Inner => 0.7,
        }
    }

    pub fn bright_mult(self) -> f32 {
        match self {
            RayLayer::Outer => 1.0,
            RayLayer::Inner => 0.6,
        }
    }
}

/// Snow parallax depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnowLayer {
    Foreground,
    Midground,
    Background,
}

impl SnowLayer {
    /// 30% foreground, 40% mid, 30% background.
    pub fn for_id(id: usize) -> Self {
        match id % 10 {
            0..=2 => SnowLayer::Foreground,
            3..=6 => SnowLayer::Midground,
            _ => SnowLayer::Background,
        }
    }

    /// `(speed, size, opacity)` multipliers.
    pub fn factors(self) -> (f32, f32, f32) {
        match self {
            SnowLayer::Foreground => (1.4, 1.3, 0.8),
            SnowLayer::Midground => (1.0, 1.0, 0.6),
            SnowLayer::Background => (0.6, 0.6, 0.35),
        }
    }
}

/// Meteor streak class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeteorLayer {
    Long,
    Medium,
    Micro,
}

impl MeteorLayer {
    /// 20% long, 40% medium, 40% micro.
    pub fn for_id(id: usize) -> Self {
        match id % 10 {
            0..=1 => MeteorLayer::Long,
            2..=5 => MeteorLayer::Medium,
            _ => MeteorLayer::Micro,
        }
    }

    /// `(streak, brightness)` multipliers.
    pub fn factors(self) -> (f32, f32) {
        match self {
            MeteorLayer::Long => (2.0, 1.3),
            MeteorLayer::Medium => (1.0, 1.0),
            MeteorLayer::Micro => (0.5, 0.6),
        }
    }
}

/// Progress through a short-lived sub-effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Burst {
    pub progress: f32,
    pub duration: f32,
}

/// Prism split in flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split {
    pub progress: f32,
    pub hue1: f32,
    pub hue2: f32,
}

/// Per-pattern extras.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternState {
    /// Patterns that only use the shared fields.
    Plain,
    Rays {
        layer: RayLayer,
        shimmer_phase: f32,
        ray_length: f32,
    },
    Starfield {
        current_scale: f32,
        burst_timer: f32,
        burst: Option<Burst>,
        life_phase: f32,
        drift_phase: f32,
    },
    Ember {
        age: f32,
        drift_phase: f32,
        flicker_phase: f32,
        temperature_shift: f32,
    },
    /// Ring-locked arc generators.
    Arc {
        time: f32,
        amp_var: f32,
        pulse_phase: f32,
        inner_core: bool,
        harmonic_flash: f32,
    },
    Wisp {
        wisp_phase: f32,
        life_phase: f32,
        size_mult: f32,
    },
    Snow {
        layer: SnowLayer,
        bowl_angle: f32,
        curl_phase: f32,
        twinkle_timer: f32,
        twinkling: bool,
    },
    Meteor {
        layer: MeteorLayer,
        drift_angle: f32,
        streak_angle: Option<f32>,
        streak_length: f32,
    },
    Aether {
        progress: f32,
    },
    OrbitalFire {
        orbit_angle: f32,
        flare_timer: f32,
        flaring: bool,
    },
    VoidPulse {
        radius: f32,
        opacity: f32,
        delay: f32,
    },
    Prism {
        split_timer: f32,
        split: Option<Split>,
    },
    Stardust {
        falling: bool,
        velocity: f32,
    },
    Spirit {
        angle: f32,
        glinting: bool,
    },
    Leaf {
        spawned: bool,
        rotation: f32,
        drift_phase: f32,
    },
}

impl PatternState {
    /// Fresh extras for `pattern`, seeded for particle `id`.
    pub fn new<R: Rng>(pattern: MotionPattern, id: usize, angle: f32, ring_radius: f32, rng: &mut R) -> Self {
        use MotionPattern as M;
        match pattern {
            M::HyperspaceRays => PatternState::Rays {
                layer: RayLayer::for_id(id),
                shimmer_phase: rng.gen::<f32>() * TAU,
                ray_length: 1.0,
            },
            M::StarfieldSmooth => PatternState::Starfield {
                current_scale: 1.0,
                burst_timer: rng.gen::<f32>() * 8.0,
                burst: None,
                life_phase: rng.gen::<f32>() * TAU,
                drift_phase: rng.gen::<f32>() * TAU,
            },
            M::EmberMixed => PatternState::Ember {
                age: 0.0,
                drift_phase: rng.gen::<f32>() * TAU,
                flicker_phase: rng.gen::<f32>() * TAU,
                temperature_shift: 0.0,
            },
            M::ElectricVaried
            | M::PlasmaDirectional
            | M::PlasmaRefined
            | M::RibbonFlow
            | M::CircuitPulse
            | M::FlareTurbulence
            | M::ChaosElectric
            | M::QuantumWave
            | M::SingularityWarp
            | M::DragonFlow => PatternState::Arc {
                time: rng.gen::<f32>() * 100.0,
                amp_var: rng.gen::<f32>() * 100.0,
                pulse_phase: 0.0,
                inner_core: false,
                harmonic_flash: 1.0,
            },
            M::CelestialOscillate => PatternState::Arc {
                time: 0.0,
                amp_var: 0.0,
                pulse_phase: 0.0,
                inner_core: false,
                harmonic_flash: 1.0,
            },
            M::WispDrift => PatternState::Wisp {
                wisp_phase: rng.gen::<f32>() * TAU,
                life_phase: rng.gen::<f32>(),
                size_mult: 1.5,
            },
            M::SnowglobeActive => PatternState::Snow {
                layer: SnowLayer::for_id(id),
                bowl_angle: rng.gen::<f32>() * TAU,
                curl_phase: rng.gen::<f32>() * TAU,
                twinkle_timer: rng.gen::<f32>() * 5.0,
                twinkling: false,
            },
            M::MeteorCycle => PatternState::Meteor {
                layer: MeteorLayer::for_id(id),
                drift_angle: 0.0,
                streak_angle: None,
                streak_length: 0.0,
            },
            M::AetherFlow => PatternState::Aether {
                progress: rng.gen::<f32>(),
            },
            M::OrbitalFire => PatternState::OrbitalFire {
                orbit_angle: angle,
                flare_timer: rng.gen::<f32>() * 3.0,
                flaring: false,
            },
            M::VoidPulse => PatternState::VoidPulse {
                radius: ring_radius,
                opacity: 0.4,
                delay: id as f32 * 0.5,
            },
            M::PrismaticSplit => PatternState::Prism {
                split_timer: rng.gen::<f32>() * 2.0,
                split: None,
            },
            M::StardustDrift => PatternState::Stardust {
                falling: false,
                velocity: 0.0,
            },
            M::SpiritOrbit => PatternState::Spirit {
                angle: id as f32 * std::f32::consts::PI,
                glinting: false,
            },
            M::ForestDrift => PatternState::Leaf {
                spawned: false,
                rotation: 0.0,
                drift_phase: 0.0,
            },
            M::OrbitSteady
            | M::Burst
            | M::Drift
            | M::FallSettle
            | M::WaveDissolve
            | M::Converge
            | M::Other => PatternState::Plain,
        }
    }
}

impl PatternState {
    /// True when these extras belong to `pattern`.
    pub fn fits(&self, pattern: MotionPattern) -> bool {
        use MotionPattern as M;
        match self {
            PatternState::Plain => matches!(
                pattern,
                M::OrbitSteady | M::Burst | M::Drift | M::FallSettle | M::WaveDissolve | M::Converge | M::Other
            ),
            PatternState::Rays { .. } => pattern == M::HyperspaceRays,
            PatternState::Starfield { .. } => pattern == M::StarfieldSmooth,
            PatternState::Ember { .. } => pattern == M::EmberMixed,
            PatternState::Arc { .. } => matches!(
                pattern,
                M::ElectricVaried
                    | M::PlasmaDirectional
                    | M::PlasmaRefined
                    | M::RibbonFlow
                    | M::CircuitPulse
                    | M::FlareTurbulence
                    | M::ChaosElectric
                    | M::QuantumWave
                    | M::SingularityWarp
                    | M::CelestialOscillate
                    | M::DragonFlow
            ),
            PatternState::Wisp { .. } => pattern == M::WispDrift,
            PatternState::Snow { .. } => pattern == M::SnowglobeActive,
            PatternState::Meteor { .. } => pattern == M::MeteorCycle,
            PatternState::Aether { .. } => pattern == M::AetherFlow,
            PatternState::OrbitalFire { .. } => pattern == M::OrbitalFire,
            PatternState::VoidPulse { .. } => pattern == M::VoidPulse,
            PatternState::Prism { .. } => pattern == M::PrismaticSplit,
            PatternState::Stardust { .. } => pattern == M::StardustDrift,
            PatternState::Spirit { .. } => pattern == M::SpiritOrbit,
            PatternState::Leaf { .. } => pattern == M::ForestDrift,
        }
    }
}
