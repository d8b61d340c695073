//! Built-in preset catalog.
//!
//! Two tables ship with the crate:
//!
//! - **Path presets**: one effect per practice path (Soma, Prana, Dhyana,
//!   Drishti, Jnana, Samyoga), looked up by path id.
//! - **Ring presets**: the ring-effect library (sun rays, embers, plasma
//!   arcs, meteor showers, ...), looked up by preset id and filterable by
//!   status and category.
//!
//! Plus a neutral default used whenever a lookup misses.
//!
//! The catalog is built once on first use and shared read-only by every
//! engine instance.

use crate::preset::{
    BreathParams, BreathPhase, BreathSync, ColorModifier, MeteorPhase, MotionPattern,
    ParticleType, Preset, PresetStatus, SizeRange,
};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Where an engine gets its preset from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PresetSource {
    /// A path id ("Soma") or ring preset id ("embers-03").
    Named(String),
    /// An inline preset that bypasses the catalog.
    Override(Box<Preset>),
}

impl Default for PresetSource {
    fn default() -> Self {
        PresetSource::Named(String::new())
    }
}

impl From<&str> for PresetSource {
    fn from(name: &str) -> Self {
        PresetSource::Named(name.to_string())
    }
}

impl From<Preset> for PresetSource {
    fn from(preset: Preset) -> Self {
        PresetSource::Override(Box::new(preset))
    }
}

struct Catalog {
    paths: Vec<Preset>,
    rings: Vec<Preset>,
    default: Preset,
}

fn catalog() -> &'static Catalog {
    static CATALOG: OnceLock<Catalog> = OnceLock::new();
    CATALOG.get_or_init(|| Catalog {
        paths: path_presets(),
        rings: ring_presets(),
        default: neutral_preset(),
    })
}

/// Look up a preset by ring id or path id.
///
/// Ring ids match exactly; path ids match case-insensitively, so both
/// `"Prana"` and `"prana"` resolve.
pub fn get_preset(name: &str) -> Option<&'static Preset> {
    preset_by_id(name).or_else(|| path_fx(name))
}

/// The neutral fallback preset (soft circles on a steady orbit).
pub fn default_preset() -> &'static Preset {
    &catalog().default
}

/// Path preset for a practice path id.
pub fn path_fx(path_id: &str) -> Option<&'static Preset> {
    catalog()
        .paths
        .iter()
        .find(|p| p.id.eq_ignore_ascii_case(path_id))
}

/// All path presets in table order.
pub fn path_presets_all() -> &'static [Preset] {
    &catalog().paths
}

/// Ring preset by exact id.
pub fn preset_by_id(id: &str) -> Option<&'static Preset> {
    catalog().rings.iter().find(|p| p.id == id)
}

/// Ring presets, optionally filtered by status, in table order.
pub fn presets(status: Option<PresetStatus>) -> Vec<&'static Preset> {
    catalog()
        .rings
        .iter()
        .filter(|p| status.map_or(true, |s| p.status == Some(s)))
        .collect()
}

/// Ring presets in a category.
pub fn presets_by_category(category: &str) -> Vec<&'static Preset> {
    catalog()
        .rings
        .iter()
        .filter(|p| p.category.as_deref() == Some(category))
        .collect()
}

/// Distinct ring preset categories, in first-seen order.
pub fn categories() -> Vec<&'static str> {
    let mut seen: Vec<&'static str> = Vec::new();
    for category in catalog().rings.iter().filter_map(|p| p.category.as_deref()) {
        if !seen.contains(&category) {
            seen.push(category);
        }
    }
    seen
}

/// Parameters a preset supplies for `phase`, falling back to `rest`.
pub fn breath_sync_params(preset: &Preset, phase: Option<BreathPhase>) -> &BreathParams {
    preset.breath_sync.get(phase)
}

/// Resolve a source to a clamped, owned preset.
///
/// Fallback chain: inline override, then ring/path id, then the neutral
/// default. Never fails.
pub fn resolve(source: &PresetSource) -> Preset {
    match source {
        PresetSource::Override(preset) => preset.clamp(),
        PresetSource::Named(name) => match get_preset(name) {
            Some(preset) => preset.clamp(),
            None => {
                if !name.is_empty() {
                    log::warn!("Unknown preset '{}', using neutral default", name);
                }
                default_preset().clamp()
            }
        },
    }
}

// ============================================================================
// Table helpers
// ============================================================================

fn p(speed: f32, glow: f32) -> BreathParams {
    BreathParams::new(speed, glow)
}

#[allow(clippy::too_many_arguments)]
fn preset(
    id: &str,
    name: &str,
    category: &str,
    status: Option<PresetStatus>,
    particle_type: ParticleType,
    motion_pattern: MotionPattern,
    particle_count: usize,
    particle_size: SizeRange,
    color_modifier: ColorModifier,
    trail_length: f32,
    breath_sync: BreathSync,
) -> Preset {
    Preset {
        id: id.to_string(),
        name: name.to_string(),
        category: Some(category.to_string()),
        status,
        symbol: None,
        description: None,
        particle_type,
        motion_pattern,
        particle_count,
        particle_size,
        color_modifier,
        trail_length,
        breath_sync,
    }
}

/// Attach the picker glyph and one-line description of a path preset.
fn about(preset: Preset, symbol: &str, description: &str) -> Preset {
    Preset {
        symbol: Some(symbol.to_string()),
        description: Some(description.to_string()),
        ..preset
    }
}

/// Four-phase table for path presets. Each row is `(speed, flag, glow)`
/// where the flag is gather, shimmer, disperse and settle respectively.
fn path_sync(rows: [(f32, bool, f32); 4]) -> BreathSync {
    let [(s0, gather, g0), (s1, shimmer, g1), (s2, disperse, g2), (s3, settle, g3)] = rows;
    BreathSync::new(
        BreathParams { gather, ..p(s0, g0) },
        BreathParams { shimmer, ..p(s1, g1) },
        BreathParams { disperse, ..p(s2, g2) },
        BreathParams { settle, ..p(s3, g3) },
    )
}

/// Ring-arc table: speed, glow, intensity plus one flow knob per phase.
fn arc_sync(rows: [(f32, f32, f32, f32); 4], knob: fn(BreathParams, f32) -> BreathParams) -> BreathSync {
    let [inhale, hold, exhale, rest] = rows.map(|(speed, glow, intensity, extra)| {
        knob(
            BreathParams {
                intensity: Some(intensity),
                ..p(speed, glow)
            },
            extra,
        )
    });
    BreathSync::new(inhale, hold, exhale, rest)
}

// ============================================================================
// Path presets
// ============================================================================

fn neutral_preset() -> Preset {
    about(
        preset(
            "neutral",
            "Neutral",
            "Path",
            None,
            ParticleType::SoftCircle,
            MotionPattern::OrbitSteady,
            6,
            SizeRange::new(4.0, 8.0),
            ColorModifier::new(0.0, 0.7, 1.0, 0.45),
            0.25,
            path_sync([(0.25, true, 0.45), (0.1, true, 0.55), (0.25, true, 0.45), (0.05, true, 0.3)]),
        ),
        "○",
        "Default neutral particles",
    )
}

fn path_presets() -> Vec<Preset> {
    vec![
        about(
            preset(
                "Soma",
                "Somatic Ground",
                "Path",
                None,
                ParticleType::Dust,
                MotionPattern::FallSettle,
                18,
                SizeRange::new(2.0, 5.0),
                ColorModifier::new(-15.0, 0.7, 0.85, 0.6),
                0.25,
                path_sync([(0.15, true, 0.3), (0.05, false, 0.5), (0.35, false, 0.4), (0.03, true, 0.25)]),
            ),
            "◇",
            "Earthy particles fall and settle like dust returning to ground",
        ),
        about(
            preset(
                "Prana",
                "Vital Flow",
                "Path",
                None,
                ParticleType::Wisp,
                MotionPattern::WaveDissolve,
                14,
                SizeRange::new(4.0, 10.0),
                ColorModifier::new(0.0, 0.85, 1.0, 0.7),
                0.6,
                path_sync([(0.4, true, 0.7), (0.1, true, 0.9), (0.5, true, 0.6), (0.08, true, 0.35)]),
            ),
            "≋",
            "Flowing wisps move like breath energy, gathering and releasing",
        ),
        about(
            preset(
                "Dhyana",
                "Still Presence",
                "Path",
                None,
                ParticleType::SoftCircle,
                MotionPattern::OrbitSteady,
                8,
                SizeRange::new(8.0, 16.0),
                ColorModifier::new(0.0, 0.4, 1.0, 0.35),
                0.15,
                path_sync([(0.08, false, 0.4), (0.03, false, 0.6), (0.08, false, 0.4), (0.02, true, 0.3)]),
            ),
            "◯",
            "Soft diffuse circles orbit slowly, embodying stillness",
        ),
        about(
            preset(
                "Drishti",
                "Focused Point",
                "Path",
                None,
                ParticleType::Spark,
                MotionPattern::Converge,
                16,
                SizeRange::new(2.0, 5.0),
                ColorModifier::new(0.0, 1.15, 1.3, 0.9),
                0.35,
                path_sync([(0.7, true, 0.9), (0.15, true, 1.0), (0.25, true, 0.5), (0.35, false, 0.45)]),
            ),
            "◉",
            "Sharp sparks converge to center point with focused intensity",
        ),
        about(
            preset(
                "Jnana",
                "Crystal Wisdom",
                "Path",
                None,
                ParticleType::Diamond,
                MotionPattern::OrbitSteady,
                10,
                SizeRange::new(5.0, 10.0),
                ColorModifier::new(0.0, 1.0, 1.2, 0.85),
                0.2,
                path_sync([(0.35, false, 0.6), (0.15, true, 0.9), (0.35, false, 0.6), (0.1, false, 0.45)]),
            ),
            "◈",
            "Crystalline diamonds orbit with precise geometric motion",
        ),
        about(
            preset(
                "Samyoga",
                "Unified Field",
                "Path",
                None,
                ParticleType::Fog,
                MotionPattern::WaveDissolve,
                22,
                SizeRange::new(12.0, 30.0),
                ColorModifier::new(0.0, 0.5, 1.0, 0.25),
                0.8,
                path_sync([(0.12, true, 0.45), (0.04, false, 0.6), (0.15, true, 0.5), (0.02, true, 0.35)]),
            ),
            "⬡",
            "Luminous fog particles merge and dissolve as unified field",
        ),
    ]
}

// ============================================================================
// Ring presets
// ============================================================================

fn ring_presets() -> Vec<Preset> {
    use MotionPattern as M;
    use ParticleType as T;
    let candidate = Some(PresetStatus::Candidate);
    let final_ = Some(PresetStatus::Final);

    vec![
        preset(
            "sun-rays-01",
            "Sun Rays",
            "Light",
            candidate,
            T::ThinRay,
            M::HyperspaceRays,
            20,
            SizeRange::new(1.0, 2.0),
            ColorModifier::new(-10.0, 1.1, 1.4, 0.85),
            0.0,
            BreathSync::new(
                BreathParams { ray_speed: Some(0.5), ray_length: Some(1.0), ..p(0.4, 0.8) },
                BreathParams { ray_speed: Some(0.3), ray_length: Some(1.5), ..p(0.3, 1.0) },
                BreathParams { ray_speed: Some(2.0), ray_length: Some(2.5), ..p(1.5, 0.9) },
                BreathParams { ray_speed: Some(0.3), ray_length: Some(1.0), ..p(0.2, 0.4) },
            ),
        ),
        preset(
            "starburst-02",
            "Starburst",
            "Light",
            candidate,
            T::TwinkleStar,
            M::StarfieldSmooth,
            35,
            SizeRange::new(1.0, 3.0),
            ColorModifier::new(0.0, 1.2, 1.5, 0.9),
            0.0,
            BreathSync::new(
                BreathParams { scale: Some(1.15), ..p(0.08, 1.0) },
                BreathParams { scale: Some(1.15), twinkle: true, ..p(0.03, 1.0) },
                BreathParams { scale: Some(0.85), ..p(0.08, 0.5) },
                BreathParams { scale: Some(1.0), ..p(0.02, 0.3) },
            ),
        ),
        preset(
            "embers-03",
            "Embers",
            "Nature",
            candidate,
            T::EmberPop,
            M::EmberMixed,
            28,
            SizeRange::new(2.0, 5.0),
            ColorModifier::new(-25.0, 1.4, 1.3, 0.95),
            0.4,
            BreathSync::new(
                BreathParams { spawn: Some(true), ..p(0.5, 0.9) },
                BreathParams { spawn: Some(false), ..p(0.4, 1.0) },
                BreathParams { spawn: Some(true), ..p(0.6, 0.7) },
                BreathParams { spawn: Some(false), ..p(0.3, 0.5) },
            ),
        ),
        preset(
            "electric-04",
            "Shimmer Ring",
            "Energy",
            final_,
            T::LightningArc,
            M::ElectricVaried,
            5,
            SizeRange::new(1.0, 2.0),
            ColorModifier::new(180.0, 1.2, 1.0, 0.4),
            0.0,
            BreathSync::new(
                BreathParams { intensity: Some(0.7), ..p(0.5, 0.6) },
                BreathParams { intensity: Some(0.6), ..p(0.3, 0.5) },
                BreathParams { intensity: Some(0.8), ..p(0.7, 0.6) },
                BreathParams { intensity: Some(0.5), ..p(0.2, 0.4) },
            ),
        ),
        preset(
            "plasma-current-07",
            "Plasma Current",
            "Energy",
            final_,
            T::PlasmaArc,
            M::PlasmaDirectional,
            5,
            SizeRange::new(1.5, 3.0),
            ColorModifier::new(180.0, 1.4, 1.2, 0.6),
            0.0,
            arc_sync(
                [(0.6, 0.7, 0.8, 1.2), (0.4, 0.6, 0.7, 0.8), (0.9, 0.8, 0.9, 2.0), (0.3, 0.5, 0.6, 0.6)],
                |b, v| BreathParams { flow_speed: Some(v), ..b },
            ),
        ),
        preset(
            "plasma-v2-08",
            "Plasma Current v2",
            "Energy",
            candidate,
            T::PlasmaV2,
            M::PlasmaRefined,
            5,
            SizeRange::new(1.5, 3.0),
            ColorModifier::new(180.0, 1.4, 1.3, 0.65),
            0.0,
            arc_sync(
                [(0.6, 0.75, 0.85, 1.5), (0.4, 0.65, 0.75, 1.0), (0.9, 0.85, 0.95, 2.5), (0.3, 0.55, 0.65, 0.8)],
                |b, v| BreathParams { flow_speed: Some(v), ..b },
            ),
        ),
        preset(
            "plasma-ribbon-09",
            "Plasma Ribbon",
            "Energy",
            candidate,
            T::PlasmaRibbon,
            M::RibbonFlow,
            3,
            SizeRange::new(1.0, 2.0),
            ColorModifier::new(200.0, 1.1, 1.0, 0.5),
            0.0,
            arc_sync(
                [(0.3, 0.6, 0.6, 0.8), (0.2, 0.5, 0.5, 0.5), (0.4, 0.7, 0.7, 1.2), (0.15, 0.4, 0.4, 0.4)],
                |b, v| BreathParams { flow_speed: Some(v), ..b },
            ),
        ),
        preset(
            "circuit-pulse-10",
            "Circuit Pulse",
            "Energy",
            candidate,
            T::CircuitLine,
            M::CircuitPulse,
            8,
            SizeRange::new(1.0, 2.0),
            ColorModifier::new(160.0, 1.6, 1.4, 0.7),
            0.0,
            arc_sync(
                [(0.5, 0.8, 0.8, 2.0), (0.3, 0.7, 0.7, 1.0), (0.8, 0.9, 0.9, 4.0), (0.2, 0.5, 0.5, 0.5)],
                |b, v| BreathParams { pulse_rate: Some(v), ..b },
            ),
        ),
        preset(
            "solar-flare-11",
            "Solar Flare Arc",
            "Energy",
            candidate,
            T::SolarFlare,
            M::FlareTurbulence,
            6,
            SizeRange::new(2.0, 4.0),
            ColorModifier::new(-30.0, 1.5, 1.5, 0.7),
            0.2,
            arc_sync(
                [(0.4, 0.9, 0.8, 1.5), (0.3, 1.0, 0.9, 1.0), (0.6, 0.8, 0.7, 2.5), (0.2, 0.6, 0.5, 0.8)],
                |b, v| BreathParams { turbulence: Some(v), ..b },
            ),
        ),
        preset(
            "ethereal-wisps-12",
            "Ethereal Wisps",
            "Energy",
            candidate,
            T::WispParticle,
            M::WispDrift,
            12,
            SizeRange::new(1.0, 3.0),
            ColorModifier::new(220.0, 0.8, 1.2, 0.4),
            0.5,
            arc_sync(
                [(0.2, 0.5, 0.5, 0.8), (0.1, 0.6, 0.6, 0.4), (0.3, 0.4, 0.4, 1.2), (0.1, 0.3, 0.3, 0.3)],
                |b, v| BreathParams { wisp_speed: Some(v), ..b },
            ),
        ),
        preset(
            "chaotic-lightning-13",
            "Chaotic Lightning",
            "Energy",
            candidate,
            T::ChaosArc,
            M::ChaosElectric,
            8,
            SizeRange::new(2.0, 4.0),
            ColorModifier::new(170.0, 1.6, 1.6, 0.8),
            0.0,
            arc_sync(
                [(0.7, 0.9, 0.9, 1.5), (0.5, 0.8, 0.8, 1.0), (1.2, 1.0, 1.0, 3.0), (0.3, 0.6, 0.6, 0.8)],
                |b, v| BreathParams { chaos_level: Some(v), ..b },
            ),
        ),
        preset(
            "quantum-ripple-14",
            "Quantum Ripple",
            "Energy",
            candidate,
            T::RippleWave,
            M::QuantumWave,
            4,
            SizeRange::new(1.0, 2.0),
            ColorModifier::new(240.0, 1.3, 1.1, 0.55),
            0.0,
            BreathSync::new(
                BreathParams { intensity: Some(0.7), wave_freq: Some(3.0), wave_amp: Some(4.0), ..p(0.4, 0.7) },
                BreathParams { intensity: Some(0.8), wave_freq: Some(2.0), wave_amp: Some(3.0), ..p(0.2, 0.8) },
                BreathParams { intensity: Some(0.6), wave_freq: Some(5.0), wave_amp: Some(6.0), ..p(0.6, 0.6) },
                BreathParams { intensity: Some(0.5), wave_freq: Some(2.0), wave_amp: Some(2.0), ..p(0.15, 0.5) },
            ),
        ),
        preset(
            "snowglobe-05",
            "Snowglobe",
            "Nature",
            candidate,
            T::SnowVaried,
            M::SnowglobeActive,
            70,
            SizeRange::new(1.0, 4.0),
            ColorModifier::new(0.0, 0.2, 1.5, 0.8),
            0.1,
            BreathSync::new(
                BreathParams { shake: true, ..p(0.6, 0.65) },
                p(0.25, 0.8),
                p(0.35, 0.55),
                p(0.15, 0.45),
            ),
        ),
        preset(
            "meteor-shower-06",
            "Meteor Shower",
            "Cosmic",
            candidate,
            T::MeteorThin,
            M::MeteorCycle,
            22,
            SizeRange::new(1.0, 3.0),
            ColorModifier::new(-15.0, 1.2, 1.3, 0.65),
            0.8,
            BreathSync::new(
                BreathParams { phase: Some(MeteorPhase::Cloud), ..p(0.15, 0.4) },
                BreathParams { phase: Some(MeteorPhase::Stop), ..p(0.0, 0.5) },
                BreathParams { phase: Some(MeteorPhase::Rain), ..p(1.5, 0.85) },
                BreathParams { phase: Some(MeteorPhase::Fade), ..p(0.05, 0.2) },
            ),
        ),
        preset(
            "aether-current-15",
            "Aether Current",
            "Ethereal",
            candidate,
            T::AetherMote,
            M::AetherFlow,
            50,
            SizeRange::new(1.0, 2.0),
            ColorModifier::new(30.0, 0.8, 1.3, 0.7),
            0.2,
            BreathSync::new(
                BreathParams { flow_speed: Some(1.5), ..p(1.2, 0.7) },
                BreathParams { flow_speed: Some(0.3), ..p(0.3, 0.5) },
                BreathParams { flow_speed: Some(0.8), ..p(0.6, 0.6) },
                BreathParams { flow_speed: Some(0.5), ..p(0.4, 0.4) },
            ),
        ),
        preset(
            "singularity-shear-16",
            "Singularity Shear",
            "Cosmic",
            candidate,
            T::DistortionArc,
            M::SingularityWarp,
            2,
            SizeRange::new(1.0, 1.0),
            ColorModifier::new(200.0, 0.6, 0.9, 0.2),
            0.0,
            BreathSync::new(
                BreathParams { distort_amp: Some(4.0), noise_scale: Some(2.0), ..p(0.5, 0.4) },
                BreathParams { distort_amp: Some(2.0), noise_scale: Some(1.5), ..p(0.2, 0.5) },
                BreathParams { distort_amp: Some(3.0), noise_scale: Some(1.8), ..p(0.4, 0.35) },
                BreathParams { distort_amp: Some(1.5), noise_scale: Some(1.2), ..p(0.2, 0.3) },
            ),
        ),
        preset(
            "celestial-harmonics-17",
            "Celestial Harmonics",
            "Sacred",
            candidate,
            T::HarmonicRing,
            M::CelestialOscillate,
            4,
            SizeRange::new(1.0, 1.0),
            ColorModifier::new(60.0, 0.7, 1.1, 0.15),
            0.0,
            BreathSync::new(
                BreathParams { amplitude: Some(3.0), frequencies: Some(vec![3.0, 5.0, 7.0, 9.0]), ..p(0.6, 0.5) },
                BreathParams { amplitude: Some(1.0), frequencies: Some(vec![0.0, 0.0, 0.0, 0.0]), ..p(0.1, 0.6) },
                BreathParams { amplitude: Some(2.5), frequencies: Some(vec![4.0, 6.0, 8.0, 10.0]), ..p(0.5, 0.4) },
                BreathParams { amplitude: Some(1.5), frequencies: Some(vec![2.0, 3.0, 4.0, 5.0]), ..p(0.2, 0.3) },
            ),
        ),
        preset(
            "dragon-veins-18",
            "Dragon Veins",
            "Elemental",
            candidate,
            T::DragonArc,
            M::DragonFlow,
            3,
            SizeRange::new(1.0, 2.0),
            ColorModifier::new(-30.0, 1.3, 1.2, 0.5),
            0.0,
            BreathSync::new(
                BreathParams { amplitude: Some(6.0), jitter: Some(0.5), ..p(0.4, 0.7) },
                BreathParams { amplitude: Some(4.0), jitter: Some(0.3), ..p(0.2, 0.6) },
                BreathParams { amplitude: Some(5.0), jitter: Some(0.4), ..p(0.3, 0.5) },
                BreathParams { amplitude: Some(3.0), jitter: Some(0.2), ..p(0.15, 0.4) },
            ),
        ),
        preset(
            "orbital-fire-19",
            "Orbital Fire",
            "Nature",
            candidate,
            T::OrbitalEmber,
            M::OrbitalFire,
            12,
            SizeRange::new(2.0, 4.0),
            ColorModifier::new(-25.0, 1.4, 1.3, 0.85),
            0.3,
            BreathSync::new(
                BreathParams { orbit_speed: Some(1.5), ..p(1.2, 0.9) },
                BreathParams { orbit_speed: Some(0.2), ..p(0.2, 0.7) },
                BreathParams { orbit_speed: Some(0.6), ..p(0.5, 0.6) },
                BreathParams { orbit_speed: Some(0.4), ..p(0.3, 0.5) },
            ),
        ),
        preset(
            "void-bloom-20",
            "Void Bloom",
            "Ethereal",
            candidate,
            T::BloomPulse,
            M::VoidPulse,
            5,
            SizeRange::new(1.0, 1.0),
            ColorModifier::new(180.0, 0.6, 1.0, 0.35),
            0.0,
            BreathSync::new(
                BreathParams { pulse_rate: Some(1.0), pulse_amp: Some(40.0), ..p(0.5, 0.8) },
                BreathParams { pulse_rate: Some(0.3), pulse_amp: Some(20.0), ..p(0.2, 0.6) },
                BreathParams { pulse_rate: Some(0.6), pulse_amp: Some(30.0), ..p(0.4, 0.5) },
                BreathParams { pulse_rate: Some(0.2), pulse_amp: Some(15.0), ..p(0.15, 0.4) },
            ),
        ),
        preset(
            "prismatic-shards-21",
            "Prismatic Shards",
            "Light",
            candidate,
            T::PrismSpark,
            M::PrismaticSplit,
            20,
            SizeRange::new(1.0, 2.0),
            ColorModifier::new(0.0, 1.5, 1.6, 0.9),
            0.1,
            BreathSync::new(
                BreathParams { split_chance: Some(0.4), hue_shift: Some(15.0), ..p(0.6, 1.0) },
                BreathParams { split_chance: Some(0.2), hue_shift: Some(10.0), ..p(0.2, 0.8) },
                BreathParams { split_chance: Some(0.3), hue_shift: Some(12.0), ..p(0.5, 0.7) },
                BreathParams { split_chance: Some(0.15), hue_shift: Some(8.0), ..p(0.3, 0.5) },
            ),
        ),
        preset(
            "stardust-stream-22",
            "Stardust Stream",
            "Cosmic",
            candidate,
            T::DustMote,
            M::StardustDrift,
            40,
            SizeRange::new(1.0, 2.0),
            ColorModifier::new(20.0, 0.9, 1.2, 0.6),
            0.15,
            BreathSync::new(
                BreathParams { flow_speed: Some(1.2), fall_chance: Some(0.03), ..p(0.8, 0.6) },
                BreathParams { flow_speed: Some(0.3), fall_chance: Some(0.01), ..p(0.2, 0.5) },
                BreathParams { flow_speed: Some(0.7), fall_chance: Some(0.05), ..p(0.5, 0.5) },
                BreathParams { flow_speed: Some(0.4), fall_chance: Some(0.02), ..p(0.3, 0.4) },
            ),
        ),
        preset(
            "spirit-chase-23",
            "Spirit Chase",
            "Ethereal",
            candidate,
            T::SpiritLight,
            M::SpiritOrbit,
            2,
            SizeRange::new(3.0, 4.0),
            ColorModifier::new(45.0, 0.8, 1.4, 0.85),
            0.4,
            BreathSync::new(
                BreathParams { speed1: Some(1.5), speed2: Some(1.8), ..p(0.8, 0.9) },
                BreathParams { speed1: Some(0.6), speed2: Some(0.7), ..p(0.3, 0.7) },
                BreathParams { speed1: Some(1.0), speed2: Some(1.3), ..p(0.6, 0.6) },
                BreathParams { speed1: Some(0.8), speed2: Some(1.0), ..p(0.4, 0.5) },
            ),
        ),
        preset(
            "breath-forest-24",
            "Breath of Forest",
            "Nature",
            candidate,
            T::LeafMote,
            M::ForestDrift,
            25,
            SizeRange::new(2.0, 4.0),
            ColorModifier::new(80.0, 0.7, 0.9, 0.5),
            0.0,
            BreathSync::new(
                BreathParams { fall_speed: Some(0.4), rot_speed: Some(0.5), ..p(0.3, 0.5) },
                BreathParams { fall_speed: Some(0.2), rot_speed: Some(0.3), ..p(0.15, 0.4) },
                BreathParams { fall_speed: Some(0.8), rot_speed: Some(0.7), ..p(0.6, 0.45) },
                BreathParams { fall_speed: Some(0.3), rot_speed: Some(0.4), ..p(0.2, 0.35) },
            ),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::{MAX_PARTICLE_COUNT, MAX_TRAIL_LENGTH};

    #[test]
    fn test_every_preset_within_limits() {
        let all = path_presets_all()
            .iter()
            .chain(presets(None))
            .chain(std::iter::once(default_preset()));
        for preset in all {
            assert!(preset.particle_count <= MAX_PARTICLE_COUNT, "{}", preset.id);
            assert!(preset.trail_length <= MAX_TRAIL_LENGTH, "{}", preset.id);
            assert!(preset.particle_size.min <= preset.particle_size.max, "{}", preset.id);
        }
    }

    #[test]
    fn test_ring_ids_unique() {
        let ids: Vec<_> = presets(None).iter().map(|p| p.id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(ids.len(), sorted.len());
        assert_eq!(ids.len(), 24);
    }

    #[test]
    fn test_lookup_by_path_and_id() {
        assert_eq!(get_preset("Prana").map(|p| p.name.as_str()), Some("Vital Flow"));
        assert_eq!(get_preset("prana").map(|p| p.name.as_str()), Some("Vital Flow"));
        assert_eq!(
            get_preset("embers-03").map(|p| p.motion_pattern),
            Some(MotionPattern::EmberMixed)
        );
        assert!(get_preset("no-such-effect").is_none());
    }

    #[test]
    fn test_default_is_neutral_orbit() {
        let preset = default_preset();
        assert_eq!(preset.particle_type, ParticleType::SoftCircle);
        assert_eq!(preset.motion_pattern, MotionPattern::OrbitSteady);
        assert_eq!(preset.particle_count, 6);
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        let resolved = resolve(&PresetSource::from("definitely-missing"));
        assert_eq!(resolved.id, "neutral");
    }

    #[test]
    fn test_resolve_override_is_clamped() {
        let mut custom = default_preset().clone();
        custom.particle_count = 1000;
        custom.trail_length = 9.0;
        let resolved = resolve(&PresetSource::from(custom));
        assert_eq!(resolved.particle_count, MAX_PARTICLE_COUNT);
        assert_eq!(resolved.trail_length, MAX_TRAIL_LENGTH);
    }

    #[test]
    fn test_status_filter() {
        let finals: Vec<_> = presets(Some(PresetStatus::Final))
            .into_iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(finals, vec!["electric-04", "plasma-current-07"]);
    }

    #[test]
    fn test_path_presets_carry_symbol_and_description() {
        let soma = path_fx("Soma").unwrap();
        assert_eq!(soma.symbol.as_deref(), Some("◇"));
        assert_eq!(
            soma.description.as_deref(),
            Some("Earthy particles fall and settle like dust returning to ground")
        );
        assert!(path_presets_all().iter().all(|p| p.symbol.is_some() && p.description.is_some()));
        assert_eq!(default_preset().symbol.as_deref(), Some("○"));
        assert!(preset_by_id("embers-03").unwrap().symbol.is_none());

        let json = soma.to_json().unwrap();
        assert!(json.contains("\"symbol\""));
        assert_eq!(Preset::from_json(&json).unwrap(), *soma);
    }

    #[test]
    fn test_categories_first_seen_order() {
        assert_eq!(
            categories(),
            vec!["Light", "Nature", "Energy", "Cosmic", "Ethereal", "Sacred", "Elemental"]
        );
        assert_eq!(presets_by_category("Sacred").len(), 1);
    }

    #[test]
    fn test_breath_sync_params_meteor_phases() {
        let meteor = preset_by_id("meteor-shower-06").unwrap();
        assert_eq!(
            breath_sync_params(meteor, Some(BreathPhase::Exhale)).phase,
            Some(MeteorPhase::Rain)
        );
        assert_eq!(
            breath_sync_params(meteor, Some(BreathPhase::Hold)).phase,
            Some(MeteorPhase::Stop)
        );
        // no split-hold entries: the split holds read rest
        assert_eq!(
            breath_sync_params(meteor, Some(BreathPhase::HoldTop)).phase,
            Some(MeteorPhase::Fade)
        );
        assert_eq!(
            breath_sync_params(meteor, Some(BreathPhase::HoldBottom)).phase,
            Some(MeteorPhase::Fade)
        );
        assert_eq!(breath_sync_params(meteor, None).phase, Some(MeteorPhase::Fade));
    }
}
