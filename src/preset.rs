//! Preset data model.
//!
//! A [`Preset`] bundles everything one visual effect needs: how many
//! particles, how big, how they are tinted, which motion pattern moves them,
//! which draw routine paints them, and a per-breath-phase parameter table.
//!
//! Presets are plain serde types so hand-authored effects can be loaded from
//! JSON using the same camelCase / kebab-case spelling as the built-in tables:
//!
//! ```ignore
//! let preset = Preset::load("presets/aurora.json")?.clamp();
//! let params = preset.breath_sync.get(Some(BreathPhase::Inhale));
//! ```

use crate::error::LoadError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Upper bound on pool size for any preset.
pub const MAX_PARTICLE_COUNT: usize = 80;

/// Upper bound on [`Preset::trail_length`].
pub const MAX_TRAIL_LENGTH: f32 = 0.8;

/// Declares a string-tagged enum with a catch-all variant.
///
/// Unknown tags parse to the fallback instead of failing, so a preset naming
/// an effect this build does not know still loads and renders with the
/// default routine.
macro_rules! tag_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $tag:literal, )*
        }
        fallback $fallback:ident => $fallback_tag:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        $vis enum $name {
            $( $(#[$vmeta])* $variant, )*
            /// Any tag this build does not recognise.
            $fallback,
        }

        impl $name {
            /// Every named variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            /// The kebab-case tag used in preset tables.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $tag, )*
                    $name::$fallback => $fallback_tag,
                }
            }

            /// Parse a tag, falling back for anything unrecognised.
            pub fn from_tag(tag: &str) -> Self {
                match tag {
                    $( $tag => $name::$variant, )*
                    _ => $name::$fallback,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<String> for $name {
            fn from(tag: String) -> Self {
                $name::from_tag(&tag)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }
    };
}

tag_enum! {
    /// Selects the draw routine for every particle of a preset.
    pub enum ParticleType {
        SoftCircle => "soft-circle",
        Dust => "dust",
        Wisp => "wisp",
        Spark => "spark",
        Diamond => "diamond",
        Fog => "fog",
        ThinRay => "thin-ray",
        TwinkleStar => "twinkle-star",
        EmberPop => "ember-pop",
        LightningArc => "lightning-arc",
        PlasmaArc => "plasma-arc",
        PlasmaV2 => "plasma-v2",
        PlasmaRibbon => "plasma-ribbon",
        CircuitLine => "circuit-line",
        SolarFlare => "solar-flare",
        WispParticle => "wisp-particle",
        ChaosArc => "chaos-arc",
        RippleWave => "ripple-wave",
        SnowVaried => "snow-varied",
        MeteorThin => "meteor-thin",
        AetherMote => "aether-mote",
        DistortionArc => "distortion-arc",
        HarmonicRing => "harmonic-ring",
        DragonArc => "dragon-arc",
        OrbitalEmber => "orbital-ember",
        BloomPulse => "bloom-pulse",
        PrismSpark => "prism-spark",
        DustMote => "dust-mote",
        SpiritLight => "spirit-light",
        LeafMote => "leaf-mote",
    }
    fallback Other => "other"
}

impl ParticleType {
    /// Ring-geometry types: they stroke arcs or rings rather than a dot and
    /// never paint position trails.
    pub fn is_arc(self) -> bool {
        matches!(
            self,
            ParticleType::LightningArc
                | ParticleType::PlasmaArc
                | ParticleType::PlasmaV2
                | ParticleType::PlasmaRibbon
                | ParticleType::CircuitLine
                | ParticleType::SolarFlare
                | ParticleType::ChaosArc
                | ParticleType::RippleWave
                | ParticleType::DistortionArc
                | ParticleType::HarmonicRing
                | ParticleType::DragonArc
                | ParticleType::BloomPulse
        )
    }
}

tag_enum! {
    /// Selects the per-frame update routine for every particle of a preset.
    pub enum MotionPattern {
        OrbitSteady => "orbit-steady",
        Burst => "burst",
        Drift => "drift",
        FallSettle => "fall-settle",
        WaveDissolve => "wave-dissolve",
        Converge => "converge",
        HyperspaceRays => "hyperspace-rays",
        StarfieldSmooth => "starfield-smooth",
        EmberMixed => "ember-mixed",
        ElectricVaried => "electric-varied",
        PlasmaDirectional => "plasma-directional",
        PlasmaRefined => "plasma-refined",
        RibbonFlow => "ribbon-flow",
        CircuitPulse => "circuit-pulse",
        FlareTurbulence => "flare-turbulence",
        WispDrift => "wisp-drift",
        ChaosElectric => "chaos-electric",
        QuantumWave => "quantum-wave",
        SnowglobeActive => "snowglobe-active",
        MeteorCycle => "meteor-cycle",
        AetherFlow => "aether-flow",
        SingularityWarp => "singularity-warp",
        CelestialOscillate => "celestial-oscillate",
        DragonFlow => "dragon-flow",
        OrbitalFire => "orbital-fire",
        VoidPulse => "void-pulse",
        PrismaticSplit => "prismatic-split",
        StardustDrift => "stardust-drift",
        SpiritOrbit => "spirit-orbit",
        ForestDrift => "forest-drift",
    }
    fallback Other => "other"
}

/// Lifecycle status of a ring preset in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetStatus {
    Candidate,
    Final,
}

impl PresetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PresetStatus::Candidate => "candidate",
            PresetStatus::Final => "final",
        }
    }
}

/// A segment of the breathing cycle.
///
/// `Hold` is the generic hold used by path presets; `HoldTop` and
/// `HoldBottom` are the split holds after inhale and after exhale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BreathPhase {
    Inhale,
    Hold,
    #[serde(alias = "holdIn")]
    HoldTop,
    Exhale,
    #[serde(alias = "holdOut")]
    HoldBottom,
    Rest,
}

impl BreathPhase {
    /// Parse a phase name as supplied by a breath timer.
    ///
    /// Accepts `holdIn`/`holdOut` as aliases for the split holds. Returns
    /// `None` for anything else; callers then use the `rest` parameters.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "inhale" => Some(BreathPhase::Inhale),
            "hold" => Some(BreathPhase::Hold),
            "holdTop" | "holdIn" => Some(BreathPhase::HoldTop),
            "exhale" => Some(BreathPhase::Exhale),
            "holdBottom" | "holdOut" => Some(BreathPhase::HoldBottom),
            "rest" => Some(BreathPhase::Rest),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BreathPhase::Inhale => "inhale",
            BreathPhase::Hold => "hold",
            BreathPhase::HoldTop => "holdTop",
            BreathPhase::Exhale => "exhale",
            BreathPhase::HoldBottom => "holdBottom",
            BreathPhase::Rest => "rest",
        }
    }

    /// True for the holds after inhale and after exhale. The generic
    /// `Hold` of path presets is not one of them.
    pub fn is_split_hold(self) -> bool {
        matches!(self, BreathPhase::HoldTop | BreathPhase::HoldBottom)
    }

    /// True for the segments that end a cycle (after exhale).
    pub fn is_cycle_end(self) -> bool {
        matches!(self, BreathPhase::Rest | BreathPhase::HoldBottom)
    }
}

impl fmt::Display for BreathPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-phase of the meteor shower, chosen per breath phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeteorPhase {
    /// Gather into a hovering cloud near the top.
    Cloud,
    /// Hang in place with a faint sway.
    Stop,
    /// Streak diagonally downward.
    Rain,
    /// Fade out and re-seed at the cloud line.
    #[default]
    Fade,
}

/// Pixel radius range particles are sized from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeRange {
    pub min: f32,
    pub max: f32,
}

impl SizeRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Linear pick inside the range for `t` in `[0, 1]`.
    pub fn lerp(&self, t: f32) -> f32 {
        self.min + t * (self.max - self.min)
    }
}

/// Global tint applied on top of the accent color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorModifier {
    /// Hue rotation in degrees.
    pub hue_shift: f32,
    /// 0 = grayscale, 1 = unchanged, >1 = boosted.
    pub saturation: f32,
    /// Per-channel multiplier.
    pub brightness: f32,
    /// Alpha multiplier.
    pub opacity: f32,
}

impl ColorModifier {
    pub const fn new(hue_shift: f32, saturation: f32, brightness: f32, opacity: f32) -> Self {
        Self {
            hue_shift,
            saturation,
            brightness,
            opacity,
        }
    }
}

impl Default for ColorModifier {
    fn default() -> Self {
        Self::new(0.0, 1.0, 1.0, 1.0)
    }
}

/// Parameters for one breath phase.
///
/// `speed` and `glow` are read by every pattern. The optional fields are
/// pattern-specific knobs; a pattern reading a knob the preset leaves unset
/// uses its own default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreathParams {
    pub speed: f32,
    pub glow: f32,

    // Path preset flags
    #[serde(default, skip_serializing_if = "is_false")]
    pub gather: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub shimmer: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disperse: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub settle: bool,

    // Rays / starfield
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ray_speed: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ray_length: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub twinkle: bool,

    // Embers / snow / meteors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawn: Option<bool>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub shake: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<MeteorPhase>,

    // Arcs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_speed: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulse_rate: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turbulence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wisp_speed: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chaos_level: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wave_freq: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wave_amp: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distort_amp: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise_scale: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amplitude: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequencies: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter: Option<f32>,

    // Orbiters and spawners
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orbit_speed: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulse_amp: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_chance: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hue_shift: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fall_chance: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed1: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed2: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fall_speed: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rot_speed: Option<f32>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl BreathParams {
    /// Parameters with only the universal speed/glow pair set.
    pub fn new(speed: f32, glow: f32) -> Self {
        Self {
            speed,
            glow,
            ..Default::default()
        }
    }

    /// Read a knob, treating unset and zero alike.
    ///
    /// Preset tables use 0 to mean "not tuned"; the pattern default applies.
    pub fn knob(value: Option<f32>, default: f32) -> f32 {
        match value {
            Some(v) if v != 0.0 && v.is_finite() => v,
            _ => default,
        }
    }
}

/// Per-phase parameter table. `rest` is mandatory and is the fallback for
/// any phase the preset does not tune.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreathSync {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inhale: Option<BreathParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold: Option<BreathParams>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "holdIn")]
    pub hold_top: Option<BreathParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exhale: Option<BreathParams>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "holdOut")]
    pub hold_bottom: Option<BreathParams>,
    pub rest: BreathParams,
}

impl BreathSync {
    /// The four-phase table used by every built-in preset.
    pub fn new(inhale: BreathParams, hold: BreathParams, exhale: BreathParams, rest: BreathParams) -> Self {
        Self {
            inhale: Some(inhale),
            hold: Some(hold),
            hold_top: None,
            exhale: Some(exhale),
            hold_bottom: None,
            rest,
        }
    }

    /// Parameters for `phase`.
    ///
    /// Each phase reads only its own entry. Anything untuned, split holds
    /// included, and an unknown phase (`None`) fall back to `rest`.
    pub fn get(&self, phase: Option<BreathPhase>) -> &BreathParams {
        let exact = match phase {
            Some(BreathPhase::Inhale) => self.inhale.as_ref(),
            Some(BreathPhase::Hold) => self.hold.as_ref(),
            Some(BreathPhase::HoldTop) => self.hold_top.as_ref(),
            Some(BreathPhase::Exhale) => self.exhale.as_ref(),
            Some(BreathPhase::HoldBottom) => self.hold_bottom.as_ref(),
            Some(BreathPhase::Rest) | None => None,
        };
        exact.unwrap_or(&self.rest)
    }
}

/// A named visual-effect configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PresetStatus>,
    /// Glyph shown next to the name in path pickers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub particle_type: ParticleType,
    pub motion_pattern: MotionPattern,
    pub particle_count: usize,
    pub particle_size: SizeRange,
    #[serde(default)]
    pub color_modifier: ColorModifier,
    #[serde(default)]
    pub trail_length: f32,
    pub breath_sync: BreathSync,
}

impl Preset {
    /// Copy with `particle_count` and `trail_length` clamped to the system
    /// maxima. Never rejects; out-of-range values are pulled into range.
    pub fn clamp(&self) -> Preset {
        let mut clamped = self.clone();
        clamped.particle_count = self.particle_count.min(MAX_PARTICLE_COUNT);
        clamped.trail_length = if self.trail_length.is_finite() {
            self.trail_length.clamp(0.0, MAX_TRAIL_LENGTH)
        } else {
            0.0
        };
        if clamped.particle_count != self.particle_count
            || clamped.trail_length != self.trail_length
        {
            log::debug!(
                "Clamped preset '{}': count {} -> {}, trail {} -> {}",
                self.id,
                self.particle_count,
                clamped.particle_count,
                self.trail_length,
                clamped.trail_length
            );
        }
        clamped
    }

    /// Parse a preset from a JSON string.
    pub fn from_json(json: &str) -> Result<Preset, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, LoadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a preset from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Preset, LoadError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Save this preset as a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
