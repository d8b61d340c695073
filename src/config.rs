//! Engine configuration.
//!
//! [`EngineConfig`] carries every input the host supplies to an engine:
//! which preset to run, how large the canvas is, the accent color, the
//! current breath phase and so on. It round-trips through camelCase JSON so
//! the headless renderer and the viewer can load it from a file.
//!
//! ```ignore
//! let config = EngineConfig::new("Prana")
//!     .with_size(400.0)
//!     .with_intensity(0.8)
//!     .with_light(true);
//! let engine = ParticleEngine::new(config);
//! ```

use crate::breath::BreathPattern;
use crate::color::Rgb;
use crate::error::LoadError;
use crate::registry::PresetSource;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Canvas side length used when none is given.
pub const DEFAULT_SIZE: f32 = 300.0;

/// Fraction of the canvas size used as the ring radius when none is given.
pub const RING_RADIUS_FRACTION: f32 = 0.4;

/// Inputs for one [`ParticleEngine`](crate::engine::ParticleEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Path id, ring preset id, or an inline preset.
    pub source: PresetSource,
    /// Global opacity and glow scalar in `[0, 1]`.
    pub intensity: f32,
    /// 1.0 is the resting ring; larger values expand it.
    pub ring_scale: f32,
    /// Explicit ring radius in pixels. Derived from `size` when `None`.
    pub ring_radius: Option<f32>,
    /// Breath phase name as reported by the breath timer.
    pub phase: String,
    /// Canvas side length in pixels.
    pub size: f32,
    /// Base particle color as `#rrggbb`.
    pub accent_color: String,
    /// Whether the animation loop should run.
    pub is_active: bool,
    /// Light background: particle colors are inverted.
    pub is_light: bool,
    /// Seed for deterministic runs. Entropy when `None`.
    pub seed: Option<u64>,
    /// Breath cycle to drive `phase` and `ring_scale` from, for hosts
    /// without their own breath timer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breath: Option<BreathPattern>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            source: PresetSource::default(),
            intensity: 0.5,
            ring_scale: 1.0,
            ring_radius: None,
            phase: "rest".to_string(),
            size: DEFAULT_SIZE,
            accent_color: "#d4af37".to_string(),
            is_active: true,
            is_light: false,
            seed: None,
            breath: None,
        }
    }
}

impl EngineConfig {
    /// Config for a path id or ring preset id with every other input at
    /// its default.
    pub fn new(name: &str) -> Self {
        Self {
            source: PresetSource::from(name),
            ..Self::default()
        }
    }

    pub fn with_source(mut self, source: impl Into<PresetSource>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn with_ring_scale(mut self, ring_scale: f32) -> Self {
        self.ring_scale = ring_scale;
        self
    }

    pub fn with_ring_radius(mut self, radius: f32) -> Self {
        self.ring_radius = Some(radius);
        self
    }

    pub fn with_phase(mut self, phase: &str) -> Self {
        self.phase = phase.to_string();
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn with_accent_color(mut self, hex: &str) -> Self {
        self.accent_color = hex.to_string();
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    pub fn with_light(mut self, light: bool) -> Self {
        self.is_light = light;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_breath(mut self, pattern: BreathPattern) -> Self {
        self.breath = Some(pattern);
        self
    }

    /// Canvas size, falling back to [`DEFAULT_SIZE`] for non-positive or
    /// non-finite values.
    pub fn canvas_size(&self) -> f32 {
        if self.size.is_finite() && self.size > 0.0 {
            self.size
        } else {
            DEFAULT_SIZE
        }
    }

    /// Unscaled ring radius in pixels.
    pub fn base_ring_radius(&self) -> f32 {
        match self.ring_radius {
            Some(r) if r.is_finite() && r > 0.0 => r,
            _ => self.canvas_size() * RING_RADIUS_FRACTION,
        }
    }

    /// Ring scale, 1.0 when the configured value is unusable.
    pub fn effective_ring_scale(&self) -> f32 {
        if self.ring_scale.is_finite() && self.ring_scale > 0.0 {
            self.ring_scale
        } else {
            1.0
        }
    }

    /// Intensity clamped to `[0, 1]`.
    pub fn effective_intensity(&self) -> f32 {
        if self.intensity.is_finite() {
            self.intensity.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Parsed accent color, gold when the string does not parse.
    pub fn accent(&self) -> Rgb {
        Rgb::parse_or_gold(&self.accent_color)
    }

    /// Identity used to decide whether the pool must be rebuilt.
    pub fn preset_identity(&self) -> &str {
        match &self.source {
            PresetSource::Named(name) => name,
            PresetSource::Override(preset) => &preset.id,
        }
    }

    pub fn from_json(json: &str) -> Result<EngineConfig, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, LoadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<EngineConfig, LoadError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Save this config as a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;

    #[test]
    fn test_defaults_match_host_inputs() {
        let config = EngineConfig::default();
        assert_eq!(config.intensity, 0.5);
        assert_eq!(config.ring_scale, 1.0);
        assert_eq!(config.phase, "rest");
        assert_eq!(config.size, 300.0);
        assert_eq!(config.accent(), Rgb::GOLD);
        assert!(config.is_active);
        assert!(!config.is_light);
    }

    #[test]
    fn test_ring_radius_derivation() {
        let config = EngineConfig::new("Soma").with_size(500.0);
        assert_eq!(config.base_ring_radius(), 200.0);
        assert_eq!(config.clone().with_ring_radius(90.0).base_ring_radius(), 90.0);
        assert_eq!(config.with_ring_radius(0.0).base_ring_radius(), 200.0);
        assert_eq!(EngineConfig::default().with_size(-1.0).base_ring_radius(), 120.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(
            r##"{"source": {"named": "embers-03"}, "isLight": true, "accentColor": "#ff0000"}"##,
        )
        .unwrap();
        assert_eq!(config.preset_identity(), "embers-03");
        assert!(config.is_light);
        assert_eq!(config.accent(), Rgb::new(255, 0, 0));
        assert_eq!(config.size, DEFAULT_SIZE);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_override_identity_and_round_trip() {
        let preset = registry::preset_by_id("embers-03").unwrap().clone();
        let config = EngineConfig::default().with_source(preset).with_seed(9);
        assert_eq!(config.preset_identity(), "embers-03");

        let back = EngineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_effective_values_guard_bad_input() {
        let config = EngineConfig::default()
            .with_intensity(3.0)
            .with_ring_scale(f32::NAN);
        assert_eq!(config.effective_intensity(), 1.0);
        assert_eq!(config.effective_ring_scale(), 1.0);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("ringfx-config-{}.json", std::process::id()));
        let config = EngineConfig::new("Dhyana").with_phase("inhale").with_size(256.0);
        config.save(&path).unwrap();
        let loaded = EngineConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }
}
