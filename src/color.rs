//! Color transform.
//!
//! Every stroke and fill the renderer issues goes through
//! [`ColorTransform::apply`]: the accent color is scaled by brightness,
//! pulled toward gray by saturation, rotated in hue with a fixed linear
//! matrix, optionally inverted for light backgrounds, and given a floored
//! alpha. Offsets vary per particle ([`ColorVariation`]) and per draw layer
//! (core, ghost, glow), so nothing here is cached.

use crate::preset::ColorModifier;
use std::fmt;

/// Opaque 8-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Accent used when the configured color does not parse.
    pub const GOLD: Rgb = Rgb::new(212, 175, 55);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (leading `#` optional, case-insensitive).
    pub fn parse_hex(hex: &str) -> Option<Rgb> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Parse `hex`, falling back to [`Rgb::GOLD`].
    pub fn parse_or_gold(hex: &str) -> Rgb {
        Self::parse_hex(hex).unwrap_or_else(|| {
            log::warn!("Invalid accent color '{}', using gold", hex);
            Rgb::GOLD
        })
    }

    pub fn with_alpha(self, a: f32) -> Rgba {
        Rgba::new(self.r, self.g, self.b, a)
    }
}

/// 8-bit color with a float alpha in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0.0);

    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(&self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }

    /// Straight-alpha components as floats in `[0, 1]`.
    pub fn to_f32(&self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a.clamp(0.0, 1.0),
        ]
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Stable per-particle color offset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorVariation {
    pub brightness: f32,
    /// Degrees.
    pub hue: f32,
}

impl ColorVariation {
    /// Variation bucket for particle `id` in a pool of `total`.
    ///
    /// Pools are split into 3..=6 buckets (one per 8 particles) spread
    /// evenly over ±0.2 brightness and ±15° hue.
    pub fn for_particle(id: usize, total: usize) -> Self {
        let buckets = (total / 8).clamp(3, 6);
        let t = (id % buckets) as f32 / (buckets - 1) as f32 - 0.5;
        Self {
            brightness: t * 0.4,
            hue: t * 30.0,
        }
    }
}

/// Preset tint plus color scheme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorTransform {
    pub modifier: ColorModifier,
    /// Invert channels for light backgrounds.
    pub light: bool,
}

impl ColorTransform {
    pub fn new(modifier: ColorModifier, light: bool) -> Self {
        Self { modifier, light }
    }

    /// Tint `base` for one draw call.
    pub fn apply(&self, base: Rgb, opacity: f32, brightness_offset: f32, hue_offset: f32) -> Rgba {
        let m = &self.modifier;

        let boost = m.brightness + brightness_offset;
        let mut r = (base.r as f32 * boost).min(255.0);
        let mut g = (base.g as f32 * boost).min(255.0);
        let mut b = (base.b as f32 * boost).min(255.0);

        let gray = (r + g + b) / 3.0;
        r = gray + (r - gray) * m.saturation;
        g = gray + (g - gray) * m.saturation;
        b = gray + (b - gray) * m.saturation;

        let hue = m.hue_shift + hue_offset;
        if hue != 0.0 {
            let (sin, cos) = hue.to_radians().sin_cos();
            let nr = r * (0.213 + cos * 0.787 - sin * 0.213)
                + g * (0.715 - cos * 0.715 - sin * 0.715)
                + b * (0.072 - cos * 0.072 + sin * 0.928);
            let ng = r * (0.213 - cos * 0.213 + sin * 0.143)
                + g * (0.715 + cos * 0.285 + sin * 0.140)
                + b * (0.072 - cos * 0.072 - sin * 0.283);
            let nb = r * (0.213 - cos * 0.213 - sin * 0.787)
                + g * (0.715 - cos * 0.715 + sin * 0.715)
                + b * (0.072 + cos * 0.928 + sin * 0.072);
            r = nr.clamp(0.0, 255.0);
            g = ng.clamp(0.0, 255.0);
            b = nb.clamp(0.0, 255.0);
        }

        if self.light {
            r = 255.0 - r;
            g = 255.0 - g;
            b = 255.0 - b;
        }

        Rgba::new(
            to_channel(r),
            to_channel(g),
            to_channel(b),
            (opacity * m.opacity).max(0.1),
        )
    }
}

fn to_channel(v: f32) -> u8 {
    if v.is_nan() {
        0
    } else {
        v.round().clamp(0.0, 255.0) as u8
    }
}
