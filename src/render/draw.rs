//! Per-particle-type draw routines.
//!
//! [`Renderer::draw_frame`] clears the canvas and paints every visible
//! particle in pool order: first its fading trail, then the routine picked by
//! the preset's [`ParticleType`]. Each particle is drawn inside a [`Scoped`]
//! guard so blend mode, shadow and transform never leak to the next one.
//!
//! Arc-type routines are table driven. An [`ArcRecipe`] lists the strokes
//! laid over the particle's ring polyline (glow, ghost and echo copies, the
//! bright core) and the sparks painted at the particle's own position.

use super::canvas::{BlendMode, Canvas2d, LineCap, LineJoin, Paint, Scoped, Shape, Stop};
use crate::color::{ColorTransform, ColorVariation, Rgb, Rgba};
use crate::particle::{Particle, PatternState};
use crate::pool::records_trail;
use crate::preset::{MeteorPhase, ParticleType, Preset};
use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;

/// Particles at or below this opacity are not drawn.
pub const MIN_DRAW_OPACITY: f32 = 0.05;

/// Trails are only painted for particles above this opacity.
const MIN_TRAIL_OPACITY: f32 = 0.1;

/// Per-frame inputs the routines read besides the particle itself.
#[derive(Debug, Clone, Copy)]
pub struct DrawParams {
    pub accent: Rgb,
    pub colors: ColorTransform,
    /// Global opacity and size scalar in `[0, 1]`.
    pub intensity: f32,
    /// `glow` of the current breath phase.
    pub glow: f32,
    /// Cycle direction, +1 or -1.
    pub direction: f32,
    /// Meteor sub-phase of the current breath phase, if any.
    pub meteor_phase: Option<MeteorPhase>,
}

/// Alpha, brightness offset and hue offset for one color.
#[derive(Debug, Clone, Copy)]
struct Tint {
    alpha: f32,
    brightness: f32,
    hue: f32,
}

const fn tint(alpha: f32, brightness: f32, hue: f32) -> Tint {
    Tint { alpha, brightness, hue }
}

/// Accent color plus the particle's variation bucket.
struct Brush {
    accent: Rgb,
    colors: ColorTransform,
    var: ColorVariation,
}

impl Brush {
    /// Tint with fixed offsets.
    fn fixed(&self, alpha: f32, brightness: f32, hue: f32) -> Rgba {
        self.colors.apply(self.accent, alpha, brightness, hue)
    }

    /// Tint relative to the particle's variation bucket.
    fn varied(&self, alpha: f32, brightness: f32, hue: f32) -> Rgba {
        self.colors
            .apply(self.accent, alpha, self.var.brightness + brightness, self.var.hue + hue)
    }

    fn pick(&self, varied: bool, t: Tint, alpha: f32) -> Rgba {
        if varied {
            self.varied(alpha, t.brightness, t.hue)
        } else {
            self.fixed(alpha, t.brightness, t.hue)
        }
    }
}

// ============================================================================
// Arc recipes
// ============================================================================

/// Which polyline a layer strokes.
#[derive(Debug, Clone, Copy)]
enum Trace {
    Main,
    /// Main line again, only when the pattern enabled its inner core.
    InnerCore,
    /// The second polyline (inner ripple, offset vein).
    Secondary,
    /// Each point pushed along its difference to the point `phase` of the
    /// ring ahead, scaled by `scale`.
    Ghost { phase: f32, scale: f32 },
    /// Main line started `phase` of the ring later.
    Echo { phase: f32 },
}

#[derive(Debug, Clone, Copy)]
enum Shadow {
    Accent(Tint),
    White(f32),
}

#[derive(Debug, Clone, Copy)]
struct Layer {
    trace: Trace,
    color: Tint,
    width: f32,
    blur: f32,
    /// `None` keeps the shadow color of the previous layer.
    shadow: Option<Shadow>,
}

const fn layer(trace: Trace, color: Tint, width: f32, blur: f32, shadow: Option<Shadow>) -> Layer {
    Layer { trace, color, width, blur, shadow }
}

/// A filled circle at the particle position, radius relative to size.
#[derive(Debug, Clone, Copy)]
struct Spark {
    color: Tint,
    radius: f32,
    blur: f32,
}

const fn spark(color: Tint, radius: f32, blur: f32) -> Spark {
    Spark { color, radius, blur }
}

#[derive(Debug, Clone, Copy)]
struct ArcRecipe {
    layers: &'static [Layer],
    sparks: &'static [Spark],
    /// Stroke and spark colors follow the particle's variation bucket.
    varied: bool,
    /// Shadow colors follow the particle's variation bucket.
    shadow_varied: bool,
    cap: LineCap,
    join: LineJoin,
}

/// Round-capped recipe with no layers, the base the tables below extend.
const ROUND: ArcRecipe = ArcRecipe {
    layers: &[],
    sparks: &[],
    varied: false,
    shadow_varied: false,
    cap: LineCap::Round,
    join: LineJoin::Round,
};

const fn glow(alpha: f32, brightness: f32, hue: f32) -> Option<Shadow> {
    Some(Shadow::Accent(tint(alpha, brightness, hue)))
}

const LIGHTNING: ArcRecipe = ArcRecipe {
    layers: &[
        layer(Trace::Ghost { phase: 0.15, scale: 0.3 }, tint(0.4, -0.15, 0.0), 2.0, 8.0, glow(0.3, 0.0, 0.0)),
        layer(Trace::Ghost { phase: 0.35, scale: -0.2 }, tint(0.25, -0.2, 10.0), 1.5, 6.0, None),
        layer(Trace::Main, tint(0.8, 0.0, 0.0), 1.2, 4.0, glow(0.5, 0.1, 0.0)),
    ],
    sparks: &[spark(tint(0.5, 0.0, 0.0), 0.4, 6.0)],
    varied: true,
    shadow_varied: true,
    ..ROUND
};

const PLASMA: ArcRecipe = ArcRecipe {
    layers: &[
        layer(Trace::Echo { phase: 0.08 }, tint(0.35, -0.1, 5.0), 2.5, 10.0, glow(0.4, 0.0, 0.0)),
        layer(Trace::Echo { phase: 0.18 }, tint(0.2, -0.15, 10.0), 1.8, 6.0, None),
        layer(Trace::Main, tint(1.0, 0.1, 0.0), 1.8, 6.0, glow(0.7, 0.15, 0.0)),
    ],
    sparks: &[spark(tint(0.8, 0.15, 0.0), 0.6, 10.0), spark(tint(0.3, 0.0, 0.0), 1.2, 15.0)],
    varied: true,
    shadow_varied: true,
    ..ROUND
};

const PLASMA_V2: ArcRecipe = ArcRecipe {
    layers: &[
        layer(Trace::Echo { phase: 0.06 }, tint(0.3, -0.1, 0.0), 2.5, 10.0, glow(0.4, 0.0, 0.0)),
        layer(Trace::Echo { phase: 0.14 }, tint(0.2, -0.15, 10.0), 1.8, 6.0, None),
        layer(Trace::Main, tint(0.9, 0.1, 0.0), 1.8, 5.0, glow(0.7, 0.15, 0.0)),
        layer(Trace::InnerCore, tint(1.2, 0.25, -5.0), 1.0, 3.0, Some(Shadow::White(0.6))),
    ],
    sparks: &[spark(tint(0.9, 0.2, 0.0), 0.7, 12.0)],
    varied: true,
    ..ROUND
};

const RIBBON: ArcRecipe = ArcRecipe {
    layers: &[
        layer(Trace::Main, tint(0.3, -0.1, 10.0), 6.0, 20.0, glow(0.4, 0.0, 0.0)),
        layer(Trace::Main, tint(0.7, 0.05, 0.0), 2.0, 8.0, None),
    ],
    ..ROUND
};

const CIRCUIT: ArcRecipe = ArcRecipe {
    layers: &[layer(Trace::Main, tint(0.8, 0.1, 0.0), 1.5, 8.0, glow(0.6, 0.15, 0.0))],
    sparks: &[spark(tint(1.0, 0.2, 0.0), 0.6, 10.0)],
    cap: LineCap::Butt,
    join: LineJoin::Miter,
    ..ROUND
};

const SOLAR: ArcRecipe = ArcRecipe {
    layers: &[
        layer(Trace::Main, tint(0.25, -0.1, -20.0), 8.0, 25.0, glow(0.5, 0.0, -15.0)),
        layer(Trace::Main, tint(0.7, 0.15, 0.0), 2.5, 10.0, glow(0.8, 0.2, 10.0)),
    ],
    sparks: &[spark(tint(0.9, 0.25, 15.0), 0.8, 15.0)],
    ..ROUND
};

const CHAOS: ArcRecipe = ArcRecipe {
    layers: &[
        layer(Trace::Main, tint(0.4, -0.05, 5.0), 5.0, 18.0, glow(0.6, 0.0, 0.0)),
        layer(Trace::Main, tint(1.0, 0.15, 0.0), 2.0, 8.0, None),
    ],
    sparks: &[spark(tint(1.0, 0.2, 0.0), 0.7, 12.0)],
    ..ROUND
};

const RIPPLE: ArcRecipe = ArcRecipe {
    layers: &[
        layer(Trace::Main, tint(0.5, -0.05, 15.0), 6.0, 20.0, glow(0.6, 0.0, 10.0)),
        layer(Trace::Main, tint(1.0, 0.15, 0.0), 2.0, 8.0, None),
    ],
    sparks: &[spark(tint(0.9, 0.15, 5.0), 0.8, 15.0)],
    ..ROUND
};

const DISTORTION: ArcRecipe = ArcRecipe {
    layers: &[
        layer(Trace::Main, tint(0.2, 0.0, 0.0), 2.0, 10.0, glow(0.3, 0.0, 0.0)),
        layer(Trace::Secondary, tint(0.12, -0.1, 10.0), 1.5, 6.0, None),
    ],
    ..ROUND
};

const HARMONIC: ArcRecipe = ArcRecipe {
    layers: &[layer(Trace::Main, tint(0.15, 0.05, 0.0), 1.5, 8.0, glow(0.4, 0.0, 0.0))],
    ..ROUND
};

const DRAGON: ArcRecipe = ArcRecipe {
    layers: &[
        layer(Trace::Secondary, tint(0.25, -0.1, -15.0), 3.0, 12.0, glow(0.4, 0.0, -10.0)),
        layer(Trace::Main, tint(0.55, 0.1, 0.0), 2.0, 8.0, glow(0.6, 0.15, 0.0)),
    ],
    ..ROUND
};

fn arc_recipe(kind: ParticleType) -> Option<&'static ArcRecipe> {
    use ParticleType as T;
    Some(match kind {
        T::LightningArc => &LIGHTNING,
        T::PlasmaArc => &PLASMA,
        T::PlasmaV2 => &PLASMA_V2,
        T::PlasmaRibbon => &RIBBON,
        T::CircuitLine => &CIRCUIT,
        T::SolarFlare => &SOLAR,
        T::ChaosArc => &CHAOS,
        T::RippleWave => &RIPPLE,
        T::DistortionArc => &DISTORTION,
        T::HarmonicRing => &HARMONIC,
        T::DragonArc => &DRAGON,
        _ => return None,
    })
}

/// Points of `trace`, or `None` when the layer has nothing to stroke.
fn trace_points(trace: Trace, p: &Particle) -> Option<Vec<Vec2>> {
    let main = &p.arc_segments;
    let n = main.len();
    let points = match trace {
        Trace::Main => main.iter().map(|s| s.pos).collect(),
        Trace::InnerCore => match p.state {
            PatternState::Arc { inner_core: true, .. } => main.iter().map(|s| s.pos).collect(),
            _ => return None,
        },
        Trace::Secondary => {
            if p.secondary_arc.len() < 2 {
                return None;
            }
            p.secondary_arc.iter().map(|s| s.pos).collect()
        }
        Trace::Ghost { phase, scale } => {
            let shift = (n as f32 * phase) as usize;
            (0..n)
                .map(|i| {
                    let seg = main[i].pos;
                    let ahead = main[(i + shift) % n].pos;
                    seg + (seg - ahead) * scale
                })
                .collect()
        }
        Trace::Echo { phase } => {
            let shift = (n as f32 * phase) as usize;
            (0..n).map(|i| main[(i + shift) % n].pos).collect()
        }
    };
    Some(points)
}

// ============================================================================
// Renderer
// ============================================================================

/// Paints particle pools onto a [`Canvas2d`].
///
/// Holds its own rng for draw-time randomness (chaos flicker) so rendering
/// never perturbs the motion rng.
#[derive(Debug, Clone)]
pub struct Renderer {
    rng: SmallRng,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(SmallRng::from_entropy())
    }
}

impl Renderer {
    pub fn new(rng: SmallRng) -> Self {
        Self { rng }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }

    /// Clear `canvas` and paint every visible particle of `pool`.
    pub fn draw_frame<C: Canvas2d + ?Sized>(
        &mut self,
        canvas: &mut C,
        pool: &[Particle],
        preset: &Preset,
        params: &DrawParams,
    ) {
        canvas.clear();
        let trails = records_trail(preset);

        for particle in pool {
            if trails && particle.opacity > MIN_TRAIL_OPACITY {
                draw_trail(canvas, particle, params);
            }
            if particle.opacity > MIN_DRAW_OPACITY {
                let mut scoped = Scoped::new(canvas);
                self.draw_particle(&mut *scoped, particle, preset.particle_type, params);
            }
        }
    }

    fn draw_particle<C: Canvas2d + ?Sized>(
        &mut self,
        c: &mut C,
        p: &Particle,
        kind: ParticleType,
        params: &DrawParams,
    ) {
        let brush = Brush {
            accent: params.accent,
            colors: params.colors,
            var: p.color_var,
        };
        let base = p.opacity * params.intensity;
        let s = p.draw_size() * (0.8 + params.intensity * 0.4);

        if let Some(recipe) = arc_recipe(kind) {
            let (master, blur_scale) = match kind {
                ParticleType::LightningArc => (base * 0.35, 1.0),
                ParticleType::PlasmaArc => (base * 0.5, 1.0),
                ParticleType::PlasmaV2 => (base * 0.55, 1.0),
                ParticleType::PlasmaRibbon => (base * 0.4, 1.0),
                ParticleType::CircuitLine => (base * p.opacity, 1.0),
                ParticleType::SolarFlare => (base * 0.6, 1.0),
                ParticleType::ChaosArc => {
                    let flicker = if self.rng.gen::<f32>() > 0.9 { 0.5 } else { 1.0 };
                    (base * 0.65 * flicker, 1.0)
                }
                ParticleType::RippleWave => (base * 0.7, 1.0),
                ParticleType::HarmonicRing => {
                    let flash = match p.state {
                        PatternState::Arc { harmonic_flash, .. } if harmonic_flash != 0.0 => harmonic_flash,
                        _ => 1.0,
                    };
                    (base * flash, flash)
                }
                _ => (base, 1.0),
            };
            draw_arcs(c, p, recipe, &brush, master, blur_scale);
            draw_sparks(c, p.pos, recipe, &brush, base, s);
            return;
        }

        match kind {
            ParticleType::WispParticle => draw_wisp(c, p, &brush, base, s),
            ParticleType::AetherMote => {
                c.set_blend(BlendMode::Additive);
                dot(c, p.pos, s * 2.0, brush.fixed(base * 0.5, 0.0, 10.0), 12.0, Some(brush.fixed(0.5, 0.0, 0.0)));
                dot(c, p.pos, s * 0.8, brush.fixed(base * 0.9, 0.15, 0.0), 6.0, None);
            }
            ParticleType::OrbitalEmber => {
                let flare = match p.state {
                    PatternState::OrbitalFire { flaring: true, .. } => 1.8,
                    _ => 1.0,
                };
                c.set_blend(BlendMode::Additive);
                let halo = brush.fixed(base * 0.4 * flare, -0.1, -10.0);
                dot(c, p.pos, s * 2.5 * flare, halo, 15.0 * flare, Some(brush.fixed(0.6, 0.0, -15.0)));
                dot(c, p.pos, s * 0.8, brush.fixed(base * 0.9, 0.2, 0.0), 8.0, None);
            }
            ParticleType::BloomPulse => draw_bloom(c, p, &brush),
            ParticleType::PrismSpark => draw_prism(c, p, &brush, base, s),
            ParticleType::DustMote => {
                c.set_blend(BlendMode::Additive);
                dot(c, p.pos, s, brush.fixed(base * 0.6, 0.1, 0.0), 8.0, Some(brush.fixed(0.4, 0.0, 0.0)));
            }
            ParticleType::SpiritLight => {
                let glint = match p.state {
                    PatternState::Spirit { glinting: true, .. } => 1.6,
                    _ => 1.0,
                };
                c.set_blend(BlendMode::Additive);
                let halo = brush.fixed(base * 0.3 * glint, -0.05, 10.0);
                dot(c, p.pos, s * 3.0 * glint, halo, 20.0 * glint, Some(brush.fixed(0.6, 0.0, 0.0)));
                dot(c, p.pos, s * 1.5, brush.fixed(base * 0.6, 0.05, 0.0), 12.0, None);
                dot(c, p.pos, s * 0.6, brush.fixed(base, 0.2, 0.0), 6.0, None);
            }
            ParticleType::LeafMote => {
                let rotation = match p.state {
                    PatternState::Leaf { rotation, .. } => rotation,
                    _ => 0.0,
                };
                c.set_blend(BlendMode::Additive);
                c.translate(p.pos);
                c.rotate(rotation);
                c.set_shadow_blur(8.0);
                c.set_shadow_color(brush.fixed(0.4, 0.0, 0.0));
                let leaf = Shape::Ellipse {
                    center: Vec2::ZERO,
                    radii: Vec2::new(s * 0.4, s * 1.2),
                    rotation: 0.0,
                };
                c.fill(&leaf, &Paint::Solid(brush.fixed(base * 0.5, 0.0, 0.0)));
            }
            _ => draw_basic(c, p, kind, &brush, params, base, s),
        }
    }
}

/// Fading dots along the recorded positions, oldest faintest.
fn draw_trail<C: Canvas2d + ?Sized>(c: &mut C, p: &Particle, params: &DrawParams) {
    let len = p.trail.len() as f32;
    for (i, pos) in p.trail.iter().enumerate() {
        let alpha = i as f32 / len * 0.2 * params.intensity;
        let color = params
            .colors
            .apply(params.accent, alpha, p.color_var.brightness, p.color_var.hue);
        c.fill(&Shape::circle(*pos, p.size * 0.2), &Paint::Solid(color));
    }
}

fn draw_arcs<C: Canvas2d + ?Sized>(
    c: &mut C,
    p: &Particle,
    recipe: &ArcRecipe,
    brush: &Brush,
    master: f32,
    blur_scale: f32,
) {
    // the spark still draws when the ring is missing
    if p.arc_segments.len() < 2 {
        return;
    }

    c.set_blend(BlendMode::Additive);
    c.set_line(1.0, recipe.cap, recipe.join);

    for layer in recipe.layers {
        let Some(points) = trace_points(layer.trace, p) else {
            continue;
        };
        c.set_line_width(layer.width);
        c.set_shadow_blur(layer.blur * blur_scale);
        match layer.shadow {
            Some(Shadow::Accent(t)) => c.set_shadow_color(brush.pick(recipe.shadow_varied, t, t.alpha)),
            Some(Shadow::White(a)) => c.set_shadow_color(Rgba::new(255, 255, 255, a)),
            None => {}
        }
        let color = brush.pick(recipe.varied, layer.color, master * layer.color.alpha);
        c.stroke(&Shape::closed(points), color);
    }

    c.set_blend(BlendMode::Alpha);
}

fn draw_sparks<C: Canvas2d + ?Sized>(c: &mut C, at: Vec2, recipe: &ArcRecipe, brush: &Brush, base: f32, s: f32) {
    for spark in recipe.sparks {
        c.set_shadow_blur(spark.blur);
        let color = brush.pick(recipe.varied, spark.color, base * spark.color.alpha);
        c.fill(&Shape::circle(at, s * spark.radius), &Paint::Solid(color));
    }
}

/// Filled circle with a blur and, optionally, a new shadow color.
fn dot<C: Canvas2d + ?Sized>(c: &mut C, at: Vec2, radius: f32, color: Rgba, blur: f32, shadow: Option<Rgba>) {
    c.set_shadow_blur(blur);
    if let Some(shadow) = shadow {
        c.set_shadow_color(shadow);
    }
    c.fill(&Shape::circle(at, radius), &Paint::Solid(color));
}

fn draw_wisp<C: Canvas2d + ?Sized>(c: &mut C, p: &Particle, brush: &Brush, base: f32, s: f32) {
    let mult = match p.state {
        PatternState::Wisp { size_mult, .. } if size_mult != 0.0 => size_mult,
        _ => 1.5,
    };
    c.set_blend(BlendMode::Additive);
    dot(c, p.pos, s * 3.0 * mult, brush.fixed(base * 0.4, -0.1, 10.0), 25.0, Some(brush.fixed(0.6, 0.0, 5.0)));
    dot(c, p.pos, s * 1.8 * mult, brush.fixed(base * 0.7, 0.05, 0.0), 18.0, Some(brush.fixed(0.7, 0.0, 0.0)));
    dot(c, p.pos, s * 0.8 * mult, brush.fixed(base, 0.2, 0.0), 8.0, None);
}

fn draw_bloom<C: Canvas2d + ?Sized>(c: &mut C, p: &Particle, brush: &Brush) {
    let PatternState::VoidPulse { radius, opacity, .. } = p.state else {
        return;
    };
    if radius <= 0.0 {
        return;
    }
    let alpha = if opacity > 0.0 { opacity } else { 0.3 };
    c.set_blend(BlendMode::Additive);
    c.set_line_width(3.0);
    c.set_shadow_blur(15.0);
    c.set_shadow_color(brush.fixed(0.4, 0.0, 0.0));
    c.stroke(&Shape::circle(p.pos, radius), brush.fixed(alpha, 0.0, 0.0));
}

fn draw_prism<C: Canvas2d + ?Sized>(c: &mut C, p: &Particle, brush: &Brush, base: f32, s: f32) {
    c.set_blend(BlendMode::Additive);

    if let PatternState::Prism { split: Some(split), .. } = p.state {
        let offset = split.progress * 4.0;
        let hue1 = if split.hue1 != 0.0 { split.hue1 } else { 15.0 };
        let hue2 = if split.hue2 != 0.0 { split.hue2 } else { -15.0 };
        let shard1 = p.pos + Vec2::new(offset, -offset * 0.5);
        let shard2 = p.pos + Vec2::new(-offset, offset * 0.5);
        dot(c, shard1, s * 0.8, brush.fixed(base * 0.8, 0.1, hue1), 10.0, None);
        c.fill(&Shape::circle(shard2, s * 0.6), &Paint::Solid(brush.fixed(base * 0.8, 0.1, hue2)));
    }

    dot(c, p.pos, s, brush.fixed(base, 0.2, 0.0), 12.0, Some(brush.fixed(0.6, 0.0, 0.0)));
}

/// Rays, stars, embers, snow, meteors and plain circles, drawn in local
/// coordinates around the particle.
fn draw_basic<C: Canvas2d + ?Sized>(
    c: &mut C,
    p: &Particle,
    kind: ParticleType,
    brush: &Brush,
    params: &DrawParams,
    base: f32,
    s: f32,
) {
    c.translate(p.pos);

    let glow = params.glow * params.intensity;
    if glow > 0.3 {
        c.set_shadow_blur(p.size * 2.0 * glow);
        c.set_shadow_color(params.accent.with_alpha(1.0));
    }

    match kind {
        ParticleType::ThinRay => {
            let len = s * 5.0 * p.ray_length();
            c.set_line_width((s * 0.2).max(0.5));
            let tip = Vec2::from_angle(p.angle) * len;
            c.stroke(&Shape::Segments(vec![[Vec2::ZERO, tip]]), brush.varied(base * 0.9, 0.0, 0.0));
        }
        ParticleType::TwinkleStar => {
            let twinkle = 0.5 + p.twinkle_phase.sin() * 0.5;
            let len = s * 0.6 * (0.7 + twinkle * 0.4);
            c.set_line_width((s * 0.25).max(0.5));
            let cross = Shape::Segments(vec![
                [Vec2::new(0.0, -len), Vec2::new(0.0, len)],
                [Vec2::new(-len, 0.0), Vec2::new(len, 0.0)],
            ]);
            c.stroke(&cross, brush.varied(base * twinkle, 0.0, 0.0));
            let core = brush.varied(base * twinkle * 0.7, 0.0, 0.0);
            c.fill(&Shape::circle(Vec2::ZERO, s * 0.25), &Paint::Solid(core));
        }
        ParticleType::EmberPop => {
            let heat = p.temperature_shift();
            let radius = s * 1.2;
            let paint = Paint::Radial {
                center: Vec2::ZERO,
                radius,
                stops: vec![
                    Stop::new(0.0, brush.varied(base * 1.3, 0.1, heat)),
                    Stop::new(0.3, brush.varied(base * 0.9, 0.0, heat)),
                    Stop::new(0.7, brush.varied(base * 0.4, -0.1, heat)),
                    Stop::new(1.0, Rgba::TRANSPARENT),
                ],
            };
            c.fill(&Shape::circle(Vec2::ZERO, radius), &paint);
            let core = brush.varied(base * 1.1, 0.15, heat);
            c.fill(&Shape::circle(Vec2::ZERO, s * 0.35), &Paint::Solid(core));
        }
        ParticleType::SnowVaried | ParticleType::SoftCircle => {
            let paint = Paint::Radial {
                center: Vec2::ZERO,
                radius: s,
                stops: vec![
                    Stop::new(0.0, brush.varied(base, 0.0, 0.0)),
                    Stop::new(1.0, brush.varied(0.0, 0.0, 0.0)),
                ],
            };
            c.fill(&Shape::circle(Vec2::ZERO, s), &paint);
        }
        ParticleType::MeteorThin => {
            let elongation = if params.meteor_phase == Some(MeteorPhase::Rain) { 7.0 } else { 2.0 };
            let fallback = if params.direction > 0.0 { PI * 0.35 } else { PI * 0.65 };
            let rotation = match p.state {
                PatternState::Meteor { streak_angle: Some(angle), .. } if angle != 0.0 => angle,
                _ => fallback,
            };
            let streak = Shape::Ellipse {
                center: Vec2::ZERO,
                radii: Vec2::new(s * elongation, s * 0.3),
                rotation,
            };
            c.fill(&streak, &Paint::Solid(brush.varied(base * 0.55, 0.0, 0.0)));
        }
        _ => {
            c.fill(&Shape::circle(Vec2::ZERO, s), &Paint::Solid(brush.varied(base, 0.0, 0.0)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::{arcs, test_support};
    use crate::particle::ArcPoint;
    use crate::preset::{ColorModifier, MotionPattern};
    use crate::registry;
    use crate::render::{Command, DisplayList};

    fn params() -> DrawParams {
        DrawParams {
            accent: Rgb::GOLD,
            colors: ColorTransform::new(ColorModifier::default(), false),
            intensity: 1.0,
            glow: 0.5,
            direction: 1.0,
            meteor_phase: None,
        }
    }

    fn preset(kind: ParticleType, pattern: MotionPattern) -> Preset {
        let mut preset = registry::default_preset().clone();
        preset.particle_type = kind;
        preset.motion_pattern = pattern;
        preset
    }

    fn ring(n: usize) -> Vec<ArcPoint> {
        (0..=n)
            .map(|i| {
                let angle = i as f32 / n as f32 * std::f32::consts::TAU;
                ArcPoint {
                    pos: Vec2::splat(150.0) + Vec2::from_angle(angle) * 120.0,
                    angle,
                }
            })
            .collect()
    }

    fn particle(pattern: MotionPattern) -> Particle {
        let mut rng = test_support::rng();
        test_support::particle(pattern, &mut rng)
    }

    #[test]
    fn test_invisible_particles_are_skipped() {
        let mut canvas = DisplayList::new(300, 300);
        let mut p = particle(MotionPattern::OrbitSteady);
        p.opacity = 0.05;
        let preset = preset(ParticleType::SoftCircle, MotionPattern::OrbitSteady);
        Renderer::seeded(1).draw_frame(&mut canvas, &[p], &preset, &params());
        assert_eq!(canvas.commands(), &[Command::Clear]);
    }

    #[test]
    fn test_state_never_leaks_between_particles() {
        let mut canvas = DisplayList::new(300, 300);
        let mut rng = test_support::rng();
        let preset = registry::preset_by_id("electric-04").unwrap();
        let mut pool = crate::pool::init_pool(preset, 300.0, 120.0, &mut rng);
        for p in &mut pool {
            p.arc_segments = ring(90);
        }
        Renderer::seeded(1).draw_frame(&mut canvas, &pool, preset, &params());
        assert_eq!(canvas.states().depth(), 0);
        assert_eq!(*canvas.state(), Default::default());
        assert!(canvas.strokes().all(|(_, _, s)| s.blend == BlendMode::Additive));
        assert!(canvas.fills().all(|(_, _, s)| s.blend == BlendMode::Alpha));
    }

    #[test]
    fn test_lightning_layers() {
        let mut canvas = DisplayList::new(300, 300);
        let mut p = particle(MotionPattern::ElectricVaried);
        p.arc_segments = ring(90);
        let preset = preset(ParticleType::LightningArc, MotionPattern::ElectricVaried);
        Renderer::seeded(1).draw_frame(&mut canvas, &[p], &preset, &params());

        let strokes: Vec<_> = canvas.strokes().collect();
        assert_eq!(strokes.len(), 3);
        let widths: Vec<f32> = strokes.iter().map(|(_, _, s)| s.line_width).collect();
        assert_eq!(widths, vec![2.0, 1.5, 1.2]);
        // ghost two keeps ghost one's shadow color
        assert_eq!(strokes[0].2.shadow_color, strokes[1].2.shadow_color);
        assert!(strokes.iter().all(|(_, _, s)| s.line_cap == LineCap::Round));
        // master opacity 0.7 * 0.35, core at 0.8
        assert!((strokes[2].1.a - 0.7 * 0.35 * 0.8).abs() < 1e-5);

        let Shape::Polyline { points, closed } = strokes[0].0 else {
            panic!("expected a polyline");
        };
        assert!(closed);
        assert_eq!(points.len(), 91);
        let radii: Vec<f32> = points.iter().map(|q| q.distance(Vec2::splat(150.0))).collect();
        // ghost points pushed outward away from the point ahead stay off the ring
        assert!(radii.iter().any(|r| (r - 120.0).abs() > 1.0));
        assert_eq!(canvas.fills().count(), 1);
    }

    #[test]
    fn test_empty_arc_draws_spark_only() {
        let mut canvas = DisplayList::new(300, 300);
        let p = particle(MotionPattern::ElectricVaried);
        let preset = preset(ParticleType::PlasmaArc, MotionPattern::ElectricVaried);
        Renderer::seeded(1).draw_frame(&mut canvas, &[p], &preset, &params());
        assert_eq!(canvas.strokes().count(), 0);
        assert_eq!(canvas.fills().count(), 2);
    }

    #[test]
    fn test_ribbon_strokes_without_sparks() {
        let mut canvas = DisplayList::new(300, 300);
        let mut p = particle(MotionPattern::RibbonFlow);
        p.arc_segments = ring(90);
        let preset = preset(ParticleType::PlasmaRibbon, MotionPattern::RibbonFlow);
        Renderer::seeded(1).draw_frame(&mut canvas, &[p], &preset, &params());

        let widths: Vec<f32> = canvas.strokes().map(|(_, _, s)| s.line_width).collect();
        assert_eq!(widths, vec![6.0, 2.0]);
        assert!(canvas.strokes().all(|(_, _, s)| s.line_cap == LineCap::Round));
        assert_eq!(canvas.fills().count(), 0);
    }

    #[test]
    fn test_echo_is_rotated_copy() {
        let mut p = particle(MotionPattern::PlasmaDirectional);
        p.arc_segments = ring(100);
        let echo = trace_points(Trace::Echo { phase: 0.08 }, &p).unwrap();
        assert_eq!(echo[0], p.arc_segments[8].pos);
        assert_eq!(echo.len(), p.arc_segments.len());
        assert!(arcs::radii(&p.arc_segments, Vec2::splat(150.0)).all(|r| (r - 120.0).abs() < 1e-3));
    }

    #[test]
    fn test_inner_core_only_when_enabled() {
        let mut p = particle(MotionPattern::PlasmaRefined);
        p.arc_segments = ring(120);
        assert!(trace_points(Trace::InnerCore, &p).is_none());
        if let PatternState::Arc { inner_core, .. } = &mut p.state {
            *inner_core = true;
        }
        assert!(trace_points(Trace::InnerCore, &p).is_some());

        let mut canvas = DisplayList::new(300, 300);
        let preset = preset(ParticleType::PlasmaV2, MotionPattern::PlasmaRefined);
        Renderer::seeded(1).draw_frame(&mut canvas, &[p], &preset, &params());
        let last = canvas.strokes().last().unwrap();
        assert_eq!(last.2.shadow_color, Rgba::new(255, 255, 255, 0.6));
    }

    #[test]
    fn test_secondary_skipped_when_missing() {
        let mut p = particle(MotionPattern::DragonFlow);
        p.arc_segments = ring(100);
        let mut canvas = DisplayList::new(300, 300);
        let preset = preset(ParticleType::DragonArc, MotionPattern::DragonFlow);
        Renderer::seeded(1).draw_frame(&mut canvas, &[p.clone()], &preset, &params());
        assert_eq!(canvas.strokes().count(), 1);

        p.secondary_arc = ring(100);
        let mut canvas = DisplayList::new(300, 300);
        Renderer::seeded(1).draw_frame(&mut canvas, &[p], &preset, &params());
        assert_eq!(canvas.strokes().count(), 2);
    }

    #[test]
    fn test_bloom_strokes_pulse_ring() {
        let mut p = particle(MotionPattern::VoidPulse);
        p.pos = Vec2::splat(150.0);
        p.opacity = 0.4;
        let mut canvas = DisplayList::new(300, 300);
        let preset = preset(ParticleType::BloomPulse, MotionPattern::VoidPulse);
        Renderer::seeded(1).draw_frame(&mut canvas, &[p], &preset, &params());
        let (shape, color, state) = canvas.strokes().next().unwrap();
        assert_eq!(*shape, Shape::circle(Vec2::splat(150.0), 120.0));
        assert!((color.a - 0.4).abs() < 1e-6);
        assert_eq!(state.line_width, 3.0);
        assert_eq!(state.shadow_blur, 15.0);
    }

    #[test]
    fn test_ray_points_along_angle() {
        let mut p = particle(MotionPattern::HyperspaceRays);
        p.angle = 0.0;
        let mut canvas = DisplayList::new(300, 300);
        let preset = preset(ParticleType::ThinRay, MotionPattern::HyperspaceRays);
        Renderer::seeded(1).draw_frame(&mut canvas, &[p.clone()], &preset, &params());
        let (shape, _, state) = canvas.strokes().next().unwrap();
        let Shape::Segments(segments) = shape else {
            panic!("expected segments");
        };
        let s = p.size * 1.2;
        assert!((segments[0][1].x - s * 5.0).abs() < 1e-4);
        assert_eq!(segments[0][1].y, 0.0);
        assert_eq!(state.transform.translation, p.pos);
    }

    #[test]
    fn test_glow_threshold() {
        let p = particle(MotionPattern::OrbitSteady);
        let preset = preset(ParticleType::Dust, MotionPattern::OrbitSteady);

        let mut dim = DisplayList::new(300, 300);
        Renderer::seeded(1).draw_frame(&mut dim, &[p.clone()], &preset, &DrawParams { glow: 0.3, ..params() });
        assert_eq!(dim.fills().next().unwrap().2.shadow_blur, 0.0);

        let mut bright = DisplayList::new(300, 300);
        Renderer::seeded(1).draw_frame(&mut bright, &[p.clone()], &preset, &DrawParams { glow: 0.8, ..params() });
        let state = bright.fills().next().unwrap().2;
        assert!((state.shadow_blur - p.size * 1.6).abs() < 1e-5);
        assert_eq!(state.shadow_color, Rgb::GOLD.with_alpha(1.0));
    }

    #[test]
    fn test_meteor_streak_elongates_in_rain() {
        let p = particle(MotionPattern::MeteorCycle);
        let preset = preset(ParticleType::MeteorThin, MotionPattern::MeteorCycle);
        let radii = |phase| {
            let mut canvas = DisplayList::new(300, 300);
            let params = DrawParams { meteor_phase: phase, direction: -1.0, ..params() };
            Renderer::seeded(1).draw_frame(&mut canvas, &[p.clone()], &preset, &params);
            let streak = match canvas.fills().next().unwrap().0 {
                Shape::Ellipse { radii, rotation, .. } => (*radii, *rotation),
                other => panic!("unexpected {:?}", other),
            };
            streak
        };
        let (rain, rotation) = radii(Some(MeteorPhase::Rain));
        let (cloud, _) = radii(Some(MeteorPhase::Cloud));
        assert!((rain.x / cloud.x - 3.5).abs() < 1e-4);
        assert!((rotation - PI * 0.65).abs() < 1e-6);
    }

    #[test]
    fn test_trail_dots_fade_in() {
        let mut p = particle(MotionPattern::OrbitSteady);
        p.trail.extend([Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0)]);
        let preset = registry::default_preset();
        let mut canvas = DisplayList::new(300, 300);
        Renderer::seeded(1).draw_frame(&mut canvas, &[p.clone()], preset, &params());
        let fills: Vec<_> = canvas.fills().collect();
        // two trail dots then the particle
        assert_eq!(fills.len(), 3);
        assert_eq!(*fills[0].0, Shape::circle(Vec2::new(1.0, 1.0), p.size * 0.2));
        // first dot has zero alpha, floored by the color transform
        assert_eq!(fills[0].1.max_alpha(), 0.1);
        assert!((fills[1].1.max_alpha() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_leaf_is_rotated() {
        let mut p = particle(MotionPattern::ForestDrift);
        if let PatternState::Leaf { rotation, .. } = &mut p.state {
            *rotation = 1.0;
        }
        let preset = preset(ParticleType::LeafMote, MotionPattern::ForestDrift);
        let mut canvas = DisplayList::new(300, 300);
        Renderer::seeded(1).draw_frame(&mut canvas, &[p.clone()], &preset, &params());
        let (_, _, state) = canvas.fills().next().unwrap();
        let expected = glam::Affine2::from_translation(p.pos) * glam::Affine2::from_angle(1.0);
        assert!(state.transform.abs_diff_eq(expected, 1e-5));
        assert_eq!(state.blend, BlendMode::Additive);
    }

    #[test]
    fn test_every_type_renders_to_raster() {
        let mut rng = test_support::rng();
        let mut canvas = crate::render::RasterCanvas::new(120, 120);
        let mut renderer = Renderer::seeded(3);
        for kind in ParticleType::ALL {
            let preset = preset(*kind, MotionPattern::OrbitSteady);
            let mut p = test_support::particle(MotionPattern::OrbitSteady, &mut rng);
            p.pos = Vec2::splat(60.0);
            p.arc_segments = ring(60).into_iter().map(|a| ArcPoint { pos: a.pos * 0.4, ..a }).collect();
            renderer.draw_frame(&mut canvas, &[p], &preset, &params());
            assert_eq!(canvas.states().depth(), 0);
        }
    }
}
