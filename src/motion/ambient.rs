//! Ambient fields.
//!
//! Gentle patterns anchored to a base position or a fixed path: stars that
//! breathe in and out of the canvas center, wisps and motes drifting along
//! the ring, rays streaming outward, and whole-ring pulses.

use super::FrameContext;
use crate::particle::{Burst, Particle, PatternState};
use crate::preset::{BreathParams, BreathPhase};
use glam::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;
use std::f32::consts::{PI, TAU};

/// Rays streaming out from the center, pulled back in on inhale and flung
/// outward on exhale.
pub fn hyperspace_rays(p: &mut Particle, ctx: &FrameContext<'_>, rng: &mut SmallRng) {
    let ray_speed = BreathParams::knob(ctx.params.ray_speed, 0.5);
    let ray_length = BreathParams::knob(ctx.params.ray_length, 1.0);
    let inhale = ctx.is_phase(BreathPhase::Inhale);
    let exhale = ctx.is_phase(BreathPhase::Exhale);
    let ring = ctx.ring_radius;

    let PatternState::Rays { layer, shimmer_phase, ray_length: length } = &mut p.state else {
        return;
    };
    let bright = layer.bright_mult();

    // roughly ±1° of angular shimmer
    *shimmer_phase += rng.gen::<f32>() * 0.1;
    let shimmer = shimmer_phase.sin() * 0.017;

    let breath_mod = if inhale {
        1.08
    } else if exhale {
        0.92
    } else {
        1.0
    };

    if inhale {
        p.distance = (p.distance - ctx.dt * ray_speed * 30.0).max(ring * 0.1);
        p.opacity = 0.7 * bright;
    } else if exhale {
        p.distance += ctx.dt * ray_speed * 120.0;
        p.opacity = (1.0 - p.distance / (ring * 1.8)).max(0.0) * bright;
    } else {
        p.distance += ctx.dt * ray_speed * 20.0;
    }

    if p.distance > ring * 1.8 {
        p.distance = ring * 0.15;
        p.opacity = 0.85 * bright;
        p.angle = rng.gen::<f32>() * TAU;
    }

    *length = ray_length * layer.length_mult() * breath_mod;
    p.pos = ctx.polar(p.angle + shimmer, p.distance);
}

fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Stars breathing around their spawn point, with rare radiating bursts.
pub fn starfield_smooth(p: &mut Particle, ctx: &FrameContext<'_>, rng: &mut SmallRng) {
    let target = BreathParams::knob(ctx.params.scale, 1.0);
    let speed_mult = match ctx.phase {
        Some(phase) if phase.is_split_hold() => 0.1,
        Some(BreathPhase::Inhale) => 1.5,
        _ => 0.8,
    };
    let offset = p.base - ctx.center;

    let PatternState::Starfield { current_scale, burst_timer, burst, life_phase, drift_phase } = &mut p.state else {
        return;
    };
    *current_scale += (target - *current_scale) * ctx.dt * 2.0;

    *burst_timer -= ctx.dt;
    if *burst_timer <= 0.0 && burst.is_none() {
        if rng.gen::<f32>() < 0.15 {
            *burst = Some(Burst {
                progress: 0.0,
                duration: 0.4 + rng.gen::<f32>() * 0.2,
            });
        }
        *burst_timer = 4.0 + rng.gen::<f32>() * 4.0;
    }

    if let Some(b) = burst {
        b.progress += ctx.dt / b.duration;
        let eased = 1.0 - (1.0 - b.progress.min(1.0)).powi(3);
        p.pos = ctx.center + offset * *current_scale * (1.0 + eased * 0.5);
        p.opacity = 1.0 - eased;
        if b.progress >= 1.0 {
            *burst = None;
            p.opacity = 0.3;
        }
    } else {
        p.pos = ctx.center + offset * *current_scale;
        *life_phase += ctx.dt * 0.5 * speed_mult;
        let t = (life_phase.sin() + 1.0) / 2.0;
        p.opacity = 0.2 + ease_in_out_cubic(t) * 0.6;
    }

    *drift_phase += ctx.dt * 0.8;
    let drift = drift_phase.sin() * 2.0;
    p.pos += Vec2::new(drift, drift * 0.5) * ctx.dt;

    p.twinkle_phase += ctx.dt * 5.0 * speed_mult;
    if ctx.params.twinkle && burst.is_none() {
        p.opacity = p.opacity.min(0.5 + p.twinkle_phase.sin().abs() * 0.5);
    }
}

/// Wisps circling just off the ring with a vertical bob.
pub fn wisp_drift(p: &mut Particle, ctx: &FrameContext<'_>, rng: &mut SmallRng) {
    let wisp_speed = BreathParams::knob(ctx.params.wisp_speed, 0.5);
    p.angle += ctx.dt * wisp_speed * p.rotation_dir;
    p.arc_segments.clear();

    let PatternState::Wisp { wisp_phase, life_phase, size_mult } = &mut p.state else {
        return;
    };
    *wisp_phase += ctx.dt * 2.0;
    let bob = wisp_phase.sin() * 8.0;

    let radius = ctx.ring_radius + (rng.gen::<f32>() - 0.5) * 10.0;
    p.pos = ctx.polar(p.angle, radius) + Vec2::new(0.0, bob);

    *life_phase += ctx.dt * 0.2;
    p.opacity = 0.55 + (*life_phase * PI).sin() * 0.35;
    *size_mult = 1.5 + (*life_phase * PI * 0.5).sin() * 0.5;
}

/// A river of motes flowing around the ring path.
pub fn aether_flow(p: &mut Particle, ctx: &FrameContext<'_>, _rng: &mut SmallRng) {
    let flow = BreathParams::knob(ctx.params.flow_speed, 0.8);
    let PatternState::Aether { progress } = &mut p.state else {
        return;
    };
    *progress += ctx.dt * flow * 0.3;
    if *progress > 1.0 {
        *progress -= 1.0;
    }

    let angle = *progress * TAU;
    let wobble = (*progress * 8.0 + ctx.now * 2.0).sin() * 2.0;
    p.pos = ctx.polar(angle, ctx.ring_radius + wobble);
    p.opacity = 0.5 + angle.sin() * 0.3;
}

/// Staggered radial pulses expanding from the ring.
///
/// The particle sits at the center; the renderer strokes a circle at the
/// pulse radius.
pub fn void_pulse(p: &mut Particle, ctx: &FrameContext<'_>, rng: &mut SmallRng) {
    let rate = BreathParams::knob(ctx.params.pulse_rate, 0.5);
    let amp = BreathParams::knob(ctx.params.pulse_amp, 30.0);
    let PatternState::VoidPulse { radius, opacity, delay } = &mut p.state else {
        return;
    };

    *delay -= ctx.dt;
    if *delay <= 0.0 {
        *radius += ctx.dt * amp * rate;
        *opacity *= 0.97;
        if *opacity < 0.02 {
            *radius = ctx.ring_radius;
            *opacity = 0.4;
            *delay = 1.5 + rng.gen::<f32>();
        }
    }

    let opacity = *opacity;
    p.pos = ctx.center;
    p.opacity = opacity;
}

/// Lissajous sway around the spawn point.
pub fn drift(p: &mut Particle, ctx: &FrameContext<'_>, _rng: &mut SmallRng) {
    let dx = (p.phase + ctx.now * 0.8).sin() * 15.0;
    let dy = (p.phase * 1.3 + ctx.now * 0.6).cos() * 12.0;
    p.pos = p.base + Vec2::new(dx, dy);
}
