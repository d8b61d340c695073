//! Ring-locked arc patterns.
//!
//! Every frame these regenerate a closed polyline around the ring whose
//! radius is perturbed by a few stacked sine harmonics plus per-frame
//! jitter. Most shift the harmonics by a time term so the noise visibly
//! flows around the ring. The particle's own position is a spark that rides
//! the ring independently of the polyline, or sits at the center for the
//! whole-ring effects.

use super::FrameContext;
use crate::particle::{ArcPoint, Particle, PatternState};
use crate::preset::BreathParams;
use glam::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;
use std::f32::consts::TAU;

/// Fill `out` with `segments + 1` points around the ring. The first and last
/// points coincide so the polyline closes.
fn trace_ring(
    out: &mut Vec<ArcPoint>,
    ctx: &FrameContext<'_>,
    segments: usize,
    angle_offset: f32,
    mut radius_at: impl FnMut(f32) -> f32,
) {
    out.clear();
    out.reserve(segments + 1);
    for i in 0..=segments {
        let angle = i as f32 / segments as f32 * TAU + angle_offset;
        let pos = ctx.polar(angle, radius_at(angle));
        out.push(ArcPoint { pos, angle });
    }
}

/// Move the drift spark along the ring at `rate` rad/s in the particle's
/// rotation direction.
fn ride_ring(p: &mut Particle, ctx: &FrameContext<'_>, rate: f32) {
    p.angle += ctx.dt * rate * p.rotation_dir;
    p.pos = ctx.polar(p.angle, ctx.ring_radius);
}

/// Advance the arc clock by `rate * dt` and return the new time.
fn tick(p: &mut Particle, rate: f32, dt: f32) -> f32 {
    match &mut p.state {
        PatternState::Arc { time, .. } => {
            *time += dt * rate;
            *time
        }
        _ => 0.0,
    }
}

fn jitter(rng: &mut SmallRng, amplitude: f32) -> f32 {
    (rng.gen::<f32>() - 0.5) * amplitude
}

fn intensity(params: &BreathParams) -> f32 {
    params.intensity.unwrap_or(0.0)
}

/// Subtle shimmering conduit: three static-angle harmonics.
pub fn electric_varied(p: &mut Particle, ctx: &FrameContext<'_>, rng: &mut SmallRng) {
    let time = tick(p, 0.8, ctx.dt);
    let amp = 3.0 + intensity(ctx.params) * 2.0;

    trace_ring(&mut p.arc_segments, ctx, 90, 0.0, |a| {
        let noise = (a * 3.0 + time * 2.0).sin() * 0.4
            + (a * 7.0 + time * 1.3).sin() * 0.25
            + (a * 13.0 + time * 0.7).sin() * 0.15;
        ctx.ring_radius + noise * amp + jitter(rng, 1.5)
    });

    ride_ring(p, ctx, 0.3);
    p.opacity = 0.35;
}

/// Plasma whose noise slides around the ring.
pub fn plasma_directional(p: &mut Particle, ctx: &FrameContext<'_>, rng: &mut SmallRng) {
    let flow = BreathParams::knob(ctx.params.flow_speed, 1.0);
    let time = tick(p, flow, ctx.dt);
    let amp = 4.0 + intensity(ctx.params) * 3.0;

    trace_ring(&mut p.arc_segments, ctx, 120, 0.0, |a| {
        let pa = a - time * 0.5;
        let noise = (pa * 4.0).sin() * 0.5 + (pa * 9.0 + 0.3).sin() * 0.3 + (pa * 17.0 + 0.7).sin() * 0.15;
        ctx.ring_radius + noise * amp + jitter(rng, 2.5)
    });

    ride_ring(p, ctx, 0.8);
    p.opacity = 0.55;
}

/// Directional plasma with breathing amplitude and a bright inner core.
pub fn plasma_refined(p: &mut Particle, ctx: &FrameContext<'_>, rng: &mut SmallRng) {
    let flow = BreathParams::knob(ctx.params.flow_speed, 1.0);
    let time = tick(p, flow, ctx.dt);
    let amp_mod = match &mut p.state {
        PatternState::Arc { amp_var, inner_core, .. } => {
            *amp_var += ctx.dt * 0.3;
            *inner_core = true;
            1.0 + amp_var.sin() * 0.3
        }
        _ => 1.0,
    };
    let amp = (4.0 + intensity(ctx.params) * 3.0) * amp_mod;
    let jitter_amp = 2.0 * amp_mod;

    trace_ring(&mut p.arc_segments, ctx, 120, 0.0, |a| {
        let pa = a - time * 0.6;
        let noise = (pa * 4.0).sin() * 0.5 + (pa * 11.0 + 0.3).sin() * 0.3 + (pa * 19.0 + 0.7).sin() * 0.15;
        ctx.ring_radius + noise * amp + jitter(rng, jitter_amp)
    });

    ride_ring(p, ctx, 0.9);
    p.opacity = 0.6;
}

/// Silk ribbon: a single low harmonic, no jitter.
pub fn ribbon_flow(p: &mut Particle, ctx: &FrameContext<'_>, _rng: &mut SmallRng) {
    let flow = BreathParams::knob(ctx.params.flow_speed, 0.8);
    let time = tick(p, flow, ctx.dt);
    let amp = 2.0 + intensity(ctx.params) * 1.5;

    trace_ring(&mut p.arc_segments, ctx, 180, 0.0, |a| {
        ctx.ring_radius + ((a - time * 0.3) * 2.0).sin() * amp
    });

    ride_ring(p, ctx, 0.2);
    p.opacity = 0.45;
}

/// Stepped digital offsets with rare spikes and a pulsing spark.
pub fn circuit_pulse(p: &mut Particle, ctx: &FrameContext<'_>, rng: &mut SmallRng) {
    let rate = BreathParams::knob(ctx.params.pulse_rate, 1.0);
    let time = tick(p, rate, ctx.dt);
    let step_amp = 3.0 + intensity(ctx.params) * 2.0;

    trace_ring(&mut p.arc_segments, ctx, 90, 0.0, |a| {
        let step = (a * 8.0 + time * 3.0).floor().rem_euclid(4.0) as i32;
        let digital = match step {
            0 => step_amp,
            2 => -step_amp,
            _ => 0.0,
        };
        let spike = if rng.gen::<f32>() > 0.95 { jitter(rng, 8.0) } else { 0.0 };
        ctx.ring_radius + digital + spike
    });

    let pulse = match &mut p.state {
        PatternState::Arc { pulse_phase, .. } => {
            *pulse_phase += ctx.dt * rate * 2.0;
            *pulse_phase
        }
        _ => 0.0,
    };
    p.opacity = 0.5 + pulse.sin() * 0.2;
    ride_ring(p, ctx, 1.0);
}

/// Turbulent heat shimmer: nested harmonics plus random roughness.
pub fn flare_turbulence(p: &mut Particle, ctx: &FrameContext<'_>, rng: &mut SmallRng) {
    let turbulence = BreathParams::knob(ctx.params.turbulence, 1.0);
    let time = tick(p, turbulence * 0.8, ctx.dt);
    let amp = 5.0 + intensity(ctx.params) * 4.0;

    trace_ring(&mut p.arc_segments, ctx, 100, 0.0, |a| {
        let pa = a + time;
        let t1 = (pa * 5.0 + (pa * 3.0).sin()).sin() * 0.5;
        let t2 = (pa * 11.0 + (pa * 7.0).cos()).sin() * 0.3;
        let t3 = jitter(rng, 0.4 * turbulence);
        ctx.ring_radius + (t1 + t2 + t3) * amp
    });

    ride_ring(p, ctx, 0.4);
    p.opacity = 0.65;
}

/// High-amplitude lightning with random spikes.
pub fn chaos_electric(p: &mut Particle, ctx: &FrameContext<'_>, rng: &mut SmallRng) {
    let chaos = BreathParams::knob(ctx.params.chaos_level, 1.0);
    let time = tick(p, chaos, ctx.dt);
    let amp = 8.0 + intensity(ctx.params) * 6.0;

    trace_ring(&mut p.arc_segments, ctx, 80, 0.0, |a| {
        let pa = a - time * 0.8;
        let c1 = (pa * 6.0).sin() * 0.6;
        let c2 = (pa * 13.0 + time).sin() * 0.4;
        let c3 = jitter(rng, chaos * 0.8);
        let spike = if rng.gen::<f32>() > 0.92 { jitter(rng, 15.0 * chaos) } else { 0.0 };
        ctx.ring_radius + (c1 + c2 + c3) * amp + spike
    });

    ride_ring(p, ctx, 1.2);
    p.opacity = 0.7;
}

/// Clean sine ripples with a second harmonic.
pub fn quantum_wave(p: &mut Particle, ctx: &FrameContext<'_>, _rng: &mut SmallRng) {
    let freq = BreathParams::knob(ctx.params.wave_freq, 4.0);
    let amp = BreathParams::knob(ctx.params.wave_amp, 8.0);
    let time = tick(p, 1.2, ctx.dt);

    trace_ring(&mut p.arc_segments, ctx, 120, 0.0, |a| {
        ctx.ring_radius + (a * freq + time * 2.5).sin() * amp + (a * freq * 2.0 + time * 1.5).sin() * amp * 0.3
    });

    ride_ring(p, ctx, 0.6);
    p.opacity = 0.7;
}

/// Two warped rings: the main distortion and a slower inner ripple.
pub fn singularity_warp(p: &mut Particle, ctx: &FrameContext<'_>, _rng: &mut SmallRng) {
    let amp = BreathParams::knob(ctx.params.distort_amp, 8.0);
    let scale = BreathParams::knob(ctx.params.noise_scale, 3.0);
    let time = tick(p, 0.8, ctx.dt);

    trace_ring(&mut p.arc_segments, ctx, 100, 0.0, |a| {
        ctx.ring_radius + (a * scale + time).sin() * amp
    });
    trace_ring(&mut p.secondary_arc, ctx, 100, 0.0, |a| {
        ctx.ring_radius - 4.0 + (a * 3.0 + time * 0.5).sin() * amp * 0.5
    });

    p.opacity = 0.5;
    p.pos = ctx.center;
}

/// Mandala layers: each particle draws one harmonic ring and flashes when
/// its phase peaks.
pub fn celestial_oscillate(p: &mut Particle, ctx: &FrameContext<'_>, _rng: &mut SmallRng) {
    let amp = BreathParams::knob(ctx.params.amplitude, 6.0);
    let layer = p.id % 4;
    let freq = match &ctx.params.frequencies {
        Some(freqs) => BreathParams::knob(freqs.get(layer).copied(), 3.0),
        None => [3.0, 5.0, 7.0, 9.0][layer],
    };
    let time = tick(p, 0.8, ctx.dt);
    let layer_amp = amp * (1.0 + layer as f32 * 0.3);

    trace_ring(&mut p.arc_segments, ctx, 100, 0.0, |a| {
        ctx.ring_radius + (a * freq + time).sin() * layer_amp
    });

    let flash = if (time * freq).sin().abs() > 0.98 { 1.5 } else { 1.0 };
    if let PatternState::Arc { harmonic_flash, .. } = &mut p.state {
        *harmonic_flash = flash;
    }
    p.opacity = 0.35 * flash;
    p.pos = ctx.center;
}

/// Serpentine vein plus a slightly rotated companion.
pub fn dragon_flow(p: &mut Particle, ctx: &FrameContext<'_>, rng: &mut SmallRng) {
    let amp = BreathParams::knob(ctx.params.amplitude, 10.0);
    let jitter_amp = BreathParams::knob(ctx.params.jitter, 0.3);
    let time = tick(p, 0.4, ctx.dt);

    trace_ring(&mut p.arc_segments, ctx, 100, 0.0, |a| {
        ctx.ring_radius + ((a - time * 0.3) * 1.2).sin() * amp + jitter(rng, jitter_amp * 2.0)
    });
    trace_ring(&mut p.secondary_arc, ctx, 100, 0.07, |a| {
        ctx.ring_radius + ((a - time * 0.3 + 0.2) * 1.2).sin() * amp
    });

    p.opacity = 0.85;
    p.pos = ctx.center;
}

/// Distance from the center of each point, for tests and diagnostics.
pub fn radii(points: &[ArcPoint], center: Vec2) -> impl Iterator<Item = f32> + '_ {
    points.iter().map(move |pt| pt.pos.distance(center))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::preset::MotionPattern;

    fn run(pattern: MotionPattern, params: &BreathParams, frames: usize) -> Particle {
        let mut rng = rng();
        let mut p = particle(pattern, &mut rng);
        let ctx = frame(params);
        for _ in 0..frames {
            super::super::update(pattern, &mut p, &ctx, &mut rng);
        }
        p
    }

    #[test]
    fn test_segment_counts() {
        let params = BreathParams { intensity: Some(0.7), ..BreathParams::new(0.5, 0.6) };
        let cases = [
            (MotionPattern::ElectricVaried, 91),
            (MotionPattern::PlasmaDirectional, 121),
            (MotionPattern::RibbonFlow, 181),
            (MotionPattern::ChaosElectric, 81),
            (MotionPattern::SingularityWarp, 101),
        ];
        for (pattern, expected) in cases {
            assert_eq!(run(pattern, &params, 1).arc_segments.len(), expected, "{}", pattern);
        }
    }

    #[test]
    fn test_electric_stays_near_ring() {
        let params = BreathParams { intensity: Some(0.8), ..BreathParams::new(0.5, 0.6) };
        let p = run(MotionPattern::ElectricVaried, &params, 30);
        let center = Vec2::splat(150.0);
        // 3 + 0.8*2 = 4.6 amplitude times at most 0.8 harmonic weight, plus 0.75 jitter
        assert!(radii(&p.arc_segments, center).all(|r| (r - 120.0).abs() <= 4.6 * 0.8 + 0.75 + 1e-3));
        assert_eq!(p.opacity, 0.35);
        assert!((p.pos.distance(center) - 120.0).abs() < 1e-3);
    }

    #[test]
    fn test_ribbon_is_smooth_and_closed() {
        let params = BreathParams { intensity: Some(0.6), ..BreathParams::new(0.3, 0.6) };
        let p = run(MotionPattern::RibbonFlow, &params, 10);
        let first = p.arc_segments.first().unwrap().pos;
        let last = p.arc_segments.last().unwrap().pos;
        assert!(first.distance(last) < 1e-2);
    }

    #[test]
    fn test_whole_ring_effects_pin_spark_to_center() {
        let params = BreathParams::new(0.4, 0.5);
        for pattern in [
            MotionPattern::SingularityWarp,
            MotionPattern::CelestialOscillate,
            MotionPattern::DragonFlow,
        ] {
            let p = run(pattern, &params, 5);
            assert_eq!(p.pos, Vec2::splat(150.0), "{}", pattern);
            assert_eq!(p.secondary_arc.is_empty(), pattern == MotionPattern::CelestialOscillate);
        }
    }

    #[test]
    fn test_celestial_zero_frequency_uses_default() {
        let params = BreathParams {
            amplitude: Some(1.0),
            frequencies: Some(vec![0.0; 4]),
            ..BreathParams::new(0.1, 0.6)
        };
        let p = run(MotionPattern::CelestialOscillate, &params, 3);
        assert!(p.arc_segments.iter().all(|s| s.pos.is_finite()));
        assert!((0.35..=0.53).contains(&p.opacity));
    }

    #[test]
    fn test_circuit_opacity_pulses_in_band() {
        let params = BreathParams { pulse_rate: Some(2.0), ..BreathParams::new(0.5, 0.8) };
        let mut rng = rng();
        let mut p = particle(MotionPattern::CircuitPulse, &mut rng);
        let ctx = frame(&params);
        for _ in 0..100 {
            super::super::update(MotionPattern::CircuitPulse, &mut p, &ctx, &mut rng);
            assert!((0.3..=0.7).contains(&p.opacity));
        }
    }
}
