//! Orbiting particles.
//!
//! Particles circle the center at a breath-scaled angular speed, with a
//! small radial wobble or jitter on top. `orbital_fire`, `spirit_orbit` and
//! `prismatic_split` add short-lived highlight states (flares, glints,
//! splits) that the draw routines read back from [`PatternState`].

use super::FrameContext;
use crate::particle::{Particle, PatternState, Split};
use crate::preset::BreathParams;
use rand::rngs::SmallRng;
use rand::Rng;
use std::f32::consts::PI;

fn base_speed(p: &Particle, ctx: &FrameContext<'_>) -> f32 {
    ctx.params.speed * p.speed
}

/// Fallback orbit at the particle's own distance.
pub fn plain_orbit(p: &mut Particle, ctx: &FrameContext<'_>, _rng: &mut SmallRng) {
    p.angle += ctx.dt * base_speed(p, ctx) * 0.3;
    p.pos = ctx.polar(p.angle, p.distance);
}

/// Slow orbit with a ±5px radial wobble.
pub fn orbit_steady(p: &mut Particle, ctx: &FrameContext<'_>, _rng: &mut SmallRng) {
    p.angle += ctx.dt * base_speed(p, ctx) * 0.3;
    let wobble = (p.phase + ctx.now * 2.0).sin() * 5.0;
    p.pos = ctx.polar(p.angle, p.distance + wobble);
}

/// Expand outward while the phase disperses, otherwise contract slowly.
pub fn burst(p: &mut Particle, ctx: &FrameContext<'_>, _rng: &mut SmallRng) {
    let speed = base_speed(p, ctx);
    if ctx.params.disperse {
        p.distance += ctx.dt * speed * 50.0;
        if p.distance > ctx.size * 0.5 {
            p.distance = ctx.size * 0.1;
        }
    } else {
        p.distance *= 0.99;
    }
    p.angle += ctx.dt * speed * 0.3;
    p.pos = ctx.polar(p.angle, p.distance);
}

/// Embers riding the ring with occasional flares.
pub fn orbital_fire(p: &mut Particle, ctx: &FrameContext<'_>, rng: &mut SmallRng) {
    let orbit_speed = BreathParams::knob(ctx.params.orbit_speed, 0.8);
    let PatternState::OrbitalFire { orbit_angle, flare_timer, flaring } = &mut p.state else {
        return;
    };

    *orbit_angle += ctx.dt * orbit_speed * p.rotation_dir;
    let noise = (*orbit_angle * 3.0 + ctx.now * 3.0).sin() * 3.0;
    let pos = ctx.polar(*orbit_angle, ctx.ring_radius + noise);

    *flare_timer -= ctx.dt;
    if *flare_timer <= 0.0 {
        *flaring = true;
        *flare_timer = 2.0 + rng.gen::<f32>() * 3.0;
    } else if *flare_timer > 0.2 {
        *flaring = false;
    }
    let opacity = if *flaring { 1.0 } else { 0.7 };

    p.pos = pos;
    p.opacity = opacity;
}

/// Two lights chasing each other around the ring at different speeds.
pub fn spirit_orbit(p: &mut Particle, ctx: &FrameContext<'_>, _rng: &mut SmallRng) {
    let speed1 = BreathParams::knob(ctx.params.speed1, 1.2);
    let speed2 = BreathParams::knob(ctx.params.speed2, 1.5);
    let own_speed = if p.id == 0 { speed1 } else { speed2 };
    let PatternState::Spirit { angle, glinting } = &mut p.state else {
        return;
    };

    *angle += ctx.dt * own_speed;
    let other = if p.id == 0 { *angle + PI } else { *angle - PI };
    *glinting = (*angle - other * (speed2 / speed1)).sin().abs() < 0.15;

    let pos = ctx.polar(*angle, ctx.ring_radius);
    let opacity = if *glinting { 1.0 } else { 0.75 };
    p.pos = pos;
    p.opacity = opacity;
}

/// Ring sparkles that occasionally split into two hue-shifted copies.
pub fn prismatic_split(p: &mut Particle, ctx: &FrameContext<'_>, rng: &mut SmallRng) {
    let split_chance = BreathParams::knob(ctx.params.split_chance, 0.3);
    let hue_shift = BreathParams::knob(ctx.params.hue_shift, 12.0);

    p.angle += ctx.dt * base_speed(p, ctx) * 0.5 * p.rotation_dir;
    let radius = ctx.ring_radius + (rng.gen::<f32>() - 0.5) * 8.0;
    p.pos = ctx.polar(p.angle, radius);
    p.opacity = 0.7 + (p.angle * 4.0).sin() * 0.2;

    let PatternState::Prism { split_timer, split } = &mut p.state else {
        return;
    };
    *split_timer -= ctx.dt;
    if *split_timer <= 0.0 && split.is_none() {
        if rng.gen::<f32>() < split_chance {
            *split = Some(Split {
                progress: 0.0,
                hue1: hue_shift,
                hue2: -hue_shift,
            });
        }
        *split_timer = 1.0 + rng.gen::<f32>() * 2.0;
    }

    if let Some(s) = split {
        s.progress += ctx.dt * 3.0;
        if s.progress >= 1.0 {
            *split = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::preset::MotionPattern;
    use glam::Vec2;

    #[test]
    fn test_orbit_steady_keeps_radius_band() {
        let params = BreathParams::new(0.25, 0.45);
        let mut rng = rng();
        let mut p = particle(MotionPattern::OrbitSteady, &mut rng);
        let mut ctx = frame(&params);
        for i in 0..300 {
            ctx.now = i as f32 * 0.016;
            orbit_steady(&mut p, &ctx, &mut rng);
            let r = p.pos.distance(Vec2::splat(150.0));
            assert!((95.0 - 1e-3..=105.0 + 1e-3).contains(&r));
        }
        assert!(p.angle > 0.0);
    }

    #[test]
    fn test_burst_disperse_wraps() {
        let params = BreathParams {
            disperse: true,
            ..BreathParams::new(1.0, 0.5)
        };
        let mut rng = rng();
        let mut p = particle(MotionPattern::Burst, &mut rng);
        let mut ctx = frame(&params);
        ctx.dt = 0.05;
        for _ in 0..200 {
            burst(&mut p, &ctx, &mut rng);
            assert!(p.distance <= 150.0 + 0.05 * 0.6 * 50.0);
        }

        let still = BreathParams::new(1.0, 0.5);
        let before = p.distance;
        burst(&mut p, &frame(&still), &mut rng);
        assert!((p.distance - before * 0.99).abs() < 1e-4);
    }

    #[test]
    fn test_orbital_fire_flares() {
        let params = BreathParams::new(0.5, 0.8);
        let mut rng = rng();
        let mut p = particle(MotionPattern::OrbitalFire, &mut rng);
        let ctx = frame(&params);
        let mut flared = false;
        for _ in 0..600 {
            orbital_fire(&mut p, &ctx, &mut rng);
            assert!(p.opacity == 0.7 || p.opacity == 1.0);
            flared |= p.opacity == 1.0;
        }
        assert!(flared);
    }

    #[test]
    fn test_spirits_stay_on_ring() {
        let params = BreathParams::new(0.5, 0.8);
        let mut rng = rng();
        let ctx = frame(&params);
        for id in 0..2 {
            let mut p = particle(MotionPattern::SpiritOrbit, &mut rng);
            p.id = id;
            p.state = PatternState::new(MotionPattern::SpiritOrbit, id, 0.0, 120.0, &mut rng);
            for _ in 0..100 {
                spirit_orbit(&mut p, &ctx, &mut rng);
                assert!((p.pos.distance(Vec2::splat(150.0)) - 120.0).abs() < 1e-2);
                assert!(p.opacity == 0.75 || p.opacity == 1.0);
            }
        }
    }

    #[test]
    fn test_prism_split_completes() {
        let params = BreathParams {
            split_chance: Some(1.0),
            ..BreathParams::new(0.5, 0.8)
        };
        let mut rng = rng();
        let mut p = particle(MotionPattern::PrismaticSplit, &mut rng);
        let ctx = frame(&params);
        let mut seen = false;
        for _ in 0..400 {
            prismatic_split(&mut p, &ctx, &mut rng);
            if let PatternState::Prism { split: Some(s), .. } = &p.state {
                seen = true;
                assert_eq!((s.hue1, s.hue2), (12.0, -12.0));
                assert!(s.progress < 1.0);
            }
        }
        assert!(seen);
    }
}
