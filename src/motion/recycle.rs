//! Spawn, travel, reset.
//!
//! These particles have a finite visual life. Each is born at an edge (the
//! ring, the top of the canvas), travels a trajectory, and is reset in place
//! once it crosses a terminal threshold. Thresholds are fractions of the
//! canvas size so the effects scale with the render size.

use super::FrameContext;
use crate::particle::{Particle, PatternState};
use crate::preset::{BreathParams, BreathPhase, MeteorPhase};
use glam::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;
use std::f32::consts::{PI, TAU};

fn base_speed(p: &Particle, ctx: &FrameContext<'_>) -> f32 {
    ctx.params.speed * p.speed
}

fn random_ring_point(ctx: &FrameContext<'_>, rng: &mut SmallRng) -> Vec2 {
    ctx.polar(rng.gen::<f32>() * TAU, ctx.ring_radius)
}

/// Rising embers with flicker, pops and a breath-linked temperature shift.
///
/// An ember dies once it rises above `center.y - size * 0.42`. It respawns on
/// the ring unless the current phase sets `spawn: false`, in which case it
/// goes dark until a spawning phase returns.
pub fn ember_mixed(p: &mut Particle, ctx: &FrameContext<'_>, rng: &mut SmallRng) {
    let speed = base_speed(p, ctx);
    let PatternState::Ember { age, drift_phase, flicker_phase, temperature_shift } = &mut p.state else {
        return;
    };
    *age += ctx.dt;
    *drift_phase += ctx.dt * 2.0;
    *flicker_phase += ctx.dt * 8.0;

    p.pos.y -= ctx.dt * speed * 45.0;

    let rise = ((ctx.center.y - p.pos.y) / (ctx.size * 0.4)).max(0.0);
    let shimmer = (p.phase * 3.0 + ctx.now * 6.0).sin() * (6.0 + rise * 10.0);
    let drift_amp = 3.0 + p.phase.sin() * 2.0;
    let orbit_drift = drift_phase.sin() * drift_amp;
    p.pos.x += (shimmer + orbit_drift) * ctx.dt * 2.5;

    let flicker = 0.85 + flicker_phase.sin() * 0.15 + rng.gen::<f32>() * 0.1;

    let sizes = ctx.particle_size;
    p.pop_timer -= ctx.dt;
    if p.pop_timer <= 0.0 {
        p.opacity = (p.opacity + 0.4).min(1.0);
        p.size = (p.size * 1.35).min(sizes.max * 1.5);
        p.pop_timer = 0.25 + rng.gen::<f32>() * 0.7;
    } else {
        p.size = (p.size * (1.0 - ctx.dt * 2.5)).max(sizes.min);
    }
    p.display_size = Some(p.size * flicker);

    *temperature_shift = if ctx.is_phase(BreathPhase::Inhale) { 15.0 } else { -10.0 };
    p.opacity = (p.opacity - ctx.dt * 0.55).max(0.15);

    if p.pos.y < ctx.center.y - ctx.size * 0.42 {
        if ctx.params.spawn != Some(false) {
            *age = 0.0;
            p.pos = random_ring_point(ctx, rng);
            p.opacity = 0.9;
            p.size = sizes.lerp(rng.gen());
        } else {
            p.opacity = 0.0;
        }
    }
}

/// Meteor shower driven by the phase's `phase` sub-state.
///
/// - `cloud`: gather near the top with a gentle sway, fading in.
/// - `stop`: hover in place.
/// - `rain`: streak diagonally. The side alternates with the engine's cycle
///   direction.
/// - `fade`: fade out, then park invisibly back in the cloud.
pub fn meteor_cycle(p: &mut Particle, ctx: &FrameContext<'_>, rng: &mut SmallRng) {
    let speed = base_speed(p, ctx);
    let cloud_y = ctx.center.y - ctx.size * 0.48;
    let respawn_x = |rng: &mut SmallRng| ctx.center.x + (rng.gen::<f32>() - 0.5) * ctx.size;
    let PatternState::Meteor { layer, drift_angle, streak_angle, streak_length } = &mut p.state else {
        return;
    };
    let (streak_mult, bright_mult) = layer.factors();
    *drift_angle += ctx.dt * 0.0015;

    match ctx.params.phase.unwrap_or_default() {
        MeteorPhase::Cloud => {
            if p.opacity < 0.35 {
                p.opacity += ctx.dt * 0.6;
            }
            p.pos.x += (p.phase + ctx.now * 4.0).sin() * 12.0 * ctx.dt;
            p.pos.y += (p.phase * 1.5 + ctx.now * 3.0).cos() * 6.0 * ctx.dt;
            p.pos.y += (cloud_y - p.pos.y) * ctx.dt * 0.5;
            if p.pos.y > cloud_y + ctx.size * 0.15 {
                p.pos.y = cloud_y;
            }
        }
        MeteorPhase::Stop => {
            p.pos.x += (p.phase + ctx.now * 2.0).sin() * 5.0 * ctx.dt;
            p.pos.y += (p.phase * 1.5 + ctx.now * 1.5).cos() * 3.0 * ctx.dt;
        }
        MeteorPhase::Rain => {
            let base = if ctx.direction > 0.0 { PI * 0.35 } else { PI * 0.65 };
            let angle = base + *drift_angle;
            let streak_speed = speed * 200.0 * (0.8 + streak_mult * 0.2);

            p.pos += Vec2::from_angle(angle) * streak_speed * ctx.dt;
            p.opacity = (p.opacity + ctx.dt * 2.0).min(0.8 * bright_mult);
            *streak_angle = Some(angle);
            *streak_length = 8.0 * streak_mult;

            if p.pos.y > ctx.center.y + ctx.size * 0.4 {
                p.pos = Vec2::new(respawn_x(rng), cloud_y + rng.gen::<f32>() * ctx.size * 0.1);
                p.opacity = 0.5;
            }
        }
        MeteorPhase::Fade => {
            p.opacity = (p.opacity - ctx.dt * 1.2).max(0.0);
            if p.opacity <= 0.05 {
                p.pos = Vec2::new(respawn_x(rng), cloud_y + rng.gen::<f32>() * ctx.size * 0.1);
                p.opacity = 0.0;
            }
        }
    }
}

/// Snow swirling inside a globe slightly larger than the ring, with
/// parallax layers and occasional twinkles.
pub fn snowglobe_active(p: &mut Particle, ctx: &FrameContext<'_>, rng: &mut SmallRng) {
    let speed = base_speed(p, ctx);
    let globe = ctx.ring_radius * 1.15;
    let PatternState::Snow { layer, bowl_angle, curl_phase, twinkle_timer, twinkling } = &mut p.state else {
        return;
    };
    let (layer_speed, layer_size, layer_opacity) = layer.factors();

    *bowl_angle += ctx.dt * 0.15;
    let swirl = bowl_angle.sin() * 3.0;
    *curl_phase += ctx.dt * 1.5;
    let curl = curl_phase.sin() * 4.0 * layer_speed;

    p.pos.y += ctx.dt * speed * 20.0 * layer_speed;
    p.angle += ctx.dt * speed * 0.3;
    p.pos.x += (p.angle.sin() * 8.0 + curl + swirl) * ctx.dt;

    if ctx.params.shake {
        p.pos.x += (rng.gen::<f32>() - 0.5) * 40.0 * ctx.dt;
        p.pos.y += (rng.gen::<f32>() - 0.5) * 25.0 * ctx.dt;
    }

    let offset = p.pos - ctx.center;
    let dist = offset.length();
    if dist > globe {
        p.pos = ctx.center + offset / dist * globe * 0.95;
    }

    if p.pos.y > ctx.center.y + globe * 0.9 {
        p.pos.y = ctx.center.y - globe * 0.85;
        p.pos.x = ctx.center.x + (rng.gen::<f32>() - 0.5) * globe * 1.8;
    }

    *twinkle_timer -= ctx.dt;
    if *twinkle_timer <= 0.0 {
        *twinkling = true;
        *twinkle_timer = 3.0 + rng.gen::<f32>() * 4.0;
    } else if *twinkle_timer > 0.1 {
        *twinkling = false;
    }

    p.opacity = layer_opacity + rng.gen::<f32>() * 0.15;
    p.display_size = Some(p.size * layer_size);
}

/// Dust flowing along the ring; now and then a mote drops off and falls.
pub fn stardust_drift(p: &mut Particle, ctx: &FrameContext<'_>, rng: &mut SmallRng) {
    let flow = BreathParams::knob(ctx.params.flow_speed, 0.6);
    let fall_chance = BreathParams::knob(ctx.params.fall_chance, 0.02);
    let PatternState::Stardust { falling, velocity } = &mut p.state else {
        return;
    };

    p.angle += ctx.dt * flow * 0.4 * p.rotation_dir;

    if !*falling && rng.gen::<f32>() < fall_chance * ctx.dt {
        *falling = true;
        *velocity = 0.0;
    }

    if *falling {
        *velocity += ctx.dt * 20.0;
        p.pos.y += *velocity * ctx.dt;
        p.opacity -= ctx.dt * 0.5;
        if p.opacity <= 0.0 || p.pos.y > ctx.center.y + ctx.size * 0.5 {
            *falling = false;
            *velocity = 0.0;
            p.angle = rng.gen::<f32>() * TAU;
            p.opacity = 0.8;
        }
    } else {
        p.pos = ctx.polar(p.angle, ctx.ring_radius);
        p.opacity = 0.7 + (p.angle * 2.0).sin() * 0.2;
    }
}

/// Leaves shed from the ring that sway as they fall.
pub fn forest_drift(p: &mut Particle, ctx: &FrameContext<'_>, rng: &mut SmallRng) {
    let fall_speed = BreathParams::knob(ctx.params.fall_speed, 0.5);
    let rot_speed = BreathParams::knob(ctx.params.rot_speed, 0.5);
    let PatternState::Leaf { spawned, rotation, drift_phase } = &mut p.state else {
        return;
    };

    if !*spawned {
        *spawned = true;
        p.pos = random_ring_point(ctx, rng);
        *rotation = rng.gen::<f32>() * TAU;
        *drift_phase = rng.gen::<f32>() * TAU;
    }

    p.pos.y += ctx.dt * fall_speed * 30.0;
    *drift_phase += ctx.dt * 2.0;
    p.pos.x += drift_phase.sin() * ctx.dt * 15.0;
    *rotation += ctx.dt * rot_speed * 2.0;

    if p.pos.y > ctx.center.y + ctx.size * 0.5 {
        p.pos = random_ring_point(ctx, rng);
    }

    p.opacity = (0.5 - (p.pos.y - ctx.center.y) / (ctx.size * 0.4) * 0.3).max(0.1);
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::preset::MotionPattern;

    #[test]
    fn test_ember_recycles_to_bright() {
        let params = BreathParams::new(0.8, 0.7);
        let mut rng = rng();
        let mut p = particle(MotionPattern::EmberMixed, &mut rng);
        let mut ctx = frame(&params);
        let mut recycles = 0;
        let mut prev_y = p.pos.y;
        for i in 0..3000 {
            ctx.now = i as f32 * ctx.dt;
            ember_mixed(&mut p, &ctx, &mut rng);
            if p.pos.y > prev_y + 1.0 {
                recycles += 1;
                assert!(p.opacity >= 0.8, "respawned at opacity {}", p.opacity);
            }
            prev_y = p.pos.y;
            assert!(p.opacity >= 0.15);
        }
        assert!(recycles > 0);
    }

    #[test]
    fn test_ember_goes_dark_without_spawn() {
        let params = BreathParams {
            spawn: Some(false),
            ..BreathParams::new(1.0, 0.7)
        };
        let mut rng = rng();
        let mut p = particle(MotionPattern::EmberMixed, &mut rng);
        p.pos.y = 150.0 - 300.0 * 0.42 - 1.0;
        ember_mixed(&mut p, &frame(&params), &mut rng);
        assert_eq!(p.opacity, 0.0);
    }

    #[test]
    fn test_ember_temperature_follows_phase() {
        let params = BreathParams::new(0.5, 0.7);
        let mut rng = rng();
        let mut p = particle(MotionPattern::EmberMixed, &mut rng);
        let mut ctx = frame(&params);
        ctx.phase = Some(BreathPhase::Inhale);
        ember_mixed(&mut p, &ctx, &mut rng);
        assert_eq!(p.temperature_shift(), 15.0);
        ctx.phase = Some(BreathPhase::Exhale);
        ember_mixed(&mut p, &ctx, &mut rng);
        assert_eq!(p.temperature_shift(), -10.0);
        assert!(p.display_size.is_some());
    }

    #[test]
    fn test_meteor_rain_direction() {
        let params = BreathParams {
            phase: Some(MeteorPhase::Rain),
            ..BreathParams::new(1.0, 0.8)
        };
        let mut ctx = frame(&params);
        for (direction, rightward) in [(1.0, true), (-1.0, false)] {
            let mut rng = rng();
            let mut p = particle(MotionPattern::MeteorCycle, &mut rng);
            p.pos = Vec2::new(150.0, 20.0);
            ctx.direction = direction;
            meteor_cycle(&mut p, &ctx, &mut rng);
            assert!(p.pos.y > 20.0);
            assert_eq!(p.pos.x > 150.0, rightward);
            let PatternState::Meteor { streak_angle, streak_length, .. } = p.state else {
                panic!("meteor state expected");
            };
            assert!(streak_angle.is_some());
            assert!(streak_length > 0.0);
        }
    }

    #[test]
    fn test_meteor_fade_parks_in_cloud() {
        let params = BreathParams::new(0.2, 0.3);
        let mut rng = rng();
        let mut p = particle(MotionPattern::MeteorCycle, &mut rng);
        let ctx = frame(&params);
        for _ in 0..100 {
            meteor_cycle(&mut p, &ctx, &mut rng);
        }
        assert_eq!(p.opacity, 0.0);
        let cloud_y = 150.0 - 300.0 * 0.48;
        assert!(p.pos.y >= cloud_y && p.pos.y <= cloud_y + 30.0);
    }

    #[test]
    fn test_snow_stays_in_globe() {
        let params = BreathParams {
            shake: true,
            ..BreathParams::new(1.0, 0.6)
        };
        let mut rng = rng();
        let mut p = particle(MotionPattern::SnowglobeActive, &mut rng);
        let ctx = frame(&params);
        for _ in 0..1000 {
            snowglobe_active(&mut p, &ctx, &mut rng);
            // wrapped flakes land in the globe's bounding box, not its disc
            let offset = (p.pos - Vec2::splat(150.0)).abs();
            assert!(offset.x <= 138.0 + 1e-2 && offset.y <= 138.0 + 1e-2, "{:?}", p.pos);
            assert!(p.display_size.is_some());
        }
    }

    #[test]
    fn test_stardust_falls_and_returns() {
        let params = BreathParams {
            fall_chance: Some(100.0),
            ..BreathParams::new(0.5, 0.6)
        };
        let mut rng = rng();
        let mut p = particle(MotionPattern::StardustDrift, &mut rng);
        let ctx = frame(&params);
        stardust_drift(&mut p, &ctx, &mut rng);
        assert!(matches!(p.state, PatternState::Stardust { falling: true, .. }));
        for _ in 0..200 {
            stardust_drift(&mut p, &ctx, &mut rng);
        }
        assert!(p.opacity > 0.0);
    }

    #[test]
    fn test_leaf_spawns_on_ring_and_falls() {
        let params = BreathParams::new(0.3, 0.5);
        let mut rng = rng();
        let mut p = particle(MotionPattern::ForestDrift, &mut rng);
        let ctx = frame(&params);
        forest_drift(&mut p, &ctx, &mut rng);
        assert!((p.pos.distance(Vec2::splat(150.0)) - 120.0).abs() < 1.0);
        for _ in 0..2000 {
            forest_drift(&mut p, &ctx, &mut rng);
            assert!(p.pos.y <= 300.0 + 1.0);
            assert!(p.opacity >= 0.1);
        }
    }
}
