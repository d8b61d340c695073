//! End-to-end engine scenarios.
//!
//! These drive a [`ParticleEngine`] the way a host would (phase changes,
//! timestamps, canvases) and check the properties that must hold across
//! whole runs rather than single updates.

use ringfx::prelude::*;
use ringfx::MAX_PARTICLE_COUNT;

fn seeded(name: &str) -> ParticleEngine {
    ParticleEngine::new(EngineConfig::new(name).with_seed(2024).with_size(300.0))
}

// ============================================================================
// Motion bounds
// ============================================================================

#[test]
fn test_neutral_preset_stays_on_canvas() {
    let mut engine = ParticleEngine::new(
        EngineConfig::default()
            .with_seed(1)
            .with_size(300.0)
            .with_phase("rest"),
    );
    assert_eq!(engine.preset().id, "neutral");
    assert_eq!(engine.pool().len(), 6);

    for _ in 0..100 {
        engine.step(0.016);
        for p in engine.pool() {
            assert!((0.0..=300.0).contains(&p.pos.x), "x = {}", p.pos.x);
            assert!((0.0..=300.0).contains(&p.pos.y), "y = {}", p.pos.y);
            assert!((0.0..=1.0).contains(&p.opacity), "opacity = {}", p.opacity);
        }
    }
}

#[test]
fn test_every_preset_stays_finite() {
    let names: Vec<String> = registry::path_presets_all()
        .iter()
        .chain(registry::presets(None))
        .map(|p| p.id.clone())
        .collect();
    let phases = ["inhale", "holdTop", "exhale", "holdBottom", "rest"];

    for name in names {
        let mut engine = seeded(&name);
        assert!(engine.pool().len() <= MAX_PARTICLE_COUNT);
        for (i, phase) in phases.iter().cycle().take(20).enumerate() {
            engine.set_phase_name(phase);
            for _ in 0..10 {
                engine.step(0.05);
            }
            for p in engine.pool() {
                assert!(p.pos.is_finite(), "{} frame {}: {:?}", name, i, p.pos);
                assert!(p.opacity.is_finite(), "{} frame {}", name, i);
            }
        }
    }
}

// ============================================================================
// Breath cycle
// ============================================================================

#[test]
fn test_meteor_direction_flips_once_per_cycle() {
    let mut engine = seeded("meteor-shower-06");
    assert_eq!(engine.preset().motion_pattern, MotionPattern::MeteorCycle);

    let mut flips = 0;
    let mut last = engine.direction();
    for phase in ["inhale", "hold", "exhale", "rest", "inhale", "hold", "exhale", "rest", "inhale"] {
        engine.set_phase_name(phase);
        for _ in 0..20 {
            engine.step(0.05);
        }
        if engine.direction() != last {
            flips += 1;
            assert_eq!(phase, "rest", "direction flipped on {}", phase);
            last = engine.direction();
        }
    }
    assert_eq!(flips, 2);
    assert_eq!(engine.direction(), 1.0);
}

#[test]
fn test_unknown_phase_uses_rest_speed() {
    let mut engine = seeded("Prana");
    engine.set_phase_name("held-breath");
    assert_eq!(engine.phase(), None);
    assert_eq!(engine.params().speed, engine.preset().breath_sync.rest.speed);

    for _ in 0..30 {
        engine.step(0.016);
    }
    assert!(engine.pool().iter().all(|p| p.pos.is_finite()));
}

#[test]
fn test_empty_breath_pattern_keeps_phase() {
    let config = EngineConfig::new("Soma")
        .with_seed(5)
        .with_phase("exhale")
        .with_breath(BreathPattern::new(0.0, 0.0, 0.0, 0.0));
    let mut engine = ParticleEngine::new(config);

    for _ in 0..20 {
        engine.step(0.05);
    }
    assert_eq!(engine.phase(), Some(BreathPhase::Exhale));
    assert_eq!(engine.ring_scale(), 1.0);
}

// ============================================================================
// Timing
// ============================================================================

#[test]
fn test_long_gap_advances_by_max_delta() {
    let mut gap = seeded("Dhyana");
    let mut steady = seeded("Dhyana");
    let mut canvas = DisplayList::new(300, 300);

    gap.frame(0.0, &mut canvas);
    steady.frame(0.0, &mut canvas);

    let dt = gap.frame(5000.0, &mut canvas);
    assert_eq!(dt, 0.05);
    steady.frame(50.0, &mut canvas);

    assert_eq!(gap.time(), steady.time());
    for (a, b) in gap.pool().iter().zip(steady.pool()) {
        assert_eq!(a.pos, b.pos);
        assert_eq!(a.opacity, b.opacity);
    }
}

#[test]
fn test_same_seed_same_frames() {
    let mut a = seeded("electric-04");
    let mut b = seeded("electric-04");
    let mut canvas_a = RasterCanvas::new(64, 64);
    let mut canvas_b = RasterCanvas::new(64, 64);

    for i in 0..10 {
        a.frame(i as f64 * 16.0, &mut canvas_a);
        b.frame(i as f64 * 16.0, &mut canvas_b);
    }
    assert_eq!(canvas_a.to_rgba8(None), canvas_b.to_rgba8(None));
}

// ============================================================================
// Recycling
// ============================================================================

#[test]
fn test_embers_recycle_to_full_opacity() {
    let mut engine = seeded("embers-03");
    engine.set_phase_name("inhale");

    // long enough for every ember to reach the top at least once
    for _ in 0..1500 {
        engine.step(0.05);
    }

    let count = engine.pool().len();
    let mut peak = vec![0.0f32; count];
    for _ in 0..1500 {
        engine.step(0.05);
        for (peak, p) in peak.iter_mut().zip(engine.pool()) {
            *peak = peak.max(p.opacity);
        }
    }
    for (id, peak) in peak.iter().enumerate() {
        assert!(*peak >= 0.8, "ember {} never recovered (peak {})", id, peak);
    }
}

// ============================================================================
// Animation loop
// ============================================================================

#[test]
fn test_loop_runs_until_deactivated() {
    let mut engine = seeded("Jnana");
    let mut canvas = DisplayList::new(300, 300);

    let mut handle = engine.request_frame();
    for i in 0..5 {
        handle = handle.and_then(|h| engine.on_frame(h, i as f64 * 16.0, &mut canvas));
    }
    assert!(handle.is_some());
    assert_eq!(engine.clock().frame(), 5);

    engine.set_active(false);
    let stale = handle.unwrap();
    assert!(engine.on_frame(stale, 100.0, &mut canvas).is_none());
    assert_eq!(engine.clock().frame(), 5);
}
