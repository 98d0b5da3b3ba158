mod common;

use common::{note, simple_registry, surface};
use glam::Vec2;
use particles_core::constants::COMMAND_QUEUE_CAPACITY;
use particles_core::spawn::effective_spawn_radius;
use particles_core::{AnimationEngine, DrawCommand, EffectKind, TrackRegistry, TrackVisualConfig};
use std::collections::HashSet;

fn engine() -> AnimationEngine {
    AnimationEngine::with_seed(simple_registry(1000.0), 800.0, 600.0, 42)
}

fn positions(engine: &AnimationEngine, track: u32) -> Vec<Vec2> {
    engine
        .particles()
        .filter(|p| p.track_id() == track)
        .map(|p| engine.world().body(p.body()).unwrap().position())
        .collect()
}

#[test]
fn trigger_spawns_one_particle_near_the_marker() {
    let mut e = AnimationEngine::with_seed(TrackRegistry::builtin(), 800.0, 600.0, 1);
    let n = note(60, 0.8, 500.0);
    e.trigger_animation(0, 100.0, 100.0, n);
    assert_eq!(e.particle_count(), 0, "triggers apply on the next update");
    assert_eq!(e.apply_pending(0.0), 1);
    assert_eq!(e.particle_count(), 1);
    assert_eq!(e.body_count(), 1);

    let cfg = e.registry().get(0).unwrap();
    let limit = effective_spawn_radius(&cfg.spawn, cfg.note_response.pitch_effect, n.pitch_factor());
    let pos = positions(&e, 0)[0];
    assert!(
        pos.distance(Vec2::new(100.0, 100.0)) <= limit + 1e-3,
        "spawned {pos:?} further than {limit} from the marker"
    );
}

#[test]
fn two_triggers_in_one_frame_make_two_bodies() {
    let mut e = engine();
    e.trigger_animation(1, 200.0, 200.0, note(40, 0.5, 100.0));
    e.trigger_animation(1, 200.0, 200.0, note(40, 0.5, 100.0));
    e.update_at(0.0, &mut surface());
    assert_eq!(e.particle_count(), 2);
    assert_eq!(e.body_count(), 2);
    let handles: HashSet<u64> = e.particles().map(|p| p.body().id()).collect();
    assert_eq!(handles.len(), 2);
}

#[test]
fn particles_are_removed_after_their_lifespan() {
    let mut e = engine();
    let baseline = e.particle_count();
    e.trigger_animation(0, 400.0, 300.0, note(60, 0.7, 200.0));
    e.update_at(0.0, &mut surface());
    assert_eq!(e.particle_count(), baseline + 1);

    e.update_at(999.0, &mut surface());
    assert_eq!(e.particle_count(), baseline + 1, "still inside lifespan");

    let stats = e.update_at(1000.5, &mut surface());
    assert_eq!(stats.expired, 1);
    assert_eq!(e.particle_count(), baseline);
    assert_eq!(e.body_count(), 0);
}

#[test]
fn unknown_track_spawns_nothing() {
    let mut e = engine();
    e.trigger_animation(999, 10.0, 10.0, note(60, 0.7, 100.0));
    assert_eq!(e.apply_pending(0.0), 0);
    assert_eq!(e.particle_count(), 0);
    assert_eq!(e.body_count(), 0);
}

#[test]
fn moving_an_empty_track_is_a_no_op() {
    let mut e = engine();
    e.update_track_position(2, 50.0, 60.0);
    assert_eq!(e.apply_pending(0.0), 1);
    assert_eq!(e.particle_count(), 0);
    assert_eq!(e.marker_position(2), Some(Vec2::new(50.0, 60.0)));
}

#[test]
fn moving_a_track_translates_only_its_particles() {
    let mut e = engine();
    e.trigger_animation(0, 100.0, 100.0, note(60, 0.7, 100.0));
    e.trigger_animation(0, 100.0, 100.0, note(64, 0.7, 100.0));
    e.trigger_animation(1, 500.0, 100.0, note(60, 0.7, 100.0));
    e.apply_pending(0.0);
    let before0 = positions(&e, 0);
    let before1 = positions(&e, 1);

    e.update_track_position(0, 150.0, 80.0);
    e.apply_pending(0.0);

    let delta = Vec2::new(50.0, -20.0);
    for (b, a) in before0.iter().zip(positions(&e, 0)) {
        assert!((a - (*b + delta)).length() < 1e-4, "{b:?} -> {a:?}");
    }
    assert_eq!(positions(&e, 1), before1);
}

#[test]
fn consecutive_moves_coalesce() {
    let mut e = engine();
    e.update_track_position(0, 1.0, 1.0);
    e.update_track_position(0, 2.0, 2.0);
    e.update_track_position(0, 3.0, 3.0);
    assert_eq!(e.pending_commands(), 1);
    e.update_track_position(1, 3.0, 3.0);
    e.update_track_position(0, 4.0, 4.0);
    assert_eq!(e.pending_commands(), 3);
    e.apply_pending(0.0);
    assert_eq!(e.marker_position(0), Some(Vec2::new(4.0, 4.0)));
}

#[test]
fn full_queue_drops_new_commands() {
    let mut e = engine();
    for _ in 0..COMMAND_QUEUE_CAPACITY + 6 {
        e.trigger_animation(0, 100.0, 100.0, note(60, 0.7, 0.0));
    }
    assert_eq!(e.pending_commands(), COMMAND_QUEUE_CAPACITY);
    assert_eq!(e.dropped_commands(), 6);
}

#[test]
fn cleanup_is_idempotent() {
    let mut e = engine();
    for i in 0..3 {
        e.trigger_animation(i, 100.0, 100.0, note(60, 0.7, 0.0));
    }
    e.update_at(0.0, &mut surface());
    e.trigger_animation(0, 100.0, 100.0, note(60, 0.7, 0.0));
    assert_eq!(e.particle_count(), 3);

    e.cleanup();
    assert_eq!(e.particle_count(), 0);
    assert_eq!(e.body_count(), 0);
    assert_eq!(e.pending_commands(), 0);
    assert!(!e.world().is_running());

    e.cleanup();
    assert_eq!(e.particle_count(), 0);
    assert_eq!(e.world().boundaries().count(), 4);

    e.trigger_animation(0, 100.0, 100.0, note(60, 0.7, 0.0));
    e.update_at(10.0, &mut surface());
    assert_eq!(e.particle_count(), 1);
    assert!(e.world().is_running());
}

#[test]
fn age_never_goes_backwards() {
    let mut e = engine();
    e.trigger_animation(0, 100.0, 100.0, note(60, 0.7, 0.0));
    e.update_at(0.0, &mut surface());
    e.update_at(500.0, &mut surface());
    e.update_at(300.0, &mut surface());
    let p = e.particles().next().unwrap();
    assert_eq!(p.age_ms(), 500.0);
}

#[test]
fn one_failing_particle_does_not_stop_the_frame() {
    let mut e = engine();
    e.trigger_animation(0, 100.0, 100.0, note(60, 0.7, 0.0));
    e.trigger_animation(1, 300.0, 100.0, note(60, 0.7, 0.0));
    let mut s = surface();
    s.fail_next_shape = true;
    let stats = e.update_at(0.0, &mut s);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.drawn, 1);
    assert_eq!(stats.alive, 2);
    assert_eq!(s.depth(), 0, "save/restore must stay balanced");

    let stats = e.update_at(16.0, &mut s);
    assert_eq!((stats.failed, stats.drawn), (0, 2));
}

#[test]
fn unknown_effect_in_config_is_skipped() {
    let mut registry = TrackRegistry::new();
    registry.insert(
        0,
        TrackVisualConfig {
            effects: vec![particles_core::EffectDescriptor {
                kind: "sparkle".into(),
                params: Default::default(),
            }],
            ..Default::default()
        },
    );
    let mut e = AnimationEngine::with_seed(registry, 800.0, 600.0, 3);
    e.trigger_animation(0, 100.0, 100.0, note(60, 0.7, 0.0));
    e.update_at(0.0, &mut surface());
    let p = e.particles().next().unwrap();
    let kinds: Vec<EffectKind> = p.effects().iter().map(|fx| fx.kind()).collect();
    assert_eq!(kinds, vec![EffectKind::Pulse]);
}

#[test]
fn same_seed_gives_same_simulation() {
    let run = || {
        let mut e = engine();
        for i in 0..3 {
            e.trigger_animation(i, 200.0 + i as f32 * 100.0, 100.0, note(50 + i as u8 * 5, 0.6, 0.0));
        }
        let mut s = surface();
        for frame in 0..30 {
            e.update_at(frame as f64 * 16.0, &mut s);
        }
        (0..3).flat_map(|t| positions(&e, t)).collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn debug_overlay_draws_a_hud() {
    let mut e = engine();
    e.set_debug(true);
    e.trigger_animation(0, 100.0, 100.0, note(60, 0.7, 0.0));
    let mut s = surface();
    e.update_at(0.0, &mut s);
    let hud = s.commands.iter().find_map(|c| match c {
        DrawCommand::Text(t, _) => Some(t.clone()),
        _ => None,
    });
    assert!(hud.unwrap().contains("particles 1"));
}

#[test]
fn markers_can_be_picked() {
    let mut e = engine();
    e.update_track_position(0, 100.0, 100.0);
    e.update_track_position(1, 300.0, 100.0);
    e.apply_pending(0.0);
    assert_eq!(e.pick_marker(Vec2::new(105.0, 98.0)), Some(0));
    assert_eq!(e.pick_marker(Vec2::new(295.0, 100.0)), Some(1));
    assert_eq!(e.pick_marker(Vec2::new(200.0, 100.0)), None);
}

#[test]
fn resize_keeps_particles() {
    let mut e = engine();
    e.trigger_animation(0, 100.0, 100.0, note(60, 0.7, 0.0));
    e.apply_pending(0.0);
    e.resize(1024.0, 768.0);
    assert_eq!(e.particle_count(), 1);
    assert_eq!(e.world().size(), Vec2::new(1024.0, 768.0));
}

#[test]
fn builtin_tracks_stay_on_the_canvas_at_every_velocity() {
    let (w, h) = (800.0, 600.0);
    for track in TrackRegistry::builtin().ids() {
        let mut e = AnimationEngine::with_seed(TrackRegistry::builtin(), w, h, 7);
        for step in 0..=10 {
            let velocity = step as f32 / 10.0;
            for pitch in [0, 60, 127] {
                e.trigger_animation(track, 400.0, 300.0, note(pitch, velocity, 100.0));
            }
        }
        let mut s = surface();
        for frame in 0..60 {
            e.update_at(frame as f64 * 16.0, &mut s);
            for body in e.world().dynamic_bodies() {
                let p = body.position();
                assert!(
                    (0.0..=w).contains(&p.x) && (0.0..=h).contains(&p.y),
                    "track {track} frame {frame}: body {} at {p:?}",
                    body.handle().id()
                );
            }
        }
        assert_eq!(e.particle_count(), 33, "track {track}");
    }
}

#[test]
fn moves_for_unknown_tracks_are_ignored() {
    let mut e = engine();
    e.update_track_position(999, 10.0, 10.0);
    assert_eq!(e.apply_pending(0.0), 0);
    assert_eq!(e.marker_position(999), None);
    assert_eq!(e.pick_marker(Vec2::new(10.0, 10.0)), None);
}

#[test]
fn replacing_the_registry_forgets_stale_markers() {
    let mut e = engine();
    e.update_track_position(2, 50.0, 60.0);
    e.apply_pending(0.0);
    let mut registry = TrackRegistry::new();
    registry.insert(0, TrackVisualConfig::default());
    e.set_registry(registry);
    assert_eq!(e.marker_position(2), None);
}
