use particles_core::{ConfigError, Rgba, ShapeKind, TrackRegistry, VariantKind};

#[test]
fn builtin_registry_has_eight_tracks() {
    let r = TrackRegistry::builtin();
    assert_eq!(r.len(), 8);
    assert_eq!(r.ids(), (0..8).collect::<Vec<_>>());
    let drums = r.get(1).unwrap();
    assert_eq!(drums.name, "Drums");
    assert_eq!(drums.shape, ShapeKind::Square);
    assert_eq!(drums.variant, Some(VariantKind::Drum));
    for id in r.ids() {
        assert!(r.get(id).unwrap().validate().is_empty(), "track {id} invalid");
    }
}

#[test]
fn unknown_track_is_an_error() {
    let r = TrackRegistry::builtin();
    assert_eq!(r.get(999).unwrap_err(), ConfigError::UnknownTrack(999));
}

#[test]
fn json_configs_fill_in_defaults() {
    let json = r##"[
        { "id": 4, "name": "Keys", "color": "#ff8800", "shape": "triangle",
          "lifespan_ms": 1200, "spawn": { "radius": 60 },
          "effects": [ { "kind": "glow", "params": { "intensity": 0.9 } } ] }
    ]"##;
    let r = TrackRegistry::from_json(json).unwrap();
    let keys = r.get(4).unwrap();
    assert_eq!(keys.name, "Keys");
    assert_eq!(keys.color, Rgba::from_hex("#ff8800").unwrap());
    assert_eq!(keys.shape, ShapeKind::Triangle);
    assert_eq!(keys.lifespan_ms, 1200.0);
    assert_eq!(keys.spawn.radius, 60.0);
    assert_eq!(keys.spawn.spread, 1.0);
    assert_eq!(keys.min_size, 20.0);
    assert_eq!(keys.effects[0].params.intensity, Some(0.9));
    assert_eq!(keys.variant, None);
}

#[test]
fn unknown_shape_and_variant_fall_back() {
    let json = r#"[ { "id": 0, "shape": "hexagon", "variant": "theremin" } ]"#;
    let r = TrackRegistry::from_json(json).unwrap();
    let cfg = r.get(0).unwrap();
    assert_eq!(cfg.shape, ShapeKind::Circle);
    assert_eq!(cfg.variant, None);
}

#[test]
fn malformed_json_is_rejected() {
    assert!(matches!(
        TrackRegistry::from_json("{ not json"),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        TrackRegistry::from_json(r#"[ { "id": 0, "color": "blue" } ]"#),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn inverted_sizes_are_repaired_on_insert() {
    let json = r#"[ { "id": 2, "min_size": 90, "max_size": 30, "lifespan_ms": -5 } ]"#;
    let r = TrackRegistry::from_json(json).unwrap();
    let cfg = r.get(2).unwrap();
    assert_eq!((cfg.min_size, cfg.max_size), (30.0, 90.0));
    assert_eq!(cfg.lifespan_ms, 2000.0);
}

#[test]
fn colors_round_trip_through_strings() {
    let c = Rgba::from_hex("#10b981").unwrap();
    assert_eq!(c.to_string(), "#10b981ff");
    assert_eq!(c.with_alpha(0.5).to_css(), "rgba(16,185,129,0.500)");
}
