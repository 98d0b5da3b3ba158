use glam::Vec2;
use particles_core::{midi_to_hz, ScheduledNote, Sequencer};
use std::time::Duration;

fn eighth(seq: &Sequencer) -> Duration {
    Duration::from_secs_f64(30.0 / seq.params.bpm as f64)
}

fn run(seq: &mut Sequencer, steps: usize) -> Vec<ScheduledNote> {
    let mut out = Vec::new();
    let dt = eighth(seq);
    for i in 0..steps {
        seq.tick(dt, i as f64 * dt.as_secs_f64(), &mut out);
    }
    out
}

#[test]
fn midi_to_hz_matches_a4_and_octave() {
    let a4 = midi_to_hz(69.0);
    assert!((a4 - 440.0).abs() < 1e-4);
    let a5 = midi_to_hz(81.0);
    assert!((a5 / a4 - 2.0).abs() < 1e-4);
}

#[test]
fn tick_emits_notes_over_time() {
    let mut seq = Sequencer::demo(800.0, 600.0, 42);
    let notes = run(&mut seq, 200);
    assert!(!notes.is_empty(), "expected some scheduled notes");
    for n in &notes {
        assert!(n.track_id < 3);
        assert!(n.note.pitch <= 127);
        assert!((0.4..=1.0).contains(&n.note.velocity));
        assert!(n.note.duration_ms >= 250.0);
        let pattern = &seq.patterns[seq.index_of(n.track_id).unwrap()];
        assert_eq!(n.position, pattern.marker);
    }
}

#[test]
fn octaves_place_tracks_in_their_register() {
    let mut seq = Sequencer::demo(800.0, 600.0, 9);
    for n in run(&mut seq, 400) {
        let lo = 60 + seq.patterns[n.track_id as usize].octave * 12;
        let p = n.note.pitch as i32;
        assert!(p >= lo && p <= lo + 12, "track {} pitch {p}", n.track_id);
    }
}

#[test]
fn same_seed_same_pattern() {
    let a = run(&mut Sequencer::demo(800.0, 600.0, 5), 100);
    let b = run(&mut Sequencer::demo(800.0, 600.0, 5), 100);
    assert_eq!(a, b);
}

#[test]
fn toggle_mute_and_solo() {
    let mut seq = Sequencer::demo(800.0, 600.0, 42);
    seq.toggle_mute(1);
    assert!(seq.tracks[1].muted);
    seq.toggle_mute(1);
    assert!(!seq.tracks[1].muted);

    seq.toggle_solo(2);
    assert_eq!(seq.solo_index(), Some(2));
    for (i, t) in seq.tracks.iter().enumerate() {
        assert_eq!(t.muted, i != 2);
    }
    assert!(run(&mut seq, 200).iter().all(|n| n.track_id == 2));

    seq.toggle_solo(2);
    assert!(seq.tracks.iter().all(|t| !t.muted));
}

#[test]
fn reseeding_one_track_leaves_the_others() {
    let mut a = Sequencer::demo(800.0, 600.0, 11);
    let mut b = Sequencer::demo(800.0, 600.0, 11);
    b.reseed(2, Some(1234));
    let only = |notes: Vec<ScheduledNote>, t: u32| {
        notes.into_iter().filter(|n| n.track_id == t).collect::<Vec<_>>()
    };
    let (na, nb) = (run(&mut a, 100), run(&mut b, 100));
    assert_eq!(only(na.clone(), 0), only(nb.clone(), 0));
    assert_eq!(only(na, 1), only(nb, 1));
}

#[test]
fn markers_follow_set_marker() {
    let mut seq = Sequencer::demo(800.0, 600.0, 42);
    seq.set_marker(0, Vec2::new(10.0, 20.0));
    for n in run(&mut seq, 100).iter().filter(|n| n.track_id == 0) {
        assert_eq!(n.position, Vec2::new(10.0, 20.0));
    }
}

#[test]
fn invalid_bpm_is_ignored() {
    let mut seq = Sequencer::demo(800.0, 600.0, 42);
    seq.set_bpm(0.0);
    assert_eq!(seq.params.bpm, 110.0);
    seq.set_bpm(140.0);
    assert_eq!(seq.params.bpm, 140.0);
}
