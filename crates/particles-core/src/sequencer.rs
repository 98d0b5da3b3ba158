//! Generative note source used by the front-ends in place of a real
//! audio scheduler.
//!
//! Each track rolls its own dice on an eighth-note grid. Tracks have
//! independent RNG streams derived from one base seed so a single track can
//! be reseeded without disturbing the others.

use crate::config::TrackId;
use crate::note::NoteEvent;
use glam::Vec2;
use rand::prelude::*;
use std::time::Duration;

pub const C_MAJOR_PENTATONIC: &[i32] = &[0, 2, 4, 7, 9, 12];

/// How one track composes.
///
/// Fields:
/// - `trigger_probability`: chance to play on each eighth note
/// - `octave`: offset from middle C in octaves
/// - `base_duration_ms`: shortest note length; up to 200 ms is added at random
/// - `marker`: where the track's particles spawn, in canvas pixels
#[derive(Clone, Debug)]
pub struct TrackPattern {
    pub track_id: TrackId,
    pub trigger_probability: f32,
    pub octave: i32,
    pub base_duration_ms: f64,
    pub marker: Vec2,
}

#[derive(Clone, Debug)]
pub struct SequencerParams {
    pub bpm: f32,
    pub root_midi: i32,
    pub scale: &'static [i32],
}

impl Default for SequencerParams {
    fn default() -> Self {
        Self {
            bpm: 110.0,
            root_midi: 60,
            scale: C_MAJOR_PENTATONIC,
        }
    }
}

/// A note due to be triggered, with the marker it should spawn at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScheduledNote {
    pub track_id: TrackId,
    pub position: Vec2,
    pub note: NoteEvent,
    pub start_time_sec: f64,
}

#[derive(Clone, Debug)]
pub struct TrackState {
    pub muted: bool,
}

pub struct Sequencer {
    pub patterns: Vec<TrackPattern>,
    pub tracks: Vec<TrackState>,
    pub params: SequencerParams,
    rngs: Vec<StdRng>,
    solo_index: Option<usize>,
    beat_accum: f64,
}

impl Sequencer {
    pub fn new(patterns: Vec<TrackPattern>, params: SequencerParams, seed: u64) -> Self {
        let tracks = patterns
            .iter()
            .map(|_| TrackState { muted: false })
            .collect::<Vec<_>>();
        let rngs = (0..patterns.len())
            .map(|i| StdRng::seed_from_u64(seed ^ (i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)))
            .collect::<Vec<_>>();
        Self {
            patterns,
            tracks,
            params,
            rngs,
            solo_index: None,
            beat_accum: 0.0,
        }
    }

    /// Three-track demo: bass, drums and lead spread across a canvas.
    pub fn demo(width: f32, height: f32, seed: u64) -> Self {
        let y = height * 0.4;
        let patterns = vec![
            TrackPattern {
                track_id: 0,
                trigger_probability: 0.4,
                octave: -1,
                base_duration_ms: 400.0,
                marker: Vec2::new(width * 0.25, y),
            },
            TrackPattern {
                track_id: 1,
                trigger_probability: 0.6,
                octave: 0,
                base_duration_ms: 250.0,
                marker: Vec2::new(width * 0.5, y),
            },
            TrackPattern {
                track_id: 2,
                trigger_probability: 0.3,
                octave: 1,
                base_duration_ms: 600.0,
                marker: Vec2::new(width * 0.75, y),
            },
        ];
        Self::new(patterns, SequencerParams::default(), seed)
    }

    pub fn set_bpm(&mut self, bpm: f32) {
        if bpm.is_finite() && bpm > 0.0 {
            self.params.bpm = bpm;
        } else {
            log::warn!("ignoring bpm {bpm}");
        }
    }

    pub fn toggle_mute(&mut self, index: usize) {
        if let Some(t) = self.tracks.get_mut(index) {
            t.muted = !t.muted;
        }
    }

    pub fn set_muted(&mut self, index: usize, muted: bool) {
        if let Some(t) = self.tracks.get_mut(index) {
            t.muted = muted;
        }
    }

    pub fn set_marker(&mut self, index: usize, marker: Vec2) {
        if let Some(p) = self.patterns.get_mut(index) {
            p.marker = marker;
        }
    }

    /// Index of the pattern driving `track_id`.
    pub fn index_of(&self, track_id: TrackId) -> Option<usize> {
        self.patterns.iter().position(|p| p.track_id == track_id)
    }

    /// Restart one track's random stream, from `seed` or from its own dice.
    pub fn reseed(&mut self, index: usize, seed: Option<u64>) {
        if let Some(r) = self.rngs.get_mut(index) {
            let new_seed = seed.unwrap_or_else(|| r.gen());
            *r = StdRng::seed_from_u64(new_seed);
        }
    }

    /// Solo a track, or clear the solo if it is already soloed.
    pub fn toggle_solo(&mut self, index: usize) {
        match self.solo_index {
            Some(idx) if idx == index => {
                self.solo_index = None;
                for t in &mut self.tracks {
                    t.muted = false;
                }
            }
            _ => {
                self.solo_index = Some(index);
                for (i, t) in self.tracks.iter_mut().enumerate() {
                    t.muted = i != index;
                }
            }
        }
    }

    pub fn solo_index(&self) -> Option<usize> {
        self.solo_index
    }

    pub fn tick(&mut self, dt: Duration, now_sec: f64, out: &mut Vec<ScheduledNote>) {
        let eighth = 30.0 / self.params.bpm as f64;
        self.beat_accum += dt.as_secs_f64();
        while self.beat_accum >= eighth {
            self.beat_accum -= eighth;
            self.schedule_step(now_sec, out);
        }
    }

    fn schedule_step(&mut self, now_sec: f64, out: &mut Vec<ScheduledNote>) {
        for (i, pattern) in self.patterns.iter().enumerate() {
            if self.tracks[i].muted {
                continue;
            }
            let rng = &mut self.rngs[i];
            if rng.gen::<f32>() >= pattern.trigger_probability {
                continue;
            }
            let degree = *self.params.scale.choose(&mut *rng).unwrap_or(&0);
            let midi = (self.params.root_midi + degree + pattern.octave * 12).clamp(0, 127);
            let velocity = 0.4 + rng.gen::<f32>() * 0.6;
            let duration_ms = pattern.base_duration_ms + rng.gen::<f64>() * 200.0;
            out.push(ScheduledNote {
                track_id: pattern.track_id,
                position: pattern.marker,
                note: NoteEvent::new(midi as u8, velocity, duration_ms),
                start_time_sec: now_sec + 0.02,
            });
        }
    }
}
