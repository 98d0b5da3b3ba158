#![allow(dead_code)]

use particles_core::{NoteEvent, RecordingSurface, TrackRegistry, TrackVisualConfig};
use rand::{Error, RngCore};

/// Replays a fixed list of unit-interval values as `rng.gen::<f32>()` draws.
///
/// rand's f32 sampling keeps the top 24 bits of `next_u32`, so values that
/// are exact in 24 bits come back unchanged. Cycles when exhausted.
pub struct ScriptedRng {
    values: Vec<u32>,
    next: usize,
}

impl ScriptedRng {
    pub fn new(units: &[f32]) -> Self {
        let values = units
            .iter()
            .map(|v| ((v.clamp(0.0, 1.0 - f32::EPSILON) * (1u32 << 24) as f32) as u32) << 8)
            .collect();
        Self { values, next: 0 }
    }
}

impl RngCore for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        let v = self.values[self.next % self.values.len()];
        self.next += 1;
        v
    }

    fn next_u64(&mut self) -> u64 {
        ((self.next_u32() as u64) << 32) | self.next_u32() as u64
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

pub fn note(pitch: u8, velocity: f32, duration_ms: f64) -> NoteEvent {
    NoteEvent::new(pitch, velocity, duration_ms)
}

/// Registry with tracks 0..3 using default physics and the given lifespan.
pub fn simple_registry(lifespan_ms: f64) -> TrackRegistry {
    let mut r = TrackRegistry::new();
    for id in 0..3 {
        r.insert(
            id,
            TrackVisualConfig {
                name: format!("track {id}"),
                lifespan_ms,
                ..Default::default()
            },
        );
    }
    r
}

pub fn surface() -> RecordingSurface {
    RecordingSurface::new()
}
