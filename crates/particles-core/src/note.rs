use crate::constants::{DEFAULT_NOTE_VELOCITY, MAX_PITCH};

/// A note trigger as delivered by the sequencer.
///
/// Fields:
/// - `pitch`: MIDI note number, 0..=127
/// - `velocity`: normalized loudness 0..1
/// - `duration_ms`: musical length of the note, only used for styling
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteEvent {
    pub pitch: u8,
    pub velocity: f32,
    pub duration_ms: f64,
}

impl Default for NoteEvent {
    fn default() -> Self {
        Self {
            pitch: 60,
            velocity: DEFAULT_NOTE_VELOCITY,
            duration_ms: 0.0,
        }
    }
}

impl NoteEvent {
    pub fn new(pitch: u8, velocity: f32, duration_ms: f64) -> Self {
        Self {
            pitch,
            velocity,
            duration_ms,
        }
    }

    /// Clamp every field into its valid range.
    ///
    /// A missing velocity (zero, negative or non-finite) becomes the default
    /// velocity, so a silent or malformed event still gets a normal-sized
    /// particle.
    pub fn normalized(self) -> Self {
        let velocity = if self.velocity.is_finite() && self.velocity > 0.0 {
            self.velocity.min(1.0)
        } else {
            DEFAULT_NOTE_VELOCITY
        };
        let duration_ms = if self.duration_ms.is_finite() {
            self.duration_ms.max(0.0)
        } else {
            0.0
        };
        Self {
            pitch: self.pitch.min(MAX_PITCH),
            velocity,
            duration_ms,
        }
    }

    #[inline]
    pub fn velocity_factor(&self) -> f32 {
        self.velocity
    }

    #[inline]
    pub fn pitch_factor(&self) -> f32 {
        self.pitch as f32 / MAX_PITCH as f32
    }
}

pub fn midi_to_hz(midi: f32) -> f32 {
    440.0 * (2.0_f32).powf((midi - 69.0) / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_clamps_out_of_range_fields() {
        let n = NoteEvent::new(200, 3.0, -5.0).normalized();
        assert_eq!(n.pitch, 127);
        assert_eq!(n.velocity, 1.0);
        assert_eq!(n.duration_ms, 0.0);
    }

    #[test]
    fn normalized_repairs_nan_velocity() {
        let n = NoteEvent::new(60, f32::NAN, f64::NAN).normalized();
        assert_eq!(n.velocity, DEFAULT_NOTE_VELOCITY);
        assert_eq!(n.duration_ms, 0.0);
    }

    #[test]
    fn zero_velocity_reads_as_default() {
        assert_eq!(NoteEvent::new(60, 0.0, 100.0).normalized().velocity, DEFAULT_NOTE_VELOCITY);
        assert_eq!(NoteEvent::new(60, -0.3, 100.0).normalized().velocity, DEFAULT_NOTE_VELOCITY);
        assert_eq!(NoteEvent::new(60, 0.05, 100.0).normalized().velocity, 0.05);
    }

    #[test]
    fn pitch_factor_spans_unit_range() {
        assert_eq!(NoteEvent::new(0, 0.5, 0.0).pitch_factor(), 0.0);
        assert_eq!(NoteEvent::new(127, 0.5, 0.0).pitch_factor(), 1.0);
    }
}
