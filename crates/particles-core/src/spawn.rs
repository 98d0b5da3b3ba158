//! Where a particle is born, how big it is and how hard it is kicked.
//!
//! Every function here is pure apart from the random stream it is handed, so
//! tests can feed scripted values and check the formulas exactly.

use crate::config::{MotionConfig, SpawnConfig, TrackVisualConfig};
use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

/// Spawn radius after the track's pitch response is applied.
#[inline]
pub fn effective_spawn_radius(spawn: &SpawnConfig, pitch_effect: f32, pitch_factor: f32) -> f32 {
    (spawn.radius * (0.5 + pitch_factor * pitch_effect)).max(0.0)
}

/// Random offset from the track marker.
///
/// Draws the angle first, then the distance. The distance exponent
/// `1 / (spread + 0.1)` pulls samples toward the center as `spread` shrinks.
pub fn compute_spawn_offset<R: Rng + ?Sized>(
    spawn: &SpawnConfig,
    pitch_effect: f32,
    pitch_factor: f32,
    rng: &mut R,
) -> Vec2 {
    let radius = effective_spawn_radius(spawn, pitch_effect, pitch_factor);
    if radius <= 0.0 || !radius.is_finite() {
        return Vec2::ZERO;
    }
    let angle = rng.gen::<f32>() * TAU;
    let exponent = 1.0 / (spawn.spread.max(0.0) + 0.1);
    let distance = radius * rng.gen::<f32>().powf(exponent);
    Vec2::from_angle(angle) * distance
}

/// Vertical bias after high pitches have pushed it sideways.
#[inline]
pub fn pitch_adjusted_bias(motion: &MotionConfig, pitch_effect: f32, pitch_factor: f32) -> f32 {
    (motion.vertical_bias * (1.0 - pitch_factor * pitch_effect)).clamp(0.0, 1.0)
}

/// Initial impulse for a new particle. Negative y is up.
///
/// Draws the random factor first, then the horizontal jitter.
pub fn compute_impulse<R: Rng + ?Sized>(
    motion: &MotionConfig,
    pitch_effect: f32,
    velocity_factor: f32,
    pitch_factor: f32,
    rng: &mut R,
) -> Vec2 {
    let random_factor = 1.0 + (rng.gen::<f32>() - 0.5) * 2.0 * motion.randomness;
    let base = motion.force * random_factor * (0.8 + velocity_factor * 0.4);
    let bias = pitch_adjusted_bias(motion, pitch_effect, pitch_factor);
    let vertical = -base * bias;
    let horizontal = base * (1.0 - bias) * (rng.gen::<f32>() - 0.5) * motion.horizontal_spread;
    Vec2::new(horizontal, vertical)
}

/// Particle size for a note of the given velocity.
///
/// The result may be degenerate (zero or negative) for extreme
/// `size_scale` values; body creation handles that.
pub fn compute_size(config: &TrackVisualConfig, velocity_factor: f32) -> f32 {
    let base = config.min_size + (config.max_size - config.min_size) * velocity_factor;
    base * (1.0 + (velocity_factor - 0.5) * config.note_response.size_scale)
}
