//! Track-specific particle behavior.
//!
//! A variant is picked once when a particle spawns and decides which effect
//! is its signature and how the particle is drawn. Dispatch goes through a
//! static table of plain functions.

use crate::config::{EffectKind, EffectParams, ShapeKind, TrackId, TrackVisualConfig};
use crate::effects::EffectOutput;
use crate::error::{ConfigError, RenderError};
use crate::note::NoteEvent;
use crate::particle::VisualState;
use crate::surface::Surface;
use glam::Vec2;
use serde::Serialize;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantKind {
    /// Pulsing circle.
    Bass,
    /// Square with a shockwave ring.
    Drum,
    /// Triangle dragging a trail.
    Lead,
}

impl FromStr for VariantKind {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bass" => Ok(Self::Bass),
            "drum" | "drums" | "percussion" => Ok(Self::Drum),
            "lead" | "melodic" => Ok(Self::Lead),
            _ => Err(ConfigError::UnknownVariant(s.to_string())),
        }
    }
}

type DrawFn = fn(&mut dyn Surface, &VisualState, &[EffectOutput]) -> Result<(), RenderError>;

pub struct VariantSpec {
    pub kind: VariantKind,
    /// Outline every particle of this variant is drawn with. The body keeps
    /// the config shape for collisions.
    pub shape: ShapeKind,
    pub signature: EffectKind,
    pub draw: DrawFn,
}

static VARIANTS: [VariantSpec; 3] = [
    VariantSpec {
        kind: VariantKind::Bass,
        shape: ShapeKind::Circle,
        signature: EffectKind::Pulse,
        draw: draw_bass,
    },
    VariantSpec {
        kind: VariantKind::Drum,
        shape: ShapeKind::Square,
        signature: EffectKind::Shockwave,
        draw: draw_drum,
    },
    VariantSpec {
        kind: VariantKind::Lead,
        shape: ShapeKind::Triangle,
        signature: EffectKind::Trail,
        draw: draw_lead,
    },
];

impl VariantKind {
    pub fn spec(self) -> &'static VariantSpec {
        match self {
            Self::Bass => &VARIANTS[0],
            Self::Drum => &VARIANTS[1],
            Self::Lead => &VARIANTS[2],
        }
    }

    /// Variant for a track: explicit config first, then the track id.
    pub fn resolve(config: &TrackVisualConfig, track_id: TrackId) -> Self {
        if let Some(v) = config.variant {
            return v;
        }
        match track_id {
            0 => Self::Bass,
            1 => Self::Drum,
            2 => Self::Lead,
            _ => {
                log::warn!("no particle variant for track {track_id}, using bass");
                Self::Bass
            }
        }
    }

    /// Parameters for the signature effect when the config does not ask for
    /// it explicitly; derived from the note that spawned the particle.
    pub fn signature_params(self, note: &NoteEvent) -> EffectParams {
        match self {
            Self::Bass => EffectParams {
                frequency: Some(note.pitch_factor() * 2.0),
                amplitude: Some(note.velocity * 0.3),
                ..Default::default()
            },
            Self::Drum => EffectParams {
                duration_ms: Some(300.0),
                ..Default::default()
            },
            Self::Lead => EffectParams {
                max_points: Some(10),
                fade_speed: Some(note.velocity),
                ..Default::default()
            },
        }
    }

    pub fn draw(
        self,
        surface: &mut dyn Surface,
        state: &VisualState,
        outputs: &[EffectOutput],
    ) -> Result<(), RenderError> {
        (self.spec().draw)(surface, state, outputs)
    }
}

fn fill_shape(surface: &mut dyn Surface, shape: ShapeKind, size: f32) -> Result<(), RenderError> {
    let half = size / 2.0;
    match shape {
        ShapeKind::Circle => surface.fill_circle(Vec2::ZERO, half),
        ShapeKind::Square => surface.fill_rect(Vec2::splat(-half), Vec2::splat(size)),
        ShapeKind::Triangle => surface.fill_triangle(
            Vec2::new(0.0, -half),
            Vec2::new(half, half),
            Vec2::new(-half, half),
        ),
    }
}

/// Draw the particle body at its transform, with local effects around it.
///
/// Glows go under the shape, rings over it.
fn draw_local(
    surface: &mut dyn Surface,
    state: &VisualState,
    outputs: &[EffectOutput],
    scale: f32,
) -> Result<(), RenderError> {
    surface.save();
    surface.translate(state.position);
    surface.rotate(state.rotation);
    let result = (|| -> Result<(), RenderError> {
        for out in outputs.iter().filter(|o| matches!(o, EffectOutput::Glow { .. })) {
            out.render(surface, state.color, state.size)?;
        }
        surface.set_fill(state.color.with_alpha(state.opacity * state.color.a));
        fill_shape(surface, state.shape, state.size * scale)?;
        for out in outputs
            .iter()
            .filter(|o| !o.is_world_space() && !matches!(o, EffectOutput::Glow { .. }))
        {
            out.render(surface, state.color, state.size)?;
        }
        Ok(())
    })();
    surface.restore();
    result
}

fn draw_world(
    surface: &mut dyn Surface,
    state: &VisualState,
    outputs: &[EffectOutput],
) -> Result<(), RenderError> {
    for out in outputs.iter().filter(|o| o.is_world_space()) {
        out.render(surface, state.color.with_alpha(state.opacity), state.size)?;
    }
    Ok(())
}

fn draw_bass(
    surface: &mut dyn Surface,
    state: &VisualState,
    outputs: &[EffectOutput],
) -> Result<(), RenderError> {
    let scale = outputs
        .iter()
        .find_map(|o| match o {
            EffectOutput::Pulse { scale } => Some(*scale),
            _ => None,
        })
        .unwrap_or(1.0);
    draw_world(surface, state, outputs)?;
    draw_local(surface, state, outputs, scale)
}

fn draw_drum(
    surface: &mut dyn Surface,
    state: &VisualState,
    outputs: &[EffectOutput],
) -> Result<(), RenderError> {
    draw_world(surface, state, outputs)?;
    draw_local(surface, state, outputs, 1.0)
}

fn draw_lead(
    surface: &mut dyn Surface,
    state: &VisualState,
    outputs: &[EffectOutput],
) -> Result<(), RenderError> {
    // Trail dots use the full track color so the path stays readable after
    // the body itself has faded.
    for out in outputs.iter().filter(|o| o.is_world_space()) {
        out.render(surface, state.color, state.size)?;
    }
    draw_local(surface, state, outputs, 1.0)
}
