//! Per-particle visual modulators.
//!
//! Effects never touch physics. Each frame a particle feeds its effects the
//! current position, note velocity, size and opacity and gets back an
//! `EffectOutput` (or nothing) that the particle's variant consumes when it
//! draws. Effect state lives exactly as long as the particle that owns it.

use crate::config::{EffectDescriptor, EffectKind, EffectParams, Rgba};
use crate::error::{ConfigError, RenderError};
use crate::surface::Surface;
use glam::Vec2;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::f32::consts::TAU;

/// Per-frame inputs shared by all effects of one particle.
#[derive(Clone, Copy, Debug)]
pub struct EffectContext {
    pub position: Vec2,
    pub note_velocity: f32,
    pub size: f32,
    pub opacity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailPoint {
    pub position: Vec2,
    pub opacity: f32,
}

pub type TrailPoints = SmallVec<[TrailPoint; 16]>;

/// What an effect contributes to this frame's drawing.
#[derive(Clone, Debug, PartialEq)]
pub enum EffectOutput {
    Pulse { scale: f32 },
    Shockwave { radius: f32, opacity: f32 },
    /// Newest point first, world coordinates.
    Trail { points: TrailPoints },
    Glow { radius: f32, opacity: f32 },
}

impl EffectOutput {
    /// Trail points are absolute; everything else is drawn around the particle.
    pub fn is_world_space(&self) -> bool {
        matches!(self, Self::Trail { .. })
    }

    /// Draw this output. Local outputs expect the surface to be translated
    /// to the particle center already.
    pub fn render(
        &self,
        surface: &mut dyn Surface,
        color: Rgba,
        size: f32,
    ) -> Result<(), RenderError> {
        match self {
            // Pulse only rescales the particle's own shape.
            Self::Pulse { .. } => Ok(()),
            Self::Shockwave { radius, opacity } => {
                surface.set_stroke(Rgba::WHITE.with_alpha(*opacity), 2.0);
                surface.stroke_circle(Vec2::ZERO, *radius)
            }
            Self::Trail { points } => {
                let n = points.len() as f32;
                for (i, p) in points.iter().enumerate() {
                    let dot = size * 0.5 * (1.0 - i as f32 / n);
                    surface.set_fill(color.with_alpha(p.opacity * color.a));
                    surface.fill_circle(p.position, dot / 2.0)?;
                }
                Ok(())
            }
            Self::Glow { radius, opacity } => {
                surface.set_fill(color.with_alpha(*opacity * 0.35));
                surface.fill_circle(Vec2::ZERO, *radius)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Pulse {
    pub frequency: f32,
    pub amplitude: f32,
    pub velocity_influence: f32,
    phase: f32,
}

impl Pulse {
    pub fn new(frequency: f32, amplitude: f32, velocity_influence: f32) -> Self {
        Self {
            frequency,
            amplitude,
            velocity_influence,
            phase: 0.0,
        }
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    fn update(&mut self, ctx: &EffectContext, dt_ms: f32) -> Option<EffectOutput> {
        self.phase = (self.phase + dt_ms / 1000.0 * self.frequency * TAU) % TAU;
        let amplitude = self.amplitude * (1.0 + ctx.note_velocity * self.velocity_influence);
        Some(EffectOutput::Pulse {
            scale: 1.0 + self.phase.sin() * amplitude,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Shockwave {
    pub duration_ms: f32,
    pub max_radius: f32,
    elapsed_ms: f32,
    spent: bool,
}

impl Shockwave {
    pub fn new(duration_ms: f32, max_radius: f32) -> Self {
        Self {
            duration_ms: duration_ms.max(f32::EPSILON),
            max_radius,
            elapsed_ms: 0.0,
            spent: false,
        }
    }

    pub fn is_spent(&self) -> bool {
        self.spent
    }

    fn update(&mut self, dt_ms: f32) -> Option<EffectOutput> {
        if self.spent {
            return None;
        }
        self.elapsed_ms += dt_ms.max(0.0);
        let progress = (self.elapsed_ms / self.duration_ms).min(1.0);
        let opacity = 1.0 - progress;
        if opacity <= 0.0 {
            self.spent = true;
            return None;
        }
        Some(EffectOutput::Shockwave {
            radius: self.max_radius * progress,
            opacity,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Trail {
    pub max_points: usize,
    pub fade_speed: f32,
    pub min_opacity: f32,
    points: VecDeque<TrailPoint>,
}

impl Trail {
    pub fn new(max_points: usize, fade_speed: f32, min_opacity: f32) -> Self {
        let max_points = max_points.max(1);
        Self {
            max_points,
            fade_speed,
            min_opacity,
            points: VecDeque::with_capacity(max_points),
        }
    }

    pub fn points(&self) -> impl Iterator<Item = &TrailPoint> {
        self.points.iter()
    }

    fn update(&mut self, ctx: &EffectContext, dt_ms: f32) -> Option<EffectOutput> {
        let fade = self.fade_speed * dt_ms / 1000.0;
        for p in self.points.iter_mut() {
            p.opacity = (p.opacity - fade).max(self.min_opacity);
        }
        self.points.push_front(TrailPoint {
            position: ctx.position,
            opacity: 1.0,
        });
        self.points.truncate(self.max_points);
        Some(EffectOutput::Trail {
            points: self.points.iter().copied().collect(),
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Glow {
    pub intensity: f32,
    pub size: f32,
}

impl Glow {
    fn update(&self, ctx: &EffectContext) -> Option<EffectOutput> {
        Some(EffectOutput::Glow {
            radius: ctx.size * self.size / 2.0,
            opacity: (self.intensity * ctx.opacity).clamp(0.0, 1.0),
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Pulse(Pulse),
    Shockwave(Shockwave),
    Trail(Trail),
    Glow(Glow),
}

impl Effect {
    /// Build an effect from config, filling unspecified params with defaults.
    ///
    /// `note_velocity` widens the shockwave ring at attach time.
    pub fn from_descriptor(desc: &EffectDescriptor, note_velocity: f32) -> Result<Self, ConfigError> {
        Ok(Self::from_params(desc.kind()?, &desc.params, note_velocity))
    }

    pub fn from_params(kind: EffectKind, p: &EffectParams, note_velocity: f32) -> Self {
        match kind {
            EffectKind::Pulse => Self::Pulse(Pulse::new(
                p.frequency.unwrap_or(1.0),
                p.amplitude.unwrap_or(0.2),
                p.velocity_influence.unwrap_or(1.0),
            )),
            EffectKind::Shockwave => {
                let influence = p.velocity_influence.unwrap_or(1.0);
                Self::Shockwave(Shockwave::new(
                    p.duration_ms.unwrap_or(500.0),
                    p.max_radius.unwrap_or(100.0) * (1.0 + note_velocity * influence),
                ))
            }
            EffectKind::Trail => Self::Trail(Trail::new(
                p.max_points.unwrap_or(10),
                p.fade_speed.unwrap_or(0.1),
                p.min_opacity.unwrap_or(0.1),
            )),
            EffectKind::Glow => Self::Glow(Glow {
                intensity: p.intensity.unwrap_or(0.5),
                size: p.size.unwrap_or(1.5),
            }),
        }
    }

    pub fn kind(&self) -> EffectKind {
        match self {
            Self::Pulse(_) => EffectKind::Pulse,
            Self::Shockwave(_) => EffectKind::Shockwave,
            Self::Trail(_) => EffectKind::Trail,
            Self::Glow(_) => EffectKind::Glow,
        }
    }

    /// Advance by `dt_ms`. `None` means nothing to draw this frame.
    pub fn update(&mut self, ctx: &EffectContext, dt_ms: f32) -> Option<EffectOutput> {
        match self {
            Self::Pulse(e) => e.update(ctx, dt_ms),
            Self::Shockwave(e) => e.update(dt_ms),
            Self::Trail(e) => e.update(ctx, dt_ms),
            Self::Glow(e) => e.update(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> EffectContext {
        EffectContext {
            position: Vec2::new(10.0, 20.0),
            note_velocity: 0.5,
            size: 40.0,
            opacity: 1.0,
        }
    }

    #[test]
    fn pulse_starts_near_unity() {
        let mut e = Effect::from_params(EffectKind::Pulse, &EffectParams::default(), 0.5);
        match e.update(&ctx(), 0.0) {
            Some(EffectOutput::Pulse { scale }) => assert!((scale - 1.0).abs() < 1e-6),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn glow_follows_particle_opacity() {
        let mut e = Effect::from_params(EffectKind::Glow, &EffectParams::default(), 0.5);
        let mut c = ctx();
        c.opacity = 0.5;
        match e.update(&c, 16.0) {
            Some(EffectOutput::Glow { radius, opacity }) => {
                assert!((radius - 30.0).abs() < 1e-5);
                assert!((opacity - 0.25).abs() < 1e-6);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
