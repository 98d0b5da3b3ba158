//! A single live particle: note metadata, age bookkeeping, effects and the
//! visual state derived from its physics body each frame.

use crate::config::{Rgba, ShapeKind, TrackId, TrackVisualConfig};
use crate::constants::SIZE_BREATH_AMOUNT;
use crate::effects::{Effect, EffectContext, EffectOutput};
use crate::error::RenderError;
use crate::note::NoteEvent;
use crate::physics::{BodyHandle, RigidBody};
use crate::surface::Surface;
use crate::variant::VariantKind;
use glam::Vec2;
use smallvec::SmallVec;
use std::f32::consts::PI;
use std::sync::Arc;

/// Everything needed to draw a particle this frame.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualState {
    pub position: Vec2,
    pub rotation: f32,
    pub size: f32,
    pub color: Rgba,
    pub opacity: f32,
    /// Drawn outline, fixed by the particle variant.
    pub shape: ShapeKind,
    pub within_note: bool,
}

pub struct Particle {
    body: BodyHandle,
    track_id: TrackId,
    created_at_ms: f64,
    note_start_ms: f64,
    note: NoteEvent,
    config: Arc<TrackVisualConfig>,
    variant: VariantKind,
    base_size: f32,
    effects: SmallVec<[Effect; 2]>,
    outputs: SmallVec<[EffectOutput; 2]>,
    age_ms: f64,
    last_update_ms: f64,
    visual: VisualState,
}

impl Particle {
    /// Wrap a freshly created body. `body` must already be in the world.
    pub fn new(
        body: &RigidBody,
        track_id: TrackId,
        now_ms: f64,
        note: NoteEvent,
        config: Arc<TrackVisualConfig>,
        variant: VariantKind,
    ) -> Self {
        let effects = build_effects(&config, variant, &note);
        let shape = variant.spec().shape;
        let base_size = body.shape().size();
        let visual = VisualState {
            position: body.position(),
            rotation: body.angle(),
            size: base_size,
            color: config.color,
            opacity: 1.0,
            shape,
            within_note: note.duration_ms > 0.0,
        };
        Self {
            body: body.handle(),
            track_id,
            created_at_ms: now_ms,
            note_start_ms: now_ms,
            note,
            config,
            variant,
            base_size,
            effects,
            outputs: SmallVec::new(),
            age_ms: 0.0,
            last_update_ms: now_ms,
            visual,
        }
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }
    pub fn track_id(&self) -> TrackId {
        self.track_id
    }
    pub fn created_at_ms(&self) -> f64 {
        self.created_at_ms
    }
    pub fn note(&self) -> &NoteEvent {
        &self.note
    }
    pub fn config(&self) -> &Arc<TrackVisualConfig> {
        &self.config
    }
    pub fn variant(&self) -> VariantKind {
        self.variant
    }
    pub fn base_size(&self) -> f32 {
        self.base_size
    }
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }
    pub fn outputs(&self) -> &[EffectOutput] {
        &self.outputs
    }
    pub fn visual(&self) -> &VisualState {
        &self.visual
    }
    pub fn age_ms(&self) -> f64 {
        self.age_ms
    }
    pub fn lifespan_ms(&self) -> f64 {
        self.config.lifespan_ms
    }

    pub fn is_expired(&self) -> bool {
        self.age_ms > self.config.lifespan_ms
    }

    /// Styling window: the note is still sounding.
    pub fn within_note_duration(&self, now_ms: f64) -> bool {
        let window = self.note.duration_ms * self.config.note_response.duration_scale as f64;
        now_ms - self.note_start_ms < window
    }

    /// Advance the age to `now_ms`. Age never decreases even if the clock
    /// does. Returns false once the particle has outlived its lifespan.
    pub fn advance(&mut self, now_ms: f64) -> bool {
        let age = now_ms - self.created_at_ms;
        if age.is_finite() && age > self.age_ms {
            self.age_ms = age;
        }
        !self.is_expired()
    }

    /// Recompute the visual state from `body` and run every effect.
    pub fn refresh(&mut self, body: &RigidBody, now_ms: f64) -> Result<(), RenderError> {
        if !body.is_finite() {
            return Err(RenderError::NonFinite {
                what: "body state",
                body: self.body.id(),
            });
        }
        let dt_ms = (now_ms - self.last_update_ms).max(0.0) as f32;
        self.last_update_ms = self.last_update_ms.max(now_ms);

        let progress = (self.age_ms / self.config.lifespan_ms).clamp(0.0, 1.0) as f32;
        let within_note = self.within_note_duration(now_ms);
        self.visual = VisualState {
            position: body.position(),
            rotation: body.angle(),
            size: self.base_size * (1.0 - SIZE_BREATH_AMOUNT * (PI * progress).sin()),
            color: if within_note {
                self.config.color
            } else {
                self.config.inactive_color
            },
            opacity: if self.config.fade_out {
                (1.0 - progress).max(0.0)
            } else {
                1.0
            },
            shape: self.visual.shape,
            within_note,
        };

        let ctx = EffectContext {
            position: self.visual.position,
            note_velocity: self.note.velocity,
            size: self.visual.size,
            opacity: self.visual.opacity,
        };
        self.outputs.clear();
        for effect in self.effects.iter_mut() {
            if let Some(out) = effect.update(&ctx, dt_ms) {
                self.outputs.push(out);
            }
        }
        Ok(())
    }

    pub fn render(&self, surface: &mut dyn Surface) -> Result<(), RenderError> {
        self.variant.draw(surface, &self.visual, &self.outputs)
    }
}

/// Instantiate the config's effects, then the variant's signature effect
/// if the config did not already ask for that kind.
fn build_effects(
    config: &TrackVisualConfig,
    variant: VariantKind,
    note: &NoteEvent,
) -> SmallVec<[Effect; 2]> {
    let mut effects: SmallVec<[Effect; 2]> = SmallVec::new();
    for desc in &config.effects {
        match Effect::from_descriptor(desc, note.velocity) {
            Ok(e) => effects.push(e),
            Err(e) => log::warn!("track '{}': {e}, effect skipped", config.name),
        }
    }
    let signature = variant.spec().signature;
    if !effects.iter().any(|e| e.kind() == signature) {
        let params = variant.signature_params(note);
        effects.push(Effect::from_params(signature, &params, note.velocity));
    }
    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EffectDescriptor, EffectKind, EffectParams};
    use crate::physics::{Material, PhysicsWorld};

    fn spawn(config: TrackVisualConfig, variant: VariantKind) -> (PhysicsWorld, Particle) {
        let mut world = PhysicsWorld::new(400.0, 300.0);
        let h = world.create_body(
            Vec2::new(100.0, 100.0),
            20.0,
            config.shape,
            Material::default(),
        );
        let note = NoteEvent::new(64, 0.5, 200.0);
        let p = Particle::new(world.body(h).unwrap(), 0, 0.0, note, Arc::new(config), variant);
        (world, p)
    }

    #[test]
    fn signature_effect_is_added_once() {
        let (_, p) = spawn(TrackVisualConfig::default(), VariantKind::Lead);
        assert_eq!(p.effects().len(), 1);
        assert_eq!(p.effects()[0].kind(), EffectKind::Trail);

        let cfg = TrackVisualConfig {
            effects: vec![EffectDescriptor::new(EffectKind::Trail, EffectParams::default())],
            ..Default::default()
        };
        let (_, p) = spawn(cfg, VariantKind::Lead);
        assert_eq!(p.effects().len(), 1);
    }

    #[test]
    fn unknown_effect_is_skipped() {
        let cfg = TrackVisualConfig {
            effects: vec![EffectDescriptor {
                kind: "sparkle".into(),
                params: EffectParams::default(),
            }],
            ..Default::default()
        };
        let (_, p) = spawn(cfg, VariantKind::Bass);
        assert_eq!(p.effects().len(), 1);
        assert_eq!(p.effects()[0].kind(), EffectKind::Pulse);
    }

    #[test]
    fn note_duration_only_changes_color() {
        let cfg = TrackVisualConfig {
            color: Rgba::new(1.0, 0.0, 0.0, 1.0),
            inactive_color: Rgba::BLACK,
            ..Default::default()
        };
        let (world, mut p) = spawn(cfg, VariantKind::Bass);
        let body = world.body(p.body()).unwrap();
        assert!(p.advance(100.0));
        p.refresh(body, 100.0).unwrap();
        assert!(p.visual().within_note);
        assert_eq!(p.visual().color.r, 1.0);

        assert!(p.advance(500.0));
        p.refresh(body, 500.0).unwrap();
        assert!(!p.visual().within_note);
        assert_eq!(p.visual().color, Rgba::BLACK);
        assert!(!p.is_expired());
    }

    #[test]
    fn variant_decides_the_drawn_shape() {
        let cfg = TrackVisualConfig {
            shape: ShapeKind::Circle,
            ..Default::default()
        };
        let (world, mut p) = spawn(cfg, VariantKind::Drum);
        assert_eq!(world.body(p.body()).unwrap().shape().kind(), ShapeKind::Circle);
        assert_eq!(p.visual().shape, ShapeKind::Square);

        let body = world.body(p.body()).unwrap();
        p.advance(50.0);
        p.refresh(body, 50.0).unwrap();
        let mut surface = crate::surface::RecordingSurface::new();
        p.render(&mut surface).unwrap();
        use crate::surface::DrawCommand;
        assert!(surface
            .commands
            .iter()
            .any(|c| matches!(c, DrawCommand::FillRect { .. })));
        assert!(!surface
            .commands
            .iter()
            .any(|c| matches!(c, DrawCommand::FillCircle { .. })));
    }

    #[test]
    fn size_breathes_and_opacity_fades() {
        let (world, mut p) = spawn(TrackVisualConfig::default(), VariantKind::Bass);
        let body = world.body(p.body()).unwrap();
        p.advance(1000.0);
        p.refresh(body, 1000.0).unwrap();
        assert!((p.visual().opacity - 0.5).abs() < 1e-6);
        assert!((p.visual().size - 20.0 * 0.8).abs() < 1e-4);
    }
}
