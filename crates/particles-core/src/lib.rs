//! Note-driven 2D particle animation.
//!
//! Every note a track plays spawns a physics-driven particle near that
//! track's marker. Particles are sized and kicked according to the note,
//! styled per track, decorated by small visual effects and removed when
//! their lifespan runs out. Hosts own an [`AnimationEngine`], feed it
//! triggers and marker moves, and call `update` once per frame with a
//! [`Surface`] to draw on.

pub mod config;
pub mod constants;
pub mod effects;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod note;
pub mod particle;
pub mod physics;
pub mod sequencer;
pub mod spawn;
pub mod surface;
pub mod variant;

pub use config::{
    EffectDescriptor, EffectKind, EffectParams, MotionConfig, NoteResponse, Rgba, ShapeKind,
    SpawnConfig, TrackId, TrackRegistry, TrackVisualConfig,
};
pub use effects::{Effect, EffectContext, EffectOutput};
pub use engine::{AnimationEngine, EngineCommand};
pub use error::{ConfigError, RenderError};
pub use lifecycle::{FrameStats, ParticleSystem, SpawnRequest};
pub use note::{midi_to_hz, NoteEvent};
pub use particle::{Particle, VisualState};
pub use physics::{BodyHandle, PhysicsWorld};
pub use sequencer::{ScheduledNote, Sequencer, SequencerParams, TrackPattern};
pub use surface::{DrawCommand, RecordingSurface, Surface};
pub use variant::VariantKind;
