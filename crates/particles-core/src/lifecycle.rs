//! Owns the physics world together with the particle records riding on it.
//!
//! Every live particle has exactly one dynamic body and every dynamic body
//! belongs to exactly one live particle. All creation and removal goes
//! through `ParticleSystem`, which changes both sides together.

use crate::config::{TrackId, TrackVisualConfig};
use crate::error::RenderError;
use crate::note::NoteEvent;
use crate::particle::Particle;
use crate::physics::{BodyHandle, Material, PhysicsWorld};
use crate::surface::Surface;
use crate::variant::VariantKind;
use glam::Vec2;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Inputs for one new particle, with randomness already resolved.
pub struct SpawnRequest {
    pub track_id: TrackId,
    pub position: Vec2,
    pub size: f32,
    pub impulse: Vec2,
    pub note: NoteEvent,
    pub config: Arc<TrackVisualConfig>,
    pub variant: VariantKind,
    pub now_ms: f64,
}

/// What one `frame` call did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Particles still alive after the frame.
    pub alive: usize,
    pub expired: usize,
    /// Particles that drew successfully.
    pub drawn: usize,
    /// Particles skipped this frame because refreshing or drawing failed.
    pub failed: usize,
    pub substeps: u32,
}

#[derive(Default)]
pub struct ParticleSystem {
    world: PhysicsWorld,
    // Keyed by handle so iteration follows creation order.
    particles: BTreeMap<BodyHandle, Particle>,
}

impl ParticleSystem {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            world: PhysicsWorld::new(width, height),
            particles: BTreeMap::new(),
        }
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.world.resize(width, height);
    }

    pub fn set_running(&mut self, running: bool) {
        self.world.set_running(running);
    }

    pub fn is_running(&self) -> bool {
        self.world.is_running()
    }

    /// Advance the simulation by `dt_sec`.
    pub fn step(&mut self, dt_sec: f32) -> u32 {
        self.world.step(dt_sec)
    }

    /// Create the body, kick it and register the particle.
    pub fn spawn(&mut self, req: SpawnRequest) -> BodyHandle {
        let material = Material {
            density: req.config.density,
            restitution: req.config.restitution,
            friction: req.config.friction,
        };
        let handle = self
            .world
            .create_body(req.position, req.size, req.config.shape, material);
        self.world.apply_impulse(handle, req.impulse);
        match self.world.body(handle) {
            Some(body) => {
                let particle =
                    Particle::new(body, req.track_id, req.now_ms, req.note, req.config, req.variant);
                self.particles.insert(handle, particle);
            }
            None => log::error!("body {} vanished right after creation", handle.id()),
        }
        handle
    }

    /// Remove a particle and its body. Returns false if it was not alive.
    pub fn remove(&mut self, handle: BodyHandle) -> bool {
        let had_particle = self.particles.remove(&handle).is_some();
        let had_body = self.world.remove(handle).is_some();
        had_particle || had_body
    }

    /// Remove everything dynamic; the walls stay.
    pub fn clear(&mut self) {
        self.particles.clear();
        self.world.clear_dynamic();
    }

    /// Age, expire, refresh and draw every particle at `now_ms`.
    ///
    /// A particle whose refresh or draw fails is logged and skipped for this
    /// frame only; the rest of the frame carries on.
    pub fn frame(&mut self, now_ms: f64, surface: &mut dyn Surface) -> FrameStats {
        let mut stats = FrameStats::default();
        let mut dead: Vec<BodyHandle> = Vec::new();

        for (handle, particle) in self.particles.iter_mut() {
            if !particle.advance(now_ms) {
                dead.push(*handle);
                continue;
            }
            let Some(body) = self.world.body(*handle) else {
                log::error!("{}", RenderError::MissingBody(handle.id()));
                dead.push(*handle);
                continue;
            };
            let drawn = particle
                .refresh(body, now_ms)
                .and_then(|_| particle.render(surface));
            match drawn {
                Ok(()) => stats.drawn += 1,
                Err(e) => {
                    log::error!("track {} particle {}: {e}", particle.track_id(), handle.id());
                    stats.failed += 1;
                }
            }
        }

        for handle in dead {
            if self.particles.get(&handle).is_some_and(Particle::is_expired) {
                stats.expired += 1;
            }
            self.remove(handle);
        }
        stats.alive = self.particles.len();
        stats
    }

    /// Shift every particle of `track_id` by `delta`. Velocities are kept.
    pub fn translate_track(&mut self, track_id: TrackId, delta: Vec2) -> usize {
        let mut moved = 0;
        for (handle, _) in self.particles.iter().filter(|(_, p)| p.track_id() == track_id) {
            if self.world.translate(*handle, delta) {
                moved += 1;
            }
        }
        moved
    }

    pub fn particle(&self, handle: BodyHandle) -> Option<&Particle> {
        self.particles.get(&handle)
    }

    /// Live particles, oldest first.
    pub fn particles(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.particles.values()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn body_count(&self) -> usize {
        self.world.dynamic_count()
    }
}
