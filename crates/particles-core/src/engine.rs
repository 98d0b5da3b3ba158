//! The host-facing animation engine.
//!
//! Hosts call `trigger_animation` and `update_track_position` whenever they
//! like; both only enqueue a command. The queue is drained at the start of
//! the next `update`, so spawning and translation never interleave with a
//! physics step or a particle sweep.

use crate::config::{Rgba, TrackId, TrackRegistry};
use crate::constants::*;
use crate::lifecycle::{FrameStats, ParticleSystem, SpawnRequest};
use crate::note::NoteEvent;
use crate::particle::Particle;
use crate::physics::PhysicsWorld;
use crate::spawn::{compute_impulse, compute_size, compute_spawn_offset};
use crate::surface::Surface;
use crate::variant::VariantKind;
use fnv::FnvHashMap;
use glam::Vec2;
use instant::Instant;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;

#[derive(Clone, Debug, PartialEq)]
pub enum EngineCommand {
    Trigger {
        track_id: TrackId,
        position: Vec2,
        note: NoteEvent,
    },
    MoveTrack {
        track_id: TrackId,
        position: Vec2,
    },
}

pub struct AnimationEngine {
    registry: TrackRegistry,
    system: ParticleSystem,
    queue: VecDeque<EngineCommand>,
    dropped_commands: u64,
    /// Last known marker position per track.
    markers: FnvHashMap<TrackId, Vec2>,
    rng: StdRng,
    epoch: Instant,
    last_frame_ms: Option<f64>,
    debug: bool,
}

impl AnimationEngine {
    pub fn new(registry: TrackRegistry, width: f32, height: f32) -> Self {
        Self::with_rng(registry, width, height, StdRng::from_entropy())
    }

    /// Deterministic engine: the same seed and inputs give the same frames.
    pub fn with_seed(registry: TrackRegistry, width: f32, height: f32, seed: u64) -> Self {
        Self::with_rng(registry, width, height, StdRng::seed_from_u64(seed))
    }

    fn with_rng(registry: TrackRegistry, width: f32, height: f32, rng: StdRng) -> Self {
        log::info!(
            "animation engine {}x{} with {} tracks",
            width,
            height,
            registry.len()
        );
        Self {
            registry,
            system: ParticleSystem::new(width, height),
            queue: VecDeque::with_capacity(64),
            dropped_commands: 0,
            markers: FnvHashMap::default(),
            rng,
            epoch: Instant::now(),
            last_frame_ms: None,
            debug: false,
        }
    }

    /// Queue a particle spawn for `track_id` near `(x, y)`.
    ///
    /// Unknown tracks are reported when the command is applied, not here.
    pub fn trigger_animation(&mut self, track_id: TrackId, x: f32, y: f32, note: NoteEvent) {
        self.enqueue(EngineCommand::Trigger {
            track_id,
            position: Vec2::new(x, y),
            note,
        });
    }

    /// Queue a move of the track marker. Live particles of the track follow
    /// by the same displacement on the next update.
    pub fn update_track_position(&mut self, track_id: TrackId, x: f32, y: f32) {
        let position = Vec2::new(x, y);
        if !position.is_finite() {
            log::warn!("ignoring non-finite marker position for track {track_id}");
            return;
        }
        self.enqueue(EngineCommand::MoveTrack { track_id, position });
    }

    fn enqueue(&mut self, cmd: EngineCommand) {
        // Consecutive moves of one track collapse into the latest.
        if let EngineCommand::MoveTrack { track_id, position } = &cmd {
            if let Some(EngineCommand::MoveTrack {
                track_id: last,
                position: pending,
            }) = self.queue.back_mut()
            {
                if *last == *track_id {
                    *pending = *position;
                    return;
                }
            }
        }
        if self.queue.len() >= COMMAND_QUEUE_CAPACITY {
            self.dropped_commands += 1;
            log::warn!(
                "command queue full ({COMMAND_QUEUE_CAPACITY}), dropping {cmd:?} ({} dropped so far)",
                self.dropped_commands
            );
            return;
        }
        self.queue.push_back(cmd);
    }

    /// Apply every queued command in arrival order, stamping spawns with
    /// `now_ms`. Returns how many commands were applied.
    pub fn apply_pending(&mut self, now_ms: f64) -> usize {
        let mut applied = 0;
        while let Some(cmd) = self.queue.pop_front() {
            match cmd {
                EngineCommand::Trigger {
                    track_id,
                    position,
                    note,
                } => {
                    if self.spawn_particle(track_id, position, note, now_ms) {
                        applied += 1;
                    }
                }
                EngineCommand::MoveTrack { track_id, position } => {
                    if self.move_track(track_id, position) {
                        applied += 1;
                    }
                }
            }
        }
        applied
    }

    fn spawn_particle(&mut self, track_id: TrackId, marker: Vec2, note: NoteEvent, now_ms: f64) -> bool {
        let config = match self.registry.get(track_id) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("{e}, trigger ignored");
                return false;
            }
        };
        if !marker.is_finite() {
            log::warn!("non-finite trigger position for track {track_id}, trigger ignored");
            return false;
        }
        self.markers.insert(track_id, marker);

        let note = note.normalized();
        let velocity_factor = note.velocity_factor();
        let pitch_factor = note.pitch_factor();
        let pitch_effect = config.note_response.pitch_effect;

        let size = compute_size(&config, velocity_factor);
        let offset = compute_spawn_offset(&config.spawn, pitch_effect, pitch_factor, &mut self.rng);
        let impulse = compute_impulse(
            &config.motion,
            pitch_effect,
            velocity_factor,
            pitch_factor,
            &mut self.rng,
        );
        let variant = VariantKind::resolve(&config, track_id);

        self.system.set_running(true);
        let handle = self.system.spawn(SpawnRequest {
            track_id,
            position: marker + offset,
            size,
            impulse,
            note,
            config,
            variant,
            now_ms,
        });
        log::debug!(
            "track {track_id} pitch {} vel {:.2}: body {} size {size:.1}",
            note.pitch,
            note.velocity,
            handle.id()
        );
        true
    }

    fn move_track(&mut self, track_id: TrackId, position: Vec2) -> bool {
        if !self.registry.contains(track_id) {
            log::warn!("marker move for unknown track {track_id} ignored");
            return false;
        }
        match self.markers.insert(track_id, position) {
            Some(previous) => {
                let delta = position - previous;
                if delta != Vec2::ZERO {
                    self.system.translate_track(track_id, delta);
                }
            }
            None => log::debug!("first marker position for track {track_id}"),
        }
        true
    }

    /// Milliseconds since the engine was created.
    pub fn now_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    /// Per-frame entry point using the engine's own clock.
    pub fn update(&mut self, surface: &mut dyn Surface) -> FrameStats {
        let now = self.now_ms();
        self.update_at(now, surface)
    }

    /// One frame at an explicit timestamp: drain commands, step physics by
    /// the time since the previous frame, then age and draw particles.
    pub fn update_at(&mut self, now_ms: f64, surface: &mut dyn Surface) -> FrameStats {
        self.apply_pending(now_ms);

        let dt_ms = match self.last_frame_ms {
            Some(prev) => (now_ms - prev).max(0.0),
            None => FALLBACK_FRAME_MS,
        };
        self.last_frame_ms = Some(self.last_frame_ms.map_or(now_ms, |prev| prev.max(now_ms)));

        let substeps = self.system.step((dt_ms / 1000.0) as f32);
        let mut stats = self.system.frame(now_ms, surface);
        stats.substeps = substeps;

        if self.debug {
            if let Err(e) = self.draw_debug(surface, &stats) {
                log::warn!("debug overlay: {e}");
            }
        }
        stats
    }

    fn draw_debug(
        &self,
        surface: &mut dyn Surface,
        stats: &FrameStats,
    ) -> Result<(), crate::error::RenderError> {
        surface.set_fill(Rgba::WHITE.with_alpha(0.8));
        let hud = format!(
            "particles {} | bodies {} | substeps {} | queued {}",
            stats.alive,
            self.system.body_count(),
            stats.substeps,
            self.queue.len()
        );
        surface.fill_text(&hud, Vec2::new(8.0, 16.0))?;
        for body in self.system.world().dynamic_bodies() {
            surface.fill_circle(body.position(), 2.0)?;
        }
        Ok(())
    }

    /// Remove every particle and body, drop queued commands and stop
    /// stepping until the next trigger. Safe to call repeatedly.
    pub fn cleanup(&mut self) {
        let removed = self.system.len();
        self.queue.clear();
        self.system.clear();
        self.system.set_running(false);
        self.last_frame_ms = None;
        if removed > 0 {
            log::info!("cleanup removed {removed} particles");
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.system.resize(width, height);
    }

    pub fn set_debug(&mut self, on: bool) {
        self.debug = on;
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Swap in new track configs. Live particles keep the config they were
    /// spawned with.
    pub fn set_registry(&mut self, registry: TrackRegistry) {
        self.markers.retain(|id, _| registry.contains(*id));
        self.registry = registry;
    }

    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }

    pub fn particle_count(&self) -> usize {
        self.system.len()
    }

    pub fn body_count(&self) -> usize {
        self.system.body_count()
    }

    pub fn pending_commands(&self) -> usize {
        self.queue.len()
    }

    pub fn dropped_commands(&self) -> u64 {
        self.dropped_commands
    }

    pub fn particles(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.system.particles()
    }

    pub fn world(&self) -> &PhysicsWorld {
        self.system.world()
    }

    pub fn marker_position(&self, track_id: TrackId) -> Option<Vec2> {
        self.markers.get(&track_id).copied()
    }

    /// Track whose marker is nearest to `point`, within the pick radius.
    pub fn pick_marker(&self, point: Vec2) -> Option<TrackId> {
        self.markers
            .iter()
            .map(|(id, p)| (*id, p.distance_squared(point)))
            .filter(|(_, d2)| *d2 <= MARKER_PICK_RADIUS * MARKER_PICK_RADIUS)
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(id, _)| id)
    }
}
