//! Fixed-step 2D rigid-body world.
//!
//! Simulation pipeline per sub-step:
//! 1. semi-implicit Euler integration with gravity, exponential air drag and
//!    a speed cap
//! 2. dynamic bodies against each other (circle vs. circle)
//! 3. dynamic bodies against the boundaries, each treated as a half-plane at
//!    the canvas edge, so no body ends a sub-step outside the canvas
//!
//! Dynamic bodies collide through their bounding circle whatever their drawn
//! shape; rotation is purely visual and is driven by contact friction.

use super::body::{BodyHandle, BodyShape, Material, RigidBody};
use crate::constants::*;
use fnv::FnvHashMap;
use glam::Vec2;

/// Which side of the canvas a boundary wall guards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Boundary {
    Ground,
    Ceiling,
    Left,
    Right,
}

pub struct PhysicsWorld {
    bodies: FnvHashMap<BodyHandle, RigidBody>,
    boundaries: Vec<(Boundary, BodyHandle)>,
    next_id: u64,
    gravity: Vec2,
    width: f32,
    height: f32,
    substep_sec: f32,
    accumulator: f32,
    running: bool,
}

impl Boundary {
    pub const ALL: [Boundary; 4] = [
        Boundary::Ground,
        Boundary::Ceiling,
        Boundary::Left,
        Boundary::Right,
    ];

    /// Inward normal and how far a circle of radius `r` at `p` pokes past
    /// this edge of a `size` canvas. Positive depth means contact.
    fn contact(self, p: Vec2, r: f32, size: Vec2) -> (Vec2, f32) {
        match self {
            Boundary::Ground => (Vec2::NEG_Y, p.y + r - size.y),
            Boundary::Ceiling => (Vec2::Y, r - p.y),
            Boundary::Left => (Vec2::X, r - p.x),
            Boundary::Right => (Vec2::NEG_X, p.x + r - size.x),
        }
    }
}

fn wall_material() -> Material {
    Material {
        density: 0.0,
        restitution: WALL_RESTITUTION,
        friction: WALL_FRICTION,
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_SIZE[0], DEFAULT_CANVAS_SIZE[1])
    }
}

impl PhysicsWorld {
    pub fn new(width: f32, height: f32) -> Self {
        let mut world = Self {
            bodies: FnvHashMap::default(),
            boundaries: Vec::with_capacity(4),
            next_id: 1,
            gravity: Vec2::new(0.0, GRAVITY_PX_PER_SEC2),
            width: DEFAULT_CANVAS_SIZE[0],
            height: DEFAULT_CANVAS_SIZE[1],
            substep_sec: 1.0 / SUBSTEP_HZ,
            accumulator: 0.0,
            running: true,
        };
        world.resize(width, height);
        world
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    fn alloc_handle(&mut self) -> BodyHandle {
        let h = BodyHandle(self.next_id);
        self.next_id += 1;
        h
    }

    /// Replace the four boundary walls with ones that fit `width` x `height`.
    ///
    /// Non-positive or non-finite dimensions are ignored.
    pub fn resize(&mut self, width: f32, height: f32) {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            log::warn!("ignoring invalid canvas size {width}x{height}");
            return;
        }
        for (_, handle) in self.boundaries.drain(..) {
            self.bodies.remove(&handle);
        }
        self.width = width;
        self.height = height;

        let t = WALL_THICKNESS;
        let material = wall_material();
        let walls = [
            (
                Boundary::Ground,
                Vec2::new(width / 2.0, height + t / 2.0),
                Vec2::new(width / 2.0, t / 2.0),
            ),
            (
                Boundary::Ceiling,
                Vec2::new(width / 2.0, -t / 2.0),
                Vec2::new(width / 2.0, t / 2.0),
            ),
            (
                Boundary::Left,
                Vec2::new(-t / 2.0, height / 2.0),
                Vec2::new(t / 2.0, height / 2.0),
            ),
            (
                Boundary::Right,
                Vec2::new(width + t / 2.0, height / 2.0),
                Vec2::new(t / 2.0, height / 2.0),
            ),
        ];
        for (side, center, half) in walls {
            let handle = self.alloc_handle();
            self.bodies
                .insert(handle, RigidBody::new_static(handle, center, half, material));
            self.boundaries.push((side, handle));
        }
        log::debug!("boundaries rebuilt for {width}x{height}");
    }

    pub fn boundaries(&self) -> impl Iterator<Item = (Boundary, &RigidBody)> + '_ {
        self.boundaries
            .iter()
            .filter_map(|(side, h)| self.bodies.get(h).map(|b| (*side, b)))
    }

    /// Insert a dynamic body.
    ///
    /// An unusable `size` falls back to a minimum-size circle and a
    /// non-finite `position` to the canvas center; both are logged.
    pub fn create_body(
        &mut self,
        position: Vec2,
        size: f32,
        shape: crate::config::ShapeKind,
        material: Material,
    ) -> BodyHandle {
        let geometry = BodyShape::for_particle(shape, size).unwrap_or_else(|| {
            log::warn!(
                "{}, creating circle of size {MIN_BODY_SIZE}",
                crate::error::ConfigError::InvalidSize(size)
            );
            BodyShape::fallback()
        });
        let position = if position.is_finite() {
            position
        } else {
            log::warn!("non-finite spawn position {position:?}, using canvas center");
            self.size() / 2.0
        };
        let handle = self.alloc_handle();
        self.bodies.insert(
            handle,
            RigidBody::new_dynamic(handle, position, geometry, material),
        );
        handle
    }

    /// Apply a one-shot force-style impulse: the force acts for one base
    /// step, so `Δv = F / m · BASE_STEP_MS · 1000` in px/s.
    ///
    /// Returns false when the handle is unknown or static.
    pub fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec2) -> bool {
        match self.bodies.get_mut(&handle) {
            Some(b) if !b.is_static && impulse.is_finite() => {
                b.velocity += impulse * b.inv_mass * BASE_STEP_MS * 1000.0;
                true
            }
            _ => false,
        }
    }

    /// Move a body without touching its velocity.
    pub fn translate(&mut self, handle: BodyHandle, delta: Vec2) -> bool {
        match self.bodies.get_mut(&handle) {
            Some(b) if !b.is_static => {
                b.position += delta;
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, handle: BodyHandle) -> Option<RigidBody> {
        if self.boundaries.iter().any(|(_, h)| *h == handle) {
            return None;
        }
        self.bodies.remove(&handle)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(&handle)
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains_key(&handle)
    }

    /// Non-boundary bodies, in no particular order.
    pub fn dynamic_bodies(&self) -> impl Iterator<Item = &RigidBody> + '_ {
        self.bodies.values().filter(|b| !b.is_static)
    }

    /// Number of non-boundary bodies.
    pub fn dynamic_count(&self) -> usize {
        self.bodies.len() - self.boundaries.len()
    }

    /// Remove every dynamic body, keeping the walls.
    pub fn clear_dynamic(&mut self) {
        self.bodies.retain(|_, b| b.is_static);
        self.accumulator = 0.0;
    }

    /// Stop or resume stepping. A stopped world ignores `step`.
    pub fn set_running(&mut self, running: bool) {
        self.running = running;
        if !running {
            self.accumulator = 0.0;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance by `dt_sec` of wall time, returning the number of sub-steps run.
    pub fn step(&mut self, dt_sec: f32) -> u32 {
        if !self.running || !dt_sec.is_finite() || dt_sec <= 0.0 {
            return 0;
        }
        self.accumulator += dt_sec;
        let h = self.substep_sec;
        if self.accumulator < h {
            return 0;
        }
        // Bodies are neither added nor removed while stepping.
        let handles = self.dynamic_handles();
        let mut steps = 0;
        while self.accumulator >= h && steps < MAX_SUBSTEPS_PER_FRAME {
            self.substep(h, &handles);
            self.accumulator -= h;
            steps += 1;
        }
        if steps == MAX_SUBSTEPS_PER_FRAME && self.accumulator >= h {
            log::debug!("dropping {:.1} ms of simulation backlog", self.accumulator * 1000.0);
            self.accumulator %= h;
        }
        steps
    }

    fn dynamic_handles(&self) -> Vec<BodyHandle> {
        let mut hs: Vec<BodyHandle> = self
            .bodies
            .values()
            .filter(|b| !b.is_static)
            .map(|b| b.handle)
            .collect();
        hs.sort_unstable();
        hs
    }

    fn substep(&mut self, h: f32, handles: &[BodyHandle]) {
        let drag = (-AIR_DRAG_PER_SEC * h).exp();
        let gravity = self.gravity;
        for b in self.bodies.values_mut().filter(|b| !b.is_static) {
            b.velocity = ((b.velocity + gravity * h) * drag)
                .clamp_length_max(MAX_LINEAR_SPEED_PX_PER_SEC);
            b.position += b.velocity * h;
            b.angular_velocity *= drag;
            b.angle += b.angular_velocity * h;
        }

        for i in 0..handles.len() {
            for j in (i + 1)..handles.len() {
                self.collide_pair(handles[i], handles[j]);
            }
        }

        let size = self.size();
        let wall = wall_material();
        for b in self.bodies.values_mut().filter(|b| !b.is_static) {
            for side in Boundary::ALL {
                collide_with_boundary(b, side, size, wall);
            }
        }
    }

    fn collide_pair(&mut self, ha: BodyHandle, hb: BodyHandle) {
        let (Some(a), Some(b)) = (self.bodies.get(&ha), self.bodies.get(&hb)) else {
            return;
        };
        let ra = a.shape.collision_radius();
        let rb = b.shape.collision_radius();
        let d = b.position - a.position;
        let dist_sq = d.length_squared();
        let reach = ra + rb;
        if dist_sq >= reach * reach {
            return;
        }
        let dist = dist_sq.sqrt();
        let normal = if dist > f32::EPSILON { d / dist } else { Vec2::Y };
        let penetration = reach - dist;
        let (ia, ib) = (a.inv_mass, b.inv_mass);
        let inv_sum = ia + ib;
        if inv_sum <= 0.0 {
            return;
        }
        let restitution = a.material.restitution.max(b.material.restitution);
        let rel = b.velocity - a.velocity;
        let vn = rel.dot(normal);

        let correction = normal * (penetration / inv_sum);
        let impulse = if vn < 0.0 {
            normal * (-(1.0 + restitution) * vn / inv_sum)
        } else {
            Vec2::ZERO
        };
        if let Some(a) = self.bodies.get_mut(&ha) {
            a.position -= correction * ia;
            a.velocity -= impulse * ia;
        }
        if let Some(b) = self.bodies.get_mut(&hb) {
            b.position += correction * ib;
            b.velocity += impulse * ib;
        }
    }
}

/// Resolve one dynamic body against one canvas edge.
fn collide_with_boundary(body: &mut RigidBody, side: Boundary, size: Vec2, wall: Material) {
    let r = body.shape.collision_radius();
    let (normal, penetration) = side.contact(body.position, r, size);
    if penetration.is_nan() || penetration <= 0.0 {
        return;
    }
    body.position += normal * penetration;

    let vn = body.velocity.dot(normal);
    if vn >= 0.0 {
        return;
    }
    let restitution = body.material.restitution.max(wall.restitution);
    let tangent = normal.perp();
    let vt = body.velocity.dot(tangent);
    let mu = body.material.friction.max(wall.friction);
    let normal_change = -(1.0 + restitution) * vn;
    let friction_change = (mu * normal_change).min(vt.abs()) * vt.signum();
    body.velocity += normal * normal_change - tangent * friction_change;

    // Contact spins the body toward rolling without slipping.
    if r > f32::EPSILON {
        let rolling = -body.velocity.dot(tangent) / r;
        body.angular_velocity += (rolling - body.angular_velocity) * 0.5;
    }
}
