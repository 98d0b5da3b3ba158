use crate::config::ShapeKind;
use crate::constants::MIN_BODY_SIZE;
use glam::Vec2;

/// Stable identity of a body inside one `PhysicsWorld`.
///
/// Handles are allocated from a monotonically increasing counter, so ordering
/// handles orders bodies by creation time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyHandle(pub(crate) u64);

impl BodyHandle {
    #[inline]
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Collision and drawing geometry, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BodyShape {
    Circle { radius: f32 },
    Square { side: f32 },
    /// Isosceles triangle with base and height equal to `side`, apex up.
    Triangle { side: f32 },
    /// Axis-aligned box used for the static boundary walls.
    Rect { half_extents: Vec2 },
}

impl BodyShape {
    /// Build the geometry for a particle of nominal `size`.
    ///
    /// Returns `None` when `size` is unusable so the caller can fall back.
    pub fn for_particle(kind: ShapeKind, size: f32) -> Option<Self> {
        if !size.is_finite() || size <= 0.0 {
            return None;
        }
        Some(match kind {
            ShapeKind::Circle => Self::Circle { radius: size / 2.0 },
            ShapeKind::Square => Self::Square { side: size },
            ShapeKind::Triangle => Self::Triangle { side: size },
        })
    }

    /// The smallest valid particle: a circle of minimum size.
    pub fn fallback() -> Self {
        Self::Circle {
            radius: MIN_BODY_SIZE / 2.0,
        }
    }

    pub fn area(&self) -> f32 {
        match *self {
            Self::Circle { radius } => std::f32::consts::PI * radius * radius,
            Self::Square { side } => side * side,
            Self::Triangle { side } => 0.5 * side * side,
            Self::Rect { half_extents } => 4.0 * half_extents.x * half_extents.y,
        }
    }

    /// Radius of the circle used for dynamic collision tests.
    pub fn collision_radius(&self) -> f32 {
        match *self {
            Self::Circle { radius } => radius,
            Self::Square { side } | Self::Triangle { side } => side / 2.0,
            Self::Rect { half_extents } => half_extents.length(),
        }
    }

    /// Nominal drawn size (diameter or side length).
    pub fn size(&self) -> f32 {
        match *self {
            Self::Circle { radius } => radius * 2.0,
            Self::Square { side } | Self::Triangle { side } => side,
            Self::Rect { half_extents } => 2.0 * half_extents.max_element(),
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Circle { .. } => ShapeKind::Circle,
            Self::Square { .. } | Self::Rect { .. } => ShapeKind::Square,
            Self::Triangle { .. } => ShapeKind::Triangle,
        }
    }
}

/// Physical properties fixed at creation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub density: f32,
    pub restitution: f32,
    pub friction: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            density: 0.001,
            restitution: 0.7,
            friction: crate::constants::DEFAULT_FRICTION,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RigidBody {
    pub(crate) handle: BodyHandle,
    pub(crate) position: Vec2,
    pub(crate) angle: f32,
    pub(crate) velocity: Vec2,
    pub(crate) angular_velocity: f32,
    pub(crate) shape: BodyShape,
    pub(crate) material: Material,
    pub(crate) inv_mass: f32,
    pub(crate) is_static: bool,
}

impl RigidBody {
    pub(crate) fn new_dynamic(
        handle: BodyHandle,
        position: Vec2,
        shape: BodyShape,
        material: Material,
    ) -> Self {
        let mass = (material.density.max(0.0) * shape.area()).max(f32::EPSILON);
        Self {
            handle,
            position,
            angle: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            shape,
            material,
            inv_mass: 1.0 / mass,
            is_static: false,
        }
    }

    pub(crate) fn new_static(
        handle: BodyHandle,
        center: Vec2,
        half_extents: Vec2,
        material: Material,
    ) -> Self {
        Self {
            handle,
            position: center,
            angle: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            shape: BodyShape::Rect { half_extents },
            material,
            inv_mass: 0.0,
            is_static: true,
        }
    }

    pub fn handle(&self) -> BodyHandle {
        self.handle
    }
    pub fn position(&self) -> Vec2 {
        self.position
    }
    pub fn angle(&self) -> f32 {
        self.angle
    }
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }
    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }
    pub fn shape(&self) -> BodyShape {
        self.shape
    }
    pub fn material(&self) -> Material {
        self.material
    }
    pub fn is_static(&self) -> bool {
        self.is_static
    }
    pub fn mass(&self) -> f32 {
        if self.inv_mass > 0.0 {
            1.0 / self.inv_mass
        } else {
            f32::INFINITY
        }
    }

    /// True when every piece of kinematic state is a finite number.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && self.angle.is_finite()
            && self.angular_velocity.is_finite()
    }
}
