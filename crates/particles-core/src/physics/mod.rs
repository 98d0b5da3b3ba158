pub mod body;
pub mod world;

pub use body::{BodyHandle, BodyShape, Material, RigidBody};
pub use world::{Boundary, PhysicsWorld};
