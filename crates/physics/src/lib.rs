//! Physics system using Rapier3D for Meadow.
//!
//! Static ground and water colliders, targeted ray probes, and collision-aware
//! capsule moves for avatars.

pub mod collision;
pub mod physics_world;
pub mod raycast;

pub use collision::*;
pub use physics_world::*;
pub use raycast::*;

// Re-export Rapier for downstream crates
pub use rapier3d;

// Re-export common Rapier types
pub use rapier3d::prelude::{ColliderHandle, RigidBodyHandle};
