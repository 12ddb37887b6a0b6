//! Core engine types and utilities for Meadow.
//!
//! This crate provides the foundational types used across all engine systems:
//! - Transform and surface alignment helpers
//! - Frame timing
//! - Asset handles for data that arrives after startup
//! - Common component types for the avatar world
//! - Capability hooks the scatter and locomotion code hand to the renderer

pub mod asset;
pub mod components;
pub mod render;
pub mod time;
pub mod transform;

pub use asset::*;
pub use components::*;
pub use render::*;
pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
pub use hecs::{Entity, World};
