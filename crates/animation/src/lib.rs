//! Animation-weight blending for avatars.
//!
//! Produces clip weights (walking, idle, sitting, posing) and cosmetic morph
//! influences once per tick. Nothing here touches skeletons or meshes; the
//! presentation layer receives the output through [`AnimationSink`].

pub mod blender;
pub mod morph;
pub mod sink;

pub use blender::*;
pub use morph::*;
pub use sink::*;
