//! Presentation-side collaborators: camera, render hooks, animation layers
//! and the text overlay. Nothing here draws; a GPU backend consumes the state.

pub mod camera;
pub mod hooks;
pub mod layers;
pub mod overlay;

pub use camera::*;
pub use hooks::*;
pub use layers::*;
pub use overlay::*;
