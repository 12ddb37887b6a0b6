//! Procedural generation for the ground and the props scattered over it.

pub mod mesh;
pub mod sampler;
pub mod scatter;
pub mod terrain;

pub use mesh::*;
pub use sampler::*;
pub use scatter::*;
pub use terrain::*;
