//! Capability hooks exposed to the rendering collaborator.
//!
//! Core code never owns shadows or reflections. It only tells the renderer
//! which meshes should take part, through a registry it is handed explicitly.

/// Opaque identifier for a renderable mesh owned by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u32);

/// Registration sink for per-mesh render capabilities.
pub trait RenderRegistry {
    /// Allocate an id for a newly built mesh.
    fn allocate_mesh(&mut self, label: &str) -> MeshId;
    /// The mesh casts shadows.
    fn add_shadow_caster(&mut self, mesh: MeshId);
    /// The mesh is visible in reflective water.
    fn add_to_reflection(&mut self, mesh: MeshId);
}
