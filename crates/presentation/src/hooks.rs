//! Render capability registry.
//!
//! Records which meshes cast shadows or show up in water reflections and how
//! often the shadow cascades were re-split. A GPU backend reads these lists.

use std::collections::BTreeSet;

use engine_core::{MeshId, RenderRegistry};

#[derive(Debug, Default)]
pub struct RenderHooks {
    labels: Vec<String>,
    shadow_casters: BTreeSet<MeshId>,
    reflected: BTreeSet<MeshId>,
    frustum_splits: u32,
}

impl RenderHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mesh_count(&self) -> usize {
        self.labels.len()
    }

    pub fn label(&self, mesh: MeshId) -> Option<&str> {
        self.labels.get(mesh.0 as usize).map(String::as_str)
    }

    pub fn is_shadow_caster(&self, mesh: MeshId) -> bool {
        self.shadow_casters.contains(&mesh)
    }

    pub fn is_reflected(&self, mesh: MeshId) -> bool {
        self.reflected.contains(&mesh)
    }

    pub fn shadow_casters(&self) -> impl Iterator<Item = MeshId> + '_ {
        self.shadow_casters.iter().copied()
    }

    /// Re-fit the shadow cascades to the current camera frustum.
    pub fn split_frustum(&mut self) {
        self.frustum_splits += 1;
        log::debug!("Shadow frustum split #{}", self.frustum_splits);
    }

    pub fn frustum_splits(&self) -> u32 {
        self.frustum_splits
    }
}

impl RenderRegistry for RenderHooks {
    fn allocate_mesh(&mut self, label: &str) -> MeshId {
        let id = MeshId(self.labels.len() as u32);
        self.labels.push(label.to_string());
        id
    }

    fn add_shadow_caster(&mut self, mesh: MeshId) {
        self.shadow_casters.insert(mesh);
    }

    fn add_to_reflection(&mut self, mesh: MeshId) {
        self.reflected.insert(mesh);
    }
}
