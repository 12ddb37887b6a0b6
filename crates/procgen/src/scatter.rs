//! Instanced prop scattering.
//!
//! A scatter pass turns a list of [`SurfacePoint`]s (or a fixed count for
//! free-floating props like birds and rain) into one shared instance buffer.
//! Per-instance and per-material tweaks come from small strategy traits so a
//! pass is fully described by data plus a couple of trait objects.

use engine_core::{MeshId, RenderRegistry, Transform};
use glam::{Mat4, Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::mesh::MeshData;
use crate::sampler::{seed_from_str, SurfacePoint};

// ── Shapes & materials ─────────────────────────────────────────────────────

/// Base geometry copied into every instance of a shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl ShapeMesh {
    /// Upright quad in the XY plane facing +Z, centered on the origin.
    pub fn quad(name: impl Into<String>, width: f32, height: f32) -> Self {
        let (hw, hh) = (width / 2.0, height / 2.0);
        Self {
            name: name.into(),
            positions: vec![
                Vec3::new(-hw, -hh, 0.0),
                Vec3::new(hw, -hh, 0.0),
                Vec3::new(hw, hh, 0.0),
                Vec3::new(-hw, hh, 0.0),
            ],
            normals: vec![Vec3::Z; 4],
            indices: vec![0, 1, 2, 2, 3, 0],
        }
    }

    /// Copy the geometry of a loaded mesh.
    pub fn from_mesh(name: impl Into<String>, mesh: &MeshData) -> Self {
        let count = mesh.vertex_count();
        Self {
            name: name.into(),
            positions: (0..count).map(|i| mesh.position(i)).collect(),
            normals: (0..count).map(|i| mesh.normal(i)).collect(),
            indices: mesh.indices().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AlphaMode {
    #[default]
    Opaque,
    /// Cutout using the albedo alpha.
    Test,
    Blend,
}

/// Renderer-agnostic material description for a scatter mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDesc {
    pub name: String,
    pub albedo: [f32; 3],
    pub albedo_texture: Option<String>,
    pub roughness: f32,
    pub metallic: f32,
    pub specular_intensity: f32,
    pub alpha_mode: AlphaMode,
    pub double_sided: bool,
}

impl MaterialDesc {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            albedo: [1.0; 3],
            albedo_texture: None,
            roughness: 0.5,
            metallic: 0.0,
            specular_intensity: 1.0,
            alpha_mode: AlphaMode::Opaque,
            double_sided: false,
        }
    }
}

// ── Strategies ─────────────────────────────────────────────────────────────

/// Local offset applied on top of an instance's base placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceDelta {
    pub transform: Transform,
    pub material_index: Option<usize>,
}

impl Default for InstanceDelta {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            material_index: None,
        }
    }
}

/// Per-instance customization. `rng` is seeded from the pass seed and the index.
pub trait InstanceCustomizer {
    fn customize_instance(
        &self,
        index: usize,
        point: Option<&SurfacePoint>,
        rng: &mut StdRng,
    ) -> InstanceDelta;
}

/// Per-pass material customization.
pub trait MaterialCustomizer {
    fn customize_material(&self, base: MaterialDesc) -> MaterialDesc;
}

/// Leaves every instance at its base placement.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCustomization;

impl InstanceCustomizer for NoCustomization {
    fn customize_instance(&self, _: usize, _: Option<&SurfacePoint>, _: &mut StdRng) -> InstanceDelta {
        InstanceDelta::default()
    }
}

impl MaterialCustomizer for NoCustomization {
    fn customize_material(&self, base: MaterialDesc) -> MaterialDesc {
        base
    }
}

/// Random yaw around local up and uniform scale jitter.
#[derive(Debug, Clone, Copy)]
pub struct RandomJitter {
    pub max_yaw: f32,
    pub min_scale: f32,
    pub max_scale: f32,
}

impl Default for RandomJitter {
    fn default() -> Self {
        Self {
            max_yaw: std::f32::consts::TAU,
            min_scale: 0.8,
            max_scale: 1.2,
        }
    }
}

impl InstanceCustomizer for RandomJitter {
    fn customize_instance(&self, _: usize, _: Option<&SurfacePoint>, rng: &mut StdRng) -> InstanceDelta {
        let yaw = rng.gen::<f32>() * self.max_yaw;
        let scale = self.min_scale + rng.gen::<f32>() * (self.max_scale - self.min_scale).max(0.0);
        InstanceDelta {
            transform: Transform {
                position: Vec3::ZERO,
                rotation: Quat::from_rotation_y(yaw),
                scale: Vec3::splat(scale),
            },
            material_index: None,
        }
    }
}

/// Grass patch sizing from the density channel: visible at 1/25 scale (5× taller)
/// where the weight exceeds 0.25, collapsed to zero elsewhere.
#[derive(Debug, Clone, Copy)]
pub struct VertexThresholdScatter {
    pub threshold: f32,
    pub scale: f32,
    pub height_factor: f32,
}

impl Default for VertexThresholdScatter {
    fn default() -> Self {
        Self {
            threshold: 0.25,
            scale: 1.0 / 25.0,
            height_factor: 5.0,
        }
    }
}

impl InstanceCustomizer for VertexThresholdScatter {
    fn customize_instance(&self, _: usize, point: Option<&SurfacePoint>, _: &mut StdRng) -> InstanceDelta {
        let weight = point.map(|p| p.density_weight).unwrap_or(0.0);
        let s = if weight > self.threshold { self.scale } else { 0.0 };
        InstanceDelta {
            transform: Transform {
                scale: Vec3::new(s, s * self.height_factor, s),
                ..Default::default()
            },
            material_index: None,
        }
    }
}

/// Alpha-tested, unlit-ish grass card material.
#[derive(Debug, Clone)]
pub struct GrassMaterial {
    pub texture: String,
}

impl MaterialCustomizer for GrassMaterial {
    fn customize_material(&self, base: MaterialDesc) -> MaterialDesc {
        MaterialDesc {
            albedo: [1.0; 3],
            albedo_texture: Some(self.texture.clone()),
            roughness: 1.0,
            metallic: 0.0,
            specular_intensity: 0.0,
            alpha_mode: AlphaMode::Test,
            double_sided: true,
            ..base
        }
    }
}

// ── Dynamic scatters ───────────────────────────────────────────────────────

/// Upward surface probe used by props that land on the ground.
pub trait SurfaceProbe {
    /// First surface hit by a ray from `origin` straight up, if any.
    fn surface_above(&self, origin: Vec3) -> Option<Vec3>;
}

/// Per-frame inputs for dynamic scatters.
pub struct FrameContext<'a> {
    pub dt_ms: f32,
    pub camera_position: Vec3,
    /// Point the follow camera looks at (usually the player).
    pub follow_target: Vec3,
    /// Gravity per 60 Hz frame (world gravity / 60).
    pub gravity_y: f32,
    pub surface: Option<&'a dyn SurfaceProbe>,
}

/// Moves individual instances of a dynamic scatter every frame.
pub trait ParticleUpdater {
    fn update_particle(&mut self, index: usize, instance: &mut ScatterInstance, frame: &FrameContext<'_>);
}

// ── Instance buffer ────────────────────────────────────────────────────────

/// One placed copy of a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterInstance {
    pub transform: Transform,
    pub shape_index: usize,
    pub material_index: Option<usize>,
}

impl ScatterInstance {
    /// Zero-scale instances are kept in the buffer but contribute no geometry.
    pub fn is_visible(&self) -> bool {
        self.transform.scale != Vec3::ZERO
    }
}

/// Options for one scatter pass.
#[derive(Debug, Clone)]
pub struct ScatterOptions {
    pub label: String,
    /// 0 ignores surface normals, 1 aligns local up with them fully.
    pub align_to_normal: f32,
    /// Re-orient instances toward the camera every frame.
    pub billboard: bool,
    /// Instances are moved every frame by a `ParticleUpdater`.
    pub dynamic: bool,
    pub seed: String,
    pub cast_shadows: bool,
    pub reflect_in_water: bool,
}

impl Default for ScatterOptions {
    fn default() -> Self {
        Self {
            label: "scatter".to_string(),
            align_to_normal: 0.0,
            billboard: false,
            dynamic: false,
            seed: "scatter".to_string(),
            cast_shadows: true,
            reflect_in_water: true,
        }
    }
}

/// Shared instance buffer produced by a scatter pass.
#[derive(Debug, Clone)]
pub struct InstanceBuffer {
    pub label: String,
    pub mesh_id: Option<MeshId>,
    pub shapes: Vec<ShapeMesh>,
    pub materials: Vec<MaterialDesc>,
    instances: Vec<ScatterInstance>,
    billboard: bool,
    /// World matrices cached by `freeze`.
    frozen: Option<Vec<Mat4>>,
}

impl InstanceBuffer {
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn instances(&self) -> &[ScatterInstance] {
        &self.instances
    }

    pub fn is_billboard(&self) -> bool {
        self.billboard
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    /// Cache world matrices. Frozen buffers ignore per-frame updates.
    pub fn freeze(&mut self) {
        self.frozen = Some(self.instances.iter().map(|i| i.transform.to_matrix()).collect());
    }

    pub fn unfreeze(&mut self) {
        self.frozen = None;
    }

    /// World matrix per instance (cached when frozen).
    pub fn world_matrices(&self) -> Vec<Mat4> {
        match &self.frozen {
            Some(cached) => cached.clone(),
            None => self.instances.iter().map(|i| i.transform.to_matrix()).collect(),
        }
    }

    /// Turn every instance to face `camera_position`. Only billboard buffers move.
    pub fn update_billboards(&mut self, camera_position: Vec3) {
        if !self.billboard || self.frozen.is_some() {
            return;
        }
        for instance in &mut self.instances {
            instance.transform.face_towards(camera_position);
        }
    }

    /// Run a dynamic-scatter updater over every instance.
    pub fn update_particles(&mut self, updater: &mut dyn ParticleUpdater, frame: &FrameContext<'_>) {
        if self.frozen.is_some() {
            log::debug!("Skipping particle update on frozen buffer '{}'", self.label);
            return;
        }
        for (index, instance) in self.instances.iter_mut().enumerate() {
            updater.update_particle(index, instance, frame);
        }
        if self.billboard {
            self.update_billboards(frame.camera_position);
        }
    }

    /// Copy each visible instance's shape into one world-space vertex/index set.
    pub fn bake_geometry(&self) -> (Vec<Vec3>, Vec<Vec3>, Vec<u32>) {
        let matrices = self.world_matrices();
        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut indices = Vec::new();

        for (instance, matrix) in self.instances.iter().zip(matrices.iter()) {
            if !instance.is_visible() {
                continue;
            }
            let Some(shape) = self.shapes.get(instance.shape_index) else {
                continue;
            };
            let base = positions.len() as u32;
            let normal_matrix = matrix.inverse().transpose();
            positions.extend(shape.positions.iter().map(|&p| matrix.transform_point3(p)));
            normals.extend(
                shape
                    .normals
                    .iter()
                    .map(|&n| normal_matrix.transform_vector3(n).normalize_or_zero()),
            );
            indices.extend(shape.indices.iter().map(|&i| base + i));
        }

        (positions, normals, indices)
    }
}

// ── Engine ─────────────────────────────────────────────────────────────────

/// Builds instance buffers from sampled points or fixed counts.
#[derive(Debug, Default)]
pub struct ScatterEngine {
    passes: usize,
}

impl ScatterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of passes built so far.
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// One instance per surface point, placed at the point and optionally aligned to its normal.
    pub fn scatter(
        &mut self,
        shape: ShapeMesh,
        material: MaterialDesc,
        points: &[SurfacePoint],
        options: &ScatterOptions,
        instances: &dyn InstanceCustomizer,
        materials: &dyn MaterialCustomizer,
        registry: &mut dyn RenderRegistry,
    ) -> InstanceBuffer {
        let mut buffer = self.empty_buffer(vec![shape], vec![material], options, materials);
        self.fill_from_points(&mut buffer, points, options, instances);
        self.register(&mut buffer, options, registry);
        buffer
    }

    /// One instance per vertex of `mesh`, weighted by the red channel.
    pub fn scatter_vertices(
        &mut self,
        shape: ShapeMesh,
        material: MaterialDesc,
        mesh: &MeshData,
        options: &ScatterOptions,
        instances: &dyn InstanceCustomizer,
        materials: &dyn MaterialCustomizer,
        registry: &mut dyn RenderRegistry,
    ) -> InstanceBuffer {
        let points: Vec<SurfacePoint> = (0..mesh.vertex_count())
            .map(|v| SurfacePoint {
                position: mesh.position(v),
                normal: mesh.normal(v),
                density_weight: mesh.color(v)[0],
            })
            .collect();
        self.scatter(shape, material, &points, options, instances, materials, registry)
    }

    /// A fixed number of instances per shape, not tied to any surface.
    ///
    /// Shapes are laid out in blocks: the first `count` instances use shape 0,
    /// the next `count` shape 1, and so on.
    pub fn scatter_count(
        &mut self,
        shapes: Vec<ShapeMesh>,
        materials_list: Vec<MaterialDesc>,
        count: usize,
        options: &ScatterOptions,
        instances: &dyn InstanceCustomizer,
        materials: &dyn MaterialCustomizer,
        registry: &mut dyn RenderRegistry,
    ) -> InstanceBuffer {
        let mut buffer = self.empty_buffer(shapes, materials_list, options, materials);
        let base_seed = seed_from_str(&options.seed);
        let total = count * buffer.shapes.len();
        buffer.instances.reserve(total);

        for index in 0..total {
            let mut rng = instance_rng(base_seed, index);
            let delta = instances.customize_instance(index, None, &mut rng);
            buffer.instances.push(ScatterInstance {
                transform: delta.transform,
                shape_index: index / count.max(1),
                material_index: delta.material_index,
            });
        }

        self.register(&mut buffer, options, registry);
        buffer
    }

    /// Re-run placement into an existing buffer, reusing its allocation.
    pub fn rescatter(
        &mut self,
        buffer: &mut InstanceBuffer,
        points: &[SurfacePoint],
        options: &ScatterOptions,
        instances: &dyn InstanceCustomizer,
    ) {
        buffer.unfreeze();
        buffer.instances.clear();
        self.fill_from_points(buffer, points, options, instances);
        if !buffer.billboard && !options.dynamic {
            buffer.freeze();
        }
    }

    fn empty_buffer(
        &mut self,
        shapes: Vec<ShapeMesh>,
        materials_list: Vec<MaterialDesc>,
        options: &ScatterOptions,
        materials: &dyn MaterialCustomizer,
    ) -> InstanceBuffer {
        self.passes += 1;
        InstanceBuffer {
            label: options.label.clone(),
            mesh_id: None,
            shapes,
            materials: materials_list
                .into_iter()
                .map(|m| materials.customize_material(m))
                .collect(),
            instances: Vec::new(),
            billboard: options.billboard,
            frozen: None,
        }
    }

    fn fill_from_points(
        &self,
        buffer: &mut InstanceBuffer,
        points: &[SurfacePoint],
        options: &ScatterOptions,
        instances: &dyn InstanceCustomizer,
    ) {
        let base_seed = seed_from_str(&options.seed);
        buffer.instances.reserve(points.len());

        for (index, point) in points.iter().enumerate() {
            let mut base = Transform::from_position(point.position);
            base.align_up_to(point.normal, options.align_to_normal);

            let mut rng = instance_rng(base_seed, index);
            let delta = instances.customize_instance(index, Some(point), &mut rng);
            buffer.instances.push(ScatterInstance {
                transform: base.then(&delta.transform),
                shape_index: 0,
                material_index: delta.material_index,
            });
        }
    }

    fn register(&self, buffer: &mut InstanceBuffer, options: &ScatterOptions, registry: &mut dyn RenderRegistry) {
        let mesh_id = registry.allocate_mesh(&options.label);
        if options.cast_shadows {
            registry.add_shadow_caster(mesh_id);
        }
        if options.reflect_in_water {
            registry.add_to_reflection(mesh_id);
        }
        buffer.mesh_id = Some(mesh_id);

        // Static scatters never move again.
        if !buffer.billboard && !options.dynamic && buffer.frozen.is_none() {
            buffer.freeze();
        }

        log::info!(
            "Scatter '{}': {} instances ({} visible)",
            buffer.label,
            buffer.len(),
            buffer.instances.iter().filter(|i| i.is_visible()).count()
        );
    }
}

/// Deterministic per-instance generator.
fn instance_rng(base_seed: u64, index: usize) -> StdRng {
    StdRng::seed_from_u64(base_seed ^ (index as u64).wrapping_mul(0x9e3779b97f4a7c15))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Registry {
        next: u32,
        shadows: Vec<MeshId>,
        reflections: Vec<MeshId>,
    }

    impl RenderRegistry for Registry {
        fn allocate_mesh(&mut self, _label: &str) -> MeshId {
            self.next += 1;
            MeshId(self.next)
        }
        fn add_shadow_caster(&mut self, mesh: MeshId) {
            self.shadows.push(mesh);
        }
        fn add_to_reflection(&mut self, mesh: MeshId) {
            self.reflections.push(mesh);
        }
    }

    fn point(position: Vec3, normal: Vec3) -> SurfacePoint {
        SurfacePoint {
            position,
            normal,
            density_weight: 1.0,
        }
    }

    fn grass() -> (ShapeMesh, MaterialDesc) {
        (ShapeMesh::quad("grass", 1.0, 1.0), MaterialDesc::new("grass"))
    }

    #[test]
    fn empty_points_give_empty_buffer() {
        let mut engine = ScatterEngine::new();
        let mut registry = Registry::default();
        let (shape, mat) = grass();
        let buffer = engine.scatter(
            shape,
            mat,
            &[],
            &ScatterOptions::default(),
            &NoCustomization,
            &NoCustomization,
            &mut registry,
        );
        assert!(buffer.is_empty());
        assert!(buffer.bake_geometry().0.is_empty());
    }

    #[test]
    fn instances_follow_points_and_register_hooks() {
        let mut engine = ScatterEngine::new();
        let mut registry = Registry::default();
        let (shape, mat) = grass();
        let points = [point(Vec3::new(1.0, 2.0, 3.0), Vec3::Y), point(Vec3::new(-4.0, 0.0, 0.5), Vec3::Y)];
        let buffer = engine.scatter(
            shape,
            mat,
            &points,
            &ScatterOptions::default(),
            &NoCustomization,
            &NoCustomization,
            &mut registry,
        );
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.instances()[0].transform.position, Vec3::new(1.0, 2.0, 3.0));
        assert!(buffer.is_frozen());
        assert_eq!(registry.shadows, vec![MeshId(1)]);
        assert_eq!(registry.reflections, vec![MeshId(1)]);
        assert_eq!(buffer.mesh_id, Some(MeshId(1)));
    }

    #[test]
    fn align_to_normal_strength_blends_up_axis() {
        let mut engine = ScatterEngine::new();
        let mut registry = Registry::default();
        let normal = Vec3::new(1.0, 1.0, 0.0).normalize();
        let points = [point(Vec3::ZERO, normal)];

        let mut run = |strength: f32| {
            let (shape, mat) = grass();
            let options = ScatterOptions {
                align_to_normal: strength,
                ..Default::default()
            };
            let buffer = engine.scatter(shape, mat, &points, &options, &NoCustomization, &NoCustomization, &mut registry);
            buffer.instances()[0].transform.up()
        };

        assert!((run(0.0) - Vec3::Y).length() < 1e-5);
        assert!((run(1.0) - normal).length() < 1e-5);
        let half = run(0.5);
        let angle = half.angle_between(Vec3::Y);
        assert!((angle - std::f32::consts::FRAC_PI_8).abs() < 1e-4);
    }

    #[test]
    fn jitter_is_deterministic_per_index() {
        let mut engine = ScatterEngine::new();
        let mut registry = Registry::default();
        let points: Vec<_> = (0..16).map(|i| point(Vec3::new(i as f32, 0.0, 0.0), Vec3::Y)).collect();
        let options = ScatterOptions {
            seed: "meadow".into(),
            ..Default::default()
        };
        let (shape, mat) = grass();
        let a = engine.scatter(shape.clone(), mat.clone(), &points, &options, &RandomJitter::default(), &NoCustomization, &mut registry);
        let b = engine.scatter(shape, mat, &points, &options, &RandomJitter::default(), &NoCustomization, &mut registry);
        assert_eq!(a.instances(), b.instances());
        assert_ne!(a.instances()[0].transform.rotation, a.instances()[1].transform.rotation);
        for instance in a.instances() {
            assert!(instance.transform.scale.x >= 0.8 && instance.transform.scale.x <= 1.2);
        }
    }

    #[test]
    fn vertex_threshold_hides_sparse_vertices() {
        let mut engine = ScatterEngine::new();
        let mut registry = Registry::default();
        let mesh = MeshData::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0],
            vec![0.0, 1.0, 0.0].repeat(3),
            Some(vec![0.9, 0.0, 0.0, 1.0, 0.1, 0.0, 0.0, 1.0, 0.3, 0.0, 0.0, 1.0]),
            vec![0, 1, 2],
        )
        .unwrap();
        let (shape, mat) = grass();
        let buffer = engine.scatter_vertices(
            shape,
            mat,
            &mesh,
            &ScatterOptions::default(),
            &VertexThresholdScatter::default(),
            &GrassMaterial { texture: "grass.png".into() },
            &mut registry,
        );
        let visible: Vec<bool> = buffer.instances().iter().map(|i| i.is_visible()).collect();
        assert_eq!(visible, vec![true, false, true]);
        assert!((buffer.instances()[0].transform.scale.y - 0.2).abs() < 1e-6);
        assert_eq!(buffer.materials[0].alpha_mode, AlphaMode::Test);
        assert!(buffer.materials[0].double_sided);
        // Two visible quads of four vertices each.
        assert_eq!(buffer.bake_geometry().0.len(), 8);
    }

    #[test]
    fn billboard_buffer_faces_camera() {
        let mut engine = ScatterEngine::new();
        let mut registry = Registry::default();
        let options = ScatterOptions {
            billboard: true,
            ..Default::default()
        };
        let mut buffer = engine.scatter_count(
            vec![ShapeMesh::quad("bird", 2.0, 1.0)],
            vec![MaterialDesc::new("bird")],
            3,
            &options,
            &NoCustomization,
            &NoCustomization,
            &mut registry,
        );
        assert!(!buffer.is_frozen());
        buffer.update_billboards(Vec3::new(0.0, 0.0, 10.0));
        for instance in buffer.instances() {
            assert!((instance.transform.rotation * Vec3::Z - Vec3::Z).length() < 1e-5);
        }
        buffer.update_billboards(Vec3::new(10.0, 0.0, 0.0));
        assert!((buffer.instances()[0].transform.rotation * Vec3::Z - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn frozen_buffer_ignores_billboard_updates() {
        let mut engine = ScatterEngine::new();
        let mut registry = Registry::default();
        let (shape, mat) = grass();
        let mut buffer = engine.scatter(
            shape,
            mat,
            &[point(Vec3::ZERO, Vec3::Y)],
            &ScatterOptions::default(),
            &NoCustomization,
            &NoCustomization,
            &mut registry,
        );
        let before = buffer.world_matrices();
        buffer.update_billboards(Vec3::new(5.0, 5.0, 5.0));
        assert_eq!(before, buffer.world_matrices());
    }

    #[test]
    fn scatter_count_lays_shapes_in_blocks() {
        let mut engine = ScatterEngine::new();
        let mut registry = Registry::default();
        let buffer = engine.scatter_count(
            vec![ShapeMesh::quad("duck 1", 1.0, 1.0), ShapeMesh::quad("duck 2", 1.0, 1.0)],
            vec![MaterialDesc::new("duck")],
            4,
            &ScatterOptions::default(),
            &NoCustomization,
            &NoCustomization,
            &mut registry,
        );
        let shapes: Vec<usize> = buffer.instances().iter().map(|i| i.shape_index).collect();
        assert_eq!(shapes, vec![0, 0, 0, 0, 1, 1, 1, 1]);
    }

    #[test]
    fn zero_count_is_valid() {
        let mut engine = ScatterEngine::new();
        let mut registry = Registry::default();
        let buffer = engine.scatter_count(
            vec![ShapeMesh::quad("rain", 0.1, 1.0)],
            vec![MaterialDesc::new("rain")],
            0,
            &ScatterOptions::default(),
            &NoCustomization,
            &NoCustomization,
            &mut registry,
        );
        assert!(buffer.is_empty());
        assert_eq!(engine.passes(), 1);
    }

    #[test]
    fn rescatter_reuses_buffer() {
        let mut engine = ScatterEngine::new();
        let mut registry = Registry::default();
        let (shape, mat) = grass();
        let options = ScatterOptions::default();
        let mut buffer = engine.scatter(shape, mat, &[point(Vec3::ZERO, Vec3::Y)], &options, &NoCustomization, &NoCustomization, &mut registry);
        let points = [point(Vec3::X, Vec3::Y), point(Vec3::Z, Vec3::Y)];
        engine.rescatter(&mut buffer, &points, &options, &NoCustomization);
        assert_eq!(buffer.len(), 2);
        assert!(buffer.is_frozen());
        assert_eq!(buffer.world_matrices()[1].w_axis.truncate(), Vec3::Z);
    }
}
