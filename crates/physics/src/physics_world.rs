//! Physics world management with Rapier3D.

use crate::collision::CollisionGroup;
use engine_core::Vec3;
use rapier3d::control::{CharacterLength, KinematicCharacterController};
use rapier3d::prelude::*;

/// Capsule used for collision-aware avatar moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterShape {
    /// Distance from the capsule center to the end of each hemisphere.
    pub half_height: f32,
    pub radius: f32,
}

impl CharacterShape {
    /// Capsule inscribed in an ellipsoid with the given radii (x and z averaged for the radius).
    pub fn from_ellipsoid(radii: Vec3, half_height: f32) -> Self {
        let radius = ((radii.x + radii.z) * 0.5).clamp(0.05, half_height);
        Self { half_height, radius }
    }

    fn capsule(&self) -> Capsule {
        Capsule::new_y((self.half_height - self.radius).max(0.0), self.radius)
    }
}

/// Outcome of one collision-aware move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterMove {
    /// Translation actually applied after sliding.
    pub translation: Vec3,
    pub grounded: bool,
}

/// Main physics world containing all simulation state.
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,
    pub character_controller: KinematicCharacterController,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Create a new physics world with default gravity.
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity: vector![0.0, -9.81, 0.0],
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            character_controller: KinematicCharacterController {
                offset: CharacterLength::Absolute(0.01),
                snap_to_ground: None,
                ..Default::default()
            },
        }
    }

    /// Gravity along Y, negative pointing down.
    pub fn gravity_y(&self) -> f32 {
        self.gravity.y
    }

    /// Step the physics simulation.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Update query pipeline for raycasting.
    pub fn update_query_pipeline(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    /// Add a kinematic rigid body (for avatars).
    pub fn add_kinematic_body(&mut self, position: Vec3) -> RigidBodyHandle {
        let rigid_body = RigidBodyBuilder::kinematic_position_based()
            .translation(vector![position.x, position.y, position.z])
            .build();
        self.rigid_body_set.insert(rigid_body)
    }

    /// Add an avatar capsule to a kinematic body.
    pub fn add_character_collider(&mut self, body_handle: RigidBodyHandle, shape: CharacterShape) -> ColliderHandle {
        let collider = ColliderBuilder::capsule_y((shape.half_height - shape.radius).max(0.0), shape.radius)
            .collision_groups(CollisionGroup::avatar())
            .build();
        let handle = self
            .collider_set
            .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);
        self.update_query_pipeline();
        handle
    }

    /// Add a ground plane collider (flat half-space at the given height).
    pub fn add_ground_plane(&mut self, height: f32) -> ColliderHandle {
        let collider = ColliderBuilder::halfspace(Vector::y_axis())
            .translation(vector![0.0, height, 0.0])
            .collision_groups(CollisionGroup::environment())
            .build();
        let handle = self.collider_set.insert(collider);
        self.update_query_pipeline();
        handle
    }

    /// Add the water surface: a sensor half-space, solid below `level`.
    ///
    /// Sensors never block character moves; they are only hit by targeted ray casts.
    pub fn add_water_surface(&mut self, level: f32) -> ColliderHandle {
        let collider = ColliderBuilder::halfspace(Vector::y_axis())
            .translation(vector![0.0, level, 0.0])
            .sensor(true)
            .collision_groups(CollisionGroup::water())
            .build();
        let handle = self.collider_set.insert(collider);
        self.update_query_pipeline();
        handle
    }

    /// Add a heightfield collider matching the ground mesh.
    /// - `heights`: row-major heights in world Y (index = z * ncols + x).
    /// - `size_x`, `size_z`: total extent (ground spans -size/2 to +size/2).
    ///
    /// Returns `None` when the grid is smaller than 2×2 or `heights` is too short.
    pub fn add_terrain_heightfield(
        &mut self,
        heights: &[f32],
        nrows: usize,
        ncols: usize,
        size_x: f32,
        size_z: f32,
    ) -> Option<ColliderHandle> {
        if nrows < 2 || ncols < 2 || heights.len() < nrows * ncols {
            log::warn!(
                "Heightfield {}x{} rejected ({} heights)",
                nrows,
                ncols,
                heights.len()
            );
            return None;
        }

        let heights_matrix = DMatrix::from_fn(nrows, ncols, |i, j| heights[i * ncols + j] as Real);
        let scale = vector![size_x, 1.0, size_z];

        let collider = ColliderBuilder::heightfield(heights_matrix, scale)
            .collision_groups(CollisionGroup::environment())
            .build();
        let handle = self.collider_set.insert(collider);
        self.update_query_pipeline();
        Some(handle)
    }

    /// Set the position of a kinematic body and its colliders right away.
    pub fn set_kinematic_position(&mut self, handle: RigidBodyHandle, position: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_next_kinematic_translation(vector![position.x, position.y, position.z]);
            body.set_translation(vector![position.x, position.y, position.z], true);
        }
    }

    /// Move a capsule by `desired`, sliding along environment and avatar colliders.
    ///
    /// Sensors (water) never block. `exclude` is the mover's own body, if it has one.
    pub fn move_character(
        &self,
        shape: CharacterShape,
        position: Vec3,
        desired: Vec3,
        dt: f32,
        exclude: Option<RigidBodyHandle>,
    ) -> CharacterMove {
        let capsule = shape.capsule();
        let isometry = Isometry::translation(position.x, position.y, position.z);
        let mut filter = QueryFilter::default().exclude_sensors();
        if let Some(body) = exclude {
            filter = filter.exclude_rigid_body(body);
        }

        let movement = self.character_controller.move_shape(
            dt,
            &self.rigid_body_set,
            &self.collider_set,
            &self.query_pipeline,
            &capsule,
            &isometry,
            vector![desired.x, desired.y, desired.z],
            filter,
            |_| {},
        );

        CharacterMove {
            translation: Vec3::new(movement.translation.x, movement.translation.y, movement.translation.z),
            grounded: movement.grounded,
        }
    }
}
