//! Avatar locomotion: input → movement, state flags and surface following.

use animation::{AnimationBlender, AnimationSink, BlendConfig, LocomotionState, StateFlags};
use engine_core::{AssetHandle, Quat, Vec3};
use input::LocomotionIntent;
use physics::{CharacterShape, ColliderHandle, PhysicsWorld, RigidBodyHandle, SpatialQuery};
use presentation::{SITTING_FOV, STANDING_FOV};

use crate::world::Surfaces;

/// The avatar's physical presence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AvatarBody {
    pub position: Vec3,
    pub orientation: Quat,
    /// Radii of the collision volume around the center.
    pub collision_ellipsoid: Vec3,
    /// Center height above the feet.
    pub vertical_offset: f32,
}

impl AvatarBody {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            orientation: Quat::IDENTITY,
            collision_ellipsoid: Vec3::new(0.5, 2.0, 0.5),
            vertical_offset: 2.0,
        }
    }

    pub fn shape(&self) -> CharacterShape {
        CharacterShape::from_ellipsoid(self.collision_ellipsoid, self.vertical_offset)
    }

    /// Facing direction (-Z local).
    pub fn forward(&self) -> Vec3 {
        self.orientation * -Vec3::Z
    }
}

/// Movement tuning. Speeds are per millisecond.
#[derive(Debug, Clone, Copy)]
pub struct LocomotionConfig {
    pub walk_speed: f32,
    pub back_speed: f32,
    /// Radians per millisecond.
    pub turn_speed: f32,
    pub run_factor: f32,
    /// Ground probe starts this far below the foot line.
    pub probe_clearance: f32,
    /// Water probe sits this far above the ground probe.
    pub water_probe_height: f32,
    /// Upward push per unit of submersion per second.
    pub buoyancy: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            walk_speed: 0.003,
            back_speed: 0.006,
            turn_speed: 5.0_f32.to_radians() / 16.666_666,
            run_factor: 4.0,
            probe_clearance: 0.1,
            water_probe_height: 1.0,
            buoyancy: 16.0,
        }
    }
}

/// Side effects a tick asks the presentation side to perform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocomotionEvent {
    /// Animate the camera field of view to this value.
    FovTransition(f32),
    /// Re-fit the shadow cascades.
    ShadowFrustumRefresh,
    FootstepsStarted,
    FootstepsStopped,
}

/// Drives one avatar. NPCs use the same controller with empty intents.
pub struct LocomotionController {
    pub config: LocomotionConfig,
    pub body: AvatarBody,
    pub blender: AnimationBlender,
    rigid_body: Option<RigidBodyHandle>,
    walking: bool,
    sitting: bool,
    posing: bool,
    footsteps: bool,
}

impl LocomotionController {
    pub fn new(body: AvatarBody) -> Self {
        Self {
            config: LocomotionConfig::default(),
            body,
            blender: AnimationBlender::new(BlendConfig::default()),
            rigid_body: None,
            walking: false,
            sitting: false,
            posing: false,
            footsteps: false,
        }
    }

    /// Give the avatar a kinematic body so other avatars bump into it.
    pub fn attach_body(&mut self, physics: &mut PhysicsWorld) -> RigidBodyHandle {
        let handle = physics.add_kinematic_body(self.body.position);
        physics.add_character_collider(handle, self.body.shape());
        self.rigid_body = Some(handle);
        handle
    }

    pub fn rigid_body(&self) -> Option<RigidBodyHandle> {
        self.rigid_body
    }

    pub fn flags(&self) -> StateFlags {
        StateFlags {
            walking: self.walking,
            sitting: self.sitting,
            posing: self.posing,
        }
    }

    pub fn state(&self) -> LocomotionState {
        LocomotionState::from_flags(self.flags())
    }

    pub fn is_sitting(&self) -> bool {
        self.sitting
    }

    pub fn is_posing(&self) -> bool {
        self.posing
    }

    /// One tick: move, update the state machine, then resolve water and ground.
    pub fn update(
        &mut self,
        intent: &LocomotionIntent,
        physics: &PhysicsWorld,
        surfaces: &Surfaces,
        dt: f32,
    ) -> Vec<LocomotionEvent> {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let dt_ms = dt * 1000.0;
        let mut events = Vec::new();

        self.apply_movement(intent, physics, dt, dt_ms);
        self.update_state(intent, &mut events);
        self.resolve_water(physics, surfaces.water, dt);
        self.resolve_ground(physics, &surfaces.ground, dt);
        events
    }

    /// Advance the blend weights and push them into the animation layers.
    pub fn animate(&mut self, dt: f32, sink: &mut dyn AnimationSink) {
        let flags = self.flags();
        self.blender.advance_into(flags, dt, sink);
    }

    fn apply_movement(&mut self, intent: &LocomotionIntent, physics: &PhysicsWorld, dt: f32, dt_ms: f32) {
        let cfg = self.config;
        let turn = cfg.turn_speed * dt_ms;
        if intent.turn_left {
            self.body.orientation = Quat::from_rotation_y(turn) * self.body.orientation;
        }
        if intent.turn_right {
            self.body.orientation = Quat::from_rotation_y(-turn) * self.body.orientation;
        }
        self.body.orientation = self.body.orientation.normalize();

        let forward = self.body.forward();
        let mut desired = Vec3::ZERO;
        if intent.forward {
            desired += forward * cfg.walk_speed * dt_ms;
        }
        if intent.run {
            desired += forward * cfg.walk_speed * cfg.run_factor * dt_ms;
        }
        if intent.back {
            desired -= forward * cfg.back_speed * dt_ms;
        }
        if desired != Vec3::ZERO {
            self.move_by(physics, desired, dt);
        }
    }

    fn move_by(&mut self, physics: &PhysicsWorld, desired: Vec3, dt: f32) {
        let moved = physics.move_character(self.body.shape(), self.body.position, desired, dt, self.rigid_body);
        self.body.position += moved.translation;
    }

    fn update_state(&mut self, intent: &LocomotionIntent, events: &mut Vec<LocomotionEvent>) {
        if intent.is_moving() {
            if !self.footsteps {
                self.footsteps = true;
                events.push(LocomotionEvent::FootstepsStarted);
            }
            if self.sitting {
                self.sitting = false;
                log::debug!("Walking cancels sitting");
                events.push(LocomotionEvent::FovTransition(STANDING_FOV));
                events.push(LocomotionEvent::ShadowFrustumRefresh);
            }
            if self.posing {
                self.posing = false;
                log::debug!("Walking cancels pose");
            }
            if !self.walking {
                self.walking = true;
                log::debug!("Walking");
            }
            return;
        }

        if self.footsteps {
            self.footsteps = false;
            events.push(LocomotionEvent::FootstepsStopped);
        }

        if intent.toggle_sit {
            if !self.blender.is_at_rest(LocomotionState::Sitting) {
                log::debug!("Sit toggle ignored mid-transition");
            } else if self.sitting && self.blender.weight(LocomotionState::Sitting) == 1.0 {
                self.sitting = false;
                self.walking = true;
                log::debug!("Standing up");
                events.push(LocomotionEvent::FovTransition(STANDING_FOV));
                events.push(LocomotionEvent::ShadowFrustumRefresh);
            } else if !self.sitting && self.blender.weight(LocomotionState::Sitting) == 0.0 {
                self.sitting = true;
                self.walking = false;
                log::debug!("Sitting down");
                events.push(LocomotionEvent::FovTransition(SITTING_FOV));
                events.push(LocomotionEvent::ShadowFrustumRefresh);
            }
        }

        if intent.toggle_pose {
            if self.blender.is_at_rest(LocomotionState::Posing) {
                self.posing = !self.posing;
                log::debug!("Pose {}", if self.posing { "on" } else { "off" });
            } else {
                log::debug!("Pose toggle ignored mid-transition");
            }
        }

        if self.walking && !self.sitting {
            self.walking = false;
            log::debug!("Idle");
        }
    }

    /// Push the avatar up while its lower body is below the water line.
    fn resolve_water(&mut self, physics: &PhysicsWorld, water: Option<ColliderHandle>, dt: f32) {
        let Some(water) = water else {
            return;
        };
        let origin = self.body.position
            + Vec3::new(
                0.0,
                -(self.body.vertical_offset + self.config.probe_clearance) + self.config.water_probe_height,
                0.0,
            );
        if let Some(hit) = physics.raycast_target(water, origin, Vec3::Y, f32::MAX) {
            let lift = self.config.buoyancy * hit.distance * dt;
            self.move_by(physics, Vec3::new(0.0, lift, 0.0), dt);
        }
    }

    /// Snap to the ground when the foot probe is at or under it, otherwise fall one step.
    fn resolve_ground(&mut self, physics: &PhysicsWorld, ground: &AssetHandle<ColliderHandle>, dt: f32) {
        let ground = match ground {
            AssetHandle::Loaded(handle) => *handle,
            AssetHandle::Pending | AssetHandle::Failed(_) => return,
        };
        let origin = self.body.position - Vec3::new(0.0, self.body.vertical_offset + self.config.probe_clearance, 0.0);
        match physics.raycast_target(ground, origin, Vec3::Y, f32::MAX) {
            Some(hit) => self.body.position.y = hit.point.y + self.body.vertical_offset,
            None => self.move_by(physics, Vec3::new(0.0, physics.gravity_y() * dt, 0.0), dt),
        }
    }
}

/// The camera is below the water line when an upward ray from it meets the surface.
pub fn camera_is_underwater(physics: &PhysicsWorld, water: Option<ColliderHandle>, camera_position: Vec3) -> bool {
    water.is_some_and(|water| {
        physics
            .raycast_target(water, camera_position, Vec3::Y, f32::MAX)
            .is_some()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use animation::BlendFrame;

    fn flat_world() -> (PhysicsWorld, Surfaces) {
        let mut physics = PhysicsWorld::new();
        let ground = physics.add_ground_plane(0.0);
        let surfaces = Surfaces {
            ground: AssetHandle::Loaded(ground),
            water: None,
        };
        (physics, surfaces)
    }

    fn standing(y: f32) -> LocomotionController {
        LocomotionController::new(AvatarBody::new(Vec3::new(0.0, y, 0.0)))
    }

    fn walk() -> LocomotionIntent {
        LocomotionIntent {
            forward: true,
            ..Default::default()
        }
    }

    fn sit() -> LocomotionIntent {
        LocomotionIntent {
            toggle_sit: true,
            ..Default::default()
        }
    }

    fn settle(avatar: &mut LocomotionController, physics: &PhysicsWorld, surfaces: &Surfaces, seconds: f32) {
        let mut frame = BlendFrame::default();
        let steps = (seconds * 60.0) as usize;
        for _ in 0..steps {
            avatar.update(&LocomotionIntent::default(), physics, surfaces, 1.0 / 60.0);
            avatar.animate(1.0 / 60.0, &mut frame);
        }
    }

    #[test]
    fn falling_avatar_lands_and_snaps_to_ground() {
        let (physics, surfaces) = flat_world();
        let mut avatar = standing(10.0);

        avatar.update(&LocomotionIntent::default(), &physics, &surfaces, 1.0);
        let y = avatar.body.position.y;
        assert!(y < 10.0, "gravity step applied");
        assert!(y > 1.9, "did not fall through the ground: {}", y);

        avatar.update(&LocomotionIntent::default(), &physics, &surfaces, 1.0);
        assert!((avatar.body.position.y - 2.0).abs() < 1e-4);
    }

    #[test]
    fn off_the_ground_edge_keeps_falling() {
        let mut physics = PhysicsWorld::new();
        let ground = physics
            .add_terrain_heightfield(&[0.0; 4], 2, 2, 10.0, 10.0)
            .unwrap();
        let surfaces = Surfaces {
            ground: AssetHandle::Loaded(ground),
            water: None,
        };
        let mut avatar = LocomotionController::new(AvatarBody::new(Vec3::new(20.0, 2.0, 0.0)));

        avatar.update(&LocomotionIntent::default(), &physics, &surfaces, 0.1);
        let y = avatar.body.position.y;
        assert!((y - (2.0 + physics.gravity_y() * 0.1)).abs() < 0.02, "fell to {}", y);

        avatar.update(&LocomotionIntent::default(), &physics, &surfaces, 0.1);
        assert!(avatar.body.position.y < y, "no snap back onto the ground");
    }

    #[test]
    fn pending_ground_skips_surface_following() {
        let (physics, _) = flat_world();
        let surfaces = Surfaces::default();
        let mut avatar = standing(10.0);
        avatar.update(&LocomotionIntent::default(), &physics, &surfaces, 1.0);
        assert_eq!(avatar.body.position.y, 10.0);
    }

    #[test]
    fn walking_moves_forward_and_starts_footsteps() {
        let (physics, surfaces) = flat_world();
        let mut avatar = standing(2.5);
        let events = avatar.update(&walk(), &physics, &surfaces, 0.1);
        assert_eq!(avatar.state(), LocomotionState::Walking);
        assert!(events.contains(&LocomotionEvent::FootstepsStarted));
        // 0.003 per ms for 100 ms along -Z.
        assert!((avatar.body.position.z + 0.3).abs() < 0.02);

        let events = avatar.update(&LocomotionIntent::default(), &physics, &surfaces, 0.1);
        assert!(events.contains(&LocomotionEvent::FootstepsStopped));
        assert_eq!(avatar.state(), LocomotionState::Idle);
    }

    #[test]
    fn running_is_four_times_walking() {
        let (physics, surfaces) = flat_world();
        let mut avatar = standing(2.5);
        let run = LocomotionIntent {
            run: true,
            ..Default::default()
        };
        avatar.update(&run, &physics, &surfaces, 0.1);
        assert!((avatar.body.position.z + 1.2).abs() < 0.05);
    }

    #[test]
    fn sitting_narrows_fov_and_walking_restores_it() {
        let (physics, surfaces) = flat_world();
        let mut avatar = standing(2.0);

        let events = avatar.update(&sit(), &physics, &surfaces, 1.0 / 60.0);
        assert!(avatar.is_sitting());
        assert_eq!(
            events,
            vec![
                LocomotionEvent::FovTransition(SITTING_FOV),
                LocomotionEvent::ShadowFrustumRefresh
            ]
        );

        settle(&mut avatar, &physics, &surfaces, 0.5);
        let events = avatar.update(&walk(), &physics, &surfaces, 1.0 / 60.0);
        assert!(!avatar.is_sitting());
        assert!(events.contains(&LocomotionEvent::FovTransition(STANDING_FOV)));
        assert!(events.contains(&LocomotionEvent::ShadowFrustumRefresh));
    }

    #[test]
    fn sit_toggle_mid_transition_is_ignored() {
        let (physics, surfaces) = flat_world();
        let mut avatar = standing(2.0);
        let mut frame = BlendFrame::default();

        avatar.update(&sit(), &physics, &surfaces, 1.0 / 60.0);
        avatar.animate(0.125, &mut frame);
        let mid = avatar.blender.weight(LocomotionState::Sitting);
        assert!((mid - 0.5).abs() < 1e-6);

        let events = avatar.update(&sit(), &physics, &surfaces, 1.0 / 60.0);
        assert!(events.is_empty());
        assert!(avatar.is_sitting());

        avatar.animate(0.05, &mut frame);
        assert!(avatar.blender.weight(LocomotionState::Sitting) > mid);
    }

    #[test]
    fn standing_up_after_full_sit() {
        let (physics, surfaces) = flat_world();
        let mut avatar = standing(2.0);
        avatar.update(&sit(), &physics, &surfaces, 1.0 / 60.0);
        settle(&mut avatar, &physics, &surfaces, 1.0);
        assert_eq!(avatar.blender.weight(LocomotionState::Sitting), 1.0);

        let events = avatar.update(&sit(), &physics, &surfaces, 1.0 / 60.0);
        assert!(!avatar.is_sitting());
        assert_eq!(avatar.state(), LocomotionState::Idle);
        assert!(events.contains(&LocomotionEvent::FovTransition(STANDING_FOV)));
    }

    #[test]
    fn pose_toggle_respects_rest_guard() {
        let (physics, surfaces) = flat_world();
        let mut avatar = standing(2.0);
        let pose = LocomotionIntent {
            toggle_pose: true,
            ..Default::default()
        };
        avatar.update(&pose, &physics, &surfaces, 1.0 / 60.0);
        assert_eq!(avatar.state(), LocomotionState::Posing);

        let mut frame = BlendFrame::default();
        avatar.animate(0.1, &mut frame);
        avatar.update(&pose, &physics, &surfaces, 1.0 / 60.0);
        assert!(avatar.is_posing(), "mid-blend toggle ignored");

        avatar.update(&walk(), &physics, &surfaces, 1.0 / 60.0);
        assert!(!avatar.is_posing());
    }

    #[test]
    fn water_pushes_submerged_avatar_up() {
        let mut physics = PhysicsWorld::new();
        let water = physics.add_water_surface(5.0);
        let surfaces = Surfaces {
            ground: AssetHandle::Pending,
            water: Some(water),
        };
        let mut avatar = standing(3.0);
        avatar.update(&LocomotionIntent::default(), &physics, &surfaces, 0.1);
        // Probe at 3 - 2.1 + 1 = 1.9, 3.1 below the surface.
        assert!((avatar.body.position.y - (3.0 + 16.0 * 3.1 * 0.1)).abs() < 0.05);
    }

    #[test]
    fn camera_probe_sees_water_above() {
        let mut physics = PhysicsWorld::new();
        let water = physics.add_water_surface(1.5);
        assert!(camera_is_underwater(&physics, Some(water), Vec3::new(0.0, 0.5, 0.0)));
        assert!(!camera_is_underwater(&physics, Some(water), Vec3::new(0.0, 4.0, 0.0)));
        assert!(!camera_is_underwater(&physics, None, Vec3::ZERO));
    }
}
