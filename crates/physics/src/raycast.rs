//! Raycasting for surface following and probes.

use crate::PhysicsWorld;
use engine_core::Vec3;
use rapier3d::prelude::*;

/// Result of a raycast query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// The collider that was hit.
    pub collider: ColliderHandle,
    /// Distance along the ray to the hit point.
    pub distance: f32,
    /// World position of the hit.
    pub point: Vec3,
    /// Surface normal at the hit point.
    pub normal: Vec3,
}

/// Ray queries against one named surface (ground, water).
pub trait SpatialQuery {
    /// Cast a ray against `target` only. Origins inside a solid report its boundary.
    fn raycast_target(
        &self,
        target: ColliderHandle,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<RaycastHit>;
}

fn to_ray(origin: Vec3, direction: Vec3) -> Ray {
    Ray::new(
        point![origin.x, origin.y, origin.z],
        vector![direction.x, direction.y, direction.z],
    )
}

impl SpatialQuery for PhysicsWorld {
    fn raycast_target(
        &self,
        target: ColliderHandle,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<RaycastHit> {
        let collider = self.collider_set.get(target)?;
        let ray = to_ray(origin, direction);

        collider
            .shape()
            .cast_ray_and_get_normal(collider.position(), &ray, max_distance, false)
            .map(|intersection| {
                let point = ray.point_at(intersection.time_of_impact);
                RaycastHit {
                    collider: target,
                    distance: intersection.time_of_impact,
                    point: Vec3::new(point.x, point.y, point.z),
                    normal: Vec3::new(
                        intersection.normal.x,
                        intersection.normal.y,
                        intersection.normal.z,
                    ),
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upward_ray_from_below_plane_hits_surface() {
        let mut world = PhysicsWorld::new();
        let ground = world.add_ground_plane(0.0);
        let hit = world
            .raycast_target(ground, Vec3::new(0.0, -0.5, 0.0), Vec3::Y, 10.0)
            .expect("ray from below should hit the plane");
        assert!((hit.point.y).abs() < 1e-5);
        assert!((hit.distance - 0.5).abs() < 1e-5);
    }

    #[test]
    fn upward_ray_from_above_plane_misses() {
        let mut world = PhysicsWorld::new();
        let ground = world.add_ground_plane(0.0);
        assert!(world.raycast_target(ground, Vec3::new(0.0, 7.9, 0.0), Vec3::Y, 10.0).is_none());
    }

    #[test]
    fn targeted_ray_sees_sensor_water() {
        let mut world = PhysicsWorld::new();
        let water = world.add_water_surface(3.0);
        let hit = world.raycast_target(water, Vec3::new(1.0, 2.0, 1.0), Vec3::Y, 5.0);
        assert!(hit.is_some());
        assert!(world.raycast_target(water, Vec3::new(1.0, 4.0, 1.0), Vec3::Y, 5.0).is_none());
    }

    #[test]
    fn other_colliders_are_ignored() {
        let mut world = PhysicsWorld::new();
        let ground = world.add_ground_plane(0.0);
        world.add_water_surface(3.0);
        let hit = world
            .raycast_target(ground, Vec3::new(0.0, -1.0, 0.0), Vec3::Y, 50.0)
            .expect("ground is above the origin");
        assert_eq!(hit.collider, ground);
        assert!(hit.point.y.abs() < 1e-5);
    }
}
