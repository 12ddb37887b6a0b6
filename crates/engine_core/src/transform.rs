//! Transform component and utilities for spatial positioning.

use glam::{Mat4, Quat, Vec3};

/// A 3D transform representing position, rotation, and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform at the given position.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create the model matrix for this transform.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Get the forward direction (negative Z in right-handed coordinates).
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::Z
    }

    /// Get the up direction (positive Y).
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Translate the transform by a delta.
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Rotate around the world Y axis (yaw). Positive angles turn left.
    pub fn rotate_y(&mut self, angle: f32) {
        self.rotation = Quat::from_rotation_y(angle) * self.rotation;
    }

    /// Rotate local +Y toward `normal`, blended by `strength` in [0, 1].
    ///
    /// 0 leaves the rotation untouched, 1 aligns up with the normal exactly.
    /// A zero-length normal is ignored.
    pub fn align_up_to(&mut self, normal: Vec3, strength: f32) {
        let normal = normal.normalize_or_zero();
        let strength = strength.clamp(0.0, 1.0);
        if normal == Vec3::ZERO || strength == 0.0 {
            return;
        }
        let arc = Quat::from_rotation_arc(Vec3::Y, normal);
        self.rotation = Quat::IDENTITY.slerp(arc, strength) * self.rotation;
    }

    /// Turn local +Z toward `eye` (billboard). Does nothing when `eye` coincides with the position.
    pub fn face_towards(&mut self, eye: Vec3) {
        let dir = (eye - self.position).normalize_or_zero();
        if dir != Vec3::ZERO {
            self.rotation = Quat::from_rotation_arc(Vec3::Z, dir);
        }
    }

    /// Compose a local offset transform on top of this one (this * delta).
    pub fn then(&self, delta: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * (self.scale * delta.position),
            rotation: self.rotation * delta.rotation,
            scale: self.scale * delta.scale,
        }
    }
}
