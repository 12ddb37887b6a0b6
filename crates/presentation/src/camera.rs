//! Third-person follow camera.

use bytemuck::{Pod, Zeroable};
use engine_core::Transform;
use glam::{Mat4, Quat, Vec3};

/// Field of view while standing or walking, radians.
pub const STANDING_FOV: f32 = 0.6;
/// Tighter field of view while seated.
pub const SITTING_FOV: f32 = 0.4;
/// 30 frames at 60 fps.
pub const FOV_TWEEN_SECONDS: f32 = 0.5;

/// `1 - (1 - t)^power`: fast start, slow finish.
pub fn ease_out_power(t: f32, power: i32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(power)
}

/// Field-of-view animation in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FovTween {
    pub from: f32,
    pub to: f32,
    pub elapsed: f32,
    pub duration: f32,
}

impl FovTween {
    pub fn new(from: f32, to: f32) -> Self {
        Self {
            from,
            to,
            elapsed: 0.0,
            duration: FOV_TWEEN_SECONDS,
        }
    }

    /// Advance and return the current value.
    pub fn advance(&mut self, dt: f32) -> f32 {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        if self.is_finished() {
            return self.to;
        }
        let t = self.elapsed / self.duration;
        self.from + (self.to - self.from) * ease_out_power(t, 2)
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Camera that trails behind a target with limited speed.
#[derive(Debug, Clone)]
pub struct FollowCamera {
    pub transform: Transform,
    /// Vertical field of view in radians.
    pub fov: f32,
    /// Distance behind the target.
    pub radius: f32,
    /// Height above the target.
    pub height_offset: f32,
    /// Fraction of the remaining distance covered per 60 Hz frame.
    pub acceleration: f32,
    /// Speed cap in units per 60 Hz frame. 0 freezes the camera.
    pub max_speed: f32,
    /// Speed restored when the camera is unlocked.
    pub unlocked_speed: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
    /// The camera is below the water surface (drives the color grade).
    pub underwater: bool,
    tween: Option<FovTween>,
    target: Vec3,
}

impl Default for FollowCamera {
    fn default() -> Self {
        Self {
            transform: Transform::from_position(Vec3::new(0.0, 10.0, 0.0)),
            fov: STANDING_FOV,
            radius: 5.0,
            height_offset: 0.0,
            acceleration: 0.025,
            max_speed: 20.0,
            unlocked_speed: 20.0,
            near: 0.1,
            far: 10000.0,
            aspect: 16.0 / 9.0,
            underwater: false,
            tween: None,
            target: Vec3::ZERO,
        }
    }
}

impl FollowCamera {
    pub fn new(position: Vec3) -> Self {
        Self {
            transform: Transform::from_position(position),
            ..Default::default()
        }
    }

    /// Update aspect ratio (call on window resize).
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Start animating the field of view toward `fov` from its current value.
    pub fn tween_fov_to(&mut self, fov: f32) {
        self.tween = Some(FovTween::new(self.fov, fov));
    }

    pub fn is_tweening(&self) -> bool {
        self.tween.is_some()
    }

    /// Toggle between frozen and following.
    pub fn toggle_lock(&mut self) {
        self.max_speed = if self.max_speed == 0.0 { self.unlocked_speed } else { 0.0 };
        log::debug!("Follow camera speed set to {}", self.max_speed);
    }

    pub fn is_locked(&self) -> bool {
        self.max_speed == 0.0
    }

    /// Returns true when the state changed.
    pub fn set_underwater(&mut self, underwater: bool) -> bool {
        let changed = self.underwater != underwater;
        self.underwater = underwater;
        changed
    }

    /// Trail the target: sits `radius` behind its facing, looking at it.
    pub fn update(&mut self, dt: f32, target_position: Vec3, target_rotation: Quat) {
        if let Some(tween) = &mut self.tween {
            self.fov = tween.advance(dt);
            if tween.is_finished() {
                self.tween = None;
            }
        }

        self.target = target_position;
        // Avatars face -Z, the camera sits on their +Z side.
        let behind = target_rotation * Vec3::Z;
        let goal = target_position + behind * self.radius + Vec3::Y * self.height_offset;

        let frames = dt * 60.0;
        let mut step = (goal - self.transform.position) * (self.acceleration * frames).min(1.0);
        let cap = self.max_speed * frames;
        if step.length() > cap {
            step = step.normalize_or_zero() * cap;
        }
        self.transform.translate(step);

        let to_target = target_position - self.transform.position;
        if to_target.length_squared() > 1e-8 {
            self.transform.rotation = Quat::from_rotation_arc(-Vec3::Z, to_target.normalize());
        }
    }

    /// Get the view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        let eye = self.transform.position;
        let target = eye + self.transform.forward();
        Mat4::look_at_rh(eye, target, Vec3::Y)
    }

    /// Get the projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    /// Get the combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.view_projection_matrix().to_cols_array_2d(),
            position: self.transform.position.to_array(),
            underwater: if self.underwater { 1.0 } else { 0.0 },
        }
    }
}

/// Camera uniform buffer data for shaders.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 3],
    /// 1.0 selects the underwater color grade.
    pub underwater: f32,
}
