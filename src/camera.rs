//! A free-flying perspective camera.
//!
//! The camera is a plain value: yaw, pitch and field of view are stored in degrees and the basis
//! vectors are derived from them on every call, so mutating yaw or pitch is reflected immediately.

use glam::{Mat4, Vec3};

/// Near clip plane distance.
pub const NEAR: f32 = 0.1;
/// Far clip plane distance.
pub const FAR: f32 = 100.0;
/// Pitch limit in degrees. At ±90° the right vector degenerates.
pub const PITCH_LIMIT: f32 = 89.0;
/// Smallest allowed field of view in degrees.
pub const MIN_FOV: f32 = 1.0;
/// Largest allowed field of view in degrees.
pub const MAX_FOV: f32 = 90.0;

/// Orthonormal camera basis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraBasis {
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

/// Directions requested for one movement step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Movement {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl Movement {
    /// Returns `true` if no direction is requested.
    pub fn is_idle(&self) -> bool {
        *self == Movement::default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    yaw: f32,
    pitch: f32,
    fov: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl Camera {
    /// Creates a camera at `position` looking down -Z.
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw: -90.0,
            pitch: 0.0,
            fov: 45.0,
        }
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        self.yaw = yaw;
    }

    /// Sets the pitch, clamped to ±[`PITCH_LIMIT`].
    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Sets the field of view, clamped to [[`MIN_FOV`], [`MAX_FOV`]].
    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov.clamp(MIN_FOV, MAX_FOV);
    }

    /// Computes the forward, right and up vectors from yaw and pitch.
    pub fn basis(&self) -> CameraBasis {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        let forward = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward).normalize();
        CameraBasis { forward, right, up }
    }

    /// Returns the view matrix.
    pub fn view(&self) -> Mat4 {
        let basis = self.basis();
        Mat4::look_at_rh(self.position, self.position + basis.forward, basis.up)
    }

    /// Returns the projection matrix for the given width / height ratio.
    pub fn projection(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov.to_radians(), aspect_ratio, NEAR, FAR)
    }

    /// Turns the camera by a look delta (typically mouse motion).
    pub fn apply_look_delta(&mut self, dx: f32, dy: f32, sensitivity: f32) {
        self.yaw += dx * sensitivity;
        self.set_pitch(self.pitch + dy * sensitivity);
    }

    /// Moves the camera by `velocity` along each requested direction.
    ///
    /// Forward and backward follow the view direction; strafing uses the right vector, which has
    /// no vertical component because world up is fixed to +Y. Up and down move along world Y.
    pub fn apply_move(&mut self, movement: Movement, velocity: f32) {
        let basis = self.basis();
        let mut offset = Vec3::ZERO;
        if movement.forward {
            offset += basis.forward;
        }
        if movement.backward {
            offset -= basis.forward;
        }
        if movement.right {
            offset += basis.right;
        }
        if movement.left {
            offset -= basis.right;
        }
        if movement.up {
            offset += Vec3::Y;
        }
        if movement.down {
            offset -= Vec3::Y;
        }
        self.position += offset * velocity;
    }

    /// Zooms by narrowing the field of view (scroll wheel).
    pub fn apply_zoom(&mut self, delta: f32) {
        self.set_fov(self.fov - delta);
    }
}
