use glam::{Mat4, Vec2, Vec3};

use crate::config::*;

/// Accumulated third-person look angles.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraAngles {
    pub yaw: f32,
    pitch: f32,
}

impl CameraAngles {
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Add look deltas (radians). Pitch is clamped so the orbit never flips.
    pub fn apply_look(&mut self, delta: Vec2) {
        self.yaw += delta.x;
        self.pitch = (self.pitch + delta.y).clamp(PITCH_MIN, PITCH_MAX);
    }

    pub fn reset_pitch(&mut self) {
        self.pitch = 0.0;
    }

    /// Unit ground-plane vectors for the current yaw: (forward, right).
    pub fn ground_axes(&self) -> (Vec3, Vec3) {
        let (sin, cos) = self.yaw.sin_cos();
        (Vec3::new(-sin, 0.0, -cos), Vec3::new(cos, 0.0, -sin))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub eye: Vec3,
    pub target: Vec3,
}

impl CameraPose {
    /// Orbit pose around a player standing at `position`. No collision.
    pub fn orbit(position: Vec3, angles: &CameraAngles) -> Self {
        let (sin_yaw, cos_yaw) = angles.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = angles.pitch.sin_cos();
        let eye = position
            + Vec3::new(
                sin_yaw * CAMERA_DISTANCE * cos_pitch,
                CAMERA_HEIGHT + sin_pitch * CAMERA_DISTANCE,
                cos_yaw * CAMERA_DISTANCE * cos_pitch,
            );
        Self {
            eye,
            target: position + Vec3::Y * CAMERA_LOOK_HEIGHT,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn view_proj(&self, fov_y: f32, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(fov_y, aspect.max(1e-3), Z_NEAR, Z_FAR) * self.view_matrix()
    }
}
