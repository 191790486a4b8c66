//! Shared 3D camera resource.
//!
//! Wraps raylib's [`raylib::prelude::Camera3D`] so that systems can agree on
//! a single view transform. The particle billboard pass and the audio
//! listener both read the camera position from here.

use bevy_ecs::prelude::Resource;
use raylib::prelude::{Camera3D, CameraProjection, Vector3};

/// ECS resource that holds the active 3D camera parameters.
///
/// Typically inserted during setup, read by render systems, and optionally
/// mutated by camera-controller systems.
#[derive(Resource)]
pub struct CameraRes(pub Camera3D);

impl Default for CameraRes {
    fn default() -> Self {
        CameraRes(Camera3D::perspective(
            Vector3::new(0.0, 2.0, 10.0),
            Vector3::zero(),
            Vector3::up(),
            60.0,
        ))
    }
}

impl CameraRes {
    pub fn position(&self) -> Vector3 {
        self.0.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_is_perspective() {
        let cam = CameraRes::default();
        assert_eq!(cam.0.camera_type(), CameraProjection::CAMERA_PERSPECTIVE);
        assert!((cam.position().z - 10.0).abs() < 1e-6);
    }
}
