// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::component::Component;
use vesper_core::math::{Mat4, Quaternion, Vec3};

/// A component that defines a perspective camera's projection parameters.
///
/// The camera's placement comes from the transform of the game object it is
/// attached to; see [`Camera::view_matrix`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// The vertical field of view in radians.
    pub fov_y_radians: f32,

    /// The aspect ratio of the viewport (width / height).
    /// This is typically updated when the window is resized.
    pub aspect_ratio: f32,

    /// The distance to the near clipping plane. Must be positive.
    pub z_near: f32,

    /// The distance to the far clipping plane. Must be larger than `z_near`.
    pub z_far: f32,

    /// Whether this camera is the primary camera.
    pub is_active: bool,
}

impl Camera {
    /// Creates a new perspective camera with the given parameters.
    pub fn new_perspective(fov_y_radians: f32, aspect_ratio: f32, z_near: f32, z_far: f32) -> Self {
        Self {
            fov_y_radians,
            aspect_ratio,
            z_near,
            z_far,
            is_active: true,
        }
    }

    /// Calculates the projection matrix for this camera.
    ///
    /// Right-handed with a [0, 1] depth range.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_zo(self.fov_y_radians, self.aspect_ratio, self.z_near, self.z_far)
    }

    /// The view matrix of a camera placed at `position` with `rotation`
    /// (typically the world position and rotation of its game object).
    ///
    /// This is the inverse of the rigid placement: `R^-1 * T(-position)`.
    pub fn view_matrix(position: Vec3, rotation: Quaternion) -> Mat4 {
        Mat4::from_quat(rotation.normalize().conjugate()) * Mat4::from_translation(-position)
    }

    /// Updates the aspect ratio, typically called when the window is resized.
    pub fn set_aspect_ratio(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect_ratio = width as f32 / height as f32;
        }
    }
}

impl Default for Camera {
    /// 60 degree vertical FOV, 16:9, near 0.1, far 1000.
    fn default() -> Self {
        Self::new_perspective(60.0_f32.to_radians(), 16.0 / 9.0, 0.1, 1000.0)
    }
}

impl Component for Camera {}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use vesper_core::math::{Vec4, FRAC_PI_2};

    #[test]
    fn test_camera_default() {
        let camera = Camera::default();
        assert_eq!(camera.fov_y_radians, 60.0_f32.to_radians());
        assert_eq!(camera.aspect_ratio, 16.0 / 9.0);
        assert_eq!(camera.z_near, 0.1);
        assert_eq!(camera.z_far, 1000.0);
        assert!(camera.is_active);
    }

    #[test]
    fn test_camera_set_aspect_ratio_ignores_zero_height() {
        let mut camera = Camera::default();
        camera.set_aspect_ratio(800, 600);
        assert_relative_eq!(camera.aspect_ratio, 4.0 / 3.0);
        camera.set_aspect_ratio(800, 0);
        assert_relative_eq!(camera.aspect_ratio, 4.0 / 3.0);
    }

    #[test]
    fn test_camera_projection_matrix() {
        let camera = Camera::new_perspective(FRAC_PI_2, 1.0, 1.0, 10.0);
        let proj = camera.projection_matrix();
        assert_ne!(proj, Mat4::IDENTITY);

        let near = proj * Vec4::new(0.0, 0.0, -1.0, 1.0);
        assert_relative_eq!(near.z / near.w, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_view_matrix_moves_camera_to_origin() {
        let position = Vec3::new(3.0, 1.0, -2.0);
        let rotation = Quaternion::from_axis_angle(Vec3::Y, 0.5);
        let view = Camera::view_matrix(position, rotation);
        assert_relative_eq!(view.transform_point(position), Vec3::ZERO, epsilon = 1e-5);
    }
}
