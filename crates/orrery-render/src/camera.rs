//! Perspective camera with reverse-Z projection.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

/// Camera data uploaded once per frame (group 0, binding 0).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
}

#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    /// Rotation as a unit quaternion; identity looks down -Z.
    pub rotation: Quat,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width / height.
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Camera at `position` facing `target`, with +Y up.
    pub fn looking_at(position: Vec3, target: Vec3, fov_y: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov_y,
            near,
            far,
            ..Self::default()
        };
        camera.look_at(position, target);
        camera
    }

    /// Move the camera to `position` and turn it towards `target`.
    pub fn look_at(&mut self, position: Vec3, target: Vec3) {
        self.position = position;
        if (target - position).length_squared() > f32::EPSILON {
            let view = Mat4::look_at_rh(position, target, Vec3::Y);
            let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
            self.rotation = rotation.normalize();
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        (Mat4::from_translation(self.position) * Mat4::from_quat(self.rotation)).inverse()
    }

    /// Projection with near and far swapped, so the near plane lands on depth 1.0.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.far, self.near)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Update the aspect ratio after a resize. Zero heights are ignored.
    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        if height > 0.0 && width > 0.0 {
            self.aspect_ratio = width / height;
        }
    }

    pub fn to_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.view_projection_matrix().to_cols_array_2d(),
            camera_pos: self.position.extend(1.0).to_array(),
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov_y: 35f32.to_radians(),
            aspect_ratio: 16.0 / 9.0,
            near: 0.1,
            far: 400.0,
        }
    }
}
