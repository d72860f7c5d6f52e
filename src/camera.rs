//! Orbit camera, perspective projection and the camera uniform.
//!
//! The camera orbits a fixed look-at target: dragging rotates the eye around
//! the target on a sphere, scrolling moves the eye along the view ray. The
//! resulting view/projection matrix is uploaded once per frame through
//! [`CameraUniform`].

use cgmath::{Angle, InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use winit::dpi::PhysicalPosition;
use winit::event::MouseScrollDelta;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P, target: P) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, Vector3::unit_y())
    }
}

#[derive(Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Pointer-driven orbit control around the camera target.
///
/// Mouse deltas and scroll amounts accumulate between frames and are applied
/// by [`update`](Self::update), which rebuilds the eye position in spherical
/// coordinates around the target.
#[derive(Debug)]
pub struct OrbitController {
    rotate_horizontal: f32,
    rotate_vertical: f32,
    scroll: f32,
    sensitivity: f32,
    zoom_speed: f32,
    min_distance: f32,
    max_distance: f32,
}

impl OrbitController {
    pub fn new(sensitivity: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
            scroll: 0.0,
            sensitivity,
            zoom_speed,
            min_distance: 1.0,
            max_distance: 400.0,
        }
    }

    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        self.rotate_horizontal += dx as f32;
        self.rotate_vertical += dy as f32;
    }

    pub fn handle_scroll(&mut self, delta: &MouseScrollDelta) {
        self.scroll += match delta {
            MouseScrollDelta::LineDelta(_, lines) => *lines,
            MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => *y as f32 / 20.0,
        };
    }

    pub fn update(&mut self, camera: &mut Camera) {
        let offset = camera.position - camera.target;
        let mut radius = offset.magnitude();
        let mut yaw = Rad(offset.x.atan2(offset.z));
        let mut pitch = Rad((offset.y / radius).asin());

        yaw -= Rad(self.rotate_horizontal * self.sensitivity);
        pitch += Rad(self.rotate_vertical * self.sensitivity);
        // Keep the eye off the poles so look_at stays well-defined.
        let limit = Rad(std::f32::consts::FRAC_PI_2 - 0.01);
        if pitch > limit {
            pitch = limit;
        }
        if pitch < -limit {
            pitch = -limit;
        }

        radius = (radius - self.scroll * self.zoom_speed)
            .clamp(self.min_distance, self.max_distance);

        camera.position = camera.target
            + Vector3::new(
                radius * pitch.cos() * yaw.sin(),
                radius * pitch.sin(),
                radius * pitch.cos() * yaw.cos(),
            );

        self.rotate_horizontal = 0.0;
        self.rotate_vertical = 0.0;
        self.scroll = 0.0;
    }
}

/// The camera data as it lives on the GPU.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything camera related the GPU context owns: the camera itself, its
/// controller, and the uniform buffer plus bind group the pipelines consume.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: OrbitController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_updates_aspect_only() {
        let mut projection = Projection::new(800, 600, cgmath::Deg(75.0), 0.1, 1000.0);
        let camera = Camera::new((0.0, 3.0, 12.0), (0.0, 0.0, 0.0));
        let before = camera.position;

        projection.resize(1920, 1080);

        assert!((projection.aspect() - 1920.0 / 1080.0).abs() < 1e-6);
        assert_eq!(camera.position, before);
    }

    #[test]
    fn orbit_preserves_distance_without_scroll() {
        let mut camera = Camera::new((0.0, 3.0, 12.0), (0.0, 0.0, 0.0));
        let mut controller = OrbitController::new(0.005, 1.0);
        let before = (camera.position - camera.target).magnitude();

        controller.handle_mouse(40.0, -25.0);
        controller.update(&mut camera);

        let after = (camera.position - camera.target).magnitude();
        assert!((before - after).abs() < 1e-4);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = Camera::new((0.0, 0.0, 12.0), (0.0, 0.0, 0.0));
        let mut controller = OrbitController::new(0.005, 1000.0);

        controller.handle_scroll(&MouseScrollDelta::LineDelta(0.0, 50.0));
        controller.update(&mut camera);
        assert!(((camera.position - camera.target).magnitude() - 1.0).abs() < 1e-4);

        controller.handle_scroll(&MouseScrollDelta::LineDelta(0.0, -500.0));
        controller.update(&mut camera);
        assert!(((camera.position - camera.target).magnitude() - 400.0).abs() < 1e-2);
    }
}
