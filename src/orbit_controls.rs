//! Pointer-driven orbit camera controller.
//!
//! Input handlers only accumulate deltas; [`OrbitControls::update`] applies
//! them once per frame, so input events may arrive in any order relative to
//! frame updates.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use crate::camera::Camera;

const EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragMode {
    Rotate,
    Pan,
}

#[derive(Debug, Clone, Copy, Default)]
struct Spherical {
    radius: f32,
    /// Polar angle from +Y.
    phi: f32,
    /// Azimuth around +Y, measured from +Z.
    theta: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self::default();
        }

        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vec3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,

    spherical_delta: Spherical,
    pan_offset: Vec3,
    scale: f32,
    drag: Option<(DragMode, Vec2)>,
    viewport_height: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            spherical_delta: Spherical::default(),
            pan_offset: Vec3::ZERO,
            scale: 1.0,
            drag: None,
            viewport_height: 1.0,
        }
    }
}

impl OrbitControls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_damping(mut self, damping_factor: f32) -> Self {
        self.enable_damping = true;
        self.damping_factor = damping_factor;
        self
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.viewport_height = height as f32;
        }
    }

    pub fn pointer_down(&mut self, button: PointerButton, position: Vec2) {
        let mode = match button {
            PointerButton::Primary => DragMode::Rotate,
            PointerButton::Secondary | PointerButton::Middle => DragMode::Pan,
        };
        self.drag = Some((mode, position));
    }

    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    pub fn pointer_move(&mut self, position: Vec2, camera: &Camera) {
        let Some((mode, last)) = self.drag else {
            return;
        };

        let delta = position - last;
        match mode {
            DragMode::Rotate => {
                let factor = 2.0 * PI / self.viewport_height * self.rotate_speed;
                self.rotate_left(delta.x * factor);
                self.rotate_up(delta.y * factor);
            }
            DragMode::Pan => self.pan(delta, camera),
        }

        self.drag = Some((mode, position));
    }

    /// Positive `lines` zoom in.
    pub fn wheel(&mut self, lines: f32) {
        let step = 0.95f32.powf(self.zoom_speed);
        self.scale *= step.powf(lines);
    }

    fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.theta -= angle;
    }

    fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.phi -= angle;
    }

    fn pan(&mut self, delta: Vec2, camera: &Camera) {
        let offset = camera.eye - self.target;
        let target_distance = offset.length() * (camera.fov_y.to_radians() * 0.5).tan();
        let world_per_pixel = 2.0 * target_distance / self.viewport_height * self.pan_speed;

        let forward = (self.target - camera.eye).normalize_or_zero();
        let right = forward.cross(camera.up).normalize_or_zero();
        let up = right.cross(forward);

        self.pan_offset += -right * delta.x * world_per_pixel + up * delta.y * world_per_pixel;
    }

    /// Applies pending input to `camera` and points it at the target.
    /// Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let previous_eye = camera.eye;

        let mut spherical = Spherical::from_offset(camera.eye - self.target);

        if self.enable_damping {
            spherical.theta += self.spherical_delta.theta * self.damping_factor;
            spherical.phi += self.spherical_delta.phi * self.damping_factor;
        } else {
            spherical.theta += self.spherical_delta.theta;
            spherical.phi += self.spherical_delta.phi;
        }

        spherical.phi = spherical
            .phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(EPSILON, PI - EPSILON);

        if self.enable_damping {
            self.target += self.pan_offset * self.damping_factor;
        } else {
            self.target += self.pan_offset;
        }

        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        camera.eye = self.target + spherical.to_offset();
        camera.look_at(self.target);

        if self.enable_damping {
            let decay = 1.0 - self.damping_factor;
            self.spherical_delta.theta *= decay;
            self.spherical_delta.phi *= decay;
            self.pan_offset *= decay;
        } else {
            self.spherical_delta = Spherical::default();
            self.pan_offset = Vec3::ZERO;
        }

        self.scale = 1.0;

        (camera.eye - previous_eye).length_squared() > EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_at(eye: Vec3) -> Camera {
        Camera::perspective(75.0, 1.0, 0.1, 1000.0).with_position(eye)
    }

    #[test]
    fn update_without_input_keeps_position() {
        let mut camera = camera_at(Vec3::new(5.0, 5.0, 5.0));
        let mut controls = OrbitControls::new();

        let moved = controls.update(&mut camera);

        assert!(!moved);
        assert!((camera.eye - Vec3::new(5.0, 5.0, 5.0)).length() < 1e-4);
        assert_eq!(camera.target, Vec3::ZERO);
    }

    #[test]
    fn horizontal_drag_orbits_at_constant_distance() {
        let mut camera = camera_at(Vec3::new(0.0, 0.0, 4.0));
        let mut controls = OrbitControls::new();
        controls.set_viewport(800, 400);

        // A drag of a quarter of the viewport height turns by a quarter turn.
        controls.pointer_down(PointerButton::Primary, Vec2::new(100.0, 100.0));
        controls.pointer_move(Vec2::new(200.0, 100.0), &camera);
        controls.pointer_up();
        controls.update(&mut camera);

        assert!((camera.eye.length() - 4.0).abs() < 1e-4);
        assert!((camera.eye - Vec3::new(-4.0, 0.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn wheel_dollies_towards_target() {
        let mut camera = camera_at(Vec3::new(0.0, 0.0, 10.0));
        let mut controls = OrbitControls::new();

        controls.wheel(1.0);
        controls.update(&mut camera);

        assert!((camera.eye.z - 9.5).abs() < 1e-4);
    }

    #[test]
    fn polar_angle_never_reaches_the_pole() {
        let mut camera = camera_at(Vec3::new(0.0, 0.0, 4.0));
        let mut controls = OrbitControls::new();
        controls.set_viewport(100, 100);

        controls.pointer_down(PointerButton::Primary, Vec2::ZERO);
        controls.pointer_move(Vec2::new(0.0, 1000.0), &camera);
        controls.update(&mut camera);

        assert!((camera.eye.y - 4.0).abs() < 1e-3);
        assert!(camera.eye.x.is_finite() && camera.eye.z.is_finite());
        assert!(camera.view().is_finite());
    }

    #[test]
    fn damping_spreads_rotation_over_frames() {
        let mut camera = camera_at(Vec3::new(0.0, 0.0, 4.0));
        let mut controls = OrbitControls::new().with_damping(0.05);
        controls.set_viewport(100, 100);

        controls.pointer_down(PointerButton::Primary, Vec2::ZERO);
        controls.pointer_move(Vec2::new(10.0, 0.0), &camera);
        controls.pointer_up();

        assert!(controls.update(&mut camera));
        let first = camera.eye;
        assert!(controls.update(&mut camera));
        assert!((camera.eye - first).length() > 0.0);
    }

    #[test]
    fn pan_moves_target_and_camera_together() {
        let mut camera = camera_at(Vec3::new(0.0, 0.0, 4.0));
        let mut controls = OrbitControls::new();
        controls.set_viewport(100, 100);

        controls.pointer_down(PointerButton::Secondary, Vec2::ZERO);
        controls.pointer_move(Vec2::new(-10.0, 0.0), &camera);
        controls.update(&mut camera);

        assert!(controls.target.x > 0.0);
        assert!((camera.eye - controls.target - Vec3::new(0.0, 0.0, 4.0)).length() < 1e-4);
    }
}
