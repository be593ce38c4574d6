use glam::{Mat4, Vec3};

/// Right-handed perspective camera. Projection depth range is 0..1.
#[derive(Debug, Clone)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn perspective(fov_y: f32, aspect: f32, z_near: f32, z_far: f32) -> Self {
        Self {
            eye: Vec3::ZERO,
            target: Vec3::NEG_Z,
            up: Vec3::Y,
            fov_y,
            aspect,
            z_near,
            z_far,
        }
    }

    pub fn with_position(mut self, eye: Vec3) -> Self {
        self.eye = eye;
        self
    }

    pub fn set_position(&mut self, eye: Vec3) {
        self.eye = eye;
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Zero or negative sizes are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y.to_radians(),
            self.aspect.max(1e-6),
            self.z_near,
            self.z_far,
        )
    }

    pub fn get_vp_matrix(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec4Swizzles;

    use super::*;

    #[test]
    fn target_projects_to_screen_center() {
        let mut camera = Camera::perspective(75.0, 16.0 / 9.0, 0.1, 1000.0).with_position(Vec3::splat(5.0));
        camera.look_at(Vec3::ZERO);

        let clip = camera.get_vp_matrix() * Vec3::ZERO.extend(1.0);
        let ndc = clip.xyz() / clip.w;

        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn viewport_sets_aspect_and_ignores_zero_sizes() {
        let mut camera = Camera::perspective(75.0, 1.0, 0.1, 1000.0);
        camera.set_viewport(800, 600);
        assert_eq!(camera.aspect, 800.0 / 600.0);

        camera.set_viewport(0, 600);
        camera.set_viewport(800, 0);
        assert_eq!(camera.aspect, 800.0 / 600.0);
    }
}
