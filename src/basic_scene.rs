use std::f32::consts::FRAC_PI_2;

use glam::{EulerRot, Quat, Vec3};

use crate::{
    camera::Camera,
    config::AppConfig,
    demo::{Demo, FrameTime, Stage},
    lighting::{srgb_hex, AmbientLight, DirectionalLight},
    model::Model,
    orbit_controls::OrbitControls,
    scene_graph::ObjectId,
};

/// Radians added to the cube's X and Y angles every frame.
pub const CUBE_SPIN_PER_FRAME: f32 = 0.01;

/// A green cube spinning above a gray ground plane.
pub struct BasicScene {
    stage: Stage,
    cube: ObjectId,
    cube_angles: Vec3,
}

impl BasicScene {
    pub fn new(config: &AppConfig) -> Self {
        let aspect = config.width as f32 / config.height as f32;
        let camera = Camera::perspective(75.0, aspect, 0.1, 1000.0).with_position(Vec3::splat(5.0));
        let mut stage = Stage::new(camera, OrbitControls::new(), srgb_hex(0x2c3e50));
        stage.resize(config.width, config.height);

        stage.lights.add_ambient(AmbientLight::new(0xffffff, 0.6));
        stage.lights.add_directional(DirectionalLight::new(
            0xffffff,
            0.8,
            Vec3::new(10.0, 10.0, 5.0),
        ));

        let scene = &mut stage.scene;
        let cube = scene.add_mesh("Cube", Model::cuboid("Cube", 1.0, 1.0, 1.0, srgb_hex(0x00ff00)));
        let plane = scene.add_mesh("Plane", Model::plane("Plane", 10.0, 10.0, srgb_hex(0x808080)));
        scene.set_object_rotation(plane, Quat::from_rotation_x(-FRAC_PI_2));
        scene.set_object_translation(plane, Vec3::new(0.0, -1.0, 0.0));

        stage.update_controls();

        Self {
            stage,
            cube,
            cube_angles: Vec3::ZERO,
        }
    }

    pub fn cube(&self) -> ObjectId {
        self.cube
    }
}

impl Demo for BasicScene {
    fn title(&self) -> &str {
        "Basic Scene"
    }

    fn stage(&self) -> &Stage {
        &self.stage
    }

    fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    fn update(&mut self, _frame: FrameTime) {
        self.cube_angles.x += CUBE_SPIN_PER_FRAME;
        self.cube_angles.y += CUBE_SPIN_PER_FRAME;

        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.cube_angles.x,
            self.cube_angles.y,
            self.cube_angles.z,
        );
        self.stage.scene.set_object_rotation(self.cube, rotation);
        self.stage.update_controls();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine;

    const FRAME: FrameTime = FrameTime { delta: 0.016 };

    fn scene() -> BasicScene {
        BasicScene::new(&AppConfig::default())
    }

    #[test]
    fn builds_the_static_scene() {
        let demo = scene();
        let stage = demo.stage();

        assert_eq!(stage.scene.objects.len(), 2);
        assert_eq!(stage.scene.models.len(), 2);
        assert_eq!(stage.lights.ambient.len(), 1);
        assert_eq!(stage.lights.directional.len(), 1);
        assert!((stage.camera.aspect - 1280.0 / 720.0).abs() < 1e-6);
        assert!(stage.camera.eye.abs_diff_eq(Vec3::splat(5.0), 1e-4));
        assert_eq!(stage.camera.target, Vec3::ZERO);

        let plane = stage.scene.get_object_by_name("Plane").unwrap();
        let transform = stage.scene.get_object_transform(plane).unwrap();
        assert_eq!(transform.translation(), Vec3::new(0.0, -1.0, 0.0));

        // The plane is built facing +Z; after the rotation it faces up.
        let normal = transform.rotation() * Vec3::Z;
        assert!(normal.abs_diff_eq(Vec3::Y, 1e-5));
    }

    #[test]
    fn spins_the_cube_every_frame() {
        let mut demo = scene();
        for _ in 0..10 {
            engine::update(&mut demo, FRAME).unwrap();
        }

        let transform = demo.stage().scene.get_object_transform(demo.cube()).unwrap();
        let (x, y, z) = transform.rotation().to_euler(EulerRot::XYZ);
        assert!((x - 0.1).abs() < 1e-4);
        assert!((y - 0.1).abs() < 1e-4);
        assert!(z.abs() < 1e-4);

        // Camera stays put without pointer input.
        assert!(demo.stage().camera.eye.abs_diff_eq(Vec3::splat(5.0), 1e-4));
    }

    #[test]
    fn cube_is_instanced_after_update() {
        let mut demo = scene();
        engine::update(&mut demo, FRAME).unwrap();

        let stage = demo.stage();
        for (_, model) in stage.scene.models.iter() {
            assert_eq!(model.instances().len(), 1);
        }
    }

    #[test]
    fn aspect_follows_last_resize() {
        let mut demo = scene();
        for (w, h) in [(800, 600), (0, 0), (1920, 1080)] {
            demo.resize(w, h);
            engine::update(&mut demo, FRAME).unwrap();
        }

        assert!((demo.stage().camera.aspect - 1920.0 / 1080.0).abs() < 1e-6);
    }
}
