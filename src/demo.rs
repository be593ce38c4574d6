use glam::{Vec2, Vec3};

use crate::{
    camera::Camera,
    lighting::Lights,
    orbit_controls::{OrbitControls, PointerButton},
    scene_graph::Scene,
};

/// Everything a frame needs to be drawn: the scene, the camera looking at it,
/// the controller driving the camera, lights and clear color.
pub struct Stage {
    pub scene: Scene,
    pub camera: Camera,
    pub controls: OrbitControls,
    pub lights: Lights,
    /// Linear RGB.
    pub background: Vec3,
}

impl Stage {
    pub fn new(camera: Camera, controls: OrbitControls, background: Vec3) -> Self {
        Self {
            scene: Scene::new(),
            camera,
            controls,
            lights: Lights::default(),
            background,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width, height);
        self.controls.set_viewport(width, height);
    }

    pub fn pointer_down(&mut self, button: PointerButton, position: Vec2) {
        self.controls.pointer_down(button, position);
    }

    pub fn pointer_up(&mut self) {
        self.controls.pointer_up();
    }

    pub fn pointer_move(&mut self, position: Vec2) {
        self.controls.pointer_move(position, &self.camera);
    }

    pub fn wheel(&mut self, lines: f32) {
        self.controls.wheel(lines);
    }

    pub fn update_controls(&mut self) {
        self.controls.update(&mut self.camera);
    }
}

/// Time information for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameTime {
    /// Seconds since the previous frame.
    pub delta: f32,
}

pub trait Demo {
    fn title(&self) -> &str;

    fn stage(&self) -> &Stage;

    fn stage_mut(&mut self) -> &mut Stage;

    /// Called once per frame before rendering.
    fn update(&mut self, frame: FrameTime);

    fn resize(&mut self, width: u32, height: u32) {
        self.stage_mut().resize(width, height);
    }

    fn draw_overlay(&mut self, _ui: &imgui::Ui) {}
}
