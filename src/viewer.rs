use std::path::PathBuf;

use glam::Vec3;
use imgui::{Condition, WindowFlags};

use crate::{
    animation::AnimationMixer,
    assets::{AssetBundle, AssetLoader, LoadError, LoadHandle, LoadProgress},
    camera::Camera,
    config::{AnimationClock, AppConfig},
    demo::{Demo, FrameTime, Stage},
    lighting::{srgb_hex, AmbientLight, DirectionalLight},
    orbit_controls::OrbitControls,
    scene_graph::ObjectId,
};

pub const LOADING_TEXT: &str = "Loading...";
pub const LOAD_ERROR_TEXT: &str = "Error: GLB file not found";
/// `#ff6b6b`
pub const ERROR_COLOR: [f32; 4] = [1.0, 0.42, 0.42, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerPhase {
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorStyle {
    Normal,
    Error,
}

/// Status line shown on top of the viewport while the model loads.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadingIndicator {
    pub visible: bool,
    pub text: String,
    pub style: IndicatorStyle,
}

impl Default for LoadingIndicator {
    fn default() -> Self {
        Self {
            visible: true,
            text: LOADING_TEXT.to_string(),
            style: IndicatorStyle::Normal,
        }
    }
}

/// Loads one glTF/GLB model in the background, frames it and plays its clips.
pub struct GlbViewer {
    stage: Stage,
    model_path: PathBuf,
    animation_clock: AnimationClock,
    phase: ViewerPhase,
    loader: Option<LoadHandle>,
    mixer: Option<AnimationMixer>,
    model_root: Option<ObjectId>,
    indicator: LoadingIndicator,
}

impl GlbViewer {
    pub fn new(config: &AppConfig) -> Self {
        let aspect = config.width as f32 / config.height as f32;
        let camera = Camera::perspective(75.0, aspect, 0.1, 1000.0)
            .with_position(Vec3::new(0.0, 1.0, 3.0));
        let controls = OrbitControls::new().with_damping(0.05);

        let mut stage = Stage::new(camera, controls, srgb_hex(0x222222));
        stage.resize(config.width, config.height);
        stage
            .lights
            .add_ambient(AmbientLight::new(0x404040, 0.6));
        stage.lights.add_directional(DirectionalLight::new(
            0xffffff,
            0.8,
            Vec3::new(1.0, 1.0, 1.0),
        ));

        Self {
            stage,
            model_path: config.model_path.clone(),
            animation_clock: config.animation_clock,
            phase: ViewerPhase::Idle,
            loader: None,
            mixer: None,
            model_root: None,
            indicator: LoadingIndicator::default(),
        }
    }

    pub fn phase(&self) -> ViewerPhase {
        self.phase
    }

    pub fn indicator(&self) -> &LoadingIndicator {
        &self.indicator
    }

    pub fn mixer(&self) -> Option<&AnimationMixer> {
        self.mixer.as_ref()
    }

    pub fn model_root(&self) -> Option<ObjectId> {
        self.model_root
    }

    /// Starts the one load this viewer performs.
    pub fn start_loading(&mut self) {
        if self.phase != ViewerPhase::Idle {
            log::warn!("Ignoring load request in phase {:?}", self.phase);
            return;
        }

        log::info!("Loading {}", self.model_path.display());
        self.loader = Some(AssetLoader::load(self.model_path.clone()));
        self.phase = ViewerPhase::Loading;
        self.indicator = LoadingIndicator::default();
    }

    pub fn on_progress(&mut self, progress: LoadProgress) {
        if self.phase != ViewerPhase::Loading {
            log::warn!("Ignoring load progress in phase {:?}", self.phase);
            return;
        }

        match progress.percentage() {
            Some(percentage) => {
                log::info!("Loading progress: {:.2}%", percentage);
                self.indicator.text = format!("{} {:.2}%", LOADING_TEXT, percentage);
            }
            None => {
                log::info!("Loading progress: {} bytes", progress.loaded);
                self.indicator.text = format!("{} {} bytes", LOADING_TEXT, progress.loaded);
            }
        }
    }

    pub fn on_loaded(&mut self, mut bundle: AssetBundle) {
        if self.phase != ViewerPhase::Loading {
            log::warn!("Ignoring loaded asset {} in phase {:?}", bundle.name, self.phase);
            return;
        }

        log::info!(
            "Loaded {}: {} nodes, {} models, {} clips",
            bundle.name,
            bundle.nodes.len(),
            bundle.models.len(),
            bundle.clips.len()
        );

        let clips = std::mem::take(&mut bundle.clips);
        let spawned = self.stage.scene.spawn_bundle(bundle);
        self.model_root = Some(spawned.root);

        match self.stage.scene.world_bounds(spawned.root) {
            Some(bounds) => {
                let size = bounds.size().length();
                let center = bounds.center();

                self.stage.scene.translate_object(spawned.root, -center);

                let camera = &mut self.stage.camera;
                camera.set_position(Vec3::new(size / 2.0, size / 5.0, size / 2.0));
                camera.look_at(Vec3::ZERO);
            }
            None => log::warn!("Loaded model has no geometry, leaving the camera as is"),
        }

        self.stage.controls.target = Vec3::ZERO;
        self.stage.update_controls();

        if !clips.is_empty() {
            let clip_count = clips.len();
            let mut mixer = AnimationMixer::new(clips, spawned.nodes);
            for clip in 0..clip_count {
                if let Some(action) = mixer.clip_action(clip) {
                    action.play();
                }
            }
            self.mixer = Some(mixer);
        }

        self.phase = ViewerPhase::Ready;
        self.indicator.visible = false;
    }

    pub fn on_failed(&mut self, error: &LoadError) {
        if self.phase != ViewerPhase::Loading {
            log::warn!("Ignoring load error in phase {:?}: {}", self.phase, error);
            return;
        }

        log::error!("Failed to load model: {}", error);
        self.phase = ViewerPhase::Failed;
        self.indicator.visible = true;
        self.indicator.text = LOAD_ERROR_TEXT.to_string();
        self.indicator.style = IndicatorStyle::Error;
    }

    /// Handles everything the loader reported since the previous frame.
    fn poll_loader(&mut self) {
        let Some(loader) = self.loader.as_ref() else {
            return;
        };

        // The worker sends all progress before the result.
        let result = loader.try_result();
        let progress = loader.poll_progress().collect::<Vec<_>>();

        for progress in progress {
            self.on_progress(progress);
        }

        if let Some(result) = result {
            self.loader = None;
            match result {
                Ok(bundle) => self.on_loaded(bundle),
                Err(error) => self.on_failed(&error),
            }
        }
    }
}

impl Demo for GlbViewer {
    fn title(&self) -> &str {
        "GLB Viewer"
    }

    fn stage(&self) -> &Stage {
        &self.stage
    }

    fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    fn update(&mut self, frame: FrameTime) {
        self.poll_loader();

        if let Some(mixer) = self.mixer.as_mut() {
            mixer.update(self.animation_clock.step(frame.delta), &mut self.stage.scene);
        }

        self.stage.update_controls();
    }

    fn draw_overlay(&mut self, ui: &imgui::Ui) {
        if !self.indicator.visible {
            return;
        }

        let [width, height] = ui.io().display_size;

        ui.window("Loading")
            .flags(
                WindowFlags::NO_DECORATION
                    | WindowFlags::ALWAYS_AUTO_RESIZE
                    | WindowFlags::NO_MOVE
                    | WindowFlags::NO_SAVED_SETTINGS
                    | WindowFlags::NO_INPUTS,
            )
            .position([width * 0.5, height * 0.5], Condition::Always)
            .position_pivot([0.5, 0.5])
            .build(|| match self.indicator.style {
                IndicatorStyle::Normal => ui.text(&self.indicator.text),
                IndicatorStyle::Error => ui.text_colored(ERROR_COLOR, &self.indicator.text),
            });
    }
}

#[cfg(test)]
mod tests {
    use std::{path::Path, thread, time::Duration};

    use super::*;
    use crate::{
        animation::AnimationClip,
        assets::{
            test_support::{
                animated_triangle_glb, mismatched_keyframes_glb, triangle_and_points_glb,
                triangle_glb,
            },
            AssetNode,
        },
        engine,
        model::Model,
    };
    use glam::Quat;

    const FRAME: FrameTime = FrameTime { delta: 0.1 };

    fn viewer_for(path: &Path) -> GlbViewer {
        let config = AppConfig {
            model_path: path.to_path_buf(),
            ..AppConfig::default()
        };
        GlbViewer::new(&config)
    }

    fn run_until_settled(viewer: &mut GlbViewer) {
        for _ in 0..500 {
            engine::update(viewer, FRAME).unwrap();
            if viewer.phase() != ViewerPhase::Loading {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("load did not finish");
    }

    fn load_file(bytes: Vec<u8>) -> GlbViewer {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.glb");
        std::fs::write(&path, bytes).unwrap();

        let mut viewer = viewer_for(&path);
        viewer.start_loading();
        run_until_settled(&mut viewer);
        viewer
    }

    /// A box offset from the origin, not yet loaded through a file.
    fn offset_box_bundle() -> AssetBundle {
        AssetBundle {
            name: "box".to_string(),
            nodes: vec![AssetNode {
                name: "box".to_string(),
                translation: Vec3::new(10.0, -4.0, 2.0),
                rotation: Quat::IDENTITY,
                scale: Vec3::ONE,
                model: Some(0),
                children: vec![],
            }],
            roots: vec![0],
            models: vec![Model::cuboid("box", 2.0, 4.0, 4.0, Vec3::ONE)],
            clips: vec![],
        }
    }

    #[test]
    fn starts_idle_with_visible_indicator() {
        let viewer = viewer_for(Path::new("unused.glb"));

        assert_eq!(viewer.phase(), ViewerPhase::Idle);
        assert!(viewer.indicator().visible);
        assert_eq!(viewer.indicator().style, IndicatorStyle::Normal);
        assert!(viewer.stage().controls.enable_damping);
        assert_eq!(viewer.stage().camera.eye, Vec3::new(0.0, 1.0, 3.0));
    }

    #[test]
    fn frames_the_loaded_model() {
        let dir = tempfile::tempdir().unwrap();
        let mut viewer = viewer_for(&dir.path().join("missing.glb"));
        viewer.phase = ViewerPhase::Loading;

        viewer.on_loaded(offset_box_bundle());

        let size = Vec3::new(2.0, 4.0, 4.0).length();
        let expected_eye = Vec3::new(size / 2.0, size / 5.0, size / 2.0);
        let stage = viewer.stage();

        assert_eq!(viewer.phase(), ViewerPhase::Ready);
        assert!(!viewer.indicator().visible);
        assert!(stage.camera.eye.abs_diff_eq(expected_eye, 1e-3));
        assert_eq!(stage.camera.target, Vec3::ZERO);
        assert_eq!(stage.controls.target, Vec3::ZERO);

        let bounds = stage.scene.world_bounds(viewer.model_root().unwrap()).unwrap();
        assert!(bounds.center().abs_diff_eq(Vec3::ZERO, 1e-4));
        assert!(viewer.mixer().is_none());
    }

    #[test]
    fn loads_model_from_disk_without_clips() {
        let viewer = load_file(triangle_glb());

        assert_eq!(viewer.phase(), ViewerPhase::Ready);
        assert!(!viewer.indicator().visible);
        assert!(viewer.mixer().is_none());

        let size = Vec3::new(1.0, 1.0, 0.0).length();
        let expected_eye = Vec3::new(size / 2.0, size / 5.0, size / 2.0);
        assert!(viewer.stage().camera.eye.abs_diff_eq(expected_eye, 1e-3));
    }

    #[test]
    fn plays_every_clip() {
        let mut viewer = load_file(animated_triangle_glb());

        let mixer = viewer.mixer().unwrap();
        assert_eq!(mixer.actions().len(), 1);
        assert!(mixer.actions().iter().all(|action| action.is_running()));

        engine::update(&mut viewer, FRAME).unwrap();
        assert!(viewer.mixer().unwrap().actions()[0].time() > 0.0);
    }

    #[test]
    fn plays_every_clip_of_a_multi_clip_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let mut viewer = viewer_for(&dir.path().join("missing.glb"));
        viewer.phase = ViewerPhase::Loading;

        let mut bundle = offset_box_bundle();
        bundle.clips = vec![
            AnimationClip::new("a", vec![]),
            AnimationClip::new("b", vec![]),
            AnimationClip::new("c", vec![]),
        ];
        viewer.on_loaded(bundle);

        let mixer = viewer.mixer().unwrap();
        assert_eq!(mixer.actions().len(), 3);
        assert!(mixer.actions().iter().all(|action| action.is_running()));
    }

    #[test]
    fn missing_file_shows_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut viewer = viewer_for(&dir.path().join("missing.glb"));
        viewer.start_loading();
        run_until_settled(&mut viewer);

        let indicator = viewer.indicator();
        assert_eq!(viewer.phase(), ViewerPhase::Failed);
        assert!(indicator.visible);
        assert_eq!(indicator.text, LOAD_ERROR_TEXT);
        assert_eq!(indicator.style, IndicatorStyle::Error);
        assert!(viewer.mixer().is_none());
    }

    #[test]
    fn default_model_ships_with_the_repository() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(crate::config::DEFAULT_MODEL_PATH);
        let mut viewer = viewer_for(&path);
        viewer.start_loading();
        run_until_settled(&mut viewer);

        assert_eq!(viewer.phase(), ViewerPhase::Ready);
        assert_eq!(viewer.mixer().unwrap().actions().len(), 1);
    }

    #[test]
    fn undecodable_animation_fails_without_playing() {
        let mut viewer = load_file(mismatched_keyframes_glb());

        assert_eq!(viewer.phase(), ViewerPhase::Failed);
        assert_eq!(viewer.indicator().text, LOAD_ERROR_TEXT);
        assert!(viewer.mixer().is_none());

        engine::update(&mut viewer, FRAME).unwrap();
        assert_eq!(viewer.phase(), ViewerPhase::Failed);
    }

    #[test]
    fn point_meshes_do_not_block_loading() {
        let viewer = load_file(triangle_and_points_glb());

        assert_eq!(viewer.phase(), ViewerPhase::Ready);
        assert!(!viewer.indicator().visible);
        assert_eq!(viewer.stage().scene.models.len(), 2);
    }

    #[test]
    fn ignores_events_outside_loading() {
        let mut viewer = viewer_for(Path::new("unused.glb"));

        viewer.on_progress(LoadProgress {
            loaded: 1,
            total: 2,
        });
        viewer.on_loaded(offset_box_bundle());

        assert_eq!(viewer.phase(), ViewerPhase::Idle);
        assert_eq!(viewer.indicator(), &LoadingIndicator::default());
        assert_eq!(viewer.stage().scene.objects.len(), 0);
    }

    #[test]
    fn progress_updates_indicator_text() {
        let dir = tempfile::tempdir().unwrap();
        let mut viewer = viewer_for(&dir.path().join("missing.glb"));
        viewer.phase = ViewerPhase::Loading;

        viewer.on_progress(LoadProgress {
            loaded: 1,
            total: 3,
        });

        assert_eq!(viewer.indicator().text, "Loading... 33.33%");
    }

    #[test]
    fn aspect_follows_last_resize() {
        let mut viewer = viewer_for(Path::new("unused.glb"));
        for (w, h) in [(640, 480), (0, 0), (300, 900), (1024, 768)] {
            viewer.resize(w, h);
            engine::update(&mut viewer, FRAME).unwrap();
        }

        assert!((viewer.stage().camera.aspect - 1024.0 / 768.0).abs() < 1e-6);
    }
}
