use std::sync::Arc;

use anyhow::Context;
use id_arena::Arena;
use wgpu::CommandEncoderDescriptor;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    demo::Stage,
    rendering::{
        imgui_renderer::ImguiRenderer,
        passes::{
            lambert_pass::{LambertPass, LambertTextureViews},
            pass::Pass,
        },
        render_common::RenderCommon,
        render_model::{render_model_instances, RenderModel},
        scene_uniform::SceneUniformState,
        shader_loader::{PipelineCacheBuilder, ShaderLoader},
        texture::DepthTexture,
    },
};

pub struct Renderer {
    pub window: Arc<Window>,
    pub size: PhysicalSize<u32>,

    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,

    common: Arc<RenderCommon>,
    depth_texture: DepthTexture,
    render_models: Arena<RenderModel>,

    shader_loader: ShaderLoader,

    lambert_pass: LambertPass,
    imgui_renderer: ImguiRenderer,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        stage: &Stage,
        imgui_context: &mut imgui::Context,
        hot_reload_shaders: bool,
    ) -> anyhow::Result<Renderer> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable graphics adapter")?;

        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to create device")?;

        let common = RenderCommon::new(
            &device,
            &adapter,
            &surface,
            size,
            SceneUniformState::new(&stage.camera, &stage.lights),
        )?;
        let common = Arc::new(common);

        let depth_texture = DepthTexture::new(&device, size, "Depth Texture");

        let mut cache_builder = PipelineCacheBuilder::new();
        let lambert_pass = LambertPass::create(&device, common.clone(), &mut cache_builder)?;
        let shader_loader = ShaderLoader::new(&device, cache_builder, hot_reload_shaders)?;

        let imgui_renderer =
            ImguiRenderer::new(&device, &queue, common.surface_format(), imgui_context);

        Ok(Self {
            window,
            size,
            surface,
            device,
            queue,
            common,
            depth_texture,
            render_models: Arena::new(),
            shader_loader,
            lambert_pass,
            imgui_renderer,
        })
    }

    /// Uploads every scene model that has no GPU counterpart yet. Models can be
    /// added at any time (e.g. when an asset finishes loading), so this runs
    /// every frame.
    fn sync_models(&mut self, stage: &mut Stage) {
        for (_id, scene_model) in stage.scene.models.iter_mut() {
            if scene_model.render_model.is_some() {
                continue;
            }

            let render_model = RenderModel::from_model(&self.device, &scene_model.model);
            scene_model.render_model = Some(self.render_models.alloc(render_model));
            log::info!(
                "Uploaded model {} with {} primitives",
                scene_model.name(),
                scene_model.model.primitives.len()
            );
        }
    }

    /// Zero-sized requests (minimized window) are ignored.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.size = new_size;
        self.depth_texture.resize(&self.device, new_size);

        let mut config = match self.common.output_surface_config.write() {
            Ok(config) => config,
            Err(poisoned) => poisoned.into_inner(),
        };
        config.width = new_size.width;
        config.height = new_size.height;
        self.surface.configure(&self.device, &config);
    }

    pub fn render(
        &mut self,
        stage: &mut Stage,
        imgui_context: &mut imgui::Context,
    ) -> Result<(), wgpu::SurfaceError> {
        self.shader_loader.load_pending_shaders();
        self.sync_models(stage);

        self.common.scene_uniform.update(
            &self.queue,
            SceneUniformState::new(&stage.camera, &stage.lights),
        );

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let background = stage.background;
        let render_models = &self.render_models;
        let queue = &self.queue;
        let scene = &stage.scene;

        self.lambert_pass.render(
            &LambertTextureViews {
                color: view.clone(),
                depth: self.depth_texture.view().clone(),
                clear_color: wgpu::Color {
                    r: background.x as f64,
                    g: background.y as f64,
                    b: background.z as f64,
                    a: 1.0,
                },
            },
            &mut encoder,
            &self.shader_loader.cache,
            |render_pass| {
                for (_id, scene_model) in scene.models.iter() {
                    let instances = scene_model.instances();
                    if !instances.should_render() {
                        continue;
                    }

                    let Some(render_model) = scene_model
                        .render_model
                        .and_then(|id| render_models.get(id))
                    else {
                        continue;
                    };

                    render_model_instances(render_pass, queue, render_model, instances);
                }
            },
        );

        self.imgui_renderer.render(
            &view,
            imgui_context,
            &self.device,
            &self.queue,
            &mut encoder,
        );

        self.queue.submit([encoder.finish()]);
        output.present();

        Ok(())
    }
}
