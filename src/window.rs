use std::{sync::Arc, time::Instant};

use anyhow::Context;
use glam::Vec2;
use imgui::{FontConfig, FontSource};
use imgui_winit_support::WinitPlatform;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    config::AppConfig,
    demo::{Demo, FrameTime},
    engine,
    orbit_controls::PointerButton,
    rendering::renderer::Renderer,
};

// Trackpads report pixels; treat this many as one wheel notch.
const PIXELS_PER_LINE: f32 = 40.0;

struct ImguiState {
    context: imgui::Context,
    platform: WinitPlatform,
}

struct App<D: Demo> {
    demo: D,
    config: AppConfig,
    renderer: Option<Renderer>,
    imgui: Option<ImguiState>,
    mouse_pos: Vec2,
    last_frame: Instant,
    error: Option<anyhow::Error>,
}

impl<D: Demo> App<D> {
    fn new(demo: D, config: AppConfig) -> Self {
        Self {
            demo,
            config,
            renderer: None,
            imgui: None,
            mouse_pos: Vec2::ZERO,
            last_frame: Instant::now(),
            error: None,
        }
    }

    fn setup_imgui(window: &Window) -> ImguiState {
        let mut context = imgui::Context::create();
        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(
            context.io_mut(),
            window,
            imgui_winit_support::HiDpiMode::Default,
        );

        let font_size = 14.0;
        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: font_size,
                ..Default::default()
            }),
        }]);

        // Disable INI support because it's broken in the published version of imgui
        context.set_ini_filename(None);

        ImguiState { context, platform }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title(self.demo.title())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = event_loop
            .create_window(window_attributes)
            .context("Failed to create window")?;
        let window = Arc::new(window);

        let mut imgui = Self::setup_imgui(&window);

        let size = window.inner_size();
        self.demo.resize(size.width, size.height);

        let renderer = pollster::block_on(Renderer::new(
            window,
            self.demo.stage(),
            &mut imgui.context,
            self.config.hot_reload_shaders,
        ))?;

        self.imgui = Some(imgui);
        self.renderer = Some(renderer);
        self.last_frame = Instant::now();

        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(renderer), Some(imgui)) = (self.renderer.as_mut(), self.imgui.as_mut()) else {
            return;
        };

        let now = Instant::now();
        let delta_time = now - self.last_frame;
        self.last_frame = now;
        imgui.context.io_mut().update_delta_time(delta_time);

        renderer.window.request_redraw();

        if let Err(e) = imgui
            .platform
            .prepare_frame(imgui.context.io_mut(), &renderer.window)
        {
            log::warn!("Failed to prepare imgui frame: {}", e);
        }

        let frame = FrameTime {
            delta: delta_time.as_secs_f32(),
        };

        if let Err(e) = engine::update(&mut self.demo, frame) {
            log::error!("Error during update: {:#}", e);
        }

        let ui = imgui.context.new_frame();
        self.demo.draw_overlay(ui);
        imgui.platform.prepare_render(ui, &renderer.window);

        match renderer.render(self.demo.stage_mut(), &mut imgui.context) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                renderer.resize(renderer.size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of memory");
                event_loop.exit();
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timeout");
            }
            Err(other) => {
                log::error!("Unexpected error: {:?}", other);
            }
        }
    }

    fn wants_mouse(&self) -> bool {
        self.imgui
            .as_ref()
            .is_some_and(|imgui| imgui.context.io().want_capture_mouse)
    }
}

impl<D: Demo> ApplicationHandler for App<D> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        if let Err(e) = self.init(event_loop) {
            self.fail(event_loop, e.context("Failed to initialize renderer"));
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(renderer), Some(imgui)) = (self.renderer.as_ref(), self.imgui.as_mut()) {
            imgui.platform.handle_event::<()>(
                imgui.context.io_mut(),
                &renderer.window,
                &Event::WindowEvent {
                    window_id,
                    event: event.clone(),
                },
            );
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(new_size);
                }
                if new_size.width > 0 && new_size.height > 0 {
                    self.demo.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_pos = Vec2::new(position.x as f32, position.y as f32);
                self.demo.stage_mut().pointer_move(self.mouse_pos);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    MouseButton::Left => PointerButton::Primary,
                    MouseButton::Right => PointerButton::Secondary,
                    MouseButton::Middle => PointerButton::Middle,
                    _ => return,
                };

                match state {
                    ElementState::Pressed if !self.wants_mouse() => {
                        self.demo.stage_mut().pointer_down(button, self.mouse_pos);
                    }
                    ElementState::Pressed => {}
                    ElementState::Released => self.demo.stage_mut().pointer_up(),
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if self.wants_mouse() {
                    return;
                }

                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_LINE,
                };
                self.demo.stage_mut().wheel(lines);
            }
            _ => (),
        }
    }
}

/// Opens a window and runs `demo` until the window is closed.
pub async fn run<D: Demo>(demo: D, config: AppConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::new(demo, config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
