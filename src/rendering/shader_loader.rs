use std::{
    path::Path,
    sync::{
        mpsc::{self, channel},
        Arc,
    },
    time::Duration,
};

use anyhow::Context;
use id_arena::{Arena, Id};
use notify_debouncer_mini::{
    new_debouncer,
    notify::{RecommendedWatcher, RecursiveMode, Watcher},
    DebounceEventResult, DebouncedEventKind, Debouncer,
};
use pollster::block_on;
use wgpu::{PollType, RenderPipeline};

const SHADER_FOLDER: &str = "assets/shaders";

type PipelineFactory = Box<
    dyn Sync
        + Send
        + Fn(&wgpu::Device, &ShaderDefinition, &str) -> anyhow::Result<wgpu::RenderPipeline>,
>;

#[derive(Debug, Clone)]
pub(crate) struct ShaderDefinition {
    pub name: &'static str,
    /// Relative to the shader folder.
    pub path: &'static str,
    /// Compiled-in copy, used when the file is not on disk.
    pub embedded: &'static str,
}

impl ShaderDefinition {
    fn read_source(&self) -> String {
        let path = Path::new(SHADER_FOLDER).join(self.path);
        match std::fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) => {
                log::debug!(
                    "Using embedded {} ({} not readable: {})",
                    self.name,
                    path.display(),
                    e
                );
                self.embedded.to_string()
            }
        }
    }
}

pub struct ShaderEntry {
    pipeline_id: PipelineId,
    def: ShaderDefinition,
    factory: PipelineFactory,
}

pub type PipelineId = Id<PipelineCacheEntry>;

#[derive(Default)]
pub struct PipelineCacheEntry(Option<wgpu::RenderPipeline>);

pub struct PipelineCacheBuilder {
    shaders: Arena<ShaderEntry>,
    pipelines: Arena<PipelineCacheEntry>,
}

impl PipelineCacheBuilder {
    pub fn new() -> Self {
        Self {
            shaders: Arena::new(),
            pipelines: Arena::new(),
        }
    }

    pub(crate) fn add_shader(
        &mut self,
        def: ShaderDefinition,
        factory: PipelineFactory,
    ) -> PipelineId {
        let pipeline_id = self.pipelines.alloc(PipelineCacheEntry::default());
        self.shaders.alloc(ShaderEntry {
            pipeline_id,
            def,
            factory,
        });
        pipeline_id
    }

    fn build(self) -> PipelineCache {
        PipelineCache {
            shaders: Arc::new(self.shaders),
            pipelines: self.pipelines,
        }
    }
}

pub struct PipelineCache {
    shaders: Arc<Arena<ShaderEntry>>,
    pipelines: Arena<PipelineCacheEntry>,
}

impl PipelineCache {
    /// `None` until the pipeline has compiled at least once.
    pub fn get(&self, id: PipelineId) -> Option<&RenderPipeline> {
        self.pipelines.get(id).and_then(|entry| entry.0.as_ref())
    }
}

/// Builds every registered pipeline, and with hot reload enabled rebuilds
/// pipelines on a watcher thread whenever their shader file changes.
pub struct ShaderLoader {
    pub cache: PipelineCache,
    receiver: mpsc::Receiver<(&'static str, PipelineId, wgpu::RenderPipeline)>,
    _debouncer: Option<Debouncer<RecommendedWatcher>>,
}

impl ShaderLoader {
    pub fn new(
        device: &wgpu::Device,
        cache_builder: PipelineCacheBuilder,
        hot_reload: bool,
    ) -> anyhow::Result<Self> {
        let mut cache = cache_builder.build();
        let (send_new_pipelines, recv_new_pipelines) = channel();

        for (_, shader) in cache.shaders.iter() {
            let pipeline = compile(device, &shader.def, &shader.factory, &shader.def.read_source())
                .with_context(|| format!("Failed to compile shader: {}", shader.def.name))?;
            if let Some(entry) = cache.pipelines.get_mut(shader.pipeline_id) {
                entry.0 = Some(pipeline);
            }
        }

        let debouncer = if hot_reload {
            match watch_shaders(device.clone(), cache.shaders.clone(), send_new_pipelines) {
                Ok(debouncer) => Some(debouncer),
                Err(e) => {
                    log::warn!("Shader hot reload disabled: {:#}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            cache,
            receiver: recv_new_pipelines,
            _debouncer: debouncer,
        })
    }

    pub fn load_pending_shaders(&mut self) {
        while let Ok((name, pipeline_id, pipeline)) = self.receiver.try_recv() {
            if let Some(entry) = self.cache.pipelines.get_mut(pipeline_id) {
                log::info!("Shader reloaded: {}", name);
                entry.0 = Some(pipeline);
            }
        }
    }
}

fn watch_shaders(
    device: wgpu::Device,
    shaders: Arc<Arena<ShaderEntry>>,
    send_new_pipelines: mpsc::Sender<(&'static str, PipelineId, wgpu::RenderPipeline)>,
) -> anyhow::Result<Debouncer<RecommendedWatcher>> {
    let mut debouncer = new_debouncer(
        Duration::from_millis(100),
        move |res: DebounceEventResult| match res {
            Ok(events) => {
                for event in events {
                    if event.kind != DebouncedEventKind::Any {
                        continue;
                    }

                    let Some(entry) = shaders
                        .iter()
                        .map(|(_, entry)| entry)
                        .find(|entry| event.path.ends_with(entry.def.path))
                    else {
                        continue;
                    };

                    let source = match std::fs::read_to_string(&event.path) {
                        Ok(source) => source,
                        Err(e) => {
                            log::warn!("Failed to read {}: {}", event.path.display(), e);
                            continue;
                        }
                    };

                    match compile(&device, &entry.def, &entry.factory, &source) {
                        Ok(pipeline) => {
                            let _ = send_new_pipelines.send((
                                entry.def.name,
                                entry.pipeline_id,
                                pipeline,
                            ));
                        }
                        Err(e) => log::error!("Failed to reload shader: {:#}", e),
                    }
                }
            }
            Err(e) => log::error!("Error debouncing shader changes: {}", e),
        },
    )
    .context("Failed to create shader watcher")?;

    let absolute_shader_folder = Path::new(SHADER_FOLDER)
        .canonicalize()
        .with_context(|| format!("Shader folder {} not found", SHADER_FOLDER))?;

    debouncer
        .watcher()
        .watch(&absolute_shader_folder, RecursiveMode::Recursive)
        .context("Failed to watch shader folder")?;

    log::info!("Watching {} for shader changes", absolute_shader_folder.display());

    Ok(debouncer)
}

fn compile(
    device: &wgpu::Device,
    shader_def: &ShaderDefinition,
    factory: &PipelineFactory,
    source: &str,
) -> anyhow::Result<wgpu::RenderPipeline> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let pipeline = factory(device, shader_def, source);

    device
        .poll(PollType::Wait)
        .context("Failed to poll device after shader compilation.")?;

    let error = block_on(device.pop_error_scope());

    if let Some(error) = error {
        return Err(anyhow::anyhow!(
            "Shader compilation failed for {}: {}",
            shader_def.name,
            error
        ));
    };

    pipeline
}
