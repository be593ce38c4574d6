use scene_demos::{config::AppConfig, viewer::GlbViewer, window};

fn main() -> anyhow::Result<()> {
    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();

    let config = AppConfig::from_env();
    let mut viewer = GlbViewer::new(&config);
    viewer.start_loading();

    pollster::block_on(window::run(viewer, config))
}
