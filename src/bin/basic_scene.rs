use scene_demos::{basic_scene::BasicScene, config::AppConfig, window};

fn main() -> anyhow::Result<()> {
    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();

    let config = AppConfig::from_env();
    let demo = BasicScene::new(&config);

    pollster::block_on(window::run(demo, config))
}
