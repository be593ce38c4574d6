use std::path::PathBuf;

use clap::Parser;
use scene_demos::docs::{default_conversions, generate_all, TEMPLATE_PATH};

#[derive(Parser)]
#[command(about = "Convert the demo READMEs into HTML pages")]
struct Args {
    /// Project root containing demos/ and docs/
    #[arg(default_value = ".")]
    root: PathBuf,
}

fn main() {
    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();

    let args = Args::parse();

    let conversions = default_conversions(&args.root);
    generate_all(&conversions, &args.root.join(TEMPLATE_PATH));
}
