use clap::Parser;

use pixel_world::app::{self, AppConfig};
use pixel_world::regions::FeatureParams;
use pixel_world::world::WorldParams;

#[derive(Parser, Debug)]
#[command(name = "pixel_world")]
#[command(about = "Explore a procedurally generated 2.5D isometric tile world")]
struct Args {
    /// Width of the world in tiles
    #[arg(short = 'W', long, default_value = "50")]
    width: usize,

    /// Height of the world in tiles
    #[arg(short = 'H', long, default_value = "50")]
    height: usize,

    /// Random seed (uses the clock if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of mountain plateaus
    #[arg(short = 'm', long, default_value = "5")]
    mountains: usize,

    /// Number of valley basins
    #[arg(short = 'v', long, default_value = "5")]
    valleys: usize,

    /// Lowest plateau height
    #[arg(long, default_value = "6")]
    min_height: i32,

    /// Highest plateau height
    #[arg(long, default_value = "6")]
    max_height: i32,

    /// Shallowest valley depth
    #[arg(long, default_value = "6")]
    min_depth: i32,

    /// Deepest valley depth
    #[arg(long, default_value = "6")]
    max_depth: i32,

    /// Window width in pixels
    #[arg(long, default_value = "640")]
    window_width: usize,

    /// Window height in pixels
    #[arg(long, default_value = "480")]
    window_height: usize,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let world = WorldParams {
        width: args.width,
        height: args.height,
        mountains: FeatureParams {
            count: args.mountains,
            min_height: args.min_height,
            max_height: args.max_height,
            ..FeatureParams::mountains()
        },
        valleys: FeatureParams {
            count: args.valleys,
            min_height: args.min_depth,
            max_height: args.max_depth,
            ..FeatureParams::valleys()
        },
        ..WorldParams::default()
    };

    let config = AppConfig {
        window_width: args.window_width,
        window_height: args.window_height,
        seed: args.seed,
        world,
        ..AppConfig::default()
    };

    if let Err(e) = app::run(config) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
