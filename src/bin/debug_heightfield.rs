//! Debug tool: print a generated height field as ASCII and optionally save a
//! rendered snapshot using placeholder textures

use std::error::Error;

use clap::Parser;

use pixel_world::camera::Camera;
use pixel_world::compositor::Compositor;
use pixel_world::heightfield::HeightField;
use pixel_world::raster::{pack_rgb, Canvas, TextureSet};
use pixel_world::seeds::WorldSeeds;
use pixel_world::world::{build_height_field, World, WorldParams};

#[derive(Parser, Debug)]
#[command(name = "debug_heightfield")]
struct Args {
    #[arg(short, long, default_value = "12345")]
    seed: u64,

    #[arg(short = 'W', long, default_value = "50")]
    width: usize,

    #[arg(short = 'H', long, default_value = "50")]
    height: usize,

    /// Write a rendered snapshot to this PNG path
    #[arg(long)]
    png: Option<String>,

    /// Zoom for the snapshot
    #[arg(long, default_value = "1.0")]
    zoom: f32,
}

/// One character per cell: `~` lake, digits for height, letters for depth.
fn cell_char(field: &HeightField, x: usize, y: usize) -> char {
    if *field.lake_seed.get(x, y) {
        return '~';
    }
    match *field.elevation.get(x, y) {
        0 => '.',
        h if h > 9 => '+',
        h if h > 0 => char::from(b'0' + h as u8),
        h if h < -9 => '#',
        h => char::from(b'a' + (-h - 1) as u8),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let params = WorldParams {
        width: args.width,
        height: args.height,
        ..WorldParams::default()
    };
    let seeds = WorldSeeds::from_master(args.seed);
    let (field, report) = build_height_field(&params, seeds);

    println!("=== HEIGHT FIELD ({}x{}) ===", field.width, field.height);
    println!("{}", seeds);
    println!();
    println!("LEGEND:");
    println!("  . = flat   1-9 = height   a-i = depth 1-9   ~ = lake   + / # = beyond 9");
    println!();

    for y in 0..field.height {
        let row: String = (0..field.width).map(|x| cell_char(&field, x, y)).collect();
        println!("{}", row);
    }

    println!();
    for growth in [&report.mountains, &report.valleys] {
        println!(
            "{}: {}/{} placed, {} skipped, {} center picks",
            growth.kind.display_name(),
            growth.placed.len(),
            growth.requested,
            growth.skipped,
            growth.center_attempts
        );
        for feature in &growth.placed {
            println!(
                "  {:?} at {:?}: peak {}, core {}, falloff {}{}",
                feature.id,
                feature.center,
                feature.peak,
                feature.core.len(),
                feature.falloff_cells,
                if feature.lake { ", lake" } else { "" }
            );
        }
    }
    println!("Claimed cells: {}", report.claimed_cells);
    println!("Lake cells: {}", report.lake_cells);

    if let Some(path) = args.png {
        let world = World::from_height_field(&field, params, seeds);
        let compositor = Compositor::default();
        let (width, height) = (960, 720);

        let mut camera = Camera::new(0.0, 0.0, args.zoom);
        let (cx, cy) = (world.width as i32 / 2, world.height as i32 / 2);
        camera.focus_on(cx, cy, world.height_at(cx, cy), compositor.config(), (width, height));

        let mut canvas = Canvas::new(width, height);
        canvas.clear(pack_rgb(5, 5, 15));
        let commands = compositor.compose(&world, &camera);
        let drawn = canvas.draw_all(&commands, &TextureSet::placeholder());
        canvas.to_image().save(&path)?;
        println!("Saved snapshot to {} ({} draw commands)", path, drawn);
    }

    Ok(())
}
