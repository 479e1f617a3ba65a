//! Interactive window: input, camera, and the per-frame render pass

use std::path::Path;
use std::time::Instant;

use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};

use crate::camera::Camera;
use crate::compositor::{Compositor, IsoConfig};
use crate::error::AppError;
use crate::player::{Direction, Player, PlayerCommand};
use crate::raster::{pack_rgb, Canvas, TextureSet};
use crate::seeds::WorldSeeds;
use crate::world::{World, WorldParams};

/// Asset directory, relative to the working directory
pub const ASSET_DIR: &str = "assets";

const WINDOW_TITLE: &str = "2.5D Pixel World - Arrows: Move, Wheel: Zoom, R: Regenerate, Esc: Exit";

/// Arrow keys and the direction each one walks
const MOVE_KEYS: [(Key, Direction); 4] = [
    (Key::Left, Direction::Left),
    (Key::Right, Direction::Right),
    (Key::Up, Direction::Up),
    (Key::Down, Direction::Down),
];

/// Everything needed to start the interactive session.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub window_width: usize,
    pub window_height: usize,
    /// Master seed for the first world; later regenerations use the clock
    pub seed: Option<u64>,
    pub world: WorldParams,
    pub iso: IsoConfig,
    /// Player start cell
    pub start: (i32, i32),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window_width: 640,
            window_height: 480,
            seed: None,
            world: WorldParams::default(),
            iso: IsoConfig::default(),
            start: (5, 5),
        }
    }
}

/// Open the window and run until it is closed or Escape is pressed.
pub fn run(config: AppConfig) -> Result<(), AppError> {
    let viewport = (config.window_width, config.window_height);
    let background = pack_rgb(0, 0, 0);

    let textures = TextureSet::load(Path::new(ASSET_DIR))?;

    let seeds = config.seed.map(WorldSeeds::from_master).unwrap_or_else(WorldSeeds::from_clock);
    let (mut world, _) = World::generate(&config.world, seeds);
    let compositor = Compositor::new(config.iso.clone());

    let mut player = Player::new(config.start.0, config.start.1);
    player.clamp_to(&world);

    let mut camera = Camera::default();
    follow(&mut camera, &player, &world, compositor.config(), viewport);

    let mut window = Window::new(
        WINDOW_TITLE,
        config.window_width,
        config.window_height,
        WindowOptions {
            resize: false,
            scale: minifb::Scale::X1,
            ..WindowOptions::default()
        },
    )?;
    window.set_target_fps(60);

    let mut canvas = Canvas::new(config.window_width, config.window_height);
    let started = Instant::now();

    println!("Controls:");
    println!("  Arrows: Move");
    println!("  Mouse wheel: Zoom around cursor");
    println!("  R: Regenerate");
    println!("  Esc: Exit");

    while window.is_open() && !window.is_key_down(Key::Escape) {
        if window.is_key_pressed(Key::R, KeyRepeat::No) {
            let report = world.regenerate(WorldSeeds::from_clock());
            log::info!("Regenerated world with seed {}", report.seeds.master);
            player.clamp_to(&world);
            follow(&mut camera, &player, &world, compositor.config(), viewport);
        }

        let command = MOVE_KEYS
            .iter()
            .find(|(key, _)| window.is_key_pressed(*key, KeyRepeat::Yes))
            .map(|&(_, direction)| PlayerCommand::Walk(direction))
            .unwrap_or(PlayerCommand::Idle);

        if player.apply(command, &world) {
            follow(&mut camera, &player, &world, compositor.config(), viewport);
        }

        if let Some((_, wheel)) = window.get_scroll_wheel() {
            if let Some(cursor) = window.get_mouse_pos(MouseMode::Clamp) {
                if camera.zoom_at(wheel, cursor) {
                    log::debug!("Zoom {:.1}", camera.zoom);
                }
            }
        }

        player.update(started.elapsed().as_millis() as u64);

        canvas.clear(background);
        let mut commands = compositor.compose(&world, &camera);
        commands.push(player.draw_command(viewport));
        canvas.draw_all(&commands, &textures);

        window.update_with_buffer(canvas.buffer(), config.window_width, config.window_height)?;
    }

    Ok(())
}

/// Center the camera on the player's tile.
fn follow(camera: &mut Camera, player: &Player, world: &World, iso: &IsoConfig, viewport: (usize, usize)) {
    let height = world.height_at(player.grid_x, player.grid_y);
    camera.focus_on(player.grid_x, player.grid_y, height, iso, viewport);
}
