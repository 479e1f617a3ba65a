//! Isometric compositing
//!
//! Turns the world's tiles plus the camera into a flat list of draw commands:
//! stacked cliff segments for raised and sunken cells, gap fillers where a
//! cell towers over its right or bottom neighbor, the shaded top face and an
//! optional water overlay. Commands are emitted back-to-front and each one
//! carries its own brightness/alpha, so the backend never holds tint state
//! between draws.

use crate::camera::Camera;
use crate::heightfield::TileType;
use crate::world::{TileInstance, World};

/// Tile geometry and shading configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct IsoConfig {
    /// Diamond width in pixels
    pub tile_width: i32,
    /// Diamond height in pixels
    pub tile_height: i32,
    /// Cliff segments per unit of elevation
    pub tiles_per_height: i32,
    /// Screen position of grid (0, 0) at zero scroll
    pub origin_x: i32,
    pub origin_y: i32,
    /// Grid offset of the neighbor that shades this cell when it is higher.
    /// (-1, 0) is the cell to the screen upper-left.
    pub shadow_offset: (i32, i32),
    /// Top face brightness at height 0
    pub top_base_brightness: i32,
    /// Opacity of the lake overlay
    pub water_alpha: u8,
}

impl Default for IsoConfig {
    fn default() -> Self {
        Self {
            tile_width: 64,
            tile_height: 32,
            tiles_per_height: 4,
            origin_x: 0,
            origin_y: 0,
            shadow_offset: (-1, 0),
            top_base_brightness: 180,
            water_alpha: 204,
        }
    }
}

impl IsoConfig {
    /// Vertical distance between stacked cliff segments, unscaled.
    pub fn vertical_overlap(&self) -> i32 {
        self.tile_height / 4
    }

    /// Unscrolled, unzoomed isometric position of a grid cell.
    pub fn base_position(&self, grid_x: i32, grid_y: i32) -> (i32, i32) {
        (
            (grid_x - grid_y) * (self.tile_width / 2),
            (grid_x + grid_y) * (self.tile_height / 2),
        )
    }

    /// Screen position of a grid cell's flat (height 0) face.
    pub fn project(&self, grid_x: i32, grid_y: i32, camera: &Camera) -> (i32, i32) {
        let (base_x, base_y) = self.base_position(grid_x, grid_y);
        let x = ((base_x as f32 - camera.scroll_x) * camera.zoom).round() as i32;
        let y = ((base_y as f32 - camera.scroll_y) * camera.zoom).round() as i32;
        (x + self.origin_x, y + self.origin_y)
    }
}

/// Textures the compositor can reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Grass,
    Water,
    Dirt,
    Cliff,
    Player,
}

impl TextureKind {
    pub const ALL: [TextureKind; 5] = [
        TextureKind::Grass,
        TextureKind::Water,
        TextureKind::Dirt,
        TextureKind::Cliff,
        TextureKind::Player,
    ];

    /// Image file for this texture, relative to the asset directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            TextureKind::Grass => "grass.png",
            TextureKind::Water => "water.png",
            TextureKind::Dirt => "dirt.png",
            TextureKind::Cliff => "rock.png",
            TextureKind::Player => "archer_blond_hair.png",
        }
    }

    /// Top face texture for a surface type.
    pub fn for_surface(tile_type: TileType) -> Self {
        match tile_type {
            TileType::Grass => TextureKind::Grass,
            TileType::Water => TextureKind::Water,
            TileType::Rock => TextureKind::Dirt,
        }
    }
}

/// What a draw command depicts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrawLayer {
    Wall,
    Top,
    Water,
    Sprite,
}

/// Axis-aligned pixel rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl ScreenRect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }
}

/// Color modulation applied to a single draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Modulation {
    /// Multiplies every color channel, 255 = unchanged
    pub brightness: u8,
    /// Multiplies texture alpha, 255 = opaque
    pub alpha: u8,
}

impl Modulation {
    pub const NEUTRAL: Modulation = Modulation { brightness: 255, alpha: 255 };

    pub fn shade(brightness: i32) -> Self {
        Self {
            brightness: brightness.clamp(0, 255) as u8,
            alpha: 255,
        }
    }
}

/// One textured quad.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawCommand {
    pub layer: DrawLayer,
    pub texture: TextureKind,
    pub dest: ScreenRect,
    /// Sub-rectangle of the texture; `None` draws the whole texture
    pub source: Option<ScreenRect>,
    pub modulation: Modulation,
    /// Painter's-order key of the tile that produced the command
    pub depth: i32,
}

/// Tiles in back-to-front order. The sort is stable, so tiles on the same
/// diagonal keep their row-major order.
pub fn render_order(tiles: &[TileInstance]) -> Vec<&TileInstance> {
    let mut ordered: Vec<&TileInstance> = tiles.iter().collect();
    ordered.sort_by_key(|t| t.depth_key());
    ordered
}

/// Builds draw lists for a world.
#[derive(Clone, Debug, Default)]
pub struct Compositor {
    config: IsoConfig,
}

impl Compositor {
    pub fn new(config: IsoConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IsoConfig {
        &self.config
    }

    /// Draw list for one frame.
    pub fn compose(&self, world: &World, camera: &Camera) -> Vec<DrawCommand> {
        let mut commands = Vec::with_capacity(world.tiles().len() * 2);
        for tile in render_order(world.tiles()) {
            self.compose_tile(tile, world, camera, &mut commands);
        }
        commands
    }

    fn compose_tile(&self, tile: &TileInstance, world: &World, camera: &Camera, out: &mut Vec<DrawCommand>) {
        let cfg = &self.config;
        let zoom = camera.zoom;
        let width = (cfg.tile_width as f32 * zoom).round() as i32;
        let height = (cfg.tile_height as f32 * zoom).round() as i32;
        let overlap = (cfg.vertical_overlap() as f32 * zoom).round() as i32;
        let tph = cfg.tiles_per_height;

        let (iso_x, iso_y) = cfg.project(tile.grid_x, tile.grid_y, camera);
        let top_y = iso_y - tile.height * tph * overlap;
        let depth = tile.depth_key();

        let (sx, sy) = cfg.shadow_offset;
        let shadowed = world.height_at(tile.grid_x + sx, tile.grid_y + sy) > tile.height;

        let wall = |y: i32, modulation: Modulation| DrawCommand {
            layer: DrawLayer::Wall,
            texture: TextureKind::Cliff,
            dest: ScreenRect::new(iso_x, y, width, height),
            source: None,
            modulation,
            depth,
        };

        if tile.height > 0 {
            // Cliff face hanging below a raised top
            for h in (1..=tile.height * tph).rev() {
                out.push(wall(top_y + h * overlap, Modulation::NEUTRAL));
            }
        } else if tile.height < 0 {
            // Pit walls, darker the deeper they go
            let sunk = -tile.height * tph;
            for s in 0..=sunk {
                let mut brightness = 255 - (sunk + s) * 10;
                if shadowed {
                    brightness -= 40;
                }
                out.push(wall(top_y + s * overlap, Modulation::shade(brightness.clamp(20, 255))));
            }
        }

        // Fill the drop down to a lower right or bottom neighbor
        for (dx, dy) in [(1, 0), (0, 1)] {
            let neighbor = world.height_at(tile.grid_x + dx, tile.grid_y + dy);
            let diff = tile.height - neighbor;
            for k in 1..=diff.max(0) * tph {
                let fake_depth = -neighbor * tph + (k - 1);
                let brightness = (255 - fake_depth * 10).clamp(40, 255);
                out.push(wall(top_y + k * overlap, Modulation::shade(brightness)));
            }
        }

        let mut brightness = cfg.top_base_brightness + tile.height * 20;
        if shadowed {
            brightness -= 40;
        }
        out.push(DrawCommand {
            layer: DrawLayer::Top,
            texture: TextureKind::for_surface(tile.tile_type),
            dest: ScreenRect::new(iso_x, top_y, width, height),
            source: None,
            modulation: Modulation::shade(brightness.clamp(40, 255)),
            depth,
        });

        // Water pools at the basin's nominal surface, not at the carved floor
        if tile.lake {
            out.push(DrawCommand {
                layer: DrawLayer::Water,
                texture: TextureKind::Water,
                dest: ScreenRect::new(iso_x, iso_y, width, height),
                source: None,
                modulation: Modulation {
                    brightness: 255,
                    alpha: cfg.water_alpha,
                },
                depth,
            });
        }
    }
}
