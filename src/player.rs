//! Player sprite: grid position, facing and walk animation

use crate::compositor::{DrawCommand, DrawLayer, Modulation, ScreenRect, TextureKind};
use crate::world::World;

/// Sprite sheet frame size in pixels
pub const FRAME_WIDTH: i32 = 64;
pub const FRAME_HEIGHT: i32 = 64;
/// Walk frames per direction row
pub const FRAMES_PER_ROW: usize = 6;
/// Time between animation frames (10 fps)
pub const FRAME_DELAY_MS: u64 = 100;

/// One of the four grid directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Down,
    Left,
    Right,
    Up,
}

impl Direction {
    /// Grid step for one move.
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
        }
    }

    /// Row in the sprite sheet.
    pub fn sprite_row(&self) -> usize {
        match self {
            Direction::Down => 0,
            Direction::Left => 1,
            Direction::Right => 2,
            Direction::Up => 3,
        }
    }
}

/// Input for a single frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerCommand {
    Idle,
    Walk(Direction),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub grid_x: i32,
    pub grid_y: i32,
    pub facing: Direction,
    frame: usize,
    moving: bool,
    last_frame_ms: u64,
}

impl Player {
    pub fn new(grid_x: i32, grid_y: i32) -> Self {
        Self {
            grid_x,
            grid_y,
            facing: Direction::Down,
            frame: 0,
            moving: false,
            last_frame_ms: 0,
        }
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Apply this frame's command. A walk always turns the player; the step
    /// itself only happens when the target cell is on the map. Returns true
    /// when the grid position changed.
    pub fn apply(&mut self, command: PlayerCommand, world: &World) -> bool {
        match command {
            PlayerCommand::Idle => {
                self.moving = false;
                false
            }
            PlayerCommand::Walk(direction) => {
                self.facing = direction;
                self.moving = true;
                let (dx, dy) = direction.delta();
                let (nx, ny) = (self.grid_x + dx, self.grid_y + dy);
                if world.contains(nx, ny) {
                    self.grid_x = nx;
                    self.grid_y = ny;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Advance the walk cycle. Frames only tick while moving.
    pub fn update(&mut self, now_ms: u64) {
        if !self.moving {
            return;
        }
        if now_ms.saturating_sub(self.last_frame_ms) >= FRAME_DELAY_MS {
            self.last_frame_ms = now_ms;
            self.frame = (self.frame + 1) % FRAMES_PER_ROW;
        }
    }

    /// Pull the player back onto the map, e.g. after a smaller world was
    /// generated.
    pub fn clamp_to(&mut self, world: &World) {
        self.grid_x = self.grid_x.clamp(0, world.width.saturating_sub(1) as i32);
        self.grid_y = self.grid_y.clamp(0, world.height.saturating_sub(1) as i32);
    }

    /// Current frame's rectangle in the sprite sheet.
    pub fn source_rect(&self) -> ScreenRect {
        ScreenRect::new(
            self.frame as i32 * FRAME_WIDTH,
            self.facing.sprite_row() as i32 * FRAME_HEIGHT,
            FRAME_WIDTH,
            FRAME_HEIGHT,
        )
    }

    /// Sprite draw, centered in a viewport. Always drawn last.
    pub fn draw_command(&self, viewport: (usize, usize)) -> DrawCommand {
        let x = viewport.0 as i32 / 2 - FRAME_WIDTH / 2;
        let y = viewport.1 as i32 / 2 - FRAME_HEIGHT / 2;
        DrawCommand {
            layer: DrawLayer::Sprite,
            texture: TextureKind::Player,
            dest: ScreenRect::new(x, y, FRAME_WIDTH, FRAME_HEIGHT),
            source: Some(self.source_rect()),
            modulation: Modulation::NEUTRAL,
            depth: i32::MAX,
        }
    }
}
