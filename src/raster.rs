//! Software backend that executes draw commands into a `u32` frame buffer
//!
//! The buffer layout (0RGB per pixel, row-major) is what `minifb` presents.
//! Textures are sampled nearest-neighbor and alpha blended. Modulation comes
//! from each command; nothing carries over between draws.

use std::collections::HashMap;
use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage, RgbaImage};

use crate::compositor::{DrawCommand, ScreenRect, TextureKind};
use crate::error::AppError;

/// Decoded RGBA texture.
#[derive(Clone, Debug)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pixels: Vec<[u8; 4]>,
}

impl Texture {
    pub fn from_rgba(img: &RgbaImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            pixels: img.pixels().map(|p| p.0).collect(),
        }
    }

    /// Uniform color rectangle.
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; (width * height) as usize],
        }
    }

    /// An isometric diamond of `color` on a transparent background, the same
    /// footprint as a tile's top face.
    pub fn diamond(width: u32, height: u32, color: [u8; 4]) -> Self {
        let mut pixels = vec![[0, 0, 0, 0]; (width * height) as usize];
        let half_w = width as f32 / 2.0;
        let half_h = height as f32 / 2.0;
        for y in 0..height {
            for x in 0..width {
                let dx = ((x as f32 + 0.5) - half_w).abs() / half_w;
                let dy = ((y as f32 + 0.5) - half_h).abs() / half_h;
                if dx + dy <= 1.0 {
                    pixels[(y * width + x) as usize] = color;
                }
            }
        }
        Self { width, height, pixels }
    }

    fn texel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels[(y * self.width + x) as usize]
    }
}

/// Every texture the compositor may reference, keyed by kind.
#[derive(Clone, Debug, Default)]
pub struct TextureSet {
    textures: HashMap<TextureKind, Texture>,
}

impl TextureSet {
    /// Load every texture from `dir`. Any missing or unreadable file is fatal.
    pub fn load(dir: &Path) -> Result<Self, AppError> {
        let mut set = Self::default();
        for kind in TextureKind::ALL {
            let path = dir.join(kind.file_name());
            let img = image::open(&path).map_err(|source| AppError::Texture {
                path: path.clone(),
                source,
            })?;
            let texture = Texture::from_rgba(&img.to_rgba8());
            log::info!("Loaded {} ({}x{})", path.display(), texture.width, texture.height);
            set.insert(kind, texture);
        }
        Ok(set)
    }

    /// Flat-colored stand-ins, used by headless snapshots and tests.
    pub fn placeholder() -> Self {
        let mut set = Self::default();
        set.insert(TextureKind::Grass, Texture::diamond(64, 32, [86, 160, 62, 255]));
        set.insert(TextureKind::Water, Texture::diamond(64, 32, [52, 104, 186, 255]));
        set.insert(TextureKind::Dirt, Texture::diamond(64, 32, [132, 100, 64, 255]));
        set.insert(TextureKind::Cliff, Texture::diamond(64, 32, [120, 116, 110, 255]));
        set.insert(TextureKind::Player, Texture::solid(384, 256, [220, 60, 60, 255]));
        set
    }

    pub fn insert(&mut self, kind: TextureKind, texture: Texture) {
        self.textures.insert(kind, texture);
    }

    pub fn get(&self, kind: TextureKind) -> Option<&Texture> {
        self.textures.get(&kind)
    }
}

/// Pack an RGB triple into a minifb pixel.
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

fn unpack_rgb(color: u32) -> [u8; 3] {
    [(color >> 16) as u8, (color >> 8) as u8, color as u8]
}

/// Frame buffer the draw commands are executed against.
pub struct Canvas {
    pub width: usize,
    pub height: usize,
    buffer: Vec<u32>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            buffer: vec![0; width * height],
        }
    }

    pub fn clear(&mut self, color: u32) {
        self.buffer.fill(color);
    }

    pub fn buffer(&self) -> &[u32] {
        &self.buffer
    }

    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.buffer[y * self.width + x]
    }

    /// Execute a whole draw list in order. Returns how many commands had a
    /// texture to draw with.
    pub fn draw_all(&mut self, commands: &[DrawCommand], textures: &TextureSet) -> usize {
        let mut drawn = 0;
        for command in commands {
            if self.draw(command, textures) {
                drawn += 1;
            }
        }
        drawn
    }

    /// Blit one textured quad. Commands whose texture is missing are skipped.
    pub fn draw(&mut self, command: &DrawCommand, textures: &TextureSet) -> bool {
        let Some(texture) = textures.get(command.texture) else {
            return false;
        };

        let dest = command.dest;
        if dest.w <= 0 || dest.h <= 0 || texture.width == 0 || texture.height == 0 {
            return true;
        }

        let source = command
            .source
            .unwrap_or_else(|| ScreenRect::new(0, 0, texture.width as i32, texture.height as i32));
        if source.w <= 0 || source.h <= 0 {
            return true;
        }

        let brightness = command.modulation.brightness as u32;
        let alpha = command.modulation.alpha as u32;

        let x_start = dest.x.max(0);
        let y_start = dest.y.max(0);
        let x_end = (dest.x + dest.w).min(self.width as i32);
        let y_end = (dest.y + dest.h).min(self.height as i32);

        for py in y_start..y_end {
            let ty = source.y + (py - dest.y) * source.h / dest.h;
            if ty < 0 || ty >= texture.height as i32 {
                continue;
            }
            for px in x_start..x_end {
                let tx = source.x + (px - dest.x) * source.w / dest.w;
                if tx < 0 || tx >= texture.width as i32 {
                    continue;
                }

                let [r, g, b, a] = texture.texel(tx as u32, ty as u32);
                let a = a as u32 * alpha / 255;
                if a == 0 {
                    continue;
                }

                let idx = py as usize * self.width + px as usize;
                let [dr, dg, db] = unpack_rgb(self.buffer[idx]);
                let blend = |src: u8, dst: u8| -> u8 {
                    let src = src as u32 * brightness / 255;
                    ((src * a + dst as u32 * (255 - a)) / 255) as u8
                };
                self.buffer[idx] = pack_rgb(blend(r, dr), blend(g, dg), blend(b, db));
            }
        }

        true
    }

    /// Copy the frame into an RGB image for saving.
    pub fn to_image(&self) -> RgbImage {
        let mut img: RgbImage = ImageBuffer::new(self.width as u32, self.height as u32);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let [r, g, b] = unpack_rgb(self.buffer[y as usize * self.width + x as usize]);
            *pixel = Rgb([r, g, b]);
        }
        img
    }
}
