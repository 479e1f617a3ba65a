//! Scroll and zoom state shared by input handling and the compositor

use crate::compositor::IsoConfig;

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 3.0;
pub const ZOOM_STEP: f32 = 0.1;

/// World-space scroll offset (unscaled pixels) and zoom factor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub scroll_x: f32,
    pub scroll_y: f32,
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            scroll_x: 0.0,
            scroll_y: 0.0,
            zoom: 1.0,
        }
    }
}

/// Round a zoom factor onto the 0.1 grid and into range.
fn snap_zoom(zoom: f32) -> f32 {
    ((zoom / ZOOM_STEP).round() * ZOOM_STEP).clamp(MIN_ZOOM, MAX_ZOOM)
}

impl Camera {
    pub fn new(scroll_x: f32, scroll_y: f32, zoom: f32) -> Self {
        Self {
            scroll_x,
            scroll_y,
            zoom: snap_zoom(zoom),
        }
    }

    /// Step the zoom by one notch in the direction of `wheel` and rescale the
    /// scroll around the cursor: `scroll = (scroll + cursor) * new / old - cursor`.
    /// Under the `(base - scroll) * zoom` projection this only approximately
    /// holds the world point under the cursor still (it can drift slightly per
    /// step). Returns false when nothing changed (no wheel
    /// movement, or already at the limit).
    pub fn zoom_at(&mut self, wheel: f32, cursor: (f32, f32)) -> bool {
        let old_zoom = self.zoom;
        let target = if wheel > 0.0 {
            old_zoom + ZOOM_STEP
        } else if wheel < 0.0 {
            old_zoom - ZOOM_STEP
        } else {
            return false;
        };

        let new_zoom = snap_zoom(target);
        if (new_zoom - old_zoom).abs() < f32::EPSILON {
            return false;
        }

        let ratio = new_zoom / old_zoom;
        self.scroll_x = (self.scroll_x + cursor.0) * ratio - cursor.0;
        self.scroll_y = (self.scroll_y + cursor.1) * ratio - cursor.1;
        self.zoom = new_zoom;
        true
    }

    /// Scroll so the top face of a tile at `height` sits in the middle of
    /// a `viewport` sized screen.
    pub fn focus_on(&mut self, grid_x: i32, grid_y: i32, height: i32, iso: &IsoConfig, viewport: (usize, usize)) {
        let (base_x, base_y) = iso.base_position(grid_x, grid_y);
        let center_x = base_x + iso.tile_width / 2;
        let center_y = base_y + iso.tile_height / 2 - height * iso.tiles_per_height * iso.vertical_overlap();

        let half_w = viewport.0 as f32 / 2.0 - iso.origin_x as f32;
        let half_h = viewport.1 as f32 / 2.0 - iso.origin_y as f32;

        self.scroll_x = center_x as f32 - half_w / self.zoom;
        self.scroll_y = center_y as f32 - half_h / self.zoom;
    }
}
