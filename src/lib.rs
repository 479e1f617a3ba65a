//! 2.5D isometric tile world
//!
//! Procedural terrain (mountain plateaus, valley basins, lakes) plus an
//! isometric compositor that turns the tiles into shaded draw commands.

pub mod app;
pub mod camera;
pub mod compositor;
pub mod error;
pub mod heightfield;
pub mod player;
pub mod raster;
pub mod regions;
pub mod seeds;
pub mod tilemap;
pub mod world;
