//! World generation and the durable tile list
//!
//! Runs the generation stages (elevation noise, mountains, valleys) over a
//! scratch `HeightField`, then snapshots every cell into an immutable
//! `TileInstance`. The height field is dropped once the tiles exist.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::heightfield::{FeatureKind, HeightField, TileType};
use crate::regions::{self, FeatureParams, GrowthReport};
use crate::seeds::WorldSeeds;
use crate::tilemap::Tilemap;

/// World size and feature configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldParams {
    /// Grid width in tiles
    pub width: usize,
    /// Grid height in tiles
    pub height: usize,
    /// Chance that a cell gets a random elevation in {-1, 0, 1}
    pub noise_chance: f64,
    pub mountains: FeatureParams,
    pub valleys: FeatureParams,
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            width: 50,
            height: 50,
            noise_chance: 0.25,
            mountains: FeatureParams::mountains(),
            valleys: FeatureParams::valleys(),
        }
    }
}

impl WorldParams {
    /// A featureless, noiseless world of the given size.
    pub fn flat(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            noise_chance: 0.0,
            mountains: FeatureParams { count: 0, ..FeatureParams::mountains() },
            valleys: FeatureParams { count: 0, ..FeatureParams::valleys() },
        }
    }
}

/// Snapshot of one grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileInstance {
    pub tile_type: TileType,
    pub grid_x: i32,
    pub grid_y: i32,
    pub height: i32,
    /// Render a water overlay at the basin's surface level
    pub lake: bool,
}

impl TileInstance {
    /// Painter's-order key: tiles with a smaller sum are further back.
    pub fn depth_key(&self) -> i32 {
        self.grid_x + self.grid_y
    }
}

/// Summary of one generation pass.
#[derive(Clone, Debug)]
pub struct GenerationReport {
    pub seeds: WorldSeeds,
    pub mountains: GrowthReport,
    pub valleys: GrowthReport,
    pub claimed_cells: usize,
    pub lake_cells: usize,
}

impl GenerationReport {
    /// False when any feature was skipped for lack of a free center.
    pub fn is_complete(&self) -> bool {
        self.mountains.is_complete() && self.valleys.is_complete()
    }
}

/// A generated world: its tiles plus a height index for neighbor lookups.
#[derive(Clone, Debug)]
pub struct World {
    pub seeds: WorldSeeds,
    pub width: usize,
    pub height: usize,
    params: WorldParams,
    tiles: Vec<TileInstance>,
    heights: Tilemap<i32>,
}

impl World {
    /// Generate a world from explicit seeds.
    pub fn generate(params: &WorldParams, seeds: WorldSeeds) -> (Self, GenerationReport) {
        log::info!("Generating {}x{} world with seed {}", params.width, params.height, seeds.master);

        let (field, report) = build_height_field(params, seeds);
        let world = Self::from_height_field(&field, params.clone(), seeds);

        log::info!(
            "Placed {}/{} mountains and {}/{} valleys ({} lakes), {} claimed cells",
            report.mountains.placed.len(),
            report.mountains.requested,
            report.valleys.placed.len(),
            report.valleys.requested,
            report.valleys.lake_count(),
            report.claimed_cells,
        );
        if !report.is_complete() {
            log::warn!(
                "World is crowded: skipped {} mountains and {} valleys",
                report.mountains.skipped,
                report.valleys.skipped
            );
        }

        (world, report)
    }

    /// Throw the current tiles away and rebuild everything from new seeds.
    pub fn regenerate(&mut self, seeds: WorldSeeds) -> GenerationReport {
        let (world, report) = Self::generate(&self.params, seeds);
        *self = world;
        report
    }

    /// Snapshot a height field into tiles, row-major.
    pub fn from_height_field(field: &HeightField, params: WorldParams, seeds: WorldSeeds) -> Self {
        let tiles = materialize(field);
        Self {
            seeds,
            width: field.width,
            height: field.height,
            params,
            heights: field.elevation.clone(),
            tiles,
        }
    }

    /// Convenience accessor for master seed
    pub fn seed(&self) -> u64 {
        self.seeds.master
    }

    pub fn params(&self) -> &WorldParams {
        &self.params
    }

    /// Tiles in creation (row-major) order.
    pub fn tiles(&self) -> &[TileInstance] {
        &self.tiles
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.heights.contains(x, y)
    }

    /// Height of a grid cell; cells off the map count as flat ground.
    pub fn height_at(&self, x: i32, y: i32) -> i32 {
        self.heights.get_checked(x, y).copied().unwrap_or(0)
    }

    /// The tile at a grid cell, if it exists.
    pub fn tile_at(&self, x: i32, y: i32) -> Option<&TileInstance> {
        if self.contains(x, y) {
            self.tiles.get(y as usize * self.width + x as usize)
        } else {
            None
        }
    }
}

/// Run every generation stage and return the finished height field.
pub fn build_height_field(params: &WorldParams, seeds: WorldSeeds) -> (HeightField, GenerationReport) {
    let mut field = HeightField::new(params.width, params.height);

    let mut noise_rng = ChaCha8Rng::seed_from_u64(seeds.noise);
    apply_elevation_noise(&mut field, params.noise_chance, &mut noise_rng);

    // Mountains claim first, so valleys can only grow into what is left
    let mut mountain_rng = ChaCha8Rng::seed_from_u64(seeds.mountains);
    let mountains = regions::grow_features(&mut field, FeatureKind::Mountain, &params.mountains, &mut mountain_rng);

    let mut valley_rng = ChaCha8Rng::seed_from_u64(seeds.valleys);
    let valleys = regions::grow_features(&mut field, FeatureKind::Valley, &params.valleys, &mut valley_rng);

    let report = GenerationReport {
        seeds,
        mountains,
        valleys,
        claimed_cells: field.claimed.count_where(|&c| c),
        lake_cells: field.lake_seed.count_where(|&l| l),
    };

    (field, report)
}

/// Jitter unclaimed ground: each cell independently gets a uniform value in
/// {-1, 0, 1} with probability `chance`, otherwise stays 0.
pub fn apply_elevation_noise(field: &mut HeightField, chance: f64, rng: &mut ChaCha8Rng) {
    let chance = chance.clamp(0.0, 1.0);
    for (_, _, h) in field.elevation.iter_mut() {
        *h = if rng.gen_bool(chance) { rng.gen_range(-1..=1) } else { 0 };
    }
}

/// One tile per cell, row-major.
pub fn materialize(field: &HeightField) -> Vec<TileInstance> {
    field
        .elevation
        .iter()
        .map(|(x, y, &height)| TileInstance {
            tile_type: *field.tile_type.get(x, y),
            grid_x: x as i32,
            grid_y: y as i32,
            height,
            lake: *field.lake_seed.get(x, y),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_world_has_one_flat_tile_per_cell() {
        let (world, report) = World::generate(&WorldParams::flat(10, 10), WorldSeeds::from_master(1));

        assert_eq!(world.tiles().len(), 100);
        assert!(world.tiles().iter().all(|t| t.height == 0 && !t.lake));
        assert!(world.tiles().iter().all(|t| t.tile_type == TileType::Grass));
        assert!(report.is_complete());
        assert_eq!(report.claimed_cells, 0);
        assert_eq!(report.lake_cells, 0);
    }

    #[test]
    fn test_tiles_are_row_major() {
        let (world, _) = World::generate(&WorldParams::flat(4, 3), WorldSeeds::from_master(1));
        let coords: Vec<(i32, i32)> = world.tiles().iter().map(|t| (t.grid_x, t.grid_y)).collect();
        assert_eq!(coords[0], (0, 0));
        assert_eq!(coords[3], (3, 0));
        assert_eq!(coords[4], (0, 1));
        assert_eq!(coords[11], (3, 2));
        assert_eq!(world.tile_at(2, 1).map(|t| (t.grid_x, t.grid_y)), Some((2, 1)));
    }

    #[test]
    fn test_noise_stays_within_one_step() {
        let params = WorldParams {
            noise_chance: 1.0,
            ..WorldParams::flat(20, 20)
        };
        let (world, _) = World::generate(&params, WorldSeeds::from_master(8));

        assert!(world.tiles().iter().all(|t| (-1..=1).contains(&t.height)));
        assert!(world.tiles().iter().any(|t| t.height != 0));
    }

    #[test]
    fn test_same_seed_same_world() {
        let params = WorldParams::default();
        let (a, _) = World::generate(&params, WorldSeeds::from_master(31337));
        let (b, _) = World::generate(&params, WorldSeeds::from_master(31337));
        assert_eq!(a.tiles(), b.tiles());
    }

    #[test]
    fn test_default_world_has_terrain_and_lake_tags_match() {
        let seeds = WorldSeeds::from_master(4242);
        let (field, report) = build_height_field(&WorldParams::default(), seeds);
        let world = World::from_height_field(&field, WorldParams::default(), seeds);

        assert!(!report.mountains.placed.is_empty());
        assert!(world.tiles().iter().any(|t| t.height >= 6));
        assert!(world.tiles().iter().any(|t| t.height <= -6));

        for tile in world.tiles() {
            let (x, y) = (tile.grid_x as usize, tile.grid_y as usize);
            assert_eq!(tile.lake, *field.lake_seed.get(x, y));
            if tile.lake {
                assert!(*field.valley_seed.get(x, y));
            }
        }
    }

    #[test]
    fn test_height_lookup_off_grid_is_zero() {
        let (world, _) = World::generate(&WorldParams::default(), WorldSeeds::from_master(9));
        assert_eq!(world.height_at(-1, 0), 0);
        assert_eq!(world.height_at(0, 50), 0);
        assert!(world.tile_at(50, 0).is_none());
        assert_eq!(world.height_at(3, 4), world.tile_at(3, 4).map(|t| t.height).unwrap_or_default());
    }

    #[test]
    fn test_regenerate_rebuilds_with_new_seed() {
        let (mut world, _) = World::generate(&WorldParams::default(), WorldSeeds::from_master(1));
        let report = world.regenerate(WorldSeeds::from_master(2));

        assert_eq!(world.seed(), 2);
        assert_eq!(report.seeds.master, 2);
        assert_eq!(world.tiles().len(), 50 * 50);
    }
}
