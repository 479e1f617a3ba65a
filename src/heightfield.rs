//! Per-cell terrain layers used during world generation
//!
//! A `HeightField` lives only for the duration of one generation pass. The
//! region grower carves features into it, then the world materializes it into
//! tile instances and drops it.

use crate::tilemap::Tilemap;

/// Surface material of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Hash)]
pub enum TileType {
    #[default]
    Grass,
    Water,
    Rock,
}

/// Whether a feature raises or lowers terrain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Mountain,
    Valley,
}

impl FeatureKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            FeatureKind::Mountain => "mountain",
            FeatureKind::Valley => "valley",
        }
    }

    /// +1 for mountains, -1 for valleys.
    pub fn sign(&self) -> i32 {
        match self {
            FeatureKind::Mountain => 1,
            FeatureKind::Valley => -1,
        }
    }
}

/// Feature identifier (0 = unclaimed, 1+ = feature index + 1)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FeatureId(pub u16);

impl FeatureId {
    pub const NONE: FeatureId = FeatureId(0);

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

/// Elevation, material and feature masks for every grid cell.
#[derive(Clone, Debug)]
pub struct HeightField {
    pub width: usize,
    pub height: usize,
    pub elevation: Tilemap<i32>,
    pub tile_type: Tilemap<TileType>,
    /// Any feature occupies this cell
    pub claimed: Tilemap<bool>,
    /// Cell belongs to a valley basin
    pub valley_seed: Tilemap<bool>,
    /// Cell should render a water overlay
    pub lake_seed: Tilemap<bool>,
    /// First feature to claim the cell, never overwritten
    owner: Tilemap<FeatureId>,
    owner_kind: Vec<FeatureKind>,
}

impl HeightField {
    /// Flat grass field with nothing claimed.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            elevation: Tilemap::new_with(width, height, 0),
            tile_type: Tilemap::new_with(width, height, TileType::Grass),
            claimed: Tilemap::new_with(width, height, false),
            valley_seed: Tilemap::new_with(width, height, false),
            lake_seed: Tilemap::new_with(width, height, false),
            owner: Tilemap::new(width, height),
            owner_kind: Vec::new(),
        }
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.elevation.contains(x, y)
    }

    /// Elevation at signed coordinates; off-grid reads as flat ground.
    pub fn elevation_at(&self, x: i32, y: i32) -> i32 {
        self.elevation.get_checked(x, y).copied().unwrap_or(0)
    }

    pub fn is_claimed(&self, x: usize, y: usize) -> bool {
        *self.claimed.get(x, y)
    }

    /// Register a new feature and return its id, or `None` once every id
    /// has been handed out.
    pub fn begin_feature(&mut self, kind: FeatureKind) -> Option<FeatureId> {
        let id = u16::try_from(self.owner_kind.len() + 1).ok()?;
        self.owner_kind.push(kind);
        Some(FeatureId(id))
    }

    pub fn owner(&self, x: usize, y: usize) -> FeatureId {
        *self.owner.get(x, y)
    }

    pub fn feature_kind(&self, id: FeatureId) -> Option<FeatureKind> {
        if id.is_none() {
            return None;
        }
        self.owner_kind.get(id.0 as usize - 1).copied()
    }

    /// Kind of the feature owning a cell, if any.
    pub fn owner_kind(&self, x: usize, y: usize) -> Option<FeatureKind> {
        self.feature_kind(self.owner(x, y))
    }

    /// Mark a cell claimed. The first claimant keeps ownership.
    pub fn claim(&mut self, x: usize, y: usize, id: FeatureId) {
        self.claimed.set(x, y, true);
        if self.owner.get(x, y).is_none() {
            self.owner.set(x, y, id);
        }
    }

    /// Cells owned by each feature, indexed by `FeatureId.0 - 1`.
    pub fn cells_per_feature(&self) -> Vec<usize> {
        let mut counts = vec![0; self.owner_kind.len()];
        for (_, _, id) in self.owner.iter() {
            if !id.is_none() {
                counts[id.0 as usize - 1] += 1;
            }
        }
        counts
    }
}
