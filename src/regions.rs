//! Mountain plateau and valley basin carving
//!
//! Each feature grows a flat core by randomized breadth-first expansion from a
//! random unclaimed center, then radiates a decaying halo ("falloff") outward
//! from the core edge. Mountains and valleys share the same algorithm with the
//! sign of the elevation flipped.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::heightfield::{FeatureId, FeatureKind, HeightField};
use crate::tilemap::NEIGHBORS_4;

/// Shape parameters for one batch of features.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureParams {
    /// Number of features to place
    pub count: usize,
    /// Smallest peak height (valleys: depth), inclusive
    pub min_height: i32,
    /// Largest peak height (valleys: depth), inclusive
    pub max_height: i32,
    /// Core size is drawn from `min_core_size..max_core_size`
    pub min_core_size: usize,
    pub max_core_size: usize,
    /// Chance that an accepted core cell pushes each neighbor
    pub spread_chance: f64,
    /// Chance that a falloff cell pushes each neighbor
    pub falloff_chance: f64,
    /// Chance that a valley becomes a lake (ignored for mountains)
    pub lake_chance: f64,
    /// Center picks allowed per feature before it is skipped
    pub max_center_attempts: usize,
}

impl FeatureParams {
    pub fn mountains() -> Self {
        Self {
            count: 5,
            min_height: 6,
            max_height: 6,
            min_core_size: 20,
            max_core_size: 35,
            spread_chance: 0.6,
            falloff_chance: 0.8,
            lake_chance: 0.0,
            max_center_attempts: 100,
        }
    }

    pub fn valleys() -> Self {
        Self {
            lake_chance: 0.5,
            ..Self::mountains()
        }
    }

    /// Inclusive height range with the bounds put in order.
    fn height_range(&self) -> (i32, i32) {
        let lo = self.min_height.min(self.max_height).max(0);
        let hi = self.min_height.max(self.max_height).max(0);
        (lo, hi)
    }

    fn roll_core_size(&self, rng: &mut ChaCha8Rng) -> usize {
        let lo = self.min_core_size.max(1);
        if self.max_core_size > lo {
            rng.gen_range(lo..self.max_core_size)
        } else {
            lo
        }
    }
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self::mountains()
    }
}

/// A feature that was carved into the field.
#[derive(Clone, Debug)]
pub struct PlacedFeature {
    pub id: FeatureId,
    pub center: (usize, usize),
    /// Signed core elevation
    pub peak: i32,
    /// Core cells in acceptance order
    pub core: Vec<(usize, usize)>,
    /// Cells whose elevation the halo touched
    pub falloff_cells: usize,
    pub lake: bool,
}

/// Outcome of one `grow_features` call.
#[derive(Clone, Debug)]
pub struct GrowthReport {
    pub kind: FeatureKind,
    pub requested: usize,
    pub placed: Vec<PlacedFeature>,
    /// Features dropped because no unclaimed center was found in budget
    pub skipped: usize,
    /// Total center picks, including collisions
    pub center_attempts: usize,
}

impl GrowthReport {
    /// True when every requested feature was placed.
    pub fn is_complete(&self) -> bool {
        self.skipped == 0
    }

    pub fn lake_count(&self) -> usize {
        self.placed.iter().filter(|f| f.lake).count()
    }
}

/// Carve `params.count` features of one kind into the field.
///
/// Centers that land on claimed cells are re-rolled. A feature that cannot
/// find a free center within `max_center_attempts` picks is skipped and
/// counted in the report rather than looping forever on a crowded map.
pub fn grow_features(
    field: &mut HeightField,
    kind: FeatureKind,
    params: &FeatureParams,
    rng: &mut ChaCha8Rng,
) -> GrowthReport {
    let mut report = GrowthReport {
        kind,
        requested: params.count,
        placed: Vec::with_capacity(params.count),
        skipped: 0,
        center_attempts: 0,
    };

    let (min_h, max_h) = params.height_range();

    for _ in 0..params.count {
        let (center, attempts) = pick_center(field, params.max_center_attempts, rng);
        report.center_attempts += attempts;

        let Some((cx, cy)) = center else {
            log::warn!(
                "Skipping {}: no unclaimed center after {} attempts",
                kind.display_name(),
                attempts
            );
            report.skipped += 1;
            continue;
        };

        let Some(id) = field.begin_feature(kind) else {
            log::warn!("Skipping {}: feature id space exhausted", kind.display_name());
            report.skipped += 1;
            continue;
        };

        let peak = rng.gen_range(min_h..=max_h) * kind.sign();
        let target_core = params.roll_core_size(rng);
        let lake = kind == FeatureKind::Valley && rng.gen_bool(params.lake_chance.clamp(0.0, 1.0));

        let feature = grow_feature(field, id, kind, (cx, cy), peak, target_core, lake, params, rng);
        log::debug!(
            "Placed {} {:?} at ({}, {}): peak {}, {} core cells, {} falloff cells{}",
            kind.display_name(),
            feature.id,
            cx,
            cy,
            feature.peak,
            feature.core.len(),
            feature.falloff_cells,
            if feature.lake { ", lake" } else { "" }
        );
        report.placed.push(feature);
    }

    report
}

/// Pick a uniformly random unclaimed cell. Returns the cell (if any) and the
/// number of picks spent.
fn pick_center(
    field: &HeightField,
    max_attempts: usize,
    rng: &mut ChaCha8Rng,
) -> (Option<(usize, usize)>, usize) {
    if field.width == 0 || field.height == 0 {
        return (None, 0);
    }

    for attempt in 1..=max_attempts {
        let x = rng.gen_range(0..field.width);
        let y = rng.gen_range(0..field.height);
        if !field.is_claimed(x, y) {
            return (Some((x, y)), attempt);
        }
    }

    (None, max_attempts)
}

/// Claim a cell for a feature and apply the valley/lake tags.
fn mark_cell(field: &mut HeightField, x: usize, y: usize, id: FeatureId, kind: FeatureKind, lake: bool) {
    field.claim(x, y, id);
    if kind == FeatureKind::Valley {
        field.valley_seed.set(x, y, true);
        if lake {
            field.lake_seed.set(x, y, true);
        }
    }
}

/// Above this many trials the binomial draw uses the normal approximation.
const EXACT_TRIALS: u64 = 64;

/// Number of successes in `trials` independent rolls at `chance`.
fn successes(trials: u64, chance: f64, rng: &mut ChaCha8Rng) -> u64 {
    if trials <= EXACT_TRIALS {
        return (0..trials).filter(|_| rng.gen_bool(chance)).count() as u64;
    }

    let n = trials as f64;
    let mean = n * chance;
    let sd = (n * chance * (1.0 - chance)).sqrt();
    // Box-Muller; 1 - u keeps the log argument in (0, 1]
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
    (mean + sd * z).round().clamp(0.0, n) as u64
}

#[allow(clippy::too_many_arguments)]
fn grow_feature(
    field: &mut HeightField,
    id: FeatureId,
    kind: FeatureKind,
    center: (usize, usize),
    peak: i32,
    target_core: usize,
    lake: bool,
    params: &FeatureParams,
    rng: &mut ChaCha8Rng,
) -> PlacedFeature {
    let sign = kind.sign();
    let spread_chance = params.spread_chance.clamp(0.0, 1.0);
    let falloff_chance = params.falloff_chance.clamp(0.0, 1.0);

    // Core: flat top at the peak height.
    // BTreeSet keeps falloff seeding in a fixed order so a seed reproduces
    // the same world.
    let mut core: BTreeSet<(i32, i32)> = BTreeSet::new();
    let mut core_order = Vec::with_capacity(target_core);
    let mut queue: VecDeque<(i32, i32)> = VecDeque::new();
    queue.push_back((center.0 as i32, center.1 as i32));

    while core.len() < target_core {
        let Some((x, y)) = queue.pop_front() else {
            break;
        };

        if !field.in_bounds(x, y) || core.contains(&(x, y)) {
            continue;
        }

        let (ux, uy) = (x as usize, y as usize);
        let owner = field.owner(ux, uy);
        if !owner.is_none() && owner != id {
            continue;
        }

        core.insert((x, y));
        core_order.push((ux, uy));
        field.elevation.set(ux, uy, peak);
        mark_cell(field, ux, uy, id, kind, lake);

        for (dx, dy) in NEIGHBORS_4 {
            if rng.gen_bool(spread_chance) {
                queue.push_back((x + dx, y + dy));
            }
        }
    }

    // Falloff: every in-bounds cell bordering the core starts one step down.
    // Arrivals are tallied per cell and level instead of queued one by one.
    // Each arrival still rolls for every neighbor on its own, so a cell reached
    // k times spreads to a neighbor with probability 1 - (1 - chance)^k.
    let mut level: BTreeMap<(i32, i32), u64> = BTreeMap::new();
    for &(x, y) in &core {
        for (dx, dy) in NEIGHBORS_4 {
            let (nx, ny) = (x + dx, y + dy);
            if field.in_bounds(nx, ny) && !core.contains(&(nx, ny)) {
                *level.entry((nx, ny)).or_insert(0) += 1;
            }
        }
    }

    let mut touched: BTreeSet<(i32, i32)> = BTreeSet::new();
    let mut h = peak - sign;

    while h * sign > 0 && !level.is_empty() {
        let mut next: BTreeMap<(i32, i32), u64> = BTreeMap::new();

        for (&(x, y), &arrivals) in &level {
            let (ux, uy) = (x as usize, y as usize);

            // Opposite kinds never carve into each other
            if let Some(owner_kind) = field.owner_kind(ux, uy) {
                if owner_kind != kind {
                    continue;
                }
            }

            let current = *field.elevation.get(ux, uy);
            let merged = match kind {
                FeatureKind::Mountain => current.max(h),
                FeatureKind::Valley => current.min(h),
            };
            field.elevation.set(ux, uy, merged);
            mark_cell(field, ux, uy, id, kind, lake);
            touched.insert((x, y));

            for (dx, dy) in NEIGHBORS_4 {
                let spread = successes(arrivals, falloff_chance, rng);
                let (nx, ny) = (x + dx, y + dy);
                if spread > 0 && field.in_bounds(nx, ny) {
                    let count = next.entry((nx, ny)).or_insert(0);
                    *count = count.saturating_add(spread);
                }
            }
        }

        level = next;
        h -= sign;
    }

    let falloff_cells = touched.iter().filter(|cell| !core.contains(*cell)).count();

    PlacedFeature {
        id,
        center,
        peak,
        core: core_order,
        falloff_cells,
        lake,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::Tilemap;
    use rand::SeedableRng;

    fn single(count: usize, height: i32) -> FeatureParams {
        FeatureParams {
            count,
            min_height: height,
            max_height: height,
            ..FeatureParams::mountains()
        }
    }

    #[test]
    fn test_single_plateau_on_flat_grid() {
        let mut field = HeightField::new(50, 50);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let report = grow_features(&mut field, FeatureKind::Mountain, &single(1, 6), &mut rng);
        assert!(report.is_complete());
        assert_eq!(report.placed.len(), 1);

        let plateau = &report.placed[0];
        assert!(!plateau.core.is_empty());
        assert!(plateau.core.len() < 35);
        assert!(field.elevation.iter().any(|(_, _, &h)| h == 6));

        for &(x, y) in &plateau.core {
            assert_eq!(*field.elevation.get(x, y), 6);
        }

        // Cells bordering the core sit exactly one step down
        for &(x, y) in &plateau.core {
            for (nx, ny) in field.elevation.neighbors(x, y) {
                if !plateau.core.contains(&(nx, ny)) {
                    assert_eq!(*field.elevation.get(nx, ny), 5, "edge cell ({}, {})", nx, ny);
                }
            }
        }

        // Nothing below zero and nothing above the peak
        assert!(field.elevation.iter().all(|(_, _, &h)| (0..=6).contains(&h)));
    }

    #[test]
    fn test_claimed_region_is_contiguous() {
        let mut field = HeightField::new(50, 50);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let report = grow_features(&mut field, FeatureKind::Mountain, &single(1, 6), &mut rng);
        let (cx, cy) = report.placed[0].center;

        let mut seen = Tilemap::new_with(50, 50, false);
        let mut queue = VecDeque::from([(cx, cy)]);
        seen.set(cx, cy, true);
        while let Some((x, y)) = queue.pop_front() {
            for (nx, ny) in field.claimed.neighbors(x, y) {
                if *field.claimed.get(nx, ny) && !*seen.get(nx, ny) {
                    seen.set(nx, ny, true);
                    queue.push_back((nx, ny));
                }
            }
        }

        let claimed = field.claimed.count_where(|&c| c);
        let reached = seen.count_where(|&c| c);
        assert_eq!(claimed, reached);
        // Every raised cell is claimed
        assert!(field.elevation.iter().all(|(x, y, &h)| h == 0 || field.is_claimed(x, y)));
    }

    #[test]
    fn test_claimed_mask_partitions_features() {
        let mut field = HeightField::new(60, 60);
        let mut rng = ChaCha8Rng::seed_from_u64(1234);

        let mountains = grow_features(&mut field, FeatureKind::Mountain, &FeatureParams::mountains(), &mut rng);
        let valleys = grow_features(&mut field, FeatureKind::Valley, &FeatureParams::valleys(), &mut rng);

        // Each claimed cell has exactly one owning feature
        for (x, y, &claimed) in field.claimed.iter() {
            assert_eq!(claimed, !field.owner(x, y).is_none());
        }

        // Cores never overlap: every core cell is owned by its own feature
        for feature in mountains.placed.iter().chain(valleys.placed.iter()) {
            for &(x, y) in &feature.core {
                assert_eq!(field.owner(x, y), feature.id);
            }
        }

        let total: usize = field.cells_per_feature().iter().sum();
        assert_eq!(total, field.claimed.count_where(|&c| c));
    }

    #[test]
    fn test_falloff_never_lowers_existing_elevation() {
        let mut field = HeightField::new(40, 40);
        let mut rng = ChaCha8Rng::seed_from_u64(99);

        grow_features(&mut field, FeatureKind::Mountain, &single(3, 8), &mut rng);
        let before = field.elevation.clone();

        let second = grow_features(&mut field, FeatureKind::Mountain, &single(3, 4), &mut rng);
        let new_cores: Vec<(usize, usize)> = second.placed.iter().flat_map(|f| f.core.iter().copied()).collect();

        for (x, y, &h) in field.elevation.iter() {
            if !new_cores.contains(&(x, y)) {
                assert!(h >= *before.get(x, y), "({}, {}) dropped from {} to {}", x, y, before.get(x, y), h);
            }
        }
    }

    #[test]
    fn test_valley_falloff_never_raises_existing_depth() {
        let mut field = HeightField::new(40, 40);
        let mut rng = ChaCha8Rng::seed_from_u64(99);

        grow_features(&mut field, FeatureKind::Valley, &single(3, 8), &mut rng);
        let before = field.elevation.clone();
        assert!(before.iter().any(|(_, _, &h)| h == -8));

        let second = grow_features(&mut field, FeatureKind::Valley, &single(3, 4), &mut rng);
        let new_cores: Vec<(usize, usize)> = second.placed.iter().flat_map(|f| f.core.iter().copied()).collect();

        for (x, y, &h) in field.elevation.iter() {
            if !new_cores.contains(&(x, y)) {
                assert!(h <= *before.get(x, y), "({}, {}) rose from {} to {}", x, y, before.get(x, y), h);
            }
        }
    }

    /// One entry per arrival, every entry rolling for its own neighbors.
    fn queued_halo(core: &[(usize, usize)], peak: i32, size: usize, rng: &mut ChaCha8Rng) -> usize {
        let bounds: Tilemap<bool> = Tilemap::new(size, size);
        let in_core = |x: i32, y: i32| core.contains(&(x as usize, y as usize));
        let mut queue = VecDeque::new();
        for &(x, y) in core {
            for (dx, dy) in NEIGHBORS_4 {
                let (nx, ny) = (x as i32 + dx, y as i32 + dy);
                if bounds.contains(nx, ny) && !in_core(nx, ny) {
                    queue.push_back((nx, ny, peak - 1));
                }
            }
        }

        let mut touched = BTreeSet::new();
        while let Some((x, y, h)) = queue.pop_front() {
            if !bounds.contains(x, y) || h <= 0 {
                continue;
            }
            if !in_core(x, y) {
                touched.insert((x, y));
            }
            for (dx, dy) in NEIGHBORS_4 {
                if rng.gen_bool(0.8) {
                    queue.push_back((x + dx, y + dy, h - 1));
                }
            }
        }
        touched.len()
    }

    #[test]
    fn test_tallied_falloff_matches_queued_halo_size() {
        let runs = 600;
        let (mut tallied, mut queued) = (0usize, 0usize);

        for seed in 0..runs {
            let mut field = HeightField::new(60, 60);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let report = grow_features(&mut field, FeatureKind::Mountain, &single(1, 6), &mut rng);
            let plateau = &report.placed[0];
            tallied += plateau.falloff_cells;

            let mut reference_rng = ChaCha8Rng::seed_from_u64(seed + 1_000_000);
            queued += queued_halo(&plateau.core, 6, 60, &mut reference_rng);
        }

        let tallied = tallied as f64 / runs as f64;
        let queued = queued as f64 / runs as f64;
        assert!(
            ((tallied - queued) / queued).abs() < 0.025,
            "mean halo cells: tallied {:.1}, queued {:.1}",
            tallied,
            queued
        );
    }

    #[test]
    fn test_successes_bounds_and_mean() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        assert_eq!(successes(10, 1.0, &mut rng), 10);
        assert_eq!(successes(10, 0.0, &mut rng), 0);
        assert_eq!(successes(1000, 1.0, &mut rng), 1000);
        assert_eq!(successes(0, 0.8, &mut rng), 0);

        let draws = 2000;
        let total: u64 = (0..draws).map(|_| successes(1000, 0.8, &mut rng)).sum();
        let mean = total as f64 / draws as f64;
        assert!((mean - 800.0).abs() < 2.0, "mean {}", mean);
        assert!((0..200).all(|_| successes(1000, 0.8, &mut rng) <= 1000));
    }

    #[test]
    fn test_valley_mirrors_mountain() {
        let mut field = HeightField::new(50, 50);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let params = FeatureParams {
            lake_chance: 0.0,
            ..single(1, 4)
        };

        let report = grow_features(&mut field, FeatureKind::Valley, &params, &mut rng);
        assert_eq!(report.placed[0].peak, -4);
        assert_eq!(report.lake_count(), 0);

        assert!(field.elevation.iter().all(|(_, _, &h)| (-4..=0).contains(&h)));
        assert!(field.elevation.iter().any(|(_, _, &h)| h == -4));
        for (x, y, &h) in field.elevation.iter() {
            if h < 0 {
                assert!(*field.valley_seed.get(x, y));
            }
        }
        assert_eq!(field.lake_seed.count_where(|&l| l), 0);
    }

    #[test]
    fn test_lake_cells_are_valley_cells() {
        let mut field = HeightField::new(60, 60);
        let mut rng = ChaCha8Rng::seed_from_u64(77);
        let params = FeatureParams {
            lake_chance: 1.0,
            ..FeatureParams::valleys()
        };

        let report = grow_features(&mut field, FeatureKind::Valley, &params, &mut rng);
        assert_eq!(report.lake_count(), report.placed.len());
        assert!(field.lake_seed.count_where(|&l| l) > 0);

        for (x, y, &lake) in field.lake_seed.iter() {
            if lake {
                assert!(*field.valley_seed.get(x, y));
            }
        }
    }

    #[test]
    fn test_valleys_leave_mountain_cells_alone() {
        let mut field = HeightField::new(40, 40);
        let mut rng = ChaCha8Rng::seed_from_u64(2024);

        grow_features(&mut field, FeatureKind::Mountain, &FeatureParams::mountains(), &mut rng);
        let mountain_cells: Vec<(usize, usize, i32)> = field
            .elevation
            .iter()
            .filter(|&(x, y, _)| field.owner_kind(x, y) == Some(FeatureKind::Mountain))
            .map(|(x, y, &h)| (x, y, h))
            .collect();

        grow_features(&mut field, FeatureKind::Valley, &FeatureParams::valleys(), &mut rng);

        for (x, y, h) in mountain_cells {
            assert_eq!(*field.elevation.get(x, y), h);
            assert!(!*field.valley_seed.get(x, y));
        }
    }

    #[test]
    fn test_saturated_grid_skips_instead_of_looping() {
        let mut field = HeightField::new(8, 8);
        let blocker = field.begin_feature(FeatureKind::Mountain).unwrap();
        for y in 0..8 {
            for x in 0..8 {
                field.claim(x, y, blocker);
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let params = FeatureParams {
            max_center_attempts: 25,
            ..single(3, 6)
        };
        let report = grow_features(&mut field, FeatureKind::Mountain, &params, &mut rng);

        assert!(!report.is_complete());
        assert!(report.placed.is_empty());
        assert_eq!(report.skipped, 3);
        assert_eq!(report.center_attempts, 75);
        assert!(field.elevation.iter().all(|(_, _, &h)| h == 0));
    }

    #[test]
    fn test_exhausted_feature_ids_skip_features() {
        let mut field = HeightField::new(20, 20);
        while field.begin_feature(FeatureKind::Valley).is_some() {}

        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let report = grow_features(&mut field, FeatureKind::Mountain, &single(2, 6), &mut rng);

        assert_eq!(report.skipped, 2);
        assert!(report.placed.is_empty());
        assert_eq!(field.claimed.count_where(|&c| c), 0);
    }

    #[test]
    fn test_same_seed_same_terrain() {
        let run = |seed: u64| {
            let mut field = HeightField::new(30, 30);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            grow_features(&mut field, FeatureKind::Mountain, &FeatureParams::mountains(), &mut rng);
            grow_features(&mut field, FeatureKind::Valley, &FeatureParams::valleys(), &mut rng);
            field.elevation
        };

        assert_eq!(run(555), run(555));
    }
}
