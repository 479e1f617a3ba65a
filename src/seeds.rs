//! Seed management for world generation
//!
//! Each generation stage gets its own seed derived from a master seed, so
//! changing the number of mountains does not reshuffle the valleys.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Seeds for all world generation stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldSeeds {
    /// Master seed (used for display/reference)
    pub master: u64,
    /// Per-cell elevation jitter
    pub noise: u64,
    /// Mountain plateau placement and shape
    pub mountains: u64,
    /// Valley basin placement, shape and lake rolls
    pub valleys: u64,
}

impl WorldSeeds {
    /// Create seeds from a master seed, deriving all sub-seeds deterministically.
    pub fn from_master(master: u64) -> Self {
        Self {
            master,
            noise: derive_seed(master, "noise"),
            mountains: derive_seed(master, "mountains"),
            valleys: derive_seed(master, "valleys"),
        }
    }

    /// Seeds derived from the wall clock, used when regenerating on demand.
    pub fn from_clock() -> Self {
        Self::from_master(clock_seed())
    }
}

impl Default for WorldSeeds {
    fn default() -> Self {
        Self::from_master(rand::random())
    }
}

/// A seed taken from the current time in nanoseconds.
pub fn clock_seed() -> u64 {
    let now = chrono::Utc::now();
    now.timestamp_nanos_opt()
        .map(|n| n as u64)
        .unwrap_or_else(|| now.timestamp_millis() as u64)
}

/// Derive a sub-seed from a master seed and a stage name.
fn derive_seed(master: u64, stage: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    master.hash(&mut hasher);
    stage.hash(&mut hasher);
    hasher.finish()
}

impl std::fmt::Display for WorldSeeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "WorldSeeds {{ master: {}, noise: {}, mountains: {}, valleys: {} }}",
            self.master, self.noise, self.mountains, self.valleys,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_derivation() {
        let seeds1 = WorldSeeds::from_master(12345);
        let seeds2 = WorldSeeds::from_master(12345);
        assert_eq!(seeds1, seeds2);
    }

    #[test]
    fn test_different_stages_get_different_seeds() {
        let seeds = WorldSeeds::from_master(12345);
        assert_ne!(seeds.noise, seeds.mountains);
        assert_ne!(seeds.mountains, seeds.valleys);
        assert_ne!(seeds.noise, seeds.valleys);
    }
}
