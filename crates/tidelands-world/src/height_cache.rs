//! Memoized tile height lookups.

use hashbrown::HashMap;
use tidelands_core::{TerrainLevel, TilePos};

use crate::terrain::TerrainGenerator;

/// Memoizes computed tile heights keyed by packed coordinate.
///
/// Purely a performance layer: results are identical whether or not a
/// coordinate was cached before. The map is unbounded for the lifetime of
/// a session; the bounded active-chunk radius keeps the live working set
/// small, and chunk dormancy is the eviction mechanism that matters.
#[derive(Default)]
pub struct TileHeightCache {
    heights: HashMap<u64, TerrainLevel>,
}

impl TileHeightCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a tile height, computing and storing it on first access.
    pub fn get_or_compute(&mut self, tile: TilePos, generator: &TerrainGenerator) -> TerrainLevel {
        *self
            .heights
            .entry(tile.packed())
            .or_insert_with(|| generator.height_at(tile))
    }

    /// Number of memoized tiles.
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    /// Whether nothing has been memoized yet.
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }
}
