//! Coordinate systems for the tile world.

use crate::constants::CHUNK_BITS;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Tile position in world coordinates.
///
/// Tiles are 64-bit so the world extent is effectively unbounded at any
/// reachable play distance. Coordinate-keyed maps use [`TilePos::packed`],
/// never string keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i64,
    pub y: i64,
}

impl TilePos {
    /// Create a new tile position
    #[inline]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Pack both coordinates into a single 64-bit map key.
    ///
    /// The low 32 bits of each coordinate are folded together, which keys
    /// worlds up to +/-2^31 tiles per axis uniquely.
    #[inline]
    pub const fn packed(self) -> u64 {
        ((self.x as u32 as u64) << 32) | (self.y as u32 as u64)
    }

    /// Get the chunk containing this tile
    #[inline]
    pub const fn chunk_pos(self) -> ChunkPos {
        ChunkPos::new(
            (self.x >> CHUNK_BITS) as i32,
            (self.y >> CHUNK_BITS) as i32,
        )
    }

    /// Convert to floating point world coordinates
    #[inline]
    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }
}

impl From<Vec2> for TilePos {
    fn from(v: Vec2) -> Self {
        Self::new(v.x.floor() as i64, v.y.floor() as i64)
    }
}

/// Chunk position in chunk coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub y: i32,
}

impl ChunkPos {
    /// Create a new chunk position
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Pack both coordinates into a single 64-bit map key
    #[inline]
    pub const fn packed(self) -> u64 {
        ((self.x as u32 as u64) << 32) | (self.y as u32 as u64)
    }

    /// Recover a chunk position from a packed key
    #[inline]
    pub const fn from_packed(key: u64) -> Self {
        Self::new((key >> 32) as u32 as i32, key as u32 as i32)
    }

    /// Get the min-corner tile of this chunk
    #[inline]
    pub const fn base_tile(self) -> TilePos {
        TilePos::new(
            (self.x as i64) << CHUNK_BITS,
            (self.y as i64) << CHUNK_BITS,
        )
    }

    /// Check whether a tile falls within this chunk's bounds
    #[inline]
    pub const fn contains(self, tile: TilePos) -> bool {
        let owner = tile.chunk_pos();
        owner.x == self.x && owner.y == self.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CHUNK_SIZE;

    #[test]
    fn tile_to_chunk() {
        assert_eq!(TilePos::new(0, 0).chunk_pos(), ChunkPos::new(0, 0));
        assert_eq!(
            TilePos::new(CHUNK_SIZE as i64, 0).chunk_pos(),
            ChunkPos::new(1, 0)
        );
        assert_eq!(
            TilePos::new(CHUNK_SIZE as i64 - 1, CHUNK_SIZE as i64 - 1).chunk_pos(),
            ChunkPos::new(0, 0)
        );
    }

    #[test]
    fn negative_tile_to_chunk() {
        // Arithmetic shift floors toward negative infinity
        assert_eq!(TilePos::new(-1, -1).chunk_pos(), ChunkPos::new(-1, -1));
        assert_eq!(
            TilePos::new(-(CHUNK_SIZE as i64), -1).chunk_pos(),
            ChunkPos::new(-1, -1)
        );
        assert_eq!(
            TilePos::new(-(CHUNK_SIZE as i64) - 1, 0).chunk_pos(),
            ChunkPos::new(-2, 0)
        );
    }

    #[test]
    fn packed_keys_are_unique() {
        let a = TilePos::new(1, 2).packed();
        let b = TilePos::new(2, 1).packed();
        let c = TilePos::new(-1, 2).packed();
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, TilePos::new(1, 2).packed());
    }

    #[test]
    fn chunk_packed_roundtrip() {
        for pos in [
            ChunkPos::new(0, 0),
            ChunkPos::new(5, -3),
            ChunkPos::new(-100, 7),
            ChunkPos::new(i32::MIN, i32::MAX),
        ] {
            assert_eq!(ChunkPos::from_packed(pos.packed()), pos);
        }
    }

    #[test]
    fn base_tile_and_contains() {
        let chunk = ChunkPos::new(-1, 2);
        let base = chunk.base_tile();
        assert_eq!(base, TilePos::new(-(CHUNK_SIZE as i64), 2 * CHUNK_SIZE as i64));
        assert!(chunk.contains(base));
        assert!(chunk.contains(TilePos::new(base.x + CHUNK_SIZE as i64 - 1, base.y)));
        assert!(!chunk.contains(TilePos::new(base.x + CHUNK_SIZE as i64, base.y)));
    }
}
