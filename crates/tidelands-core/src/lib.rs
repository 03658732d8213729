//! Core types for the Tidelands world engine.
//!
//! This crate provides the foundational types used throughout the engine:
//! - Terrain level and tint types
//! - Coordinate systems (tile, chunk)
//! - Common error types

pub mod coords;
pub mod error;
pub mod types;

pub use coords::{ChunkPos, TilePos};
pub use error::{Error, Result};
pub use types::{TerrainLevel, Tint};

/// Engine-wide constants
pub mod constants {
    /// Size of a chunk in tiles per axis
    pub const CHUNK_SIZE: usize = 64;
    /// Bits needed to represent position within a chunk (6 bits for 0-63)
    pub const CHUNK_BITS: u32 = 6;
    /// Number of discrete terrain height buckets (water/sand/grass/rock)
    pub const TERRAIN_LEVELS: usize = 4;
}
