//! Chunked world generation, activation management, and persistence glue.

pub mod chunk;
pub mod height_cache;
pub mod scheduler;
pub mod terrain;
pub mod world;

pub use chunk::Chunk;
pub use height_cache::TileHeightCache;
pub use scheduler::Scheduler;
pub use terrain::{NoiseField, TerrainGenerator};
pub use world::{ChunkState, World, WorldConfig, WorldEvent};

/// World seed for procedural generation.
pub type WorldSeed = u64;
