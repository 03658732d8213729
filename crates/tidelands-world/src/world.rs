//! World: sparse chunk manager with activation and dormancy.
//!
//! Each chunk coordinate is in one of three states: `Unloaded` (never
//! seen), `Active` (live [`Chunk`] with physics bodies), or `Dormant`
//! (only a [`ChunkProxy`] snapshot). The management pass is amortized by a
//! timer rather than running every frame, and a coordinate goes through at
//! most one state change per pass. All transitions complete before any
//! chunk ticks, so no object ever ticks against a half-materialized chunk.

use glam::Vec2;
use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use tidelands_core::{ChunkPos, Result, TerrainLevel, TilePos};
use tidelands_object::{AbstractObject, ObjectId, PhysicsWorld};
use tidelands_save::{ChunkProxy, SaveStore, WorldProxy};
use tracing::debug;

use crate::chunk::Chunk;
use crate::height_cache::TileHeightCache;
use crate::scheduler::Scheduler;
use crate::terrain::TerrainGenerator;
use crate::WorldSeed;

/// Observable state of a chunk coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChunkState {
    /// Never generated and no snapshot exists.
    Unloaded,
    /// Live chunk with physics bodies.
    Active,
    /// Only a snapshot exists.
    Dormant,
}

/// Timed events the world schedules for itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorldEvent {
    /// Advance the wave/threat counter.
    WaveAdvance,
}

/// World construction parameters.
///
/// Passed in explicitly so tests can build isolated worlds; there is no
/// process-wide shared state anywhere in the engine.
#[derive(Clone, Debug)]
pub struct WorldConfig {
    pub name: String,
    pub seed: WorldSeed,
    /// Chebyshev radius, in chunks, kept active around the focal point.
    pub active_radius: i32,
    /// Seconds between management passes.
    pub management_interval: f32,
    /// Seconds between wave advances.
    pub wave_interval: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: "world".to_owned(),
            seed: 0,
            active_radius: 2,
            management_interval: 0.5,
            wave_interval: 120.0,
        }
    }
}

/// A chunk coordinate's slot: live chunk or snapshot, never both.
enum ChunkSlot {
    Active(Chunk),
    Dormant(ChunkProxy),
}

/// The game world: sparse chunk mapping, shared physics, and world clock.
pub struct World {
    config: WorldConfig,
    generator: TerrainGenerator,
    height_cache: TileHeightCache,
    physics: PhysicsWorld,
    chunks: HashMap<ChunkPos, ChunkSlot>,
    scheduler: Scheduler<WorldEvent>,
    world_time: f32,
    wave: u64,
    management_timer: f32,
    contacts: Vec<(ObjectId, ObjectId)>,
}

impl World {
    /// Create a fresh world from the given configuration.
    pub fn new(config: WorldConfig) -> Self {
        let mut scheduler = Scheduler::new();
        scheduler.every(config.wave_interval, WorldEvent::WaveAdvance);

        Self {
            generator: TerrainGenerator::new(config.seed),
            height_cache: TileHeightCache::new(),
            physics: PhysicsWorld::new(),
            chunks: HashMap::new(),
            scheduler,
            world_time: 0.0,
            wave: 0,
            // First update always runs a management pass
            management_timer: config.management_interval,
            contacts: Vec::new(),
            config,
        }
    }

    /// Reconstruct a world from a snapshot.
    ///
    /// Every chunk comes back `Dormant`; materialization happens lazily
    /// when a coordinate is next requested, so loading a large world stays
    /// cheap.
    pub fn from_proxy(proxy: WorldProxy, mut config: WorldConfig) -> Self {
        config.name = proxy.world_name;
        config.seed = proxy.seed;

        let mut world = Self::new(config);
        world.world_time = proxy.world_time;
        world.wave = proxy.wave;
        world.chunks = proxy
            .chunks
            .into_values()
            .map(|chunk| (chunk.pos(), ChunkSlot::Dormant(chunk)))
            .collect();
        world
    }

    /// Load a world from the store, falling back to a fresh world when no
    /// save exists. A corrupted save is an explicit error, never a silent
    /// fresh start.
    pub fn load_or_create(store: &SaveStore, config: WorldConfig) -> Result<Self> {
        match store.load()? {
            Some(proxy) => Ok(Self::from_proxy(proxy, config)),
            None => {
                debug!("no save found, starting fresh world");
                Ok(Self::new(config))
            }
        }
    }

    /// Snapshot the entire world: every known chunk, active and dormant.
    ///
    /// The player's persistent entity is not part of any chunk and is
    /// persisted separately by the caller.
    pub fn snapshot(&self) -> WorldProxy {
        let chunks = self
            .chunks
            .iter()
            .map(|(pos, slot)| {
                let proxy = match slot {
                    ChunkSlot::Active(chunk) => chunk.snapshot(),
                    ChunkSlot::Dormant(proxy) => proxy.clone(),
                };
                (pos.packed(), proxy)
            })
            .collect();

        WorldProxy {
            world_name: self.config.name.clone(),
            seed: self.config.seed,
            world_time: self.world_time,
            wave: self.wave,
            chunks,
        }
    }

    /// Snapshot and write to the store.
    pub fn save_to(&self, store: &SaveStore) -> Result<()> {
        store.save(&self.snapshot())
    }

    /// Advance the world by one frame.
    ///
    /// Order within the frame: amortized management pass, physics step,
    /// chunk ticks, clock and scheduled events. Returns ids of objects
    /// removed this frame.
    pub fn update(&mut self, dt: f32, focus: TilePos) -> Vec<ObjectId> {
        self.management_timer += dt;
        if self.management_timer >= self.config.management_interval {
            self.management_timer = 0.0;
            self.management_pass(focus.chunk_pos());
        }

        self.physics.step(dt);

        let mut removed = Vec::new();
        let Self {
            chunks, physics, ..
        } = self;
        for slot in chunks.values_mut() {
            if let ChunkSlot::Active(chunk) = slot {
                removed.extend(chunk.tick(dt, physics));
            }
        }

        self.world_time += dt;
        for event in self.scheduler.tick(dt) {
            match event {
                WorldEvent::WaveAdvance => {
                    self.wave += 1;
                    debug!(wave = self.wave, "wave advanced");
                }
            }
        }

        self.contacts = self.physics.drain_contacts();
        removed
    }

    /// One management pass: activate coordinates inside the radius, then
    /// let active chunks outside it accrue a pass counter and go dormant
    /// once they have been outside for more than one pass.
    fn management_pass(&mut self, center: ChunkPos) {
        let r = self.config.active_radius;

        for dy in -r..=r {
            for dx in -r..=r {
                self.activate(ChunkPos::new(center.x + dx, center.y + dy));
            }
        }

        let mut to_evict = Vec::new();
        for (pos, slot) in &mut self.chunks {
            if let ChunkSlot::Active(chunk) = slot {
                let dx = (pos.x - center.x).abs();
                let dy = (pos.y - center.y).abs();
                if dx > r || dy > r {
                    chunk.passes_outside = chunk.passes_outside.saturating_add(1);
                    if chunk.passes_outside > 1 {
                        to_evict.push(*pos);
                    }
                }
            }
        }

        for pos in to_evict {
            if let Some(ChunkSlot::Active(chunk)) = self.chunks.remove(&pos) {
                let proxy = chunk.into_dormant(&mut self.physics);
                debug!(chunk = ?pos, objects = proxy.objects.len(), "chunk going dormant");
                self.chunks.insert(pos, ChunkSlot::Dormant(proxy));
            }
        }
    }

    /// Bring a coordinate to the `Active` state, generating fresh or
    /// rehydrating from its snapshot. A lookup for a never-seen coordinate
    /// is the generation path, not an error.
    fn activate(&mut self, pos: ChunkPos) -> &mut Chunk {
        let slot = match self.chunks.entry(pos) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                debug!(chunk = ?pos, "activating fresh chunk");
                entry.insert(ChunkSlot::Active(Chunk::new(pos)))
            }
        };

        if let ChunkSlot::Dormant(proxy) = slot {
            debug!(chunk = ?pos, objects = proxy.objects.len(), "rehydrating dormant chunk");
            let chunk = Chunk::rehydrate(proxy, &mut self.physics);
            *slot = ChunkSlot::Active(chunk);
        }

        match slot {
            ChunkSlot::Active(chunk) => {
                chunk.passes_outside = 0;
                chunk
            }
            ChunkSlot::Dormant(_) => unreachable!("slot was just activated"),
        }
    }

    /// Terrain level at a tile, activating its chunk if needed.
    pub fn get_or_generate_tile(&mut self, tile: TilePos) -> TerrainLevel {
        let pos = tile.chunk_pos();
        self.activate(pos);

        let Self {
            chunks,
            height_cache,
            generator,
            ..
        } = self;
        match chunks.get_mut(&pos) {
            Some(ChunkSlot::Active(chunk)) => {
                chunk.get_or_generate_tile(tile, height_cache, generator)
            }
            _ => unreachable!("chunk was just activated"),
        }
    }

    /// Overwrite a tile level (world edit), activating its chunk if needed.
    pub fn set_tile_height_at(&mut self, tile: TilePos, level: TerrainLevel) {
        self.activate(tile.chunk_pos()).set_tile_height(tile, level);
    }

    /// Spawn an object into the chunk containing its position.
    pub fn add_object(&mut self, descriptor: AbstractObject) -> Result<ObjectId> {
        let pos = TilePos::from(Vec2::new(descriptor.x, descriptor.y)).chunk_pos();
        self.activate(pos);

        let Self {
            chunks, physics, ..
        } = self;
        match chunks.get_mut(&pos) {
            Some(ChunkSlot::Active(chunk)) => chunk.add_object(descriptor, physics),
            _ => unreachable!("chunk was just activated"),
        }
    }

    /// Remove an object by id. Returns false if no active chunk holds it.
    pub fn remove_object(&mut self, id: ObjectId) -> bool {
        let Self {
            chunks, physics, ..
        } = self;
        for slot in chunks.values_mut() {
            if let ChunkSlot::Active(chunk) = slot {
                if chunk.remove_object(id, physics) {
                    return true;
                }
            }
        }
        false
    }

    /// Read an active object's descriptor by id.
    pub fn object(&self, id: ObjectId) -> Option<&AbstractObject> {
        self.active_chunks()
            .find_map(|chunk| chunk.object(id))
            .map(|runtime| runtime.object())
    }

    /// Cast a ray through the physics world; first non-particulate hit.
    pub fn cast_ray(&self, origin: Vec2, to: Vec2) -> Option<ObjectId> {
        self.physics.cast_ray(origin, to, None).map(|(id, _)| id)
    }

    /// Contact pairs reported by the last update.
    pub fn contacts(&self) -> &[(ObjectId, ObjectId)] {
        &self.contacts
    }

    /// Observable state of a chunk coordinate.
    pub fn chunk_state(&self, pos: ChunkPos) -> ChunkState {
        match self.chunks.get(&pos) {
            Some(ChunkSlot::Active(_)) => ChunkState::Active,
            Some(ChunkSlot::Dormant(_)) => ChunkState::Dormant,
            None => ChunkState::Unloaded,
        }
    }

    /// Access a live chunk, if the coordinate is active.
    pub fn chunk(&self, pos: ChunkPos) -> Option<&Chunk> {
        match self.chunks.get(&pos) {
            Some(ChunkSlot::Active(chunk)) => Some(chunk),
            _ => None,
        }
    }

    /// Iterate over live chunks.
    pub fn active_chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values().filter_map(|slot| match slot {
            ChunkSlot::Active(chunk) => Some(chunk),
            ChunkSlot::Dormant(_) => None,
        })
    }

    /// Number of live chunks.
    pub fn active_chunk_count(&self) -> usize {
        self.active_chunks().count()
    }

    /// Number of known coordinates, live or dormant.
    pub fn known_chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// World name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// World seed.
    pub const fn seed(&self) -> WorldSeed {
        self.config.seed
    }

    /// Accumulated world time in seconds.
    pub const fn world_time(&self) -> f32 {
        self.world_time
    }

    /// Current wave/threat counter.
    pub const fn wave(&self) -> u64 {
        self.wave
    }

    /// Shared physics context.
    ///
    /// The player's persistent entity lives outside the chunk system: the
    /// caller spawns its runtime directly against this context so it
    /// survives every chunk transition.
    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    /// Mutable shared physics context.
    pub fn physics_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.physics
    }
}
