//! A fixed-size square region of tiles plus the objects active inside it.

use hashbrown::HashMap;
use tidelands_core::{ChunkPos, Result, TerrainLevel, TilePos};
use tidelands_object::{AbstractObject, ObjectId, ObjectRuntime, PhysicsWorld};
use tidelands_save::{ChunkProxy, ObjectProxy};
use tracing::warn;

use crate::height_cache::TileHeightCache;
use crate::terrain::TerrainGenerator;

/// One live chunk: sparse terrain heights and the active object set.
///
/// Only tiles that have been queried or edited are materialized. Objects
/// belong to the chunk whose bounds contained their position at spawn time
/// and are not reassigned when they move; a chunk going dormant freezes
/// its objects where the snapshot caught them.
pub struct Chunk {
    pos: ChunkPos,
    /// Packed tile key -> level; sparse.
    tiles: HashMap<u64, TerrainLevel>,
    objects: Vec<ObjectRuntime>,
    /// Objects queued for spawn during a tick; committed post-tick.
    spawn_queue: Vec<AbstractObject>,
    /// Objects marked for removal during a tick; committed post-tick.
    despawn_marks: Vec<ObjectId>,
    /// Management passes spent outside the active radius.
    pub(crate) passes_outside: u8,
}

impl Chunk {
    /// Create an empty chunk at the given coordinate.
    pub fn new(pos: ChunkPos) -> Self {
        Self {
            pos,
            tiles: HashMap::new(),
            objects: Vec::new(),
            spawn_queue: Vec::new(),
            despawn_marks: Vec::new(),
            passes_outside: 0,
        }
    }

    /// Chunk coordinate.
    pub const fn pos(&self) -> ChunkPos {
        self.pos
    }

    /// Return the tile's level, generating and storing it on first access.
    /// Idempotent.
    pub fn get_or_generate_tile(
        &mut self,
        tile: TilePos,
        cache: &mut TileHeightCache,
        generator: &TerrainGenerator,
    ) -> TerrainLevel {
        debug_assert!(self.pos.contains(tile), "tile outside chunk bounds");
        *self
            .tiles
            .entry(tile.packed())
            .or_insert_with(|| cache.get_or_compute(tile, generator))
    }

    /// Overwrite a tile level explicitly, bypassing generation.
    pub fn set_tile_height(&mut self, tile: TilePos, level: TerrainLevel) {
        debug_assert!(self.pos.contains(tile), "tile outside chunk bounds");
        self.tiles.insert(tile.packed(), level);
    }

    /// Level of a tile if it has been materialized.
    pub fn tile(&self, tile: TilePos) -> Option<TerrainLevel> {
        self.tiles.get(&tile.packed()).copied()
    }

    /// Number of materialized tiles.
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Bind a descriptor to a physics body and register it in the active
    /// set. Returns the new object's id.
    pub fn add_object(
        &mut self,
        descriptor: AbstractObject,
        physics: &mut PhysicsWorld,
    ) -> Result<ObjectId> {
        let runtime = ObjectRuntime::spawn(descriptor, physics)?;
        let id = runtime.id();
        self.objects.push(runtime);
        Ok(id)
    }

    /// Queue a descriptor for spawn at the post-tick commit phase.
    ///
    /// Safe to call from behavior code while the active set is being
    /// iterated.
    pub fn queue_spawn(&mut self, descriptor: AbstractObject) {
        self.spawn_queue.push(descriptor);
    }

    /// Mark an object for removal at the post-tick commit phase.
    pub fn queue_despawn(&mut self, id: ObjectId) {
        self.despawn_marks.push(id);
    }

    /// Destroy an object's physics body and drop it from the active set
    /// immediately. Returns false if the id is not in this chunk.
    pub fn remove_object(&mut self, id: ObjectId, physics: &mut PhysicsWorld) -> bool {
        match self.objects.iter().position(|rt| rt.id() == id) {
            Some(index) => {
                self.objects.swap_remove(index).despawn(physics);
                true
            }
            None => false,
        }
    }

    /// Advance every active object one frame, then commit deferred spawns
    /// and removals. Returns the ids removed this tick.
    pub fn tick(&mut self, dt: f32, physics: &mut PhysicsWorld) -> Vec<ObjectId> {
        for runtime in &mut self.objects {
            runtime.tick(dt, physics);
        }

        // Post-tick commit: removals first, then spawns
        let mut removed: Vec<ObjectId> = std::mem::take(&mut self.despawn_marks);
        removed.extend(
            self.objects
                .iter()
                .filter(|rt| rt.is_dead())
                .map(ObjectRuntime::id),
        );
        removed.sort_unstable();
        removed.dedup();
        removed.retain(|&id| self.remove_object(id, physics));

        for descriptor in std::mem::take(&mut self.spawn_queue) {
            if let Err(e) = self.add_object(descriptor, physics) {
                warn!(chunk = ?self.pos, error = %e, "dropping queued spawn");
            }
        }

        removed
    }

    /// Objects currently active in this chunk.
    pub fn objects(&self) -> &[ObjectRuntime] {
        &self.objects
    }

    /// Look up an active object by id.
    pub fn object(&self, id: ObjectId) -> Option<&ObjectRuntime> {
        self.objects.iter().find(|rt| rt.id() == id)
    }

    /// Mutable lookup of an active object by id.
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut ObjectRuntime> {
        self.objects.iter_mut().find(|rt| rt.id() == id)
    }

    /// Number of active objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Capture the serializable subset of this chunk's state.
    pub fn snapshot(&self) -> ChunkProxy {
        let mut proxy = ChunkProxy::new(self.pos);
        proxy.tiles = self
            .tiles
            .iter()
            .map(|(&key, &level)| (key, level.0))
            .collect();
        proxy.objects = self
            .objects
            .iter()
            .filter_map(|rt| ObjectProxy::capture(rt.object()))
            .collect();
        proxy
    }

    /// Snapshot and destroy: capture state, then tear down every physics
    /// body. Used when a chunk transitions to dormant.
    pub fn into_dormant(mut self, physics: &mut PhysicsWorld) -> ChunkProxy {
        let proxy = self.snapshot();
        for runtime in self.objects.drain(..) {
            runtime.despawn(physics);
        }
        proxy
    }

    /// Rebuild a live chunk from a snapshot.
    ///
    /// Malformed object records (unknown type tag, degenerate extents) are
    /// skipped with a warning; losing one decorative object beats losing
    /// the whole chunk.
    pub fn rehydrate(proxy: &ChunkProxy, physics: &mut PhysicsWorld) -> Self {
        let mut chunk = Self::new(proxy.pos());
        chunk.tiles = proxy
            .tiles
            .iter()
            .map(|(&key, &level)| (key, TerrainLevel(level)))
            .collect();

        for record in &proxy.objects {
            let Some(descriptor) = record.restore() else {
                warn!(
                    chunk = ?chunk.pos,
                    tag = %record.type_tag,
                    "skipping object record with unknown type tag"
                );
                continue;
            };
            if let Err(e) = chunk.add_object(descriptor, physics) {
                warn!(chunk = ?chunk.pos, error = %e, "skipping unrestorable object record");
            }
        }

        chunk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidelands_core::constants::TERRAIN_LEVELS;
    use tidelands_object::ObjectKind;

    fn test_parts() -> (Chunk, TileHeightCache, TerrainGenerator, PhysicsWorld) {
        (
            Chunk::new(ChunkPos::new(0, 0)),
            TileHeightCache::new(),
            TerrainGenerator::new(42),
            PhysicsWorld::new(),
        )
    }

    #[test]
    fn tile_generation_is_idempotent() {
        let (mut chunk, mut cache, generator, _) = test_parts();
        let tile = TilePos::new(5, 5);

        let first = chunk.get_or_generate_tile(tile, &mut cache, &generator);
        let second = chunk.get_or_generate_tile(tile, &mut cache, &generator);

        assert_eq!(first, second);
        assert!((first.0 as usize) < TERRAIN_LEVELS);
        assert_eq!(chunk.tile_count(), 1);
    }

    #[test]
    fn tile_edit_bypasses_generation() {
        let (mut chunk, mut cache, generator, _) = test_parts();
        let tile = TilePos::new(3, 3);

        chunk.set_tile_height(tile, TerrainLevel::ROCK);
        let level = chunk.get_or_generate_tile(tile, &mut cache, &generator);

        assert_eq!(level, TerrainLevel::ROCK);
        // Edit never touched the shared generation cache
        assert!(cache.is_empty());
    }

    #[test]
    fn add_and_remove_object() {
        let (mut chunk, _, _, mut physics) = test_parts();
        let tree = AbstractObject::new(ObjectKind::Tree, 10.0, 10.0, 1.0, 2.0).with_hp(5.0);

        let id = chunk.add_object(tree, &mut physics).unwrap();
        assert_eq!(chunk.object_count(), 1);
        assert_eq!(physics.body_count(), 1);

        assert!(chunk.remove_object(id, &mut physics));
        assert_eq!(chunk.object_count(), 0);
        assert_eq!(physics.body_count(), 0);
        assert!(!chunk.remove_object(id, &mut physics));
    }

    #[test]
    fn dead_objects_removed_post_tick() {
        let (mut chunk, _, _, mut physics) = test_parts();
        let mut tree = AbstractObject::new(ObjectKind::Tree, 1.0, 1.0, 1.0, 1.0).with_hp(5.0);
        tree.hp = Some(0.0);

        chunk.add_object(tree, &mut physics).unwrap();
        let removed = chunk.tick(1.0 / 60.0, &mut physics);

        assert_eq!(removed.len(), 1);
        assert_eq!(chunk.object_count(), 0);
        assert_eq!(physics.body_count(), 0);
    }

    #[test]
    fn queued_mutations_commit_after_tick() {
        let (mut chunk, _, _, mut physics) = test_parts();
        let rock = AbstractObject::new(ObjectKind::Rock, 2.0, 2.0, 1.0, 1.0).with_hp(5.0);
        let id = chunk.add_object(rock, &mut physics).unwrap();

        chunk.queue_despawn(id);
        chunk.queue_spawn(AbstractObject::new(ObjectKind::Shrub, 4.0, 4.0, 0.5, 0.5).with_hp(2.0));

        let removed = chunk.tick(1.0 / 60.0, &mut physics);

        assert_eq!(removed, vec![id]);
        assert_eq!(chunk.object_count(), 1);
        assert_eq!(chunk.objects()[0].object().kind, ObjectKind::Shrub);
    }

    #[test]
    fn snapshot_rehydrate_roundtrip() {
        let (mut chunk, mut cache, generator, mut physics) = test_parts();

        for x in 0..8 {
            chunk.get_or_generate_tile(TilePos::new(x, 0), &mut cache, &generator);
        }
        chunk.set_tile_height(TilePos::new(9, 9), TerrainLevel::WATER);
        chunk
            .add_object(
                AbstractObject::new(ObjectKind::Tree, 10.0, 10.0, 1.0, 2.0).with_hp(5.0),
                &mut physics,
            )
            .unwrap();

        let expected_tiles: Vec<(TilePos, TerrainLevel)> = (0..8)
            .map(|x| {
                let tile = TilePos::new(x, 0);
                (tile, chunk.tile(tile).unwrap())
            })
            .collect();

        let proxy = chunk.into_dormant(&mut physics);
        assert_eq!(physics.body_count(), 0);

        let mut revived = Chunk::rehydrate(&proxy, &mut physics);
        assert_eq!(physics.body_count(), 1);
        assert_eq!(revived.object_count(), 1);

        let obj = revived.objects()[0].object();
        assert_eq!(obj.kind, ObjectKind::Tree);
        assert_eq!((obj.x, obj.y), (10.0, 10.0));
        assert_eq!(obj.hp, Some(5.0));

        for (tile, level) in expected_tiles {
            assert_eq!(
                revived.get_or_generate_tile(tile, &mut cache, &generator),
                level
            );
        }
        assert_eq!(revived.tile(TilePos::new(9, 9)), Some(TerrainLevel::WATER));
    }

    #[test]
    fn malformed_records_are_skipped_on_rehydrate() {
        let (mut chunk, _, _, mut physics) = test_parts();
        chunk
            .add_object(
                AbstractObject::new(ObjectKind::Rock, 1.0, 1.0, 1.0, 1.0).with_hp(3.0),
                &mut physics,
            )
            .unwrap();

        let mut proxy = chunk.into_dormant(&mut physics);
        proxy.objects.push(ObjectProxy {
            type_tag: "chrono_gate".to_owned(),
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
            tint: 0xFFFF_FFFF,
            hp: None,
            hunger: None,
            energy: None,
            power_multiplier: None,
            item_ref: None,
            alive_time: 0.0,
        });

        let revived = Chunk::rehydrate(&proxy, &mut physics);
        assert_eq!(revived.object_count(), 1);
        assert_eq!(revived.objects()[0].object().kind, ObjectKind::Rock);
    }
}
