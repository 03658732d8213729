//! Snapshot proxy family: world, chunk, object.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tidelands_core::{ChunkPos, TerrainLevel, Tint};
use tidelands_object::{AbstractObject, ObjectFlags, ObjectKind};

/// Serializable copy of one object's persistent fields.
///
/// The type tag is the kind's stable save tag, not a Rust type name, so
/// refactors cannot silently break old saves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectProxy {
    pub type_tag: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub tint: u32,
    pub hp: Option<f32>,
    pub hunger: Option<f32>,
    pub energy: Option<f32>,
    pub power_multiplier: Option<f32>,
    pub item_ref: Option<String>,
    pub alive_time: f32,
}

impl ObjectProxy {
    /// Capture an object's persistent fields.
    ///
    /// Particulates are decorative and never saved; capturing one returns
    /// `None`.
    pub fn capture(object: &AbstractObject) -> Option<Self> {
        if object.flags.contains(ObjectFlags::PARTICULATE) {
            return None;
        }
        Some(Self {
            type_tag: object.kind.save_tag().to_owned(),
            x: object.x,
            y: object.y,
            width: object.width,
            height: object.height,
            tint: object.tint.0,
            hp: object.hp,
            hunger: object.hunger,
            energy: object.energy,
            power_multiplier: object.power_multiplier,
            item_ref: object.item_ref.clone(),
            alive_time: object.alive_time,
        })
    }

    /// Rebuild a descriptor from this record.
    ///
    /// An unknown type tag yields `None`; the caller logs and skips the
    /// record instead of failing the whole load.
    pub fn restore(&self) -> Option<AbstractObject> {
        let kind = ObjectKind::from_save_tag(&self.type_tag)?;
        let mut object = AbstractObject::new(kind, self.x, self.y, self.width, self.height)
            .with_tint(Tint(self.tint));
        object.hp = self.hp;
        object.hunger = self.hunger;
        object.energy = self.energy;
        object.power_multiplier = self.power_multiplier;
        object.item_ref = self.item_ref.clone();
        object.alive_time = self.alive_time;
        Some(object)
    }
}

/// Serializable copy of one chunk: its materialized tiles and objects.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkProxy {
    pub chunk_x: i32,
    pub chunk_y: i32,
    /// Packed tile key -> terrain level. Sparse; only materialized tiles.
    pub tiles: HashMap<u64, u8>,
    pub objects: Vec<ObjectProxy>,
}

impl ChunkProxy {
    /// Create an empty proxy for the given coordinate.
    pub fn new(pos: ChunkPos) -> Self {
        Self {
            chunk_x: pos.x,
            chunk_y: pos.y,
            tiles: HashMap::new(),
            objects: Vec::new(),
        }
    }

    /// Chunk coordinate of this snapshot.
    pub const fn pos(&self) -> ChunkPos {
        ChunkPos::new(self.chunk_x, self.chunk_y)
    }

    /// Record a tile level under its packed key.
    pub fn insert_tile(&mut self, key: u64, level: TerrainLevel) {
        self.tiles.insert(key, level.0);
    }
}

/// Serializable copy of an entire world at one point in time.
///
/// Aggregates every chunk known to the manager, active and dormant alike,
/// keyed by packed chunk coordinate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldProxy {
    pub world_name: String,
    pub seed: u64,
    pub world_time: f32,
    pub wave: u64,
    pub chunks: HashMap<u64, ChunkProxy>,
}
