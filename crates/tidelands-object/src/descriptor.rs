//! Flat game-object descriptors.
//!
//! Entities are a single data struct plus orthogonal capability tags
//! resolved per kind, instead of an inheritance hierarchy. Behavior is a
//! tagged-variant dispatch in [`AbstractObject::step`].

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tidelands_core::Tint;

/// Seconds a projectile stays alive before expiring.
pub const PROJECTILE_LIFETIME: f32 = 8.0;
/// Seconds a particle stays alive before expiring.
pub const PARTICLE_LIFETIME: f32 = 2.0;
/// Hunger drained per second for creatures.
pub const HUNGER_DECAY: f32 = 0.02;
/// Energy drained per second for creatures.
pub const ENERGY_DECAY: f32 = 0.01;
/// Health lost per second once hunger hits zero.
pub const STARVATION_DAMAGE: f32 = 0.5;

bitflags! {
    /// Physics-facing flags of an object.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ObjectFlags: u32 {
        /// Simulated with a dynamic body instead of a fixed one.
        const DYNAMIC = 1 << 0;
        /// Collider reports overlaps but generates no contact forces.
        const SENSOR = 1 << 1;
        /// Decorative; ignored by raycasts and never persisted.
        const PARTICULATE = 1 << 2;
    }
}

bitflags! {
    /// Orthogonal capability tags composed per entity kind.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Capabilities: u32 {
        const MOVABLE = 1 << 0;
        const HARVESTABLE = 1 << 1;
        const DAMAGEABLE = 1 << 2;
        const ATTACKING = 1 << 3;
    }
}

/// Closed set of entity kinds known to the engine.
///
/// The save tag of each kind is a stable schema identifier, deliberately
/// independent of the Rust type or variant name, so renames never break
/// old saves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Tree,
    Rock,
    Shrub,
    Critter,
    ItemDrop,
    Projectile,
    Particle,
}

impl ObjectKind {
    /// Stable identifier used in save files.
    pub const fn save_tag(self) -> &'static str {
        match self {
            Self::Tree => "tree",
            Self::Rock => "rock",
            Self::Shrub => "shrub",
            Self::Critter => "critter",
            Self::ItemDrop => "item_drop",
            Self::Projectile => "projectile",
            Self::Particle => "particle",
        }
    }

    /// Resolve a save tag back to a kind. Unknown tags return `None` so a
    /// malformed record can be skipped without failing the whole load.
    pub fn from_save_tag(tag: &str) -> Option<Self> {
        match tag {
            "tree" => Some(Self::Tree),
            "rock" => Some(Self::Rock),
            "shrub" => Some(Self::Shrub),
            "critter" => Some(Self::Critter),
            "item_drop" => Some(Self::ItemDrop),
            "projectile" => Some(Self::Projectile),
            "particle" => Some(Self::Particle),
            _ => None,
        }
    }

    /// Capability tags for this kind.
    pub const fn capabilities(self) -> Capabilities {
        match self {
            Self::Tree | Self::Rock | Self::Shrub => {
                Capabilities::HARVESTABLE.union(Capabilities::DAMAGEABLE)
            }
            Self::Critter => Capabilities::MOVABLE
                .union(Capabilities::DAMAGEABLE)
                .union(Capabilities::ATTACKING),
            Self::ItemDrop => Capabilities::empty(),
            Self::Projectile => Capabilities::MOVABLE.union(Capabilities::ATTACKING),
            Self::Particle => Capabilities::MOVABLE,
        }
    }

    /// Default physics flags for this kind.
    pub const fn default_flags(self) -> ObjectFlags {
        match self {
            Self::Tree | Self::Rock | Self::Shrub => ObjectFlags::empty(),
            Self::Critter => ObjectFlags::DYNAMIC,
            Self::ItemDrop => ObjectFlags::SENSOR,
            Self::Projectile => ObjectFlags::DYNAMIC.union(ObjectFlags::SENSOR),
            Self::Particle => ObjectFlags::DYNAMIC
                .union(ObjectFlags::SENSOR)
                .union(ObjectFlags::PARTICULATE),
        }
    }

    /// Collider density for mass derivation.
    pub const fn density(self) -> f32 {
        match self {
            Self::Tree | Self::Rock => 5.0,
            Self::Shrub | Self::ItemDrop => 1.0,
            Self::Critter => 2.0,
            Self::Projectile | Self::Particle => 0.2,
        }
    }
}

/// Physics-derived state handed to the behavior step.
///
/// Position is read from the body before the step; a changed velocity is
/// written back afterwards.
#[derive(Clone, Copy, Debug, Default)]
pub struct BodyState {
    pub position: Vec2,
    pub velocity: Vec2,
}

/// The serializable, physics-agnostic description of a game entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AbstractObject {
    pub kind: ObjectKind,
    /// World position (center of the collider).
    pub x: f32,
    pub y: f32,
    /// Full collider extents.
    pub width: f32,
    pub height: f32,
    pub tint: Tint,
    pub flags: ObjectFlags,
    pub hp: Option<f32>,
    pub hunger: Option<f32>,
    pub energy: Option<f32>,
    pub power_multiplier: Option<f32>,
    pub item_ref: Option<String>,
    pub alive_time: f32,
}

impl AbstractObject {
    /// Create a descriptor with the kind's default flags and no stats.
    pub fn new(kind: ObjectKind, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            kind,
            x,
            y,
            width,
            height,
            tint: Tint::WHITE,
            flags: kind.default_flags(),
            hp: None,
            hunger: None,
            energy: None,
            power_multiplier: None,
            item_ref: None,
            alive_time: 0.0,
        }
    }

    /// Set starting health.
    #[must_use]
    pub fn with_hp(mut self, hp: f32) -> Self {
        self.hp = Some(hp);
        self
    }

    /// Set starting hunger and energy (creatures).
    #[must_use]
    pub fn with_vitals(mut self, hunger: f32, energy: f32) -> Self {
        self.hunger = Some(hunger);
        self.energy = Some(energy);
        self
    }

    /// Set the carried item reference (drops).
    #[must_use]
    pub fn with_item(mut self, item_ref: impl Into<String>) -> Self {
        self.item_ref = Some(item_ref.into());
        self
    }

    /// Set the sprite tint.
    #[must_use]
    pub const fn with_tint(mut self, tint: Tint) -> Self {
        self.tint = tint;
        self
    }

    /// Capability tags of this object's kind.
    pub const fn capabilities(&self) -> Capabilities {
        self.kind.capabilities()
    }

    /// Apply damage; no-op for kinds without the `DAMAGEABLE` capability.
    pub fn apply_damage(&mut self, amount: f32) {
        if !self.capabilities().contains(Capabilities::DAMAGEABLE) {
            return;
        }
        if let Some(hp) = self.hp.as_mut() {
            *hp -= amount;
        }
    }

    /// Whether the object should be removed from the world.
    pub fn is_dead(&self) -> bool {
        if matches!(self.hp, Some(hp) if hp <= 0.0) {
            return true;
        }
        match self.kind {
            ObjectKind::Projectile => self.alive_time >= PROJECTILE_LIFETIME,
            ObjectKind::Particle => self.alive_time >= PARTICLE_LIFETIME,
            _ => false,
        }
    }

    /// Advance per-frame entity logic.
    ///
    /// Called by the runtime with the current body state; the runtime
    /// writes any velocity change back to the physics body.
    pub fn step(&mut self, dt: f32, body: &mut BodyState) {
        self.alive_time += dt;
        self.x = body.position.x;
        self.y = body.position.y;

        match self.kind {
            ObjectKind::Critter => {
                if let Some(hunger) = self.hunger.as_mut() {
                    *hunger = (*hunger - HUNGER_DECAY * dt).max(0.0);
                    if *hunger <= 0.0 {
                        if let Some(hp) = self.hp.as_mut() {
                            *hp -= STARVATION_DAMAGE * dt;
                        }
                    }
                }
                if let Some(energy) = self.energy.as_mut() {
                    *energy = (*energy - ENERGY_DECAY * dt).max(0.0);
                }
            }
            ObjectKind::Particle => {
                // Particles coast to a stop over their short lifetime
                body.velocity *= 1.0 - (2.0 * dt).min(1.0);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_tag_roundtrip() {
        for kind in [
            ObjectKind::Tree,
            ObjectKind::Rock,
            ObjectKind::Shrub,
            ObjectKind::Critter,
            ObjectKind::ItemDrop,
            ObjectKind::Projectile,
            ObjectKind::Particle,
        ] {
            assert_eq!(ObjectKind::from_save_tag(kind.save_tag()), Some(kind));
        }
        assert_eq!(ObjectKind::from_save_tag("gilded_altar"), None);
    }

    #[test]
    fn damage_respects_capability() {
        let mut drop = AbstractObject::new(ObjectKind::ItemDrop, 0.0, 0.0, 0.5, 0.5).with_hp(3.0);
        drop.apply_damage(1.0);
        assert_eq!(drop.hp, Some(3.0));

        let mut tree = AbstractObject::new(ObjectKind::Tree, 0.0, 0.0, 1.0, 1.0).with_hp(3.0);
        tree.apply_damage(1.0);
        assert_eq!(tree.hp, Some(2.0));
        assert!(!tree.is_dead());
        tree.apply_damage(5.0);
        assert!(tree.is_dead());
    }

    #[test]
    fn projectile_expires() {
        let mut p = AbstractObject::new(ObjectKind::Projectile, 0.0, 0.0, 0.2, 0.2);
        let mut body = BodyState::default();
        p.step(PROJECTILE_LIFETIME / 2.0, &mut body);
        assert!(!p.is_dead());
        p.step(PROJECTILE_LIFETIME, &mut body);
        assert!(p.is_dead());
    }

    #[test]
    fn starvation_drains_health() {
        let mut c = AbstractObject::new(ObjectKind::Critter, 0.0, 0.0, 1.0, 1.0)
            .with_hp(5.0)
            .with_vitals(0.0, 1.0);
        let mut body = BodyState::default();
        c.step(2.0, &mut body);
        let hp = c.hp.unwrap();
        assert!(hp < 5.0, "starving critter should lose health, hp = {hp}");
    }

    #[test]
    fn step_syncs_position() {
        let mut c = AbstractObject::new(ObjectKind::Critter, 0.0, 0.0, 1.0, 1.0);
        let mut body = BodyState {
            position: Vec2::new(3.5, -2.25),
            velocity: Vec2::ZERO,
        };
        c.step(0.016, &mut body);
        assert_eq!(c.x, 3.5);
        assert_eq!(c.y, -2.25);
    }
}
