//! Core terrain and color types.

use crate::constants::TERRAIN_LEVELS;
use serde::{Deserialize, Serialize};

/// Quantized terrain height bucket.
///
/// Levels are derived from continuous noise and only change through
/// explicit tile edits, never in place.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct TerrainLevel(pub u8);

impl TerrainLevel {
    /// Water level (lowest)
    pub const WATER: Self = Self(0);
    /// Sand level
    pub const SAND: Self = Self(1);
    /// Grass level
    pub const GRASS: Self = Self(2);
    /// Rock level (highest)
    pub const ROCK: Self = Self(3);

    /// Quantize a noise value in [0, 1] into a terrain level.
    ///
    /// Uniform partition: `floor(value * levels)` clamped to the valid range,
    /// so a value of exactly 1.0 still lands in the top bucket.
    #[inline]
    pub fn from_noise(value: f64) -> Self {
        let bucket = (value * TERRAIN_LEVELS as f64).floor() as i64;
        Self(bucket.clamp(0, TERRAIN_LEVELS as i64 - 1) as u8)
    }

    /// Returns true if this level is walkable ground (not water)
    #[inline]
    pub const fn is_ground(self) -> bool {
        self.0 > 0
    }
}

/// RGBA tint applied to an object's sprite by the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Tint(pub u32);

impl Tint {
    /// Untinted white
    pub const WHITE: Self = Self(0xFFFF_FFFF);

    /// Create a tint from individual channels
    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | a as u32)
    }

    /// Red channel
    #[inline]
    pub const fn r(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Green channel
    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Blue channel
    #[inline]
    pub const fn b(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Alpha channel
    #[inline]
    pub const fn a(self) -> u8 {
        self.0 as u8
    }
}

impl Default for Tint {
    fn default() -> Self {
        Self::WHITE
    }
}
