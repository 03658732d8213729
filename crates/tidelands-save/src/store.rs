//! Durable save store.
//!
//! File layout: 4-byte magic, little-endian u32 format version, bincode
//! payload. Saves go through a temp file and an atomic rename so an I/O
//! failure mid-write can never leave a truncated save behind.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tidelands_core::{Error, Result};
use tracing::debug;

use crate::proxy::WorldProxy;

const MAGIC: &[u8; 4] = b"TDW1";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 8;

/// Reads and writes world snapshots at a fixed path.
pub struct SaveStore {
    path: PathBuf,
}

impl SaveStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a world snapshot to disk.
    ///
    /// Failures are surfaced to the caller; a silent save failure risks
    /// data loss the player was never warned about.
    pub fn save(&self, world: &WorldProxy) -> Result<()> {
        let payload =
            bincode::serialize(world).map_err(|e| Error::Serialization(e.to_string()))?;

        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&payload);

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), chunks = world.chunks.len(), "world saved");
        Ok(())
    }

    /// Load a world snapshot.
    ///
    /// A missing file is not an error: it means a fresh world, so `Ok(None)`
    /// is returned. A corrupted header or undecodable payload is an explicit
    /// failure.
    pub fn load(&self) -> Result<Option<WorldProxy>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if bytes.len() < HEADER_LEN || &bytes[..4] != MAGIC {
            return Err(Error::InvalidData(format!(
                "{} is not a world save",
                self.path.display()
            )));
        }

        let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if version != FORMAT_VERSION {
            return Err(Error::InvalidData(format!(
                "unsupported save format version {version}"
            )));
        }

        let world: WorldProxy = bincode::deserialize(&bytes[HEADER_LEN..])
            .map_err(|e| Error::Serialization(e.to_string()))?;

        debug!(path = %self.path.display(), chunks = world.chunks.len(), "world loaded");
        Ok(Some(world))
    }
}
