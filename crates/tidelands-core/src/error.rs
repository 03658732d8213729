//! Error types for the engine.

use thiserror::Error;

/// Engine-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid data error
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Collider built with zero or negative extents
    #[error("Degenerate collider dimensions: {width}x{height}")]
    DegenerateCollider { width: f32, height: f32 },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
