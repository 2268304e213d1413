//! Error types for voxtrace

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid dimensions {x}x{y}x{z}: every axis must be positive")]
    InvalidDimension { x: i64, y: i64, z: i64 },

    #[error("coordinate ({x}, {y}, {z}) outside extent {extent:?}")]
    OutOfBounds { x: i64, y: i64, z: i64, extent: [u32; 3] },

    #[error("cannot read {0} before any item was inserted")]
    EmptyStructureAccess(&'static str),

    #[error("malformed buffer: {0}")]
    MalformedBuffer(String),

    #[error("scene config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Out-of-bounds error for an unsigned coordinate
    pub fn out_of_bounds(x: u32, y: u32, z: u32, extent: [u32; 3]) -> Self {
        Self::OutOfBounds {
            x: x as i64,
            y: y as i64,
            z: z as i64,
            extent,
        }
    }
}
