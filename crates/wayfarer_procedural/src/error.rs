//! # World Error Types
//!
//! Errors are limited to construction and configuration loading.
//! Every query on a constructed world is total.

use thiserror::Error;

/// Errors that can occur while building a world.
#[derive(Error, Debug)]
pub enum WorldError {
    /// Tile size must be finite and strictly positive.
    #[error("invalid tile size: {0} (must be finite and > 0)")]
    InvalidTileSize(f64),

    /// Chunk dimensions must both be non-zero.
    #[error("invalid chunk size: {width}x{height} tiles (both must be > 0)")]
    InvalidChunkSize {
        /// Chunk width in tiles.
        width: u32,
        /// Chunk height in tiles.
        height: u32,
    },

    /// Recipe failed validation.
    #[error("invalid recipe: {0}")]
    InvalidRecipe(String),

    /// Recipe file is not valid TOML for a `BiomeRecipe`.
    #[error("failed to parse recipe: {0}")]
    RecipeParse(#[from] toml::de::Error),

    /// Recipe file could not be read.
    #[error("failed to read recipe: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for world construction.
pub type WorldResult<T> = Result<T, WorldError>;
