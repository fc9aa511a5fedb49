//! # Wayfarer Procedural
//!
//! Deterministic tile worlds streamed around a moving observer.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same recipe always produces the same world
//! 2. **Derived**: Tile type is recomputed from noise, never stored
//! 3. **Chunked**: The world is built and discarded in fixed-size chunks
//! 4. **Headless**: Drawing goes through the `SceneSink` trait
//!
//! ## Core Components
//!
//! - `NoiseFields`: height, moisture, river mask, domain warp, slope
//! - `TileClassifier`: terrain type and color per tile
//! - `WorldContext`: recipe, geometry and coordinate conversions
//! - `ChunkStreamer`: load/unload of chunks around the observer
//! - `BeaconStructures`: per-chunk deterministic beacon placement
//! - `CollisionSystem`: occupancy, slide resolution, spawn search
//! - `ChunkPrefetcher`: background classification ahead of the window
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use wayfarer_procedural::{
//!     BiomeRecipe, ChunkSize, ChunkStreamer, RecordingScene, TileClassifier, WorldContext,
//!     WorldPoint,
//! };
//!
//! let recipe = BiomeRecipe::from_phrase("RAIN_FOX_PEAKS");
//! let context = Arc::new(WorldContext::new(recipe, 40.0, ChunkSize::new(16, 16))?);
//! let mut streamer = ChunkStreamer::new(TileClassifier::new(context));
//! let mut scene = RecordingScene::new();
//!
//! streamer.update_visible(&mut scene, WorldPoint::new(100.0, 200.0), 1, |_, _, _| {});
//! assert_eq!(streamer.loaded_count(), 9);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod chunk;
pub mod classifier;
pub mod collision;
pub mod context;
pub mod error;
pub mod noise;
pub mod prefetch;
pub mod recipe;
pub mod scene;
pub mod streamer;
pub mod structures;

pub use chunk::{ChunkCoord, ChunkRef, ChunkSize, ChunkTiles, TileRecord};
pub use classifier::{TileClassifier, TileSample, TileType};
pub use collision::{CollisionSystem, MoveOutcome, SPAWN_SEARCH_RADIUS};
pub use context::{TileCoord, TileRect, WorldContext, WorldPoint};
pub use error::{WorldError, WorldResult};
pub use noise::{NoiseFields, WorldSeed};
pub use prefetch::ChunkPrefetcher;
pub use recipe::{
    Atmosphere, BiomeRecipe, NoiseKind, NoiseParams, Rgb, StreamingConfig, StructureDef,
    BEACON_STRUCTURE, DEFAULT_BEACON_RARITY,
};
pub use scene::{Quad, RecordedContainer, RecordingScene, SceneSink};
pub use streamer::{ChunkStreamer, StreamReport, StreamStats};
pub use structures::{BeaconMarker, BeaconStructures};
