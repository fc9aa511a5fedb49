//! # World Context
//!
//! Immutable session configuration: the recipe, tile size, chunk
//! dimensions and the noise sampler built from the recipe. Also owns the
//! coordinate conventions shared by every subsystem:
//!
//! ```text
//! world point ──floor(p / tile_size)──> tile ──div_euclid──> chunk
//! tile (tx, ty) covers [tx * s, (tx + 1) * s) x [ty * s, (ty + 1) * s)
//! tile center = ((tx + 0.5) * s, (ty + 0.5) * s)
//! ```
//!
//! Screen convention is y-down, so the minimum corner is "top-left".

use tracing::info;

use crate::chunk::{ChunkRef, ChunkSize};
use crate::error::{WorldError, WorldResult};
use crate::noise::NoiseFields;
use crate::recipe::{BiomeRecipe, StreamingConfig};

/// Integer tile address. Unbounded in both directions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl TileCoord {
    /// Creates a tile coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the coordinate shifted by `(dx, dy)`.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Chebyshev distance to another tile.
    #[inline]
    #[must_use]
    pub fn chebyshev(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

/// Continuous world-space position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WorldPoint {
    /// X in world units.
    pub x: f64,
    /// Y in world units.
    pub y: f64,
}

impl WorldPoint {
    /// World origin.
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    /// Creates a world point.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[inline]
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned world-space rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileRect {
    /// Minimum (top-left) corner.
    pub min: WorldPoint,
    /// Width and height in world units.
    pub size: f64,
}

impl TileRect {
    /// Maximum (bottom-right) corner.
    #[inline]
    #[must_use]
    pub fn max(&self) -> WorldPoint {
        WorldPoint::new(self.min.x + self.size, self.min.y + self.size)
    }

    /// Half-open containment test.
    #[inline]
    #[must_use]
    pub fn contains(&self, point: WorldPoint) -> bool {
        let max = self.max();
        point.x >= self.min.x && point.x < max.x && point.y >= self.min.y && point.y < max.y
    }
}

/// Recipe, geometry and noise for one session.
///
/// Built once; shared read-only (typically behind an `Arc`).
pub struct WorldContext {
    recipe: BiomeRecipe,
    tile_size: f64,
    chunk_size: ChunkSize,
    fields: NoiseFields,
}

impl WorldContext {
    /// Builds the context and its noise sampler.
    ///
    /// # Errors
    ///
    /// Fails fast on a non-positive or non-finite tile size, a zero chunk
    /// dimension, or a recipe that does not validate.
    pub fn new(recipe: BiomeRecipe, tile_size: f64, chunk_size: ChunkSize) -> WorldResult<Self> {
        if !tile_size.is_finite() || tile_size <= 0.0 {
            return Err(WorldError::InvalidTileSize(tile_size));
        }
        if chunk_size.width == 0 || chunk_size.height == 0 {
            return Err(WorldError::InvalidChunkSize {
                width: chunk_size.width,
                height: chunk_size.height,
            });
        }
        recipe.validate()?;

        let fields = NoiseFields::new(&recipe);
        info!(
            seed = recipe.seed,
            tile_size,
            chunk_width = chunk_size.width,
            chunk_height = chunk_size.height,
            "world context ready"
        );

        Ok(Self {
            recipe,
            tile_size,
            chunk_size,
            fields,
        })
    }

    /// Builds the context from a streaming config.
    ///
    /// # Errors
    ///
    /// As [`WorldContext::new`].
    pub fn from_config(recipe: BiomeRecipe, config: &StreamingConfig) -> WorldResult<Self> {
        config.validate()?;
        Self::new(
            recipe,
            config.tile_size,
            ChunkSize::new(config.chunk_width, config.chunk_height),
        )
    }

    /// The recipe this world was generated from.
    #[inline]
    #[must_use]
    pub fn recipe(&self) -> &BiomeRecipe {
        &self.recipe
    }

    /// World units per tile.
    #[inline]
    #[must_use]
    pub fn tile_size(&self) -> f64 {
        self.tile_size
    }

    /// Chunk dimensions in tiles.
    #[inline]
    #[must_use]
    pub fn chunk_size(&self) -> ChunkSize {
        self.chunk_size
    }

    /// The noise sampler.
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &NoiseFields {
        &self.fields
    }

    /// Tile containing a world point (floor division).
    #[inline]
    #[must_use]
    pub fn world_to_tile(&self, point: WorldPoint) -> TileCoord {
        TileCoord::new(
            (point.x / self.tile_size).floor() as i32,
            (point.y / self.tile_size).floor() as i32,
        )
    }

    /// Center of a tile in world space.
    #[inline]
    #[must_use]
    pub fn tile_to_world(&self, tile: TileCoord) -> WorldPoint {
        WorldPoint::new(
            (f64::from(tile.x) + 0.5) * self.tile_size,
            (f64::from(tile.y) + 0.5) * self.tile_size,
        )
    }

    /// World-space footprint of a tile.
    #[inline]
    #[must_use]
    pub fn tile_rect(&self, tile: TileCoord) -> TileRect {
        TileRect {
            min: WorldPoint::new(
                f64::from(tile.x) * self.tile_size,
                f64::from(tile.y) * self.tile_size,
            ),
            size: self.tile_size,
        }
    }

    /// Chunk containing a tile.
    #[inline]
    #[must_use]
    pub fn chunk_ref_for_tile(&self, tile: TileCoord) -> ChunkRef {
        self.chunk_size.chunk_ref_for_tile(tile)
    }

    /// Chunk containing a world point.
    #[inline]
    #[must_use]
    pub fn chunk_ref_at(&self, point: WorldPoint) -> ChunkRef {
        self.chunk_ref_for_tile(self.world_to_tile(point))
    }

    /// Top-left corner of a chunk: its origin tile's center minus half a tile.
    #[inline]
    #[must_use]
    pub fn chunk_world_origin(&self, chunk: ChunkRef) -> WorldPoint {
        let center = self.tile_to_world(chunk.origin());
        let half = self.tile_size * 0.5;
        WorldPoint::new(center.x - half, center.y - half)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(tile_size: f64) -> WorldContext {
        WorldContext::new(BiomeRecipe::with_seed(1), tile_size, ChunkSize::new(16, 16)).unwrap()
    }

    #[test]
    fn test_rejects_bad_geometry() {
        let recipe = BiomeRecipe::with_seed(1);
        for bad in [0.0, -4.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                WorldContext::new(recipe.clone(), bad, ChunkSize::new(16, 16)),
                Err(WorldError::InvalidTileSize(_))
            ));
        }
        assert!(matches!(
            WorldContext::new(recipe.clone(), 40.0, ChunkSize::new(0, 16)),
            Err(WorldError::InvalidChunkSize { width: 0, height: 16 })
        ));
        assert!(matches!(
            WorldContext::new(recipe, 40.0, ChunkSize::new(16, 0)),
            Err(WorldError::InvalidChunkSize { .. })
        ));
    }

    #[test]
    fn test_rejects_invalid_recipe() {
        let mut recipe = BiomeRecipe::with_seed(1);
        recipe.height.scale = 0.0;
        assert!(matches!(
            WorldContext::new(recipe, 40.0, ChunkSize::new(16, 16)),
            Err(WorldError::InvalidRecipe(_))
        ));
    }

    #[test]
    fn test_world_to_tile_floors_negatives() {
        let ctx = context(40.0);
        assert_eq!(ctx.world_to_tile(WorldPoint::new(0.0, 0.0)), TileCoord::new(0, 0));
        assert_eq!(ctx.world_to_tile(WorldPoint::new(39.9, 39.9)), TileCoord::new(0, 0));
        assert_eq!(ctx.world_to_tile(WorldPoint::new(40.0, 80.0)), TileCoord::new(1, 2));
        assert_eq!(ctx.world_to_tile(WorldPoint::new(-0.1, -40.0)), TileCoord::new(-1, -1));
        assert_eq!(ctx.world_to_tile(WorldPoint::new(-40.1, 0.0)), TileCoord::new(-2, 0));
    }

    #[test]
    fn test_tile_center_round_trips() {
        let ctx = context(40.0);
        for tile in [TileCoord::new(0, 0), TileCoord::new(-7, 3), TileCoord::new(100, -100)] {
            let center = ctx.tile_to_world(tile);
            assert_eq!(ctx.world_to_tile(center), tile);
            assert!(ctx.tile_rect(tile).contains(center));
        }
        assert_eq!(ctx.tile_to_world(TileCoord::new(-1, 0)), WorldPoint::new(-20.0, 20.0));
    }

    #[test]
    fn test_chunk_world_origin_is_top_left() {
        let ctx = context(40.0);
        let chunk = ctx.chunk_ref_for_tile(TileCoord::new(-1, 5));
        assert_eq!(chunk.origin(), TileCoord::new(-16, 0));
        assert_eq!(ctx.chunk_world_origin(chunk), WorldPoint::new(-640.0, 0.0));
        assert_eq!(ctx.chunk_ref_at(WorldPoint::new(-0.5, 639.0)), chunk);
    }

    #[test]
    fn test_context_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WorldContext>();
    }
}
