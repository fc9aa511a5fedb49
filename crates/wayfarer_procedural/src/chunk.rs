//! # Chunk System
//!
//! World tiles are organized into fixed-size chunks for:
//! - Bounded residency (only chunks near the observer are materialized)
//! - Cheap streaming (build/destroy whole chunks on demand)
//!
//! ## Indexing
//!
//! A chunk is identified by its origin tile, the floor-aligned corner.
//! Floor division (`div_euclid`) is mandatory: truncating division maps
//! tiles `-15..=15` into one chunk and breaks every negative boundary.

use crate::classifier::{TileClassifier, TileType};
use crate::context::TileCoord;
use crate::recipe::Rgb;

/// Chunk coordinate (identifies a chunk in the chunk grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not tiles).
    pub x: i32,
    /// Y coordinate (in chunks, not tiles).
    pub y: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the coordinate shifted by `(dx, dy)` chunks.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Chebyshev distance to another chunk.
    #[inline]
    #[must_use]
    pub fn chebyshev(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

/// A chunk, identified solely by its origin tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkRef {
    origin: TileCoord,
}

impl ChunkRef {
    /// Origin (minimum corner) tile of the chunk.
    #[inline]
    #[must_use]
    pub const fn origin(self) -> TileCoord {
        self.origin
    }
}

/// Chunk dimensions in tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkSize {
    /// Tiles per chunk along x.
    pub width: u32,
    /// Tiles per chunk along y.
    pub height: u32,
}

impl ChunkSize {
    /// Creates a chunk size. Zero dimensions are rejected by `WorldContext`.
    #[inline]
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Tiles in one chunk.
    #[inline]
    #[must_use]
    pub const fn tiles_per_chunk(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Chunk index containing a tile (rounds toward negative infinity).
    #[inline]
    #[must_use]
    pub const fn chunk_coord(self, tile: TileCoord) -> ChunkCoord {
        ChunkCoord {
            x: tile.x.div_euclid(self.width as i32),
            y: tile.y.div_euclid(self.height as i32),
        }
    }

    /// Chunk ref for a chunk index.
    #[inline]
    #[must_use]
    pub const fn chunk_ref(self, coord: ChunkCoord) -> ChunkRef {
        ChunkRef {
            origin: TileCoord {
                x: coord.x * self.width as i32,
                y: coord.y * self.height as i32,
            },
        }
    }

    /// Chunk ref containing a tile.
    #[inline]
    #[must_use]
    pub const fn chunk_ref_for_tile(self, tile: TileCoord) -> ChunkRef {
        self.chunk_ref(self.chunk_coord(tile))
    }

    /// Chunk index of a chunk ref.
    #[inline]
    #[must_use]
    pub const fn coord_of(self, chunk: ChunkRef) -> ChunkCoord {
        self.chunk_coord(chunk.origin)
    }

    /// Every tile of a chunk, row-major from the origin.
    pub fn tiles(self, chunk: ChunkRef) -> impl Iterator<Item = TileCoord> {
        let origin = chunk.origin;
        (0..self.height as i32)
            .flat_map(move |dy| (0..self.width as i32).map(move |dx| origin.offset(dx, dy)))
    }

    /// Chunk refs within Chebyshev `radius` of `center`, row-major.
    pub fn window(self, center: ChunkCoord, radius: u32) -> impl Iterator<Item = ChunkRef> {
        let r = radius as i32;
        (-r..=r).flat_map(move |dy| (-r..=r).map(move |dx| self.chunk_ref(center.offset(dx, dy))))
    }
}

/// One classified tile of a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileRecord {
    /// Absolute tile coordinate.
    pub tile: TileCoord,
    /// Terrain type.
    pub tile_type: TileType,
    /// Display color.
    pub color: Rgb,
}

/// The classified tile grid of one chunk, row-major from the origin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkTiles {
    chunk: ChunkRef,
    size: ChunkSize,
    tiles: Vec<TileRecord>,
}

impl ChunkTiles {
    /// Classifies every tile of a chunk.
    #[must_use]
    pub fn classify(classifier: &TileClassifier, chunk: ChunkRef) -> Self {
        let size = classifier.context().chunk_size();
        let tiles = size
            .tiles(chunk)
            .map(|tile| {
                let tile_type = classifier.classify(tile);
                TileRecord {
                    tile,
                    tile_type,
                    color: classifier.color_for(tile_type),
                }
            })
            .collect();

        Self { chunk, size, tiles }
    }

    /// The chunk these tiles belong to.
    #[inline]
    #[must_use]
    pub fn chunk(&self) -> ChunkRef {
        self.chunk
    }

    /// All tiles, row-major.
    #[inline]
    #[must_use]
    pub fn tiles(&self) -> &[TileRecord] {
        &self.tiles
    }

    /// Tile at a chunk-local position.
    #[must_use]
    pub fn get(&self, local_x: u32, local_y: u32) -> Option<&TileRecord> {
        if local_x < self.size.width && local_y < self.size.height {
            self.tiles
                .get(local_y as usize * self.size.width as usize + local_x as usize)
        } else {
            None
        }
    }

    /// Number of tiles of a given type.
    #[must_use]
    pub fn count(&self, tile_type: TileType) -> usize {
        self.tiles.iter().filter(|t| t.tile_type == tile_type).count()
    }
}
