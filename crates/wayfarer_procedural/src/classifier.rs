//! # Tile Classification
//!
//! Determines terrain type from the noise fields.
//!
//! Tile type is never stored as truth. Rendering, collision, spawn search
//! and structure placement all re-derive it from the same coordinates, so
//! they always agree.
//!
//! ## Bands (evaluated in order)
//!
//! ```text
//! height >= 0.28 and river > 0.55        -> River
//! height <  0.18                         -> DeepWater
//! height <  0.28                         -> ShallowWater
//! height <  0.34                         -> Sand
//! height <  0.62  (wet and flat)         -> Forest
//! height <  0.62                         -> Grass
//! height <  0.82                         -> Rock
//! otherwise                              -> Snow
//! ```

use std::sync::Arc;

use crate::context::{TileCoord, WorldContext, WorldPoint};
use crate::recipe::Rgb;

/// Classification thresholds.
pub mod thresholds {
    /// Below this height: deep water.
    pub const DEEP_WATER: f64 = 0.18;
    /// Below this height: shallow water. Rivers only carve at or above it.
    pub const SHALLOW_WATER: f64 = 0.28;
    /// Below this height: sand.
    pub const SAND: f64 = 0.34;
    /// Below this height: grass or forest.
    pub const VEGETATION: f64 = 0.62;
    /// Below this height: rock. Above: snow.
    pub const ROCK: f64 = 0.82;
    /// River mask above this on land is river.
    pub const RIVER: f64 = 0.55;
    /// Moisture above this (with low slope) grows forest.
    pub const FOREST_MOISTURE: f64 = 0.55;
    /// Slope below this (with high moisture) grows forest.
    pub const FOREST_SLOPE: f64 = 0.12;
}

/// Terrain types in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TileType {
    /// Open water, impassable.
    DeepWater = 0,
    /// Wadeable water.
    ShallowWater = 1,
    /// River channel through land.
    River = 2,
    /// Beach / shore.
    Sand = 3,
    /// Grassland.
    Grass = 4,
    /// Wet, flat woodland.
    Forest = 5,
    /// Bare rock, impassable.
    Rock = 6,
    /// Snowy peaks.
    Snow = 7,
}

impl TileType {
    /// Every variant, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::DeepWater,
        Self::ShallowWater,
        Self::River,
        Self::Sand,
        Self::Grass,
        Self::Forest,
        Self::Rock,
        Self::Snow,
    ];

    /// Returns whether actors may not stand on this tile.
    #[inline]
    #[must_use]
    pub const fn is_blocked(self) -> bool {
        matches!(self, Self::DeepWater | Self::Rock)
    }

    /// Palette slot used for this type, or `None` for fixed colors.
    #[inline]
    #[must_use]
    pub const fn palette_slot(self) -> Option<usize> {
        match self {
            Self::DeepWater => Some(0),
            Self::ShallowWater | Self::River => Some(1),
            Self::Grass | Self::Forest => Some(2),
            Self::Sand => Some(3),
            Self::Rock | Self::Snow => None,
        }
    }
}

/// Raw field values at one tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileSample {
    /// Height field.
    pub height: f64,
    /// Moisture field.
    pub moisture: f64,
    /// Height gradient magnitude.
    pub slope: f64,
    /// River mask.
    pub river: f64,
}

impl TileSample {
    /// Applies the fixed band table.
    #[must_use]
    pub fn classify(&self) -> TileType {
        use thresholds as t;

        if self.height >= t::SHALLOW_WATER && self.river > t::RIVER {
            return TileType::River;
        }

        let h = self.height;
        if h < t::DEEP_WATER {
            TileType::DeepWater
        } else if h < t::SHALLOW_WATER {
            TileType::ShallowWater
        } else if h < t::SAND {
            TileType::Sand
        } else if h < t::VEGETATION {
            if self.moisture > t::FOREST_MOISTURE && self.slope < t::FOREST_SLOPE {
                TileType::Forest
            } else {
                TileType::Grass
            }
        } else if h < t::ROCK {
            TileType::Rock
        } else {
            TileType::Snow
        }
    }
}

/// Tile classifier bound to one world.
#[derive(Clone)]
pub struct TileClassifier {
    context: Arc<WorldContext>,
}

impl TileClassifier {
    /// Fixed color for rock.
    pub const ROCK_COLOR: Rgb = Rgb::from_hex(0x6E_6A_64);
    /// Fixed color for snow.
    pub const SNOW_COLOR: Rgb = Rgb::from_hex(0xF4_F6_F8);

    /// Creates a classifier over a shared context.
    #[must_use]
    pub fn new(context: Arc<WorldContext>) -> Self {
        Self { context }
    }

    /// The world this classifier reads.
    #[inline]
    #[must_use]
    pub fn context(&self) -> &Arc<WorldContext> {
        &self.context
    }

    /// Samples all four fields at a tile.
    ///
    /// Tile coordinates are used directly as noise-space coordinates.
    #[must_use]
    pub fn sample(&self, tile: TileCoord) -> TileSample {
        let fields = self.context.fields();
        let (x, y) = (f64::from(tile.x), f64::from(tile.y));
        TileSample {
            height: fields.sample_height(x, y),
            moisture: fields.sample_moisture(x, y),
            slope: fields.slope(x, y),
            river: fields.river_mask(x, y),
        }
    }

    /// Terrain type of a tile.
    ///
    /// Equivalent to `self.sample(tile).classify()`, but only evaluates the
    /// fields the band table actually consults.
    #[must_use]
    pub fn classify(&self, tile: TileCoord) -> TileType {
        use thresholds as t;

        let fields = self.context.fields();
        let (x, y) = (f64::from(tile.x), f64::from(tile.y));

        let height = fields.sample_height(x, y);
        if height >= t::SHALLOW_WATER && fields.river_mask(x, y) > t::RIVER {
            return TileType::River;
        }
        if !(t::SAND..t::VEGETATION).contains(&height) {
            // Moisture and slope are irrelevant outside the vegetation band.
            return TileSample {
                height,
                moisture: 0.0,
                slope: 0.0,
                river: 0.0,
            }
            .classify();
        }

        TileSample {
            height,
            moisture: fields.sample_moisture(x, y),
            slope: fields.slope(x, y),
            river: 0.0,
        }
        .classify()
    }

    /// Terrain type under a world point.
    #[inline]
    #[must_use]
    pub fn classify_point(&self, point: WorldPoint) -> TileType {
        self.classify(self.context.world_to_tile(point))
    }

    /// Returns whether a tile blocks movement.
    #[inline]
    #[must_use]
    pub fn is_blocked(&self, tile: TileCoord) -> bool {
        self.classify(tile).is_blocked()
    }

    /// Display color for a terrain type.
    ///
    /// Missing palette slots fall back to neutral gray.
    #[must_use]
    pub fn color_for(&self, tile_type: TileType) -> Rgb {
        match tile_type {
            TileType::Rock => Self::ROCK_COLOR,
            TileType::Snow => Self::SNOW_COLOR,
            other => other
                .palette_slot()
                .and_then(|slot| self.context.recipe().palette_color(slot))
                .unwrap_or(Rgb::NEUTRAL_GRAY),
        }
    }
}
