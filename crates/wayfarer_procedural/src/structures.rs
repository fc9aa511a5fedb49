//! # Beacon Structures
//!
//! Scatters collectible beacon markers inside a chunk.
//!
//! Placement is a pure function of `(recipe seed, chunk origin)`: every
//! chunk gets its own `ChaCha8Rng` seeded from the world seed and the
//! chunk's origin tile, so a chunk rebuilt after an unload gets exactly
//! the markers it had the first time, whatever else was built in between.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::chunk::ChunkRef;
use crate::classifier::{TileClassifier, TileType};
use crate::context::{TileCoord, WorldPoint};
use crate::noise::WorldSeed;
use crate::recipe::{BEACON_STRUCTURE, DEFAULT_BEACON_RARITY};

/// Purpose tag for the structure placement sub-seed.
const STRUCTURE_PURPOSE: u64 = 0x5354_5255_4354;

/// A collectible marker anchored at a tile center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeaconMarker {
    /// Tile the marker sits on.
    pub tile: TileCoord,
    /// World-space tile center.
    pub position: WorldPoint,
    /// Caller-supplied collision category, echoed unchanged.
    pub category: u32,
}

/// Per-chunk beacon placement for one world.
#[derive(Clone, Debug)]
pub struct BeaconStructures {
    seed: WorldSeed,
    rarity: f64,
}

impl BeaconStructures {
    /// Creates the placement from the classifier's recipe.
    ///
    /// A recipe without a `beacon` structure uses [`DEFAULT_BEACON_RARITY`].
    #[must_use]
    pub fn new(classifier: &TileClassifier) -> Self {
        let recipe = classifier.context().recipe();
        Self {
            seed: recipe.world_seed().derive(STRUCTURE_PURPOSE),
            rarity: recipe
                .structure_rarity(BEACON_STRUCTURE)
                .unwrap_or(DEFAULT_BEACON_RARITY),
        }
    }

    /// Beacon rarity in use.
    #[inline]
    #[must_use]
    pub fn rarity(&self) -> f64 {
        self.rarity
    }

    /// Target marker count for a chunk of `tiles` tiles.
    #[inline]
    #[must_use]
    pub fn expected_count(&self, tiles: usize) -> usize {
        (tiles as f64 * self.rarity).round() as usize
    }

    /// Returns whether a beacon may stand on this terrain.
    #[inline]
    #[must_use]
    pub const fn is_eligible(tile_type: TileType) -> bool {
        matches!(tile_type, TileType::Grass | TileType::Forest | TileType::Sand)
    }

    /// Chunk-local RNG. Same chunk, same stream.
    fn chunk_rng(&self, chunk: ChunkRef) -> ChaCha8Rng {
        let origin = chunk.origin();
        let packed = (u64::from(origin.x as u32) << 32) | u64::from(origin.y as u32);
        ChaCha8Rng::seed_from_u64(self.seed.derive(packed).value())
    }

    /// Places markers in a chunk.
    ///
    /// Draws uniform tile offsets until the expected count is reached or
    /// `2 * tiles` attempts are spent. Fewer markers than expected is a
    /// normal outcome on water-heavy or rocky chunks.
    #[must_use]
    pub fn place_in_chunk(
        &self,
        classifier: &TileClassifier,
        chunk: ChunkRef,
        category: u32,
    ) -> Vec<BeaconMarker> {
        let context = classifier.context();
        let size = context.chunk_size();
        let tiles = size.tiles_per_chunk();
        let expected = self.expected_count(tiles);
        if expected == 0 {
            return Vec::new();
        }

        let mut rng = self.chunk_rng(chunk);
        let mut placed: Vec<BeaconMarker> = Vec::with_capacity(expected);
        let max_attempts = tiles * 2;

        for _ in 0..max_attempts {
            if placed.len() >= expected {
                break;
            }

            let dx = rng.gen_range(0..size.width) as i32;
            let dy = rng.gen_range(0..size.height) as i32;
            let tile = chunk.origin().offset(dx, dy);

            if placed.iter().any(|m| m.tile == tile) {
                continue;
            }
            if !Self::is_eligible(classifier.classify(tile)) {
                continue;
            }

            let marker = BeaconMarker {
                tile,
                position: context.tile_to_world(tile),
                category,
            };
            trace!(x = tile.x, y = tile.y, "beacon placed");
            placed.push(marker);
        }

        placed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::chunk::{ChunkCoord, ChunkSize};
    use crate::context::WorldContext;
    use crate::recipe::{BiomeRecipe, StructureDef};

    fn classifier(recipe: BiomeRecipe) -> TileClassifier {
        let ctx = WorldContext::new(recipe, 40.0, ChunkSize::new(16, 16)).unwrap();
        TileClassifier::new(Arc::new(ctx))
    }

    fn with_rarity(rarity: f64) -> BiomeRecipe {
        let mut recipe = BiomeRecipe::from_phrase("RAIN_FOX_PEAKS");
        recipe.structures = vec![StructureDef {
            name: BEACON_STRUCTURE.to_string(),
            rarity,
        }];
        recipe
    }

    #[test]
    fn test_expected_count_rounds() {
        let c = classifier(with_rarity(0.015));
        let s = BeaconStructures::new(&c);
        assert_eq!(s.expected_count(256), 4);
        assert_eq!(s.expected_count(0), 0);
    }

    #[test]
    fn test_missing_definition_uses_default() {
        let mut recipe = BiomeRecipe::with_seed(3);
        recipe.structures.clear();
        let s = BeaconStructures::new(&classifier(recipe));
        assert!((s.rarity() - DEFAULT_BEACON_RARITY).abs() < f64::EPSILON);
    }

    #[test]
    fn test_markers_bounded_and_eligible() {
        let c = classifier(with_rarity(0.2));
        let s = BeaconStructures::new(&c);
        let size = c.context().chunk_size();

        for cx in -3..3 {
            for cy in -3..3 {
                let chunk = size.chunk_ref(ChunkCoord::new(cx, cy));
                let markers = s.place_in_chunk(&c, chunk, 7);
                assert!(markers.len() <= s.expected_count(256));

                let mut tiles: Vec<_> = markers.iter().map(|m| m.tile).collect();
                tiles.sort();
                tiles.dedup();
                assert_eq!(tiles.len(), markers.len(), "duplicate marker tile");

                for m in &markers {
                    assert_eq!(m.category, 7);
                    assert_eq!(c.context().chunk_ref_for_tile(m.tile), chunk);
                    assert!(BeaconStructures::is_eligible(c.classify(m.tile)));
                    assert_eq!(m.position, c.context().tile_to_world(m.tile));
                }
            }
        }
    }

    #[test]
    fn test_placement_is_pure_per_chunk() {
        let c = classifier(with_rarity(0.1));
        let s = BeaconStructures::new(&c);
        let size = c.context().chunk_size();
        let target = size.chunk_ref(ChunkCoord::new(2, -1));

        let first = s.place_in_chunk(&c, target, 1);
        for cx in 0..4 {
            let _ = s.place_in_chunk(&c, size.chunk_ref(ChunkCoord::new(cx, 5)), 1);
        }
        let again = s.place_in_chunk(&c, target, 1);
        assert_eq!(first, again);

        let other = BeaconStructures::new(&classifier(with_rarity(0.1)));
        assert_eq!(other.place_in_chunk(&c, target, 1), first);
    }

    #[test]
    fn test_zero_rarity_places_nothing() {
        let c = classifier(with_rarity(0.0));
        let s = BeaconStructures::new(&c);
        let chunk = c.context().chunk_ref_for_tile(TileCoord::new(0, 0));
        assert!(s.place_in_chunk(&c, chunk, 1).is_empty());
    }
}
