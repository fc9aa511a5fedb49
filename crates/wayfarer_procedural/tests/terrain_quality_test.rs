//! # Terrain Quality Tests
//!
//! Verifies that generated worlds are varied, walkable and reproducible.

use std::collections::HashMap;
use std::sync::Arc;

use approx::assert_abs_diff_eq;
use wayfarer_procedural::{
    BeaconStructures, BiomeRecipe, ChunkSize, ChunkStreamer, ChunkTiles, CollisionSystem,
    NoiseFields, RecordedContainer, RecordingScene, SceneSink, TileClassifier, TileCoord, TileType,
    WorldContext, WorldPoint, BEACON_STRUCTURE, DEFAULT_BEACON_RARITY,
};

fn classifier(phrase: &str) -> TileClassifier {
    let context = WorldContext::new(BiomeRecipe::from_phrase(phrase), 40.0, ChunkSize::new(16, 16))
        .expect("valid world");
    TileClassifier::new(Arc::new(context))
}

/// Test: Independently built fields agree at the probe points.
#[test]
fn test_fields_reproducible_across_instances() {
    for seed in [0_u64, 1, 42, 0xDEAD_BEEF, u64::MAX] {
        let a = NoiseFields::new(&BiomeRecipe::with_seed(seed));
        let b = NoiseFields::new(&BiomeRecipe::with_seed(seed));
        for (x, y) in [(0.0, 0.0), (10.0, 20.0), (-15.0, 7.0), (123.0, -88.0), (512.5, -1024.25)] {
            assert_abs_diff_eq!(a.sample_height(x, y), b.sample_height(x, y), epsilon = 1e-9);
            assert_abs_diff_eq!(a.sample_moisture(x, y), b.sample_moisture(x, y), epsilon = 1e-9);
        }
    }
}

/// Test: A world has water, land and something impassable.
#[test]
fn test_terrain_variety() {
    let c = classifier("VARIETY");
    let mut counts: HashMap<TileType, usize> = HashMap::new();
    let mut total: u32 = 0;

    for y in (-800..800).step_by(8) {
        for x in (-800..800).step_by(8) {
            *counts.entry(c.classify(TileCoord::new(x, y))).or_insert(0) += 1;
            total += 1;
        }
    }

    for (tile_type, count) in &counts {
        println!("{tile_type:?}: {:.1}%", *count as f64 / f64::from(total) * 100.0);
    }

    let passable: usize = counts
        .iter()
        .filter(|(t, _)| !t.is_blocked())
        .map(|(_, n)| n)
        .sum();
    assert!(passable > 0, "World has no walkable terrain");
    assert!(counts.len() >= 3, "Too little variety: {counts:?}");
}

/// Test: The reference scenario chunk.
#[test]
fn test_rain_fox_peaks_origin_chunk() {
    let c = classifier("RAIN_FOX_PEAKS");
    let recipe = c.context().recipe().clone();
    let chunk = c.context().chunk_ref_for_tile(TileCoord::new(0, 0));

    let mut streamer: ChunkStreamer<RecordingScene> = ChunkStreamer::new(c.clone());
    let mut scene = RecordingScene::new();
    let beacons = BeaconStructures::new(&c);

    let mut placed = 0;
    let report = streamer.build_around(
        &mut scene,
        WorldPoint::new(1.0, 1.0),
        0,
        |scene, chunk, container: &mut RecordedContainer| {
            for marker in beacons.place_in_chunk(&c, chunk, 4) {
                scene.add_marker(container, &marker);
                placed += 1;
            }
        },
    );
    assert_eq!(report.built, vec![chunk]);

    let container = streamer.container(chunk).expect("chunk built");
    assert_eq!(container.quads.len(), 256);
    assert_eq!(container.origin, WorldPoint::new(0.0, 0.0));

    for quad in &container.quads {
        let tile_type = c.classify(quad.tile);
        assert_eq!(quad.color, c.color_for(tile_type));
        if let Some(slot) = tile_type.palette_slot() {
            assert_eq!(Some(quad.color), recipe.palette_color(slot));
        }
    }

    let rarity = recipe
        .structure_rarity(BEACON_STRUCTURE)
        .unwrap_or(DEFAULT_BEACON_RARITY);
    let cap = (256.0 * rarity).round() as usize;
    println!("Placed {placed} beacons (cap {cap})");
    assert!(placed <= cap);
    assert_eq!(container.markers.len(), placed);
    assert_eq!(scene.live_markers(), placed);
}

/// Test: Chunk tiles, point queries and collision agree.
#[test]
fn test_queries_agree_with_rendering() {
    let c = classifier("AGREEMENT");
    let size = c.context().chunk_size();
    let chunk = c.context().chunk_ref_for_tile(TileCoord::new(-40, 70));
    let tiles = ChunkTiles::classify(&c, chunk);

    for record in tiles.tiles() {
        let center = c.context().tile_to_world(record.tile);
        assert_eq!(c.classify_point(center), record.tile_type);
        if record.tile_type.is_blocked() {
            assert!(!CollisionSystem::can_occupy(center, &c));
        }
    }
    assert_eq!(tiles.tiles().len(), size.tiles_per_chunk());
}

/// Test: Spawn search lands on open ground for several worlds.
#[test]
fn test_spawn_is_walkable() {
    for phrase in ["RAIN_FOX_PEAKS", "A", "DESERT_OWL", "NORTHERN_LIGHTS"] {
        let c = classifier(phrase);
        let spawn = CollisionSystem::find_open_spawn(WorldPoint::ORIGIN, &c);
        if spawn != WorldPoint::ORIGIN {
            assert!(CollisionSystem::can_occupy(spawn, &c), "{phrase}: spawn blocked");
        }
        let nearest = CollisionSystem::find_spawn(WorldPoint::ORIGIN, &c);
        if nearest != WorldPoint::ORIGIN {
            assert!(!c.is_blocked(c.context().world_to_tile(nearest)), "{phrase}: tile blocked");
        }
        println!("{phrase}: spawn at ({}, {})", spawn.x, spawn.y);
    }
}
