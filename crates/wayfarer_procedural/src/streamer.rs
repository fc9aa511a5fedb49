//! # Chunk Streamer
//!
//! Keeps the set of materialized chunks matched to an observer.
//!
//! ## Window
//!
//! ```text
//! margin = 1                 (2 * margin + 1)^2 chunks resident
//! ┌────┬────┬────┐
//! │    │    │    │           prefetch ring: Chebyshev distance margin + 1
//! ├────┼────┼────┤
//! │    │ @  │    │           @ = chunk containing the observer
//! ├────┼────┼────┤
//! │    │    │    │
//! └────┴────┴────┘
//! ```
//!
//! ## Ordering
//!
//! Within one `update_visible` pass every build (and its ready callback)
//! completes before the first unload. Builds happen only for refs missing
//! from the loaded map and unloads only for refs outside the window, so a
//! repeated call with the same window does nothing.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::chunk::{ChunkCoord, ChunkRef, ChunkTiles};
use crate::classifier::TileClassifier;
use crate::context::WorldPoint;
use crate::prefetch::ChunkPrefetcher;
use crate::scene::{Quad, SceneSink};

/// Chunks touched by one streaming pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamReport {
    /// Newly built, in window order.
    pub built: Vec<ChunkRef>,
    /// Unloaded, sorted.
    pub unloaded: Vec<ChunkRef>,
}

impl StreamReport {
    /// Returns whether the pass changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.built.is_empty() && self.unloaded.is_empty()
    }
}

/// Streaming statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Chunks currently loaded.
    pub loaded: usize,
    /// Chunks built this session.
    pub built_total: u64,
    /// Chunks unloaded this session.
    pub unloaded_total: u64,
    /// Builds that adopted prefetched tiles.
    pub prefetch_hits: u64,
}

/// Owns the loaded-chunk map: at most one container per chunk.
pub struct ChunkStreamer<S: SceneSink> {
    classifier: TileClassifier,
    loaded: HashMap<ChunkRef, S::Container>,
    prefetcher: Option<ChunkPrefetcher>,
    built_total: u64,
    unloaded_total: u64,
    prefetch_hits: u64,
}

impl<S: SceneSink> ChunkStreamer<S> {
    /// Creates an empty streamer.
    #[must_use]
    pub fn new(classifier: TileClassifier) -> Self {
        Self {
            classifier,
            loaded: HashMap::new(),
            prefetcher: None,
            built_total: 0,
            unloaded_total: 0,
            prefetch_hits: 0,
        }
    }

    /// Attaches a background prefetcher.
    #[must_use]
    pub fn with_prefetcher(mut self, prefetcher: ChunkPrefetcher) -> Self {
        self.prefetcher = Some(prefetcher);
        self
    }

    /// The classifier chunks are built from.
    #[inline]
    #[must_use]
    pub fn classifier(&self) -> &TileClassifier {
        &self.classifier
    }

    /// The attached prefetcher, if any.
    #[must_use]
    pub fn prefetcher(&self) -> Option<&ChunkPrefetcher> {
        self.prefetcher.as_ref()
    }

    /// Chunk containing a world point.
    #[inline]
    #[must_use]
    pub fn chunk_ref_at(&self, point: WorldPoint) -> ChunkRef {
        self.classifier.context().chunk_ref_at(point)
    }

    fn chunk_coord_at(&self, point: WorldPoint) -> ChunkCoord {
        let context = self.classifier.context();
        context
            .chunk_size()
            .chunk_coord(context.world_to_tile(point))
    }

    /// Builds every missing chunk within `radius` of `position`. Never unloads.
    pub fn build_around<F>(
        &mut self,
        scene: &mut S,
        position: WorldPoint,
        radius: u32,
        mut on_ready: F,
    ) -> StreamReport
    where
        F: FnMut(&mut S, ChunkRef, &mut S::Container),
    {
        let size = self.classifier.context().chunk_size();
        let center = self.chunk_coord_at(position);

        let mut report = StreamReport::default();
        for chunk in size.window(center, radius) {
            if !self.loaded.contains_key(&chunk) {
                self.build_chunk(scene, chunk, &mut on_ready);
                report.built.push(chunk);
            }
        }

        debug!(built = report.built.len(), radius, "preload pass");
        report
    }

    /// Matches the loaded set to the window of `margin` chunks around `center`.
    ///
    /// Builds missing chunks first, then unloads chunks outside the window,
    /// then queues the surrounding ring for prefetch.
    pub fn update_visible<F>(
        &mut self,
        scene: &mut S,
        center: WorldPoint,
        margin: u32,
        mut on_ready: F,
    ) -> StreamReport
    where
        F: FnMut(&mut S, ChunkRef, &mut S::Container),
    {
        let size = self.classifier.context().chunk_size();
        let center_coord = self.chunk_coord_at(center);
        let desired: Vec<ChunkRef> = size.window(center_coord, margin).collect();

        let mut report = StreamReport::default();
        for &chunk in &desired {
            if !self.loaded.contains_key(&chunk) {
                self.build_chunk(scene, chunk, &mut on_ready);
                report.built.push(chunk);
            }
        }

        let keep: HashSet<ChunkRef> = desired.into_iter().collect();
        let mut stale: Vec<ChunkRef> = self
            .loaded
            .keys()
            .filter(|chunk| !keep.contains(chunk))
            .copied()
            .collect();
        stale.sort_unstable();
        for chunk in &stale {
            self.unload_chunk(scene, *chunk);
        }
        report.unloaded = stale;

        self.prefetch_ring(center_coord, margin);

        if !report.is_empty() {
            debug!(
                built = report.built.len(),
                unloaded = report.unloaded.len(),
                loaded = self.loaded.len(),
                "streaming pass"
            );
        }
        report
    }

    /// Unloads everything. Returns the unloaded refs, sorted.
    pub fn unload_all(&mut self, scene: &mut S) -> Vec<ChunkRef> {
        let mut all: Vec<ChunkRef> = self.loaded.keys().copied().collect();
        all.sort_unstable();
        for chunk in &all {
            self.unload_chunk(scene, *chunk);
        }
        all
    }

    fn build_chunk<F>(&mut self, scene: &mut S, chunk: ChunkRef, on_ready: &mut F)
    where
        F: FnMut(&mut S, ChunkRef, &mut S::Container),
    {
        let context = self.classifier.context();
        let tile_size = context.tile_size();
        let origin = chunk.origin();

        let tiles = match self.prefetcher.as_ref().and_then(|p| p.take(chunk)) {
            Some(tiles) => {
                self.prefetch_hits += 1;
                tiles
            }
            None => ChunkTiles::classify(&self.classifier, chunk),
        };

        let mut container = scene.create_container(chunk, context.chunk_world_origin(chunk));
        for record in tiles.tiles() {
            let quad = Quad {
                tile: record.tile,
                local: WorldPoint::new(
                    f64::from(record.tile.x - origin.x) * tile_size,
                    f64::from(record.tile.y - origin.y) * tile_size,
                ),
                size: tile_size,
                color: record.color,
            };
            scene.add_quad(&mut container, quad);
        }

        self.built_total += 1;
        debug!(x = origin.x, y = origin.y, tiles = tiles.tiles().len(), "chunk built");

        let container = self.loaded.entry(chunk).or_insert(container);
        on_ready(scene, chunk, container);
    }

    fn unload_chunk(&mut self, scene: &mut S, chunk: ChunkRef) {
        if let Some(container) = self.loaded.remove(&chunk) {
            scene.destroy_container(container);
            self.unloaded_total += 1;
            debug!(x = chunk.origin().x, y = chunk.origin().y, "chunk unloaded");
        }
    }

    fn prefetch_ring(&self, center: ChunkCoord, margin: u32) {
        let Some(prefetcher) = &self.prefetcher else {
            return;
        };
        let size = self.classifier.context().chunk_size();
        let reach = margin + 1;

        for chunk in size.window(center, reach) {
            if size.coord_of(chunk).chebyshev(center) == reach && !self.loaded.contains_key(&chunk) {
                prefetcher.request(chunk);
            }
        }
        prefetcher.retain_ready(|chunk| size.coord_of(chunk).chebyshev(center) <= reach);
    }

    /// Returns whether a chunk is resident.
    #[inline]
    #[must_use]
    pub fn is_loaded(&self, chunk: ChunkRef) -> bool {
        self.loaded.contains_key(&chunk)
    }

    /// Number of resident chunks.
    #[inline]
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    /// Resident chunks, sorted.
    #[must_use]
    pub fn loaded_refs(&self) -> Vec<ChunkRef> {
        let mut refs: Vec<ChunkRef> = self.loaded.keys().copied().collect();
        refs.sort_unstable();
        refs
    }

    /// Container of a resident chunk.
    #[must_use]
    pub fn container(&self, chunk: ChunkRef) -> Option<&S::Container> {
        self.loaded.get(&chunk)
    }

    /// Mutable container of a resident chunk.
    #[must_use]
    pub fn container_mut(&mut self, chunk: ChunkRef) -> Option<&mut S::Container> {
        self.loaded.get_mut(&chunk)
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> StreamStats {
        StreamStats {
            loaded: self.loaded.len(),
            built_total: self.built_total,
            unloaded_total: self.unloaded_total,
            prefetch_hits: self.prefetch_hits,
        }
    }
}
