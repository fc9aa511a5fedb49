//! # Scene Sink
//!
//! The boundary between the world core and whatever draws it.
//!
//! The core never renders. It asks a [`SceneSink`] for one positioned
//! container per chunk and one colored quad per tile, attaches beacon
//! markers to containers, and hands containers back when chunks leave the
//! window. Destroying a container destroys everything attached to it.

use std::collections::HashMap;

use crate::chunk::ChunkRef;
use crate::context::{TileCoord, WorldPoint};
use crate::recipe::Rgb;
use crate::structures::BeaconMarker;

/// One tile's visual.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quad {
    /// Tile this quad represents.
    pub tile: TileCoord,
    /// Top-left corner relative to the chunk container.
    pub local: WorldPoint,
    /// Edge length in world units (the tile size).
    pub size: f64,
    /// Fill color.
    pub color: Rgb,
}

/// Visual materialization interface.
pub trait SceneSink {
    /// Per-chunk container handle, owned by the streamer while the chunk is loaded.
    type Container;

    /// Creates an empty container whose top-left corner sits at `origin`.
    fn create_container(&mut self, chunk: ChunkRef, origin: WorldPoint) -> Self::Container;

    /// Attaches a tile quad.
    fn add_quad(&mut self, container: &mut Self::Container, quad: Quad);

    /// Attaches a beacon marker.
    fn add_marker(&mut self, container: &mut Self::Container, marker: &BeaconMarker);

    /// Detaches the marker on `tile`. Returns `false` if there was none.
    fn remove_marker(&mut self, container: &mut Self::Container, tile: TileCoord) -> bool;

    /// Destroys a container and all its children.
    fn destroy_container(&mut self, container: Self::Container);
}

/// In-memory container kept by [`RecordingScene`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedContainer {
    /// Chunk this container belongs to.
    pub chunk: ChunkRef,
    /// World-space top-left corner.
    pub origin: WorldPoint,
    /// Tile quads, in insertion order.
    pub quads: Vec<Quad>,
    /// Attached markers.
    pub markers: Vec<BeaconMarker>,
}

impl RecordedContainer {
    /// Marker on a tile, if any.
    #[must_use]
    pub fn marker_at(&self, tile: TileCoord) -> Option<&BeaconMarker> {
        self.markers.iter().find(|m| m.tile == tile)
    }
}

/// Scene sink that records everything and draws nothing.
///
/// Used by tests and the headless runner.
#[derive(Debug, Default)]
pub struct RecordingScene {
    live_containers: usize,
    live_quads: usize,
    live_markers: usize,
    containers_created: u64,
    containers_destroyed: u64,
    creations: HashMap<ChunkRef, u32>,
}

impl RecordingScene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Containers currently alive.
    #[must_use]
    pub fn live_containers(&self) -> usize {
        self.live_containers
    }

    /// Quads currently alive.
    #[must_use]
    pub fn live_quads(&self) -> usize {
        self.live_quads
    }

    /// Markers currently alive.
    #[must_use]
    pub fn live_markers(&self) -> usize {
        self.live_markers
    }

    /// Containers created so far.
    #[must_use]
    pub fn containers_created(&self) -> u64 {
        self.containers_created
    }

    /// Containers destroyed so far.
    #[must_use]
    pub fn containers_destroyed(&self) -> u64 {
        self.containers_destroyed
    }

    /// How many times a container was created for `chunk`.
    #[must_use]
    pub fn creations_of(&self, chunk: ChunkRef) -> u32 {
        self.creations.get(&chunk).copied().unwrap_or(0)
    }
}

impl SceneSink for RecordingScene {
    type Container = RecordedContainer;

    fn create_container(&mut self, chunk: ChunkRef, origin: WorldPoint) -> RecordedContainer {
        self.live_containers += 1;
        self.containers_created += 1;
        *self.creations.entry(chunk).or_insert(0) += 1;
        RecordedContainer {
            chunk,
            origin,
            quads: Vec::new(),
            markers: Vec::new(),
        }
    }

    fn add_quad(&mut self, container: &mut RecordedContainer, quad: Quad) {
        self.live_quads += 1;
        container.quads.push(quad);
    }

    fn add_marker(&mut self, container: &mut RecordedContainer, marker: &BeaconMarker) {
        self.live_markers += 1;
        container.markers.push(*marker);
    }

    fn remove_marker(&mut self, container: &mut RecordedContainer, tile: TileCoord) -> bool {
        match container.markers.iter().position(|m| m.tile == tile) {
            Some(index) => {
                container.markers.swap_remove(index);
                self.live_markers -= 1;
                true
            }
            None => false,
        }
    }

    fn destroy_container(&mut self, container: RecordedContainer) {
        self.live_containers -= 1;
        self.live_quads -= container.quads.len();
        self.live_markers -= container.markers.len();
        self.containers_destroyed += 1;
    }
}
