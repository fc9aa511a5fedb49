//! # Session
//!
//! One play-through of one world: spawn, walk, stream, collect.
//!
//! ## Per tick
//!
//! ```text
//! input ──> Walker::update ──> ChunkStreamer::update_visible ──> collect
//!              │                        │                          │
//!        MovementBlocked       ChunkLoaded / Unloaded       BeaconCollected
//! ```
//!
//! Beacons are placed in the chunk-ready callback. A collected beacon is
//! remembered by tile, so the chunk comes back without it after a rebuild.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};
use wayfarer_procedural::{
    BeaconMarker, BeaconStructures, BiomeRecipe, ChunkPrefetcher, ChunkRef, ChunkStreamer,
    CollisionSystem, SceneSink, StreamReport, StreamingConfig, TileClassifier, TileCoord,
    WorldContext, WorldPoint, WorldResult,
};

use crate::events::{EventSender, GameEvent};
use crate::movement::Walker;
use crate::services::{AuthState, Leaderboard};

/// Collision category echoed onto every beacon marker.
pub const BEACON_CATEGORY: u32 = 0b10;

/// Leaderboard board that receives the beacon score.
pub const SCORE_BOARD: &str = "beacons";

/// Session options.
#[derive(Clone, Debug, Default)]
pub struct SessionConfig {
    /// Geometry and window sizes.
    pub streaming: StreamingConfig,
    /// Background prefetch threads (0 disables prefetch).
    pub prefetch_workers: usize,
}

/// Beacons currently placed, and beacons already collected.
#[derive(Debug, Default)]
pub struct BeaconRegistry {
    active: HashMap<TileCoord, ChunkRef>,
    collected: HashSet<TileCoord>,
}

impl BeaconRegistry {
    /// Keeps the markers not yet collected and records them as active.
    pub fn admit(&mut self, chunk: ChunkRef, markers: Vec<BeaconMarker>) -> Vec<BeaconMarker> {
        let fresh: Vec<BeaconMarker> = markers
            .into_iter()
            .filter(|m| !self.collected.contains(&m.tile))
            .collect();
        for marker in &fresh {
            self.active.insert(marker.tile, chunk);
        }
        fresh
    }

    /// Forgets the active markers of an unloaded chunk.
    pub fn forget_chunk(&mut self, chunk: ChunkRef) {
        self.active.retain(|_, owner| *owner != chunk);
    }

    /// Collects the beacon on `tile`, returning its chunk.
    pub fn collect(&mut self, tile: TileCoord) -> Option<ChunkRef> {
        let chunk = self.active.remove(&tile)?;
        self.collected.insert(tile);
        Some(chunk)
    }

    /// Returns whether the beacon on `tile` was collected.
    #[must_use]
    pub fn is_collected(&self, tile: TileCoord) -> bool {
        self.collected.contains(&tile)
    }

    /// Returns whether a beacon is waiting on `tile`.
    #[must_use]
    pub fn is_active(&self, tile: TileCoord) -> bool {
        self.active.contains_key(&tile)
    }

    /// Active beacons in loaded chunks.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Active beacon tiles, sorted.
    #[must_use]
    pub fn active_tiles(&self) -> Vec<TileCoord> {
        let mut tiles: Vec<TileCoord> = self.active.keys().copied().collect();
        tiles.sort_unstable();
        tiles
    }

    /// Beacons collected so far.
    #[must_use]
    pub fn collected_count(&self) -> usize {
        self.collected.len()
    }
}

/// What one tick did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickOutcome {
    /// Observer position after the tick.
    pub position: WorldPoint,
    /// Chunks built and unloaded.
    pub stream: StreamReport,
    /// Whether terrain rejected part of the move.
    pub blocked: bool,
    /// Whether a beacon was collected.
    pub collected: bool,
}

/// A running game session.
pub struct Session<S: SceneSink> {
    context: Arc<WorldContext>,
    classifier: TileClassifier,
    streamer: ChunkStreamer<S>,
    beacons: BeaconStructures,
    registry: BeaconRegistry,
    walker: Walker,
    events: EventSender,
    leaderboard: Box<dyn Leaderboard>,
    config: StreamingConfig,
    score: u32,
    ticks: u64,
}

impl<S: SceneSink> Session<S> {
    /// Builds the world, spawns the observer and streams the first window.
    ///
    /// # Errors
    ///
    /// Returns the world construction error for an invalid recipe or config.
    pub fn start(
        recipe: BiomeRecipe,
        config: SessionConfig,
        scene: &mut S,
        mut leaderboard: Box<dyn Leaderboard>,
        events: EventSender,
    ) -> WorldResult<Self> {
        let context = Arc::new(WorldContext::from_config(recipe, &config.streaming)?);
        let classifier = TileClassifier::new(Arc::clone(&context));

        let mut streamer = ChunkStreamer::new(classifier.clone());
        if config.prefetch_workers > 0 {
            streamer = streamer.with_prefetcher(ChunkPrefetcher::new(classifier.clone(), config.prefetch_workers));
        }

        if let Err(e) = leaderboard.initialize() {
            warn!(error = %e, "leaderboard initialization failed");
        }

        let spawn = CollisionSystem::find_open_spawn(WorldPoint::ORIGIN, &classifier);
        info!(x = spawn.x, y = spawn.y, seed = context.recipe().seed, "session started");

        let mut session = Self {
            beacons: BeaconStructures::new(&classifier),
            context,
            classifier,
            streamer,
            registry: BeaconRegistry::default(),
            walker: Walker::new(spawn),
            events,
            leaderboard,
            config: config.streaming,
            score: 0,
            ticks: 0,
        };
        session.events.send(GameEvent::SessionStarted { spawn });

        let preload = session.stream(scene, spawn, Some(session.config.preload_radius));
        let visible = session.stream(scene, spawn, None);
        debug!(
            preloaded = preload.built.len(),
            built = visible.built.len(),
            unloaded = visible.unloaded.len(),
            "initial window ready"
        );
        Ok(session)
    }

    /// Builds (radius given) or updates (radius `None`) the window and
    /// places beacons in every new chunk.
    fn stream(&mut self, scene: &mut S, center: WorldPoint, preload_radius: Option<u32>) -> StreamReport {
        let Self {
            streamer,
            beacons,
            registry,
            classifier,
            config,
            ..
        } = self;

        let mut loaded: Vec<(ChunkRef, usize)> = Vec::new();
        let on_ready = |scene: &mut S, chunk: ChunkRef, container: &mut S::Container| {
            let markers = registry.admit(chunk, beacons.place_in_chunk(classifier, chunk, BEACON_CATEGORY));
            for marker in &markers {
                scene.add_marker(container, marker);
            }
            loaded.push((chunk, markers.len()));
        };

        let report = match preload_radius {
            Some(radius) => streamer.build_around(scene, center, radius, on_ready),
            None => streamer.update_visible(scene, center, config.margin_chunks, on_ready),
        };

        for (chunk, beacons) in loaded {
            self.events.send(GameEvent::ChunkLoaded { chunk, beacons });
        }
        for chunk in &report.unloaded {
            self.registry.forget_chunk(*chunk);
            self.events.send(GameEvent::ChunkUnloaded { chunk: *chunk });
        }
        report
    }

    /// Advances the session by `dt` seconds of input.
    pub fn tick(&mut self, scene: &mut S, dt: f64, input_direction: (f64, f64)) -> TickOutcome {
        self.ticks += 1;
        if *self.leaderboard.auth_state() == AuthState::Pending {
            let _ = self.leaderboard.poll_authentication();
        }

        self.walker.apply_input(input_direction);
        let step = self.walker.update(dt, &self.classifier);
        if step.obstructed {
            self.events.send(GameEvent::MovementBlocked {
                position: step.position,
                attempted: step.attempted,
            });
        }

        let stream = self.stream(scene, step.position, None);
        let collected = self.collect_at(scene, step.position);

        TickOutcome {
            position: step.position,
            stream,
            blocked: step.obstructed,
            collected,
        }
    }

    fn collect_at(&mut self, scene: &mut S, position: WorldPoint) -> bool {
        let tile = self.context.world_to_tile(position);
        let Some(chunk) = self.registry.collect(tile) else {
            return false;
        };

        if let Some(container) = self.streamer.container_mut(chunk) {
            scene.remove_marker(container, tile);
        }
        self.score += 1;
        debug!(x = tile.x, y = tile.y, score = self.score, "beacon collected");
        self.events.send(GameEvent::BeaconCollected { tile, score: self.score });

        if self.leaderboard.auth_state().is_authenticated() {
            if let Err(e) = self.leaderboard.submit_score(SCORE_BOARD, self.score) {
                warn!(error = %e, "score submission failed");
            }
        }
        true
    }

    /// Moves the observer directly (no collision), then streams around it.
    pub fn teleport(&mut self, scene: &mut S, position: WorldPoint) -> StreamReport {
        self.walker.position = position;
        self.stream(scene, position, None)
    }

    /// Unloads every chunk. Returns the final score.
    pub fn finish(&mut self, scene: &mut S) -> u32 {
        for chunk in self.streamer.unload_all(scene) {
            self.registry.forget_chunk(chunk);
            self.events.send(GameEvent::ChunkUnloaded { chunk });
        }
        info!(score = self.score, ticks = self.ticks, "session finished");
        self.score
    }

    /// Observer position.
    #[must_use]
    pub fn position(&self) -> WorldPoint {
        self.walker.position
    }

    /// Beacons collected.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Ticks run.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// The world.
    #[must_use]
    pub fn context(&self) -> &Arc<WorldContext> {
        &self.context
    }

    /// The streamer (loaded chunks and their containers).
    #[must_use]
    pub fn streamer(&self) -> &ChunkStreamer<S> {
        &self.streamer
    }

    /// The beacon registry.
    #[must_use]
    pub fn registry(&self) -> &BeaconRegistry {
        &self.registry
    }

    /// The injected leaderboard.
    #[must_use]
    pub fn leaderboard(&self) -> &dyn Leaderboard {
        self.leaderboard.as_ref()
    }
}
