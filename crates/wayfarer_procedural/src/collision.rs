//! # Collision
//!
//! Occupancy queries against classified terrain.
//!
//! A point is occupiable when the tile containing it and all 8 neighbours
//! are passable. This rejects some legal spots near diagonal corners but
//! never admits a point overlapping a blocked tile's edge.

use tracing::warn;

use crate::classifier::TileClassifier;
use crate::context::{TileCoord, WorldPoint};

/// Largest ring searched by [`CollisionSystem::find_spawn`].
pub const SPAWN_SEARCH_RADIUS: i32 = 24;

/// Result of resolving one movement step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MoveOutcome {
    /// The full move was accepted.
    Full(WorldPoint),
    /// Only the X component was accepted.
    SlideX(WorldPoint),
    /// Only the Y component was accepted.
    SlideY(WorldPoint),
    /// Nothing was accepted; the actor stays put.
    Blocked(WorldPoint),
}

impl MoveOutcome {
    /// Resulting position.
    #[inline]
    #[must_use]
    pub const fn position(self) -> WorldPoint {
        match self {
            Self::Full(p) | Self::SlideX(p) | Self::SlideY(p) | Self::Blocked(p) => p,
        }
    }

    /// Returns whether any part of the move was rejected.
    #[inline]
    #[must_use]
    pub const fn was_obstructed(self) -> bool {
        !matches!(self, Self::Full(_))
    }
}

/// Stateless terrain collision queries.
#[derive(Clone, Copy, Debug, Default)]
pub struct CollisionSystem;

impl CollisionSystem {
    /// Returns whether an actor may stand at `point`.
    #[must_use]
    pub fn can_occupy(point: WorldPoint, classifier: &TileClassifier) -> bool {
        let center = classifier.context().world_to_tile(point);
        (-1..=1).all(|dy| (-1..=1).all(|dx| !classifier.is_blocked(center.offset(dx, dy))))
    }

    /// Moves from `from` toward `to`, sliding along obstacles.
    ///
    /// Tries the full move, then X only, then Y only.
    #[must_use]
    pub fn resolve_move(from: WorldPoint, to: WorldPoint, classifier: &TileClassifier) -> MoveOutcome {
        if Self::can_occupy(to, classifier) {
            return MoveOutcome::Full(to);
        }

        let x_only = WorldPoint::new(to.x, from.y);
        if x_only != from && Self::can_occupy(x_only, classifier) {
            return MoveOutcome::SlideX(x_only);
        }

        let y_only = WorldPoint::new(from.x, to.y);
        if y_only != from && Self::can_occupy(y_only, classifier) {
            return MoveOutcome::SlideY(y_only);
        }

        MoveOutcome::Blocked(from)
    }

    /// Center of the first unblocked tile around `point`.
    ///
    /// Searches square rings of radius `1..=SPAWN_SEARCH_RADIUS`, row-major
    /// within each ring. The containing tile itself is not considered.
    /// Falls back to the world origin.
    #[must_use]
    pub fn find_spawn(point: WorldPoint, classifier: &TileClassifier) -> WorldPoint {
        let context = classifier.context();
        let start = context.world_to_tile(point);

        match (1..=SPAWN_SEARCH_RADIUS)
            .flat_map(|radius| ring(start, radius))
            .find(|tile| !classifier.is_blocked(*tile))
        {
            Some(tile) => context.tile_to_world(tile),
            None => {
                warn!(x = point.x, y = point.y, "no unblocked tile near spawn point, using origin");
                WorldPoint::ORIGIN
            }
        }
    }

    /// Center of the nearest tile an actor can stand on (see [`Self::can_occupy`]).
    ///
    /// Searches the containing tile, then rings of radius
    /// `1..=SPAWN_SEARCH_RADIUS` in the same order as [`Self::find_spawn`].
    /// Falls back to the world origin.
    #[must_use]
    pub fn find_open_spawn(point: WorldPoint, classifier: &TileClassifier) -> WorldPoint {
        let context = classifier.context();
        let start = context.world_to_tile(point);

        match (0..=SPAWN_SEARCH_RADIUS)
            .flat_map(|radius| ring(start, radius))
            .find(|tile| Self::can_occupy(context.tile_to_world(*tile), classifier))
        {
            Some(tile) => context.tile_to_world(tile),
            None => {
                warn!(x = point.x, y = point.y, "no open tile near spawn point, using origin");
                WorldPoint::ORIGIN
            }
        }
    }
}

/// Tiles at exactly Chebyshev distance `radius` from `center`, row-major.
fn ring(center: TileCoord, radius: i32) -> impl Iterator<Item = TileCoord> {
    (-radius..=radius).flat_map(move |dy| {
        (-radius..=radius)
            .filter(move |dx| dy.abs() == radius || dx.abs() == radius)
            .map(move |dx| center.offset(dx, dy))
    })
}
