//! # Wayfarer Movement
//!
//! Kinematic top-down walker with terrain collision.
//!
//! Features:
//! - Input direction to velocity (diagonals are not faster)
//! - Sub-stepped moves so a fast frame cannot skip a blocked tile
//! - Slide along obstacles (full move, then X only, then Y only)

use wayfarer_procedural::{CollisionSystem, MoveOutcome, TileClassifier, WorldPoint};

/// Default walking speed (world units per second).
pub const WALK_SPEED: f64 = 160.0;

/// Longest sub-step, as a fraction of the tile size.
pub const MAX_STEP_FRACTION: f64 = 0.5;

/// Result of one walker update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepResult {
    /// Where the walker ended up.
    pub position: WorldPoint,
    /// Where unobstructed movement would have taken it.
    pub attempted: WorldPoint,
    /// Whether any sub-step was obstructed.
    pub obstructed: bool,
}

/// Top-down character controller.
#[derive(Clone, Copy, Debug)]
pub struct Walker {
    /// Current position.
    pub position: WorldPoint,
    /// Current velocity (world units per second).
    pub velocity: (f64, f64),
    /// Speed at full input.
    pub speed: f64,
}

impl Walker {
    /// Creates a stationary walker.
    #[must_use]
    pub fn new(position: WorldPoint) -> Self {
        Self {
            position,
            velocity: (0.0, 0.0),
            speed: WALK_SPEED,
        }
    }

    /// Sets velocity from an input direction.
    ///
    /// Inputs longer than 1 are normalized; shorter inputs walk slower.
    pub fn apply_input(&mut self, direction: (f64, f64)) {
        let (x, y) = direction;
        let len = x.hypot(y);
        if !len.is_finite() || len <= f64::EPSILON {
            self.velocity = (0.0, 0.0);
            return;
        }
        let scale = if len > 1.0 { self.speed / len } else { self.speed };
        self.velocity = (x * scale, y * scale);
    }

    /// Returns whether the walker is moving.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.velocity != (0.0, 0.0)
    }

    /// Integrates velocity over `dt` seconds against the terrain.
    pub fn update(&mut self, dt: f64, classifier: &TileClassifier) -> StepResult {
        let start = self.position;
        let attempted = WorldPoint::new(start.x + self.velocity.0 * dt, start.y + self.velocity.1 * dt);
        if !self.is_moving() || dt <= 0.0 {
            return StepResult {
                position: start,
                attempted: start,
                obstructed: false,
            };
        }

        let max_step = classifier.context().tile_size() * MAX_STEP_FRACTION;
        let steps = (start.distance(attempted) / max_step).ceil().max(1.0) as u32;
        let (sx, sy) = (
            (attempted.x - start.x) / f64::from(steps),
            (attempted.y - start.y) / f64::from(steps),
        );

        let mut obstructed = false;
        for _ in 0..steps {
            let from = self.position;
            let to = WorldPoint::new(from.x + sx, from.y + sy);
            let outcome = CollisionSystem::resolve_move(from, to, classifier);
            obstructed |= outcome.was_obstructed();
            self.position = outcome.position();
            if matches!(outcome, MoveOutcome::Blocked(_)) {
                break;
            }
        }

        StepResult {
            position: self.position,
            attempted,
            obstructed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::Arc;
    use wayfarer_procedural::{BiomeRecipe, ChunkSize, WorldContext};

    fn classifier() -> TileClassifier {
        let ctx = WorldContext::new(BiomeRecipe::from_phrase("WALKER"), 40.0, ChunkSize::new(16, 16)).unwrap();
        TileClassifier::new(Arc::new(ctx))
    }

    #[test]
    fn test_diagonal_is_not_faster() {
        let mut w = Walker::new(WorldPoint::ORIGIN);
        w.apply_input((1.0, 1.0));
        assert_relative_eq!(w.velocity.0.hypot(w.velocity.1), WALK_SPEED, epsilon = 1e-9);

        w.apply_input((0.5, 0.0));
        assert_relative_eq!(w.velocity.0, WALK_SPEED * 0.5);

        w.apply_input((0.0, 0.0));
        assert!(!w.is_moving());
        w.apply_input((f64::NAN, 1.0));
        assert!(!w.is_moving());
    }

    #[test]
    fn test_walker_never_enters_blocked_neighbourhood() {
        let c = classifier();
        let spawn = CollisionSystem::find_open_spawn(WorldPoint::ORIGIN, &c);
        let mut w = Walker::new(spawn);
        let spawn_open = CollisionSystem::can_occupy(spawn, &c);

        for frame in 0..600 {
            let heading = f64::from(frame / 60) * 1.3;
            w.apply_input((heading.cos(), heading.sin()));
            let result = w.update(1.0 / 30.0, &c);
            if spawn_open {
                assert!(CollisionSystem::can_occupy(result.position, &c), "frame {frame}");
            }
        }
    }

    #[test]
    fn test_unobstructed_update_reaches_target() {
        let c = classifier();
        let spawn = CollisionSystem::find_open_spawn(WorldPoint::ORIGIN, &c);
        let mut w = Walker::new(spawn);
        w.apply_input((1.0, 0.0));
        let result = w.update(0.01, &c);
        if !result.obstructed {
            assert_relative_eq!(result.position.x, spawn.x + WALK_SPEED * 0.01, epsilon = 1e-9);
            assert_relative_eq!(result.position.y, spawn.y);
        }

        let idle = Walker::new(spawn).update(1.0, &c);
        assert_eq!(idle.position, spawn);
        assert!(!idle.obstructed);
    }
}
