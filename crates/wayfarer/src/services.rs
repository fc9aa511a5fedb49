//! # Platform Services
//!
//! Leaderboards are an injected collaborator with an explicit lifecycle:
//!
//! ```text
//! initialize() ──> Pending ──poll_authentication()──> Authenticated
//!                                                 └─> Unavailable
//! ```
//!
//! The session owns one as a `Box<dyn Leaderboard>`; the world core never
//! sees it.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info};

/// Leaderboard failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LeaderboardError {
    /// `initialize` was called twice.
    #[error("leaderboard already initialized")]
    AlreadyInitialized,

    /// A score was submitted before authentication finished.
    #[error("player is not authenticated")]
    NotAuthenticated,

    /// The backing service cannot be reached.
    #[error("leaderboard unavailable: {0}")]
    Unavailable(String),
}

/// Authentication progress.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AuthState {
    /// `initialize` has not been called.
    #[default]
    Uninitialized,
    /// Authentication is in progress.
    Pending,
    /// Signed in.
    Authenticated {
        /// Display name.
        player: String,
    },
    /// Authentication failed; scores are not submitted.
    Unavailable,
}

impl AuthState {
    /// Returns whether scores may be submitted.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Score service.
pub trait Leaderboard: Send {
    /// Starts authentication. Call once at startup.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyInitialized` on a second call.
    fn initialize(&mut self) -> Result<(), LeaderboardError>;

    /// Advances authentication and returns the new state.
    fn poll_authentication(&mut self) -> AuthState;

    /// Current authentication state.
    fn auth_state(&self) -> &AuthState;

    /// Submits a score to a board.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` before authentication completes.
    fn submit_score(&mut self, board: &str, score: u32) -> Result<(), LeaderboardError>;
}

/// Local leaderboard that keeps the best score per board in memory.
#[derive(Debug, Default)]
pub struct OfflineLeaderboard {
    player: String,
    state: AuthState,
    best: HashMap<String, u32>,
    submissions: u64,
}

impl OfflineLeaderboard {
    /// Creates an offline leaderboard for a local player.
    #[must_use]
    pub fn new(player: impl Into<String>) -> Self {
        Self {
            player: player.into(),
            ..Self::default()
        }
    }

    /// Best score submitted to a board.
    #[must_use]
    pub fn best(&self, board: &str) -> Option<u32> {
        self.best.get(board).copied()
    }

    /// Number of accepted submissions.
    #[must_use]
    pub fn submissions(&self) -> u64 {
        self.submissions
    }
}

impl Leaderboard for OfflineLeaderboard {
    fn initialize(&mut self) -> Result<(), LeaderboardError> {
        if self.state != AuthState::Uninitialized {
            return Err(LeaderboardError::AlreadyInitialized);
        }
        self.state = AuthState::Pending;
        debug!(player = %self.player, "offline leaderboard initialized");
        Ok(())
    }

    fn poll_authentication(&mut self) -> AuthState {
        if self.state == AuthState::Pending {
            self.state = AuthState::Authenticated {
                player: self.player.clone(),
            };
            info!(player = %self.player, "signed in (offline)");
        }
        self.state.clone()
    }

    fn auth_state(&self) -> &AuthState {
        &self.state
    }

    fn submit_score(&mut self, board: &str, score: u32) -> Result<(), LeaderboardError> {
        if !self.state.is_authenticated() {
            return Err(LeaderboardError::NotAuthenticated);
        }
        let best = self.best.entry(board.to_owned()).or_insert(0);
        *best = (*best).max(score);
        self.submissions += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let mut board = OfflineLeaderboard::new("tester");
        assert_eq!(board.auth_state(), &AuthState::Uninitialized);
        assert_eq!(board.submit_score("beacons", 3), Err(LeaderboardError::NotAuthenticated));

        board.initialize().unwrap();
        assert_eq!(board.auth_state(), &AuthState::Pending);
        assert_eq!(board.initialize(), Err(LeaderboardError::AlreadyInitialized));

        let state = board.poll_authentication();
        assert!(state.is_authenticated());
        assert_eq!(
            state,
            AuthState::Authenticated {
                player: "tester".to_owned()
            }
        );
    }

    #[test]
    fn test_keeps_best_score() {
        let mut board = OfflineLeaderboard::new("tester");
        board.initialize().unwrap();
        let _ = board.poll_authentication();

        board.submit_score("beacons", 5).unwrap();
        board.submit_score("beacons", 2).unwrap();
        board.submit_score("distance", 900).unwrap();
        assert_eq!(board.best("beacons"), Some(5));
        assert_eq!(board.best("distance"), Some(900));
        assert_eq!(board.best("missing"), None);
        assert_eq!(board.submissions(), 3);
    }

    #[test]
    fn test_is_object_safe() {
        let mut boxed: Box<dyn Leaderboard> = Box::new(OfflineLeaderboard::new("p"));
        boxed.initialize().unwrap();
        assert_eq!(boxed.poll_authentication(), AuthState::Authenticated { player: "p".to_owned() });
    }
}
