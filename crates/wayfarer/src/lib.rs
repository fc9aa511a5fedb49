//! # Wayfarer
//!
//! The game crate: a walker exploring an endless procedural world.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                            WAYFARER                               │
//! ├───────────────────────────────────────────────────────────────────┤
//! │                                                                   │
//! │  ┌───────────────┐     ┌───────────────┐     ┌───────────────┐    │
//! │  │  GameLoop     │────>│  Session      │────>│  EventBus     │    │
//! │  │  fixed step   │     │  walk/stream  │     │  to the UI    │    │
//! │  └───────────────┘     └───────┬───────┘     └───────────────┘    │
//! │                                │                                  │
//! │                 ┌──────────────┴──────────────┐                   │
//! │                 v                             v                   │
//! │        ┌─────────────────┐          ┌─────────────────┐           │
//! │        │ wayfarer_       │          │  Leaderboard    │           │
//! │        │ procedural      │          │  (injected)     │           │
//! │        └─────────────────┘          └─────────────────┘           │
//! │                                                                   │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `events`: session-to-presentation event channel
//! - `game_loop`: fixed-step timing
//! - `movement`: walker with terrain slide
//! - `services`: leaderboard lifecycle
//! - `session`: spawn, streaming and beacon collection

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod events;
pub mod game_loop;
pub mod movement;
pub mod services;
pub mod session;

pub use wayfarer_procedural as procedural;

pub use events::{EventBus, EventReceiver, EventSender, GameEvent, DEFAULT_EVENT_CAPACITY};
pub use game_loop::{FrameStats, FrameStatsAccumulator, GameLoop, GameLoopConfig, TARGET_FRAME_TIME};
pub use movement::{StepResult, Walker, MAX_STEP_FRACTION, WALK_SPEED};
pub use services::{AuthState, Leaderboard, LeaderboardError, OfflineLeaderboard};
pub use session::{
    BeaconRegistry, Session, SessionConfig, TickOutcome, BEACON_CATEGORY, SCORE_BOARD,
};
