//! # Wayfarer Event System
//!
//! One-way notifications from the session to whoever presents it.
//!
//! ```text
//! ┌─────────────┐      ┌─────────────┐      ┌──────────────┐
//! │   Session   │─────>│   Event     │─────>│ Presentation │
//! │   (tick)    │      │   Channel   │      │ (HUD, audio) │
//! └─────────────┘      └─────────────┘      └──────────────┘
//! ```
//!
//! The session never blocks on a slow consumer: a full channel drops the
//! event and logs a warning.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::warn;
use wayfarer_procedural::{ChunkRef, TileCoord, WorldPoint};

/// Default channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Things that happened during a session tick.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// The session spawned its observer.
    SessionStarted {
        /// Spawn point.
        spawn: WorldPoint,
    },

    /// A chunk entered the window and was built.
    ChunkLoaded {
        /// The chunk.
        chunk: ChunkRef,
        /// Beacons placed in it.
        beacons: usize,
    },

    /// A chunk left the window and was destroyed.
    ChunkUnloaded {
        /// The chunk.
        chunk: ChunkRef,
    },

    /// The observer picked up a beacon.
    BeaconCollected {
        /// Tile the beacon stood on.
        tile: TileCoord,
        /// Score after collecting.
        score: u32,
    },

    /// Terrain rejected some or all of a move.
    MovementBlocked {
        /// Where the observer ended up.
        position: WorldPoint,
        /// Where it tried to go.
        attempted: WorldPoint,
    },
}

/// Event bus between the session and its consumers.
pub struct EventBus {
    sender: Sender<GameEvent>,
    receiver: Receiver<GameEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum events in flight before new ones are dropped.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Creates a sender handle (clone for multiple producers).
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// Creates a receiver handle (clone for multiple consumers).
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }

    /// Creates a new pair of sender and receiver.
    #[must_use]
    pub fn create_pair(capacity: usize) -> (EventSender, EventReceiver) {
        let bus = Self::new(capacity);
        (bus.sender(), bus.receiver())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

/// Handle for sending events.
#[derive(Clone)]
pub struct EventSender {
    sender: Sender<GameEvent>,
}

impl EventSender {
    /// Sends an event (non-blocking).
    ///
    /// Returns `false` if the event was dropped.
    #[inline]
    pub fn send(&self, event: GameEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!(?event, "event channel full, dropping event");
                false
            }
            // Nobody is listening; that is allowed.
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Handle for receiving events.
#[derive(Clone)]
pub struct EventReceiver {
    receiver: Receiver<GameEvent>,
}

impl EventReceiver {
    /// Receives all pending events (non-blocking).
    #[inline]
    #[must_use]
    pub fn drain(&self) -> Vec<GameEvent> {
        self.receiver.try_iter().collect()
    }

    /// Receives one event (non-blocking).
    #[inline]
    #[must_use]
    pub fn try_recv(&self) -> Option<GameEvent> {
        self.receiver.try_recv().ok()
    }

    /// Returns the number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Checks if there are pending events.
    #[inline]
    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.receiver.is_empty()
    }
}
