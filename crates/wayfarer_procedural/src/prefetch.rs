//! # Chunk Prefetch
//!
//! Background classification of chunks just outside the streaming window.
//!
//! ```text
//! streamer ──request(ref)──> [job channel] ──> worker 0..N
//!                                               │ ChunkTiles::classify
//! streamer <──take(ref)───── ready map <────────┘
//! ```
//!
//! Only tile classification runs off-thread. The loaded-chunk map and the
//! scene stay on the streamer's thread. A ref is either in flight or ready,
//! never both, and `request` refuses a ref that is already either, so at
//! most one worker ever builds a given chunk.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

use crate::chunk::{ChunkRef, ChunkTiles};
use crate::classifier::TileClassifier;

#[derive(Default)]
struct PrefetchState {
    in_flight: HashSet<ChunkRef>,
    ready: HashMap<ChunkRef, ChunkTiles>,
}

struct Shared {
    state: Mutex<PrefetchState>,
    settled: Condvar,
}

/// Worker pool that classifies chunks ahead of the window.
pub struct ChunkPrefetcher {
    jobs: Option<Sender<ChunkRef>>,
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl ChunkPrefetcher {
    /// Starts `workers` threads (at least one).
    #[must_use]
    pub fn new(classifier: TileClassifier, workers: usize) -> Self {
        let (jobs, queue) = unbounded();
        let shared = Arc::new(Shared {
            state: Mutex::new(PrefetchState::default()),
            settled: Condvar::new(),
        });

        let workers = (0..workers.max(1))
            .map(|_| {
                let queue = queue.clone();
                let shared = Arc::clone(&shared);
                let classifier = classifier.clone();
                thread::spawn(move || Self::worker_loop(&classifier, &queue, &shared))
            })
            .collect::<Vec<_>>();

        debug!(workers = workers.len(), "chunk prefetcher started");
        Self {
            jobs: Some(jobs),
            shared,
            workers,
        }
    }

    fn worker_loop(classifier: &TileClassifier, queue: &Receiver<ChunkRef>, shared: &Shared) {
        // Ends when the sender is dropped.
        for chunk in queue {
            let tiles = ChunkTiles::classify(classifier, chunk);
            let mut state = shared.state.lock();
            state.in_flight.remove(&chunk);
            state.ready.insert(chunk, tiles);
            drop(state);
            shared.settled.notify_all();
            trace!(x = chunk.origin().x, y = chunk.origin().y, "chunk prefetched");
        }
    }

    /// Queues a chunk for classification.
    ///
    /// Returns `false` if the chunk is already in flight or ready.
    pub fn request(&self, chunk: ChunkRef) -> bool {
        let Some(jobs) = &self.jobs else {
            return false;
        };

        let mut state = self.shared.state.lock();
        if state.in_flight.contains(&chunk) || state.ready.contains_key(&chunk) {
            return false;
        }
        if jobs.send(chunk).is_err() {
            return false;
        }
        state.in_flight.insert(chunk);
        true
    }

    /// Removes and returns a finished chunk.
    pub fn take(&self, chunk: ChunkRef) -> Option<ChunkTiles> {
        self.shared.state.lock().ready.remove(&chunk)
    }

    /// Returns whether a chunk is queued or being classified.
    #[must_use]
    pub fn is_in_flight(&self, chunk: ChunkRef) -> bool {
        self.shared.state.lock().in_flight.contains(&chunk)
    }

    /// Returns whether a finished chunk is waiting to be taken.
    #[must_use]
    pub fn is_ready(&self, chunk: ChunkRef) -> bool {
        self.shared.state.lock().ready.contains_key(&chunk)
    }

    /// Number of finished chunks waiting to be taken.
    #[must_use]
    pub fn ready_count(&self) -> usize {
        self.shared.state.lock().ready.len()
    }

    /// Drops finished chunks for which `keep` returns `false`.
    pub fn retain_ready(&self, mut keep: impl FnMut(ChunkRef) -> bool) {
        self.shared.state.lock().ready.retain(|chunk, _| keep(*chunk));
    }

    /// Blocks until nothing is in flight or `timeout` elapses.
    ///
    /// Returns `true` if the pool went idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        while !state.in_flight.is_empty() {
            if self.shared.settled.wait_until(&mut state, deadline).timed_out() {
                return state.in_flight.is_empty();
            }
        }
        true
    }
}

impl Drop for ChunkPrefetcher {
    fn drop(&mut self) {
        // Closing the channel ends every worker loop.
        self.jobs.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}
