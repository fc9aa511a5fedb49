//! # Wayfarer Game Loop
//!
//! Fixed-step simulation driven by variable frame time.
//!
//! ```text
//! Frame N:
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. ACCUMULATE                                                       │
//! │    └─ accumulator += min(frame_time, max_frame_time)                │
//! │                                                                     │
//! │ 2. TICK (while accumulator >= step, at most max_ticks_per_frame)    │
//! │    ├─ movement + collision                                          │
//! │    ├─ chunk streaming                                               │
//! │    └─ beacon collection                                             │
//! │                                                                     │
//! │ 3. RECORD                                                           │
//! │    └─ FrameStats into the accumulator                               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::{Duration, Instant};

use tracing::{debug, info};

/// Target frame time for 60 FPS.
pub const TARGET_FRAME_TIME: Duration = Duration::from_micros(16_666);

/// Configuration for the game loop.
#[derive(Clone, Debug)]
pub struct GameLoopConfig {
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Tick cap per frame; leftover time is discarded.
    pub max_ticks_per_frame: u32,
    /// Frame time clamp (prevents a spiral after a stall).
    pub max_frame_time: Duration,
}

impl Default for GameLoopConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            max_ticks_per_frame: 5,
            max_frame_time: Duration::from_millis(250),
        }
    }
}

impl GameLoopConfig {
    /// Fixed tick length in seconds.
    #[must_use]
    pub fn step(&self) -> f64 {
        1.0 / f64::from(self.tick_rate.max(1))
    }
}

/// Frame timing statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame number.
    pub frame: u64,
    /// Ticks run this frame.
    pub ticks: u32,
    /// Wall time spent in ticks, in microseconds.
    pub logic_us: u64,
    /// Whether accumulated time was discarded by the tick cap.
    pub dropped_time: bool,
}

/// Fixed-step driver.
pub struct GameLoop {
    config: GameLoopConfig,
    accumulator: f64,
    frame_count: u64,
    tick_count: u64,
    stats_accumulator: FrameStatsAccumulator,
}

impl GameLoop {
    /// Creates a new game loop.
    #[must_use]
    pub fn new(config: GameLoopConfig) -> Self {
        Self {
            config,
            accumulator: 0.0,
            frame_count: 0,
            tick_count: 0,
            stats_accumulator: FrameStatsAccumulator::new(),
        }
    }

    /// Runs the ticks owed for `frame_time`, calling `tick(step_seconds)` for each.
    pub fn advance(&mut self, frame_time: Duration, mut tick: impl FnMut(f64)) -> FrameStats {
        let step = self.config.step();
        self.accumulator += frame_time.min(self.config.max_frame_time).as_secs_f64();

        let start = Instant::now();
        let mut ticks = 0;
        while self.accumulator >= step && ticks < self.config.max_ticks_per_frame {
            tick(step);
            self.accumulator -= step;
            ticks += 1;
        }

        let dropped_time = self.accumulator >= step;
        if dropped_time {
            debug!(frame = self.frame_count, owed = self.accumulator, "tick cap reached, dropping time");
            self.accumulator = 0.0;
        }

        let stats = FrameStats {
            frame: self.frame_count,
            ticks,
            logic_us: start.elapsed().as_micros() as u64,
            dropped_time,
        };
        self.frame_count += 1;
        self.tick_count += u64::from(ticks);
        self.stats_accumulator.record(stats);
        stats
    }

    /// Returns the current frame count.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Returns the total ticks run.
    #[inline]
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &GameLoopConfig {
        &self.config
    }

    /// Returns the accumulated statistics.
    #[must_use]
    pub fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats_accumulator
    }
}

/// Accumulator for frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Sum of logic times.
    pub logic_us_sum: u64,
    /// Min logic time.
    pub min_logic_us: u64,
    /// Max logic time.
    pub max_logic_us: u64,
    /// Frames whose logic exceeded the frame budget.
    pub frames_over_budget: u64,
    /// Frames that discarded owed time.
    pub frames_dropping_time: u64,
}

impl FrameStatsAccumulator {
    /// Creates a new accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames_recorded: 0,
            logic_us_sum: 0,
            min_logic_us: u64::MAX,
            max_logic_us: 0,
            frames_over_budget: 0,
            frames_dropping_time: 0,
        }
    }

    /// Records a frame's statistics.
    pub fn record(&mut self, stats: FrameStats) {
        self.frames_recorded += 1;
        self.logic_us_sum += stats.logic_us;
        self.min_logic_us = self.min_logic_us.min(stats.logic_us);
        self.max_logic_us = self.max_logic_us.max(stats.logic_us);

        if stats.logic_us > TARGET_FRAME_TIME.as_micros() as u64 {
            self.frames_over_budget += 1;
        }
        if stats.dropped_time {
            self.frames_dropping_time += 1;
        }
    }

    /// Returns average logic time in milliseconds.
    #[must_use]
    pub fn avg_logic_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.logic_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns the fraction of frames over budget.
    #[must_use]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }

    /// Logs a summary of the statistics.
    pub fn log_summary(&self) {
        info!(
            frames = self.frames_recorded,
            avg_logic_ms = self.avg_logic_ms(),
            max_logic_ms = self.max_logic_us as f64 / 1000.0,
            over_budget_pct = self.over_budget_ratio() * 100.0,
            dropping_time = self.frames_dropping_time,
            "frame statistics"
        );
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
