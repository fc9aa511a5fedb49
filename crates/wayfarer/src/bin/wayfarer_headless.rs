//! # Wayfarer Headless Runner
//!
//! Walks a world without a renderer and logs what happened.
//!
//! ```text
//! cargo run --release --bin wayfarer_headless -- --phrase RAIN_FOX_PEAKS --frames 3600
//! RUST_LOG=debug cargo run --bin wayfarer_headless -- --recipe worlds/desert.toml
//! ```

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use log::info;
use wayfarer::procedural::{BiomeRecipe, RecordingScene, StreamingConfig};
use wayfarer::{
    EventBus, GameEvent, GameLoop, GameLoopConfig, OfflineLeaderboard, Session,
    SessionConfig, SCORE_BOARD, TARGET_FRAME_TIME,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Walk a procedural world without a renderer", long_about = None)]
struct Args {
    /// Phrase the world seed is derived from
    #[arg(short, long, default_value = "RAIN_FOX_PEAKS")]
    phrase: String,

    /// TOML recipe file (overrides --phrase)
    #[arg(short, long)]
    recipe: Option<PathBuf>,

    /// Frames to simulate at 60 FPS
    #[arg(short, long, default_value_t = 3600)]
    frames: u64,

    /// Tile edge length in world units
    #[arg(long, default_value_t = 40.0)]
    tile_size: f64,

    /// Chunks kept loaded on each side of the observer
    #[arg(long, default_value_t = 1)]
    margin: u32,

    /// Background prefetch threads (0 disables prefetch)
    #[arg(long, default_value_t = 2)]
    workers: usize,

    /// Frames between heading changes
    #[arg(long, default_value_t = 240)]
    turn_every: u64,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let recipe = match &args.recipe {
        Some(path) => BiomeRecipe::load(path)?,
        None => BiomeRecipe::from_phrase(&args.phrase),
    };
    let streaming = StreamingConfig {
        tile_size: args.tile_size,
        margin_chunks: args.margin,
        ..StreamingConfig::default()
    };
    info!("Recipe seed {:#018x}, {} palette colors", recipe.seed, recipe.palette.len());

    let mut scene = RecordingScene::new();
    let (sender, receiver) = EventBus::create_pair(wayfarer::DEFAULT_EVENT_CAPACITY);

    let mut session = Session::start(
        recipe,
        SessionConfig {
            streaming,
            prefetch_workers: args.workers,
        },
        &mut scene,
        Box::new(OfflineLeaderboard::new("headless")),
        sender,
    )?;

    let mut game_loop = GameLoop::new(GameLoopConfig::default());
    let (mut loaded, mut unloaded, mut blocked) = (0_u64, 0_u64, 0_u64);

    for frame in 0..args.frames {
        let heading = (frame / args.turn_every.max(1)) as f64 * 2.1;
        let input = (heading.cos(), heading.sin());
        game_loop.advance(TARGET_FRAME_TIME, |dt| {
            let _ = session.tick(&mut scene, dt, input);
        });

        for event in receiver.drain() {
            match event {
                GameEvent::ChunkLoaded { .. } => loaded += 1,
                GameEvent::ChunkUnloaded { .. } => unloaded += 1,
                GameEvent::MovementBlocked { .. } => blocked += 1,
                GameEvent::BeaconCollected { tile, score } => {
                    info!("Beacon at ({}, {}), score {}", tile.x, tile.y, score);
                }
                GameEvent::SessionStarted { spawn } => {
                    info!("Spawned at ({:.1}, {:.1})", spawn.x, spawn.y);
                }
            }
        }
    }

    let position = session.position();
    let stats = session.streamer().stats();
    let signed_in = session.leaderboard().auth_state().is_authenticated();
    let score = session.finish(&mut scene);

    game_loop.stats().log_summary();
    info!(
        "Walked to ({:.1}, {:.1}) in {} ticks, blocked {} times",
        position.x,
        position.y,
        game_loop.tick_count(),
        blocked
    );
    info!(
        "Chunks: {} loaded, {} unloaded, {} prefetch hits, {} containers created",
        loaded,
        unloaded,
        stats.prefetch_hits,
        scene.containers_created()
    );
    info!("Score {} on '{}' (signed in: {})", score, SCORE_BOARD, signed_in);
    Ok(())
}
