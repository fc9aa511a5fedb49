//! # Session Integration Test
//!
//! Spawn, stream, collect and rebuild through the public session API.

use wayfarer::procedural::{BiomeRecipe, RecordingScene, StreamingConfig, TileCoord, WorldPoint};
use wayfarer::{
    EventBus, EventReceiver, GameEvent, Leaderboard, OfflineLeaderboard, Session, SessionConfig,
};

const PHRASES: [&str; 4] = ["RAIN_FOX_PEAKS", "SALT_MARSH", "EMBER_DUNES", "QUIET_PINES"];

fn start(phrase: &str, workers: usize) -> (Session<RecordingScene>, RecordingScene, EventReceiver) {
    let mut scene = RecordingScene::new();
    let (sender, receiver) = EventBus::create_pair(4096);
    let session = Session::start(
        BiomeRecipe::from_phrase(phrase),
        SessionConfig {
            streaming: StreamingConfig::default(),
            prefetch_workers: workers,
        },
        &mut scene,
        Box::new(OfflineLeaderboard::new("tester")),
        sender,
    )
    .expect("valid world");
    (session, scene, receiver)
}

/// Starts sessions until one has a beacon in its first window.
fn start_with_beacon() -> (Session<RecordingScene>, RecordingScene, EventReceiver, TileCoord) {
    for phrase in PHRASES {
        let (session, scene, receiver) = start(phrase, 0);
        if let Some(tile) = session.registry().active_tiles().first().copied() {
            return (session, scene, receiver, tile);
        }
    }
    panic!("no beacon near spawn in any test world");
}

fn far_away(point: WorldPoint) -> WorldPoint {
    WorldPoint::new(point.x + 100_000.0, point.y - 100_000.0)
}

#[test]
fn test_start_streams_first_window() {
    let (session, scene, receiver) = start("RAIN_FOX_PEAKS", 0);
    let events = receiver.drain();

    assert!(matches!(events.first(), Some(GameEvent::SessionStarted { .. })));
    let loaded = events
        .iter()
        .filter(|e| matches!(e, GameEvent::ChunkLoaded { .. }))
        .count();
    assert_eq!(loaded, 9);
    assert_eq!(session.streamer().loaded_count(), 9);
    assert_eq!(scene.live_containers(), 9);
    assert_eq!(scene.live_markers(), session.registry().active_count());
    assert_eq!(session.score(), 0);
}

#[test]
fn test_collect_beacon_on_observer_tile() {
    let (mut session, mut scene, receiver, tile) = start_with_beacon();
    let chunk = session.context().chunk_ref_for_tile(tile);

    let _ = session.teleport(&mut scene, session.context().tile_to_world(tile));
    let markers_before = scene.live_markers();
    let outcome = session.tick(&mut scene, 1.0 / 60.0, (0.0, 0.0));

    assert!(outcome.collected);
    assert_eq!(session.score(), 1);
    assert_eq!(scene.live_markers(), markers_before - 1);
    let container = session.streamer().container(chunk).expect("chunk stays loaded");
    assert!(container.marker_at(tile).is_none());
    assert!(session.registry().is_collected(tile));

    let collected: Vec<GameEvent> = receiver
        .drain()
        .into_iter()
        .filter(|e| matches!(e, GameEvent::BeaconCollected { .. }))
        .collect();
    assert_eq!(collected, vec![GameEvent::BeaconCollected { tile, score: 1 }]);

    // Standing still does not collect twice.
    let outcome = session.tick(&mut scene, 1.0 / 60.0, (0.0, 0.0));
    assert!(!outcome.collected);
    assert_eq!(session.score(), 1);
}

#[test]
fn test_collected_beacon_stays_gone_after_rebuild() {
    let (mut session, mut scene, _receiver, tile) = start_with_beacon();
    let chunk = session.context().chunk_ref_for_tile(tile);
    let home = session.context().tile_to_world(tile);

    session.teleport(&mut scene, home);
    assert!(session.tick(&mut scene, 1.0 / 60.0, (0.0, 0.0)).collected);

    let away = session.teleport(&mut scene, far_away(home));
    assert!(away.unloaded.contains(&chunk));
    assert!(!session.streamer().is_loaded(chunk));

    let back = session.teleport(&mut scene, home);
    assert!(back.built.contains(&chunk));
    assert_eq!(scene.creations_of(chunk), 2);

    let container = session.streamer().container(chunk).expect("rebuilt");
    assert!(container.marker_at(tile).is_none());
    assert!(!session.registry().is_active(tile));
    assert!(!session.tick(&mut scene, 1.0 / 60.0, (0.0, 0.0)).collected);
}

#[test]
fn test_uncollected_beacons_return_after_rebuild() {
    let (mut session, mut scene, _receiver) = start("RAIN_FOX_PEAKS", 0);
    let before = session.registry().active_tiles();
    let home = session.position();

    session.teleport(&mut scene, far_away(home));
    session.teleport(&mut scene, home);
    assert_eq!(session.registry().active_tiles(), before);
}

#[test]
fn test_walking_keeps_window_and_reports_blocks() {
    let (mut session, mut scene, receiver) = start("QUIET_PINES", 2);
    let _ = receiver.drain();

    let mut blocked_ticks = 0;
    for tick in 0..1_200 {
        let heading = f64::from(tick / 120) * 2.1;
        let outcome = session.tick(&mut scene, 1.0 / 60.0, (heading.cos(), heading.sin()));
        if outcome.blocked {
            blocked_ticks += 1;
        }
        assert_eq!(session.streamer().loaded_count(), 9);
    }

    let blocked_events = receiver
        .drain()
        .into_iter()
        .filter(|e| matches!(e, GameEvent::MovementBlocked { .. }))
        .count();
    assert_eq!(blocked_events, blocked_ticks);
    assert_eq!(session.ticks(), 1_200);
    assert!(session.leaderboard().auth_state().is_authenticated());
}

#[test]
fn test_finish_unloads_everything() {
    let (mut session, mut scene, receiver) = start("EMBER_DUNES", 0);
    let _ = receiver.drain();

    let score = session.finish(&mut scene);
    assert_eq!(score, session.score());
    assert_eq!(scene.live_containers(), 0);
    assert_eq!(scene.live_markers(), 0);
    assert_eq!(session.registry().active_count(), 0);

    let unloaded = receiver
        .drain()
        .into_iter()
        .filter(|e| matches!(e, GameEvent::ChunkUnloaded { .. }))
        .count();
    assert_eq!(unloaded, 9);
}

/// A leaderboard that never authenticates must not stop play.
#[test]
fn test_unavailable_leaderboard_is_tolerated() {
    struct Offline {
        state: wayfarer::AuthState,
    }

    impl Leaderboard for Offline {
        fn initialize(&mut self) -> Result<(), wayfarer::LeaderboardError> {
            Err(wayfarer::LeaderboardError::Unavailable("no network".to_owned()))
        }
        fn poll_authentication(&mut self) -> wayfarer::AuthState {
            wayfarer::AuthState::Unavailable
        }
        fn auth_state(&self) -> &wayfarer::AuthState {
            &self.state
        }
        fn submit_score(&mut self, _: &str, _: u32) -> Result<(), wayfarer::LeaderboardError> {
            Err(wayfarer::LeaderboardError::NotAuthenticated)
        }
    }

    let mut scene = RecordingScene::new();
    let (sender, _receiver) = EventBus::create_pair(4096);
    let mut session = Session::start(
        BiomeRecipe::from_phrase("SALT_MARSH"),
        SessionConfig::default(),
        &mut scene,
        Box::new(Offline {
            state: wayfarer::AuthState::Unavailable,
        }),
        sender,
    )
    .expect("valid world");

    let _ = session.tick(&mut scene, 1.0 / 60.0, (1.0, 0.0));
    assert!(!session.leaderboard().auth_state().is_authenticated());
    assert_eq!(scene.live_containers(), 9);
}

#[test]
fn test_loaded_events_precede_unloaded_events() {
    let (mut session, mut scene, receiver) = start("RAIN_FOX_PEAKS", 0);
    let _ = receiver.drain();

    let home = session.position();
    let report = session.teleport(&mut scene, far_away(home));
    assert_eq!(report.built.len(), 9);
    assert_eq!(report.unloaded.len(), 9);

    let events = receiver.drain();
    let kinds: Vec<bool> = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::ChunkLoaded { .. } => Some(true),
            GameEvent::ChunkUnloaded { .. } => Some(false),
            _ => None,
        })
        .collect();
    assert_eq!(kinds.len(), 18);
    assert!(kinds[..9].iter().all(|loaded| *loaded));
    assert!(kinds[9..].iter().all(|loaded| !*loaded));

    let loaded: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::ChunkLoaded { chunk, .. } => Some(*chunk),
            _ => None,
        })
        .collect();
    assert_eq!(loaded, report.built);
}
