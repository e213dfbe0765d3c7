//! Player command-loop integration tests
//!
//! Drives the player the way the application does: commands in through the
//! mpsc channel, notifications out through the event bus, with the player
//! task owning all state. The simulated engine advances against the wall
//! clock, so scheduler assertions use generous margins.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::Receiver;
use tokio::sync::mpsc;
use uuid::Uuid;

use loopline_common::events::{EventBus, LooplineEvent, RegionRef, TimeChangeReason};
use loopline_player::config::PlayerConfig;
use loopline_player::engine::{EngineAdapter, SimulatedEngine};
use loopline_player::events::PlayerCommand;
use loopline_player::resolver::MemoryResolver;
use loopline_player::Player;

const DURATION: f64 = 60.0;

struct Harness {
    tx: mpsc::Sender<PlayerCommand>,
    rx: Receiver<LooplineEvent>,
    engine: SimulatedEngine,
    resolver: Arc<MemoryResolver>,
    task: tokio::task::JoinHandle<()>,
}

fn spawn_player() -> Harness {
    let config = PlayerConfig {
        tick_interval_ms: 10,
        ..PlayerConfig::default()
    };
    let engine = SimulatedEngine::new(DURATION);
    let resolver = Arc::new(MemoryResolver::new());
    let bus = EventBus::new(config.event_capacity);
    let rx = bus.subscribe();
    let player = Player::new(
        Box::new(engine.clone()),
        resolver.clone(),
        bus,
        &config,
    );

    let (tx, commands) = mpsc::channel(32);
    let task = tokio::spawn(player.run(commands));

    Harness {
        tx,
        rx,
        engine,
        resolver,
        task,
    }
}

async fn load_media(harness: &Harness) {
    harness
        .tx
        .send(PlayerCommand::LoadMedia {
            path: PathBuf::from("media/test.ogg"),
            window_start: 0.0,
            window_end: 0.0,
        })
        .await
        .unwrap();
    harness
        .tx
        .send(PlayerCommand::DurationAvailable { duration: DURATION })
        .await
        .unwrap();
}

fn region(resolver: &MemoryResolver, start: f64, end: f64) -> RegionRef {
    let r = RegionRef::new(Uuid::new_v4(), Uuid::new_v4());
    resolver.insert(r, start, end);
    r
}

fn drain(rx: &mut Receiver<LooplineEvent>) -> Vec<LooplineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_transport_round_trip() {
    let mut harness = spawn_player();
    load_media(&harness).await;

    harness
        .tx
        .send(PlayerCommand::TogglePlay { playing: true })
        .await
        .unwrap();

    // Let the scheduler tick a few times.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(harness.engine.is_playing());

    harness.tx.send(PlayerCommand::Stop).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let events = drain(&mut harness.rx);
    let types: Vec<&str> = events.iter().map(|e| e.event_type()).collect();

    assert!(types.contains(&"MediaLoaded"));
    assert!(types.contains(&"DurationAvailable"));
    assert!(types.contains(&"Unpaused"));
    assert!(types.contains(&"Stopped"));

    // Scheduler progress was reported while playing.
    let playback_ticks = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                LooplineEvent::TimeChanged {
                    reason: TimeChangeReason::Playback,
                    ..
                }
            )
        })
        .count();
    assert!(playback_ticks >= 1, "expected scheduler progress events");

    assert!(!harness.engine.is_playing());
    assert_eq!(harness.engine.current_time(), 0.0);

    drop(harness.tx);
    harness.task.await.unwrap();
}

#[tokio::test]
async fn test_loop_lifecycle_over_commands() {
    let mut harness = spawn_player();
    load_media(&harness).await;

    let a = region(&harness.resolver, 0.0, 2.0);
    let b = region(&harness.resolver, 2.0, 5.0);
    harness
        .tx
        .send(PlayerCommand::ToggleLoop {
            looping: true,
            selection: HashSet::from([a, b]),
        })
        .await
        .unwrap();

    // Wait for the enable to land before editing the timeline under it.
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Delete one element; the loop shrinks to the remainder.
    harness.resolver.remove(b);
    harness
        .tx
        .send(PlayerCommand::RegionDeleted {
            region: b,
            affects_loop: true,
        })
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;

    let events = drain(&mut harness.rx);
    let loop_changes: Vec<(f64, f64)> = events
        .iter()
        .filter_map(|e| match e {
            LooplineEvent::LoopChanged { start, end, .. } => Some((*start, *end)),
            _ => None,
        })
        .collect();
    assert_eq!(loop_changes, [(0.0, 5.0), (0.0, 2.0)]);
    assert!(harness.resolver.is_looped(a));
    assert!(!harness.resolver.is_looped(b));

    // Undo invalidates the loop silently: flags drop, no loop events.
    harness.tx.send(PlayerCommand::Undo).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(harness.resolver.looped_count(), 0);
    assert!(drain(&mut harness.rx).is_empty());

    drop(harness.tx);
    harness.task.await.unwrap();
}

#[tokio::test]
async fn test_whole_media_loop_uses_native_flag() {
    let mut harness = spawn_player();
    load_media(&harness).await;

    harness
        .tx
        .send(PlayerCommand::ToggleLoop {
            looping: true,
            selection: HashSet::new(),
        })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(harness.engine.native_loop());
    let events = drain(&mut harness.rx);
    let bounds = events.iter().find_map(|e| match e {
        LooplineEvent::LoopChanged { start, end, .. } => Some((*start, *end)),
        _ => None,
    });
    assert_eq!(bounds, Some((0.0, DURATION)));

    harness
        .tx
        .send(PlayerCommand::ToggleLoop {
            looping: false,
            selection: HashSet::new(),
        })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!harness.engine.native_loop());

    drop(harness.tx);
    harness.task.await.unwrap();
}

#[tokio::test]
async fn test_channel_close_shuts_player_down() {
    let harness = spawn_player();
    load_media(&harness).await;
    harness
        .tx
        .send(PlayerCommand::TogglePlay { playing: true })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    let Harness {
        tx, task, engine, ..
    } = harness;
    drop(tx);
    task.await.unwrap();

    // Shutdown stopped and unloaded the media.
    assert!(!engine.is_playing());
    assert_eq!(engine.media_path(), None);
}

#[tokio::test]
async fn test_seek_outside_loop_cancels_via_commands() {
    let mut harness = spawn_player();
    load_media(&harness).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    drain(&mut harness.rx);

    let a = region(&harness.resolver, 1.0, 5.0);
    harness
        .tx
        .send(PlayerCommand::ToggleLoop {
            looping: true,
            selection: HashSet::from([a]),
        })
        .await
        .unwrap();
    harness
        .tx
        .send(PlayerCommand::Seek { time: 20.0 })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let events = drain(&mut harness.rx);
    let types: Vec<&str> = events.iter().map(|e| e.event_type()).collect();
    // Enable pair, then the cancel pair, then the seek's time change.
    assert_eq!(
        types,
        [
            "LoopToggled",
            "LoopChanged",
            "LoopToggled",
            "LoopChanged",
            "TimeChanged"
        ]
    );
    assert_eq!(harness.resolver.looped_count(), 0);

    drop(harness.tx);
    harness.task.await.unwrap();
}
