//! Loopline player - headless demo binary
//!
//! Drives the playback controller against the simulated engine from a
//! stdin command prompt. Useful for exercising transport and loop-region
//! behavior without a media backend.
//!
//! Commands:
//!   load <path>         load media (duration comes from --duration)
//!   play | pause | stop
//!   seek <secs>
//!   rate <rate>         request a playback rate
//!   vol <0-100>
//!   mute <on|off>
//!   region <start> <end>   add a timeline region, prints its index
//!   loop [idx...]       loop over regions (no indices: whole media)
//!   unloop
//!   delete <idx>        delete a region
//!   undo | redo
//!   unload
//!   quit

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use loopline_common::events::{EventBus, RegionRef};
use loopline_player::config::PlayerConfig;
use loopline_player::engine::SimulatedEngine;
use loopline_player::events::PlayerCommand;
use loopline_player::resolver::MemoryResolver;
use loopline_player::Player;

/// Command-line arguments for loopline-player
#[derive(Parser, Debug)]
#[command(name = "loopline-player")]
#[command(about = "Headless playback controller demo for Loopline")]
#[command(version)]
struct Args {
    /// Scheduler tick interval in milliseconds
    #[arg(long, env = "LOOPLINE_TICK_MS")]
    tick_ms: Option<u64>,

    /// Simulated media duration in seconds
    #[arg(long, default_value = "60.0")]
    duration: f64,

    /// Optional TOML config file
    #[arg(short, long, env = "LOOPLINE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loopline_player=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config =
        PlayerConfig::resolve(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(tick_ms) = args.tick_ms {
        config.tick_interval_ms = tick_ms;
    }

    info!(
        tick_ms = config.tick_interval_ms,
        duration = args.duration,
        "starting loopline player demo"
    );

    let engine = SimulatedEngine::new(args.duration);
    let resolver = Arc::new(MemoryResolver::new());
    let bus = EventBus::new(config.event_capacity);

    // Print every notification the player produces.
    let mut events = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => println!("<- {json}"),
                    Err(e) => eprintln!("event serialization failed: {e}"),
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let player = Player::new(Box::new(engine), resolver.clone(), bus, &config);
    let (tx, rx) = mpsc::channel::<PlayerCommand>(32);
    let player_task = tokio::spawn(player.run(rx));

    let media_duration = args.duration;
    let mut regions: Vec<RegionRef> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("stdin read failed")? {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let command = match parts.as_slice() {
            [] => continue,
            ["quit"] | ["exit"] => break,
            ["load", path] => {
                // The simulated engine probes instantly; report the duration
                // right behind the load like a real adapter would.
                let load = PlayerCommand::LoadMedia {
                    path: PathBuf::from(path),
                    window_start: 0.0,
                    window_end: 0.0,
                };
                tx.send(load).await?;
                PlayerCommand::DurationAvailable {
                    duration: media_duration,
                }
            }
            ["play"] => PlayerCommand::TogglePlay { playing: true },
            ["pause"] => PlayerCommand::TogglePlay { playing: false },
            ["stop"] => PlayerCommand::Stop,
            ["seek", time] => match time.parse() {
                Ok(time) => PlayerCommand::Seek { time },
                Err(_) => {
                    eprintln!("usage: seek <secs>");
                    continue;
                }
            },
            ["rate", rate] => match rate.parse() {
                Ok(rate) => PlayerCommand::PlaybackRateTry { rate },
                Err(_) => {
                    eprintln!("usage: rate <rate>");
                    continue;
                }
            },
            ["vol", volume] => match volume.parse() {
                Ok(volume) => PlayerCommand::VolumeChange { volume },
                Err(_) => {
                    eprintln!("usage: vol <0-100>");
                    continue;
                }
            },
            ["mute", state @ ("on" | "off")] => PlayerCommand::VolumeMute {
                muted: *state == "on",
            },
            ["region", start, end] => {
                match (start.parse::<f64>(), end.parse::<f64>()) {
                    (Ok(start), Ok(end)) if start <= end => {
                        let region = RegionRef::new(Uuid::new_v4(), Uuid::new_v4());
                        resolver.insert(region, start, end);
                        regions.push(region);
                        println!("region #{} = [{start}, {end}]", regions.len() - 1);
                    }
                    _ => eprintln!("usage: region <start> <end>"),
                }
                continue;
            }
            ["loop", indices @ ..] => {
                let mut selection = std::collections::HashSet::new();
                let mut valid = true;
                for index in indices {
                    match index.parse::<usize>().ok().and_then(|i| regions.get(i)) {
                        Some(&region) => {
                            selection.insert(region);
                        }
                        None => {
                            eprintln!("unknown region index: {index}");
                            valid = false;
                        }
                    }
                }
                if !valid {
                    continue;
                }
                PlayerCommand::ToggleLoop {
                    looping: true,
                    selection,
                }
            }
            ["unloop"] => PlayerCommand::ToggleLoop {
                looping: false,
                selection: Default::default(),
            },
            ["delete", index] => {
                match index.parse::<usize>().ok().and_then(|i| regions.get(i)) {
                    Some(&region) => {
                        resolver.remove(region);
                        PlayerCommand::RegionDeleted {
                            region,
                            affects_loop: true,
                        }
                    }
                    None => {
                        eprintln!("unknown region index: {index}");
                        continue;
                    }
                }
            }
            ["undo"] => PlayerCommand::Undo,
            ["redo"] => PlayerCommand::Redo,
            ["unload"] => PlayerCommand::UnloadMedia,
            _ => {
                eprintln!("unknown command: {line}");
                continue;
            }
        };
        tx.send(command).await?;
    }

    // Closing the channel shuts the player down.
    drop(tx);
    player_task.await.context("player task panicked")?;
    info!("demo finished");
    Ok(())
}
