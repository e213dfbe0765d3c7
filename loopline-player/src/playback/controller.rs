//! Playback controller
//!
//! Owns transport state, the polling scheduler and seek/stop/unload logic,
//! and delegates loop-window maintenance to the loop engine. All state
//! lives in one task: `run` serializes commands from the mpsc channel with
//! scheduler ticks via `tokio::select!`, so no tick can overlap another
//! tick or a command handler.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use loopline_common::events::{
    ErrorKind, EventBus, LooplineEvent, RegionRef, TimeChangeReason,
};
use loopline_common::time::now;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::PlayerConfig;
use crate::engine::EngineAdapter;
use crate::events::PlayerCommand;
use crate::playback::loop_engine::{LoopEngine, LoopState};
use crate::playback::state::PlaybackState;
use crate::resolver::RegionResolver;

/// Media playback controller.
pub struct Player {
    state: PlaybackState,
    looper: LoopEngine,
    engine: Box<dyn EngineAdapter>,
    bus: EventBus,
    tick: Duration,
}

impl Player {
    pub fn new(
        engine: Box<dyn EngineAdapter>,
        resolver: Arc<dyn RegionResolver>,
        bus: EventBus,
        config: &PlayerConfig,
    ) -> Self {
        let mut player = Self {
            state: PlaybackState::default(),
            looper: LoopEngine::new(resolver, bus.clone(), config.epsilon()),
            engine,
            bus,
            tick: config.tick_interval(),
        };
        player.engine.set_volume(config.volume);
        player
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn loop_state(&self) -> &LoopState {
        self.looper.state()
    }

    /// Load media, stopping current playback first.
    ///
    /// On adapter failure the error is surfaced on the bus and all state is
    /// left unchanged. Duration arrives later through
    /// [`on_duration_available`](Self::on_duration_available).
    pub fn load(&mut self, path: &Path, window_start: f64, window_end: f64) -> bool {
        if self.state.is_playing {
            self.stop();
        }

        if let Err(e) = self.engine.load(path) {
            warn!(path = %path.display(), error = %e, "media load failed");
            self.emit_error(
                ErrorKind::MediaLoadFailed,
                "Media load failed",
                &format!("could not load {}", path.display()),
            );
            return false;
        }

        self.state.media_path = path.display().to_string();
        self.state.playback_start = window_start;
        self.state.window_end = window_end;
        self.state.current_time = 0.0;
        self.state.media_loaded = true;
        info!(path = %self.state.media_path, "media loaded");

        self.bus.emit_lossy(LooplineEvent::MediaLoaded {
            path: self.state.media_path.clone(),
            timestamp: now(),
        });
        self.emit_time_changed(0.0, TimeChangeReason::Load);
        true
    }

    /// Duration became known; the adapter calls this once probing completes.
    pub fn on_duration_available(&mut self, duration: f64) {
        self.state.duration = duration;
        self.state.playback_end = if self.state.window_end > 0.0 {
            self.state.window_end
        } else {
            duration
        };
        debug!(
            duration,
            playback_end = self.state.playback_end,
            "duration available"
        );
        self.bus.emit_lossy(LooplineEvent::DurationAvailable {
            duration,
            timestamp: now(),
        });
    }

    /// Unload the current media. Always succeeds.
    pub fn unload(&mut self) {
        self.engine.unload();
        self.looper.disable(&mut *self.engine);
        self.state.reset();
        info!("media unloaded");
        self.bus.emit_lossy(LooplineEvent::MediaUnloaded {
            timestamp: now(),
        });
    }

    /// Start or pause playback. Starting with a loop active first seeks to
    /// the loop start; the scheduler arms and disarms with `is_playing`.
    pub fn set_playing(&mut self, want_playing: bool) {
        if want_playing && !self.state.media_loaded {
            self.emit_error(
                ErrorKind::NoMediaLoaded,
                "No media loaded",
                "load a media file before playing",
            );
            return;
        }

        if want_playing {
            if self.looper.is_looping() {
                self.seek(self.looper.state().loop_start, false);
            }
            self.engine.play();
            self.state.is_playing = true;
            self.bus.emit_lossy(LooplineEvent::Unpaused {
                timestamp: now(),
            });
        } else {
            self.engine.pause();
            self.state.is_playing = false;
            self.bus.emit_lossy(LooplineEvent::Paused {
                timestamp: now(),
            });
        }
    }

    /// Stop playback and rewind to the playback start. Cancels any active
    /// loop. No-op when already stopped at time zero.
    pub fn stop(&mut self) {
        if !self.state.is_playing && self.state.current_time == 0.0 {
            return;
        }

        self.engine.stop();
        self.state.is_playing = false;

        if self.looper.is_looping() {
            self.looper.disable(&mut *self.engine);
        }

        self.engine.seek(self.state.playback_start);
        self.state.current_time = self.state.playback_start;
        info!("playback stopped");

        self.bus.emit_lossy(LooplineEvent::Stopped {
            timestamp: now(),
        });
        self.emit_time_changed(self.state.current_time, TimeChangeReason::Playback);
    }

    /// Seek to an absolute time. A seek landing outside the loop window
    /// (with epsilon tolerance at the edges) cancels the loop first. This
    /// is the single entry point for external seeks and for the
    /// scheduler's loop wraparound.
    pub fn seek(&mut self, time: f64, only_if_paused: bool) {
        if only_if_paused && self.state.is_playing {
            return;
        }

        if self.state.media_loaded {
            if self.looper.outside_window(time) {
                debug!(time, "seek outside loop window, cancelling loop");
                self.looper.disable(&mut *self.engine);
            }
            self.engine.seek(time);
        }

        self.state.current_time = time;
        self.emit_time_changed(time, TimeChangeReason::Seek);
    }

    /// Enable looping over `selection` (empty set loops the whole media),
    /// or disable looping.
    pub fn toggle_loop(&mut self, looping: bool, selection: HashSet<RegionRef>) {
        if looping {
            self.looper
                .enable(&mut *self.engine, selection, self.state.duration);
        } else {
            self.looper.disable(&mut *self.engine);
        }
    }

    /// Set output volume, clamped to 0..=100.
    pub fn set_volume(&mut self, volume: u8) {
        let volume = volume.min(100);
        self.engine.set_volume(volume);
        self.bus.emit_lossy(LooplineEvent::VolumeChanged {
            volume,
            timestamp: now(),
        });
    }

    pub fn set_mute(&mut self, muted: bool) {
        self.engine.set_mute(muted);
        self.bus.emit_lossy(LooplineEvent::MuteChanged {
            muted,
            timestamp: now(),
        });
    }

    /// Request a playback rate; reports and returns the rate the adapter
    /// accepted.
    pub fn try_playback_rate(&mut self, rate: f64) -> f64 {
        let accepted = self.engine.try_playback_rate(rate);
        self.bus.emit_lossy(LooplineEvent::PlaybackRateChanged {
            rate: accepted,
            timestamp: now(),
        });
        accepted
    }

    /// Reload only when the requested path differs from the loaded media.
    pub fn restore_state(&mut self, media_path: &str) {
        if self.state.media_path == media_path {
            return;
        }
        self.unload();
        self.load(Path::new(media_path), 0.0, 0.0);
    }

    /// One scheduler tick: read the engine clock, wrap at the loop end or
    /// report progress, and stop at the end of the playback window.
    pub fn on_tick(&mut self) {
        self.state.current_time = self.engine.current_time() - self.state.playback_start;

        if self.looper.wraps_at(self.state.current_time) {
            // The seek emits the time change for this tick.
            self.seek(self.looper.state().loop_start, false);
            return;
        }

        self.emit_time_changed(self.state.current_time, TimeChangeReason::Playback);

        if self.state.current_time >= self.state.playback_length() {
            self.stop();
        }
    }

    /// Stop, unload, and release the engine adapter.
    pub fn shutdown(&mut self) {
        info!("player shutting down");
        self.stop();
        self.unload();
        self.engine.exit();
    }

    /// Dispatch one command. Structural notices are routed to the loop
    /// engine; everything else mutates transport state here.
    pub fn handle_command(&mut self, command: PlayerCommand) {
        match command {
            PlayerCommand::LoadMedia {
                path,
                window_start,
                window_end,
            } => {
                self.load(&path, window_start, window_end);
            }
            PlayerCommand::UnloadMedia => self.unload(),
            PlayerCommand::TogglePlay { playing } => self.set_playing(playing),
            PlayerCommand::Stop => self.stop(),
            PlayerCommand::Seek { time } => self.seek(time, false),
            PlayerCommand::SeekIfNotPlaying { time } => self.seek(time, true),
            PlayerCommand::ToggleLoop { looping, selection } => {
                self.toggle_loop(looping, selection)
            }
            PlayerCommand::VolumeChange { volume } => self.set_volume(volume),
            PlayerCommand::VolumeMute { muted } => self.set_mute(muted),
            PlayerCommand::PlaybackRateTry { rate } => {
                self.try_playback_rate(rate);
            }
            PlayerCommand::DurationAvailable { duration } => {
                self.on_duration_available(duration)
            }
            PlayerCommand::RestoreState { media_path } => self.restore_state(&media_path),
            PlayerCommand::RegionMergeSplit { new, old } => {
                self.looper.on_regions_merged_or_split(
                    &mut *self.engine,
                    &new,
                    &old,
                    self.state.duration,
                );
            }
            PlayerCommand::RegionDeleted {
                region,
                affects_loop,
            } => {
                if affects_loop {
                    self.looper
                        .on_region_deleted(&mut *self.engine, region, self.state.duration);
                }
            }
            PlayerCommand::RegionDataChanged { region } => {
                self.looper
                    .on_region_data_changed(&mut *self.engine, region, self.state.duration);
            }
            PlayerCommand::Undo | PlayerCommand::Redo => {
                self.looper.cancel_silent(&mut *self.engine);
            }
        }
    }

    /// Command and scheduler loop. Runs until the command channel closes,
    /// then shuts the player down. The tick branch is gated on
    /// `is_playing`, and `select!` never polls the interval while a
    /// handler runs, so ticks cannot overlap or re-enter.
    pub async fn run(mut self, mut commands: mpsc::Receiver<PlayerCommand>) {
        let mut ticker = interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                _ = ticker.tick(), if self.state.is_playing => self.on_tick(),
            }
        }

        self.shutdown();
    }

    fn emit_time_changed(&self, time: f64, reason: TimeChangeReason) {
        self.bus.emit_lossy(LooplineEvent::TimeChanged {
            time,
            reason,
            timestamp: now(),
        });
    }

    fn emit_error(&self, kind: ErrorKind, title: &str, message: &str) {
        warn!(%kind, detail = message, "surfacing error");
        self.bus.emit_lossy(LooplineEvent::ErrorReported {
            kind,
            title: title.to_string(),
            message: message.to_string(),
            timestamp: now(),
        });
    }
}
