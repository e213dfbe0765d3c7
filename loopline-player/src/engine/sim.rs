//! Simulated engine adapter
//!
//! A clock-driven transport shim: position advances against the wall clock
//! while "playing", scaled by the accepted playback rate. Used by the demo
//! binary and by tests that need a deterministic, inspectable backend.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use crate::engine::EngineAdapter;
use crate::error::{Error, Result};

#[derive(Debug)]
struct Inner {
    media: Option<PathBuf>,
    duration: f64,
    /// Position at the moment the clock last (re)started.
    position: f64,
    /// Set while playing; elapsed time since this instant scales by `rate`.
    started_at: Option<Instant>,
    rate: f64,
    volume: u8,
    muted: bool,
    native_loop: bool,
    fail_loads: bool,
}

impl Inner {
    fn current_time(&self) -> f64 {
        let mut time = self.position;
        if let Some(started_at) = self.started_at {
            time += started_at.elapsed().as_secs_f64() * self.rate;
        }
        if self.duration > 0.0 {
            if self.native_loop {
                time %= self.duration;
            } else {
                time = time.min(self.duration);
            }
        }
        time
    }

    /// Fold the running clock into `position` so rate/transport changes
    /// take effect from the current time.
    fn freeze(&mut self) {
        self.position = self.current_time();
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
    }
}

/// Simulated media engine.
///
/// Clones share the same backend state, so tests and the demo binary can
/// keep a handle for inspection after handing the engine to the player.
#[derive(Debug, Clone)]
pub struct SimulatedEngine {
    inner: Arc<RwLock<Inner>>,
}

impl SimulatedEngine {
    pub fn new(duration: f64) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                media: None,
                duration,
                position: 0.0,
                started_at: None,
                rate: 1.0,
                volume: 100,
                muted: false,
                native_loop: false,
                fail_loads: false,
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Change the simulated media duration.
    pub fn set_media_duration(&self, duration: f64) {
        self.write().duration = duration;
    }

    /// Make subsequent `load` calls fail, simulating a bad path or codec.
    pub fn set_fail_loads(&self, fail: bool) {
        self.write().fail_loads = fail;
    }

    /// Jump the transport clock to an absolute position.
    pub fn set_position(&self, time: f64) {
        let mut inner = self.write();
        inner.position = time;
        if inner.started_at.is_some() {
            inner.started_at = Some(Instant::now());
        }
    }

    pub fn is_playing(&self) -> bool {
        self.read().started_at.is_some()
    }

    pub fn native_loop(&self) -> bool {
        self.read().native_loop
    }

    pub fn volume(&self) -> u8 {
        self.read().volume
    }

    pub fn muted(&self) -> bool {
        self.read().muted
    }

    pub fn rate(&self) -> f64 {
        self.read().rate
    }

    pub fn media_path(&self) -> Option<PathBuf> {
        self.read().media.clone()
    }
}

impl EngineAdapter for SimulatedEngine {
    fn load(&mut self, path: &Path) -> Result<()> {
        let mut inner = self.write();
        if inner.fail_loads {
            return Err(Error::MediaLoad(path.display().to_string()));
        }
        inner.media = Some(path.to_path_buf());
        inner.position = 0.0;
        inner.started_at = None;
        Ok(())
    }

    fn unload(&mut self) {
        let mut inner = self.write();
        inner.media = None;
        inner.position = 0.0;
        inner.started_at = None;
        inner.native_loop = false;
    }

    fn play(&mut self) {
        let mut inner = self.write();
        if inner.started_at.is_none() {
            inner.started_at = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        let mut inner = self.write();
        inner.freeze();
        inner.started_at = None;
    }

    fn stop(&mut self) {
        let mut inner = self.write();
        inner.freeze();
        inner.started_at = None;
    }

    fn seek(&mut self, time: f64) {
        let mut inner = self.write();
        inner.position = if inner.duration > 0.0 {
            time.clamp(0.0, inner.duration)
        } else {
            time.max(0.0)
        };
        if inner.started_at.is_some() {
            inner.started_at = Some(Instant::now());
        }
    }

    fn current_time(&self) -> f64 {
        self.read().current_time()
    }

    fn duration(&self) -> f64 {
        self.read().duration
    }

    fn set_volume(&mut self, volume: u8) {
        self.write().volume = volume.min(100);
    }

    fn set_mute(&mut self, muted: bool) {
        self.write().muted = muted;
    }

    fn try_playback_rate(&mut self, rate: f64) -> f64 {
        let mut inner = self.write();
        inner.freeze();
        inner.rate = rate.clamp(0.25, 4.0);
        inner.rate
    }

    fn set_native_loop(&mut self, looping: bool) {
        self.write().native_loop = looping;
    }

    fn exit(&mut self) {
        self.unload();
    }
}
