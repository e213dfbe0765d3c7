//! Configuration for the player
//!
//! TOML bootstrap settings with built-in defaults. The scheduler tick
//! interval also determines the epsilon guard used for loop boundary
//! snapping and seek tolerance near loop edges.
//!
//! Resolution priority:
//! 1. Explicit config file path
//! 2. `LOOPLINE_CONFIG` environment variable
//! 3. Built-in defaults (code constants)

use loopline_common::time::millis_to_duration;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

/// Player configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerConfig {
    /// Scheduler tick interval in milliseconds while media plays
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Event bus channel capacity
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Initial output volume, 0..=100
    #[serde(default = "default_volume")]
    pub volume: u8,
}

fn default_tick_interval_ms() -> u64 {
    100
}

fn default_event_capacity() -> usize {
    256
}

fn default_volume() -> u8 {
    75
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            event_capacity: default_event_capacity(),
            volume: default_volume(),
        }
    }
}

impl PlayerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), ?config, "loaded configuration");
        Ok(config)
    }

    /// Resolve configuration: explicit path, then `LOOPLINE_CONFIG`,
    /// then built-in defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        if let Ok(env_path) = std::env::var("LOOPLINE_CONFIG") {
            return Self::load(Path::new(&env_path));
        }
        Ok(Self::default())
    }

    /// Scheduler tick interval as a Duration.
    pub fn tick_interval(&self) -> Duration {
        millis_to_duration(self.tick_interval_ms)
    }

    /// Epsilon guard in seconds: two ticks of slack, keeping the snap
    /// window just larger than one tick's time-advance.
    pub fn epsilon(&self) -> f64 {
        self.tick_interval_ms as f64 * 2.0 / 1000.0
    }
}
