//! # Loopline Player Library
//!
//! Media playback controller with a loop-region engine.
//!
//! **Purpose:** own transport state (loaded/playing/paused/stopped), drive a
//! periodic scheduler while media plays, and repeat a playback span derived
//! from a dynamic, possibly multi-part selection of externally-owned timeline
//! regions while that selection is concurrently edited.
//!
//! **Architecture:** a single task owns all controller and loop state; it
//! serializes commands from an mpsc channel with scheduler ticks via
//! `tokio::select!`, and broadcasts state-change notifications on the
//! [`EventBus`](loopline_common::events::EventBus). The concrete media
//! backend sits behind the [`EngineAdapter`](engine::EngineAdapter) trait;
//! timeline regions are reached through the
//! [`RegionResolver`](resolver::RegionResolver) trait.

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod playback;
pub mod resolver;

pub use error::{Error, Result};
pub use playback::Player;
