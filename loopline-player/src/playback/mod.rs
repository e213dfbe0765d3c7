//! Playback controller and loop-region engine

pub mod continuity;
pub mod controller;
pub mod loop_engine;
pub mod state;

pub use controller::Player;
pub use loop_engine::{LoopEngine, LoopState};
pub use state::PlaybackState;
