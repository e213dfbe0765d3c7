//! Event and command surface for the player
//!
//! Re-exports the shared event types from loopline-common and defines the
//! commands the player consumes. Commands arrive on an mpsc channel and are
//! handled one at a time by the task that owns the player, which is what
//! serializes all state mutation against scheduler ticks.

use std::collections::HashSet;
use std::path::PathBuf;

// ========================================
// Re-exports from loopline-common
// ========================================

pub use loopline_common::events::{
    ErrorKind, EventBus, LooplineEvent, RegionRef, TimeChangeReason,
};

// ========================================
// Commands (consumed by the player)
// ========================================

/// Commands and structural notices the player reacts to.
///
/// Transport commands originate from the UI or remote control surface;
/// structural notices originate from the timeline data model when editing
/// operations change regions the loop may be built on.
#[derive(Debug, Clone)]
pub enum PlayerCommand {
    /// Load media, optionally restricted to a playback window.
    /// A `window_end` of 0.0 means "until the end of the media".
    LoadMedia {
        path: PathBuf,
        window_start: f64,
        window_end: f64,
    },

    /// Unload the current media and reset all state.
    UnloadMedia,

    /// Start (`true`) or pause (`false`) playback.
    TogglePlay { playing: bool },

    /// Stop playback and rewind to the playback start.
    Stop,

    /// Seek to an absolute time.
    Seek { time: f64 },

    /// Seek only if playback is currently paused.
    SeekIfNotPlaying { time: f64 },

    /// Enable looping over the given region selection (empty selection
    /// means "loop the whole media"), or disable looping.
    ToggleLoop {
        looping: bool,
        selection: HashSet<RegionRef>,
    },

    /// Set output volume, 0..=100.
    VolumeChange { volume: u8 },

    /// Mute or unmute output.
    VolumeMute { muted: bool },

    /// Request a playback rate; the accepted rate is reported on the bus.
    PlaybackRateTry { rate: f64 },

    /// Media duration became known (sent by the engine adapter once its
    /// probing completes).
    DurationAvailable { duration: f64 },

    /// Reload only if `media_path` differs from the loaded media.
    RestoreState { media_path: String },

    /// Regions were merged or split: `old` were removed from the timeline,
    /// `new` replaced them.
    RegionMergeSplit {
        new: Vec<RegionRef>,
        old: Vec<RegionRef>,
    },

    /// A region was deleted. `affects_loop` is false for deletions the
    /// timeline already knows cannot involve the loop.
    RegionDeleted {
        region: RegionRef,
        affects_loop: bool,
    },

    /// A region's start/end data was edited.
    RegionDataChanged { region: RegionRef },

    /// Undo was performed; any active loop is silently invalidated.
    Undo,

    /// Redo was performed; any active loop is silently invalidated.
    Redo,
}
