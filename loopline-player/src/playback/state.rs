//! Playback transport state

/// Transport state owned exclusively by the playback controller.
///
/// Invariants: `is_playing` implies `media_loaded`; `current_time` is
/// meaningful only while media is loaded; `playback_end >= playback_start`
/// once the duration is known.
#[derive(Debug, Clone, Default)]
pub struct PlaybackState {
    pub media_loaded: bool,
    /// Empty string means no media.
    pub media_path: String,
    /// 0.0 until the adapter reports it.
    pub duration: f64,
    pub playback_start: f64,
    pub playback_end: f64,
    /// Requested window end from `load`, applied once the duration is
    /// known; 0.0 means "until the end of the media".
    pub(crate) window_end: f64,
    pub current_time: f64,
    pub is_playing: bool,
}

impl PlaybackState {
    /// Length of the playable window.
    pub fn playback_length(&self) -> f64 {
        self.playback_end - self.playback_start
    }

    /// Back to the initial (no media) state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
