//! Event types and EventBus for the Loopline notification system
//!
//! Loopline uses hybrid communication:
//! - **EventBus** (tokio::broadcast): one-to-many state-change notifications
//! - **Command channels** (tokio::mpsc): command → single handler
//!
//! Within one command or scheduler tick, state mutation happens before the
//! corresponding notifications are emitted, and toggle-style notifications
//! precede their companion range/value notification (for example
//! `LoopToggled` before `LoopChanged`).

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Weak reference to an externally-owned timeline region.
///
/// The player never holds an owning handle to a region: regions can be
/// deleted out from under an active loop, so they are resolved on demand
/// through the region resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionRef {
    pub timeline_id: Uuid,
    pub region_id: Uuid,
}

impl RegionRef {
    pub fn new(timeline_id: Uuid, region_id: Uuid) -> Self {
        Self {
            timeline_id,
            region_id,
        }
    }
}

/// Why the current playback time changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeChangeReason {
    /// Scheduler tick during playback (including the stop at end of media)
    Playback,
    /// Explicit seek, external or loop wraparound
    Seek,
    /// Media was just loaded
    Load,
}

impl std::fmt::Display for TimeChangeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeChangeReason::Playback => write!(f, "playback"),
            TimeChangeReason::Seek => write!(f, "seek"),
            TimeChangeReason::Load => write!(f, "load"),
        }
    }
}

/// Classification of user-visible error conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A command requiring loaded media was issued with none loaded
    NoMediaLoaded,
    /// The engine adapter failed to load the requested media
    MediaLoadFailed,
    /// A loop was requested over a non-contiguous region selection
    LoopDiscontinuous,
    /// Operation unsupported on the current platform or media type
    Unsupported,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NoMediaLoaded => write!(f, "no_media_loaded"),
            ErrorKind::MediaLoadFailed => write!(f, "media_load_failed"),
            ErrorKind::LoopDiscontinuous => write!(f, "loop_discontinuous"),
            ErrorKind::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Loopline event types
///
/// Events are broadcast via EventBus and can be serialized for transmission
/// to out-of-process observers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LooplineEvent {
    /// Media was loaded into the engine adapter
    MediaLoaded {
        path: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Media duration became known (adapter probing is asynchronous)
    DurationAvailable {
        duration: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Current playback time changed
    TimeChanged {
        time: f64,
        reason: TimeChangeReason,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback was paused
    Paused {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback was started or resumed
    Unpaused {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback was stopped and rewound to the playback start
    Stopped {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Media was unloaded; all transport and loop state was reset
    MediaUnloaded {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Loop mode was switched on or off
    LoopToggled {
        looping: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Active loop window changed; (0, 0) when no loop is active
    LoopChanged {
        start: f64,
        end: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback volume changed (0..=100)
    VolumeChanged {
        volume: u8,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Mute state changed
    MuteChanged {
        muted: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback rate changed to the adapter-accepted value
    PlaybackRateChanged {
        rate: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// User-visible error condition
    ErrorReported {
        kind: ErrorKind,
        title: String,
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl LooplineEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            LooplineEvent::MediaLoaded { .. } => "MediaLoaded",
            LooplineEvent::DurationAvailable { .. } => "DurationAvailable",
            LooplineEvent::TimeChanged { .. } => "TimeChanged",
            LooplineEvent::Paused { .. } => "Paused",
            LooplineEvent::Unpaused { .. } => "Unpaused",
            LooplineEvent::Stopped { .. } => "Stopped",
            LooplineEvent::MediaUnloaded { .. } => "MediaUnloaded",
            LooplineEvent::LoopToggled { .. } => "LoopToggled",
            LooplineEvent::LoopChanged { .. } => "LoopChanged",
            LooplineEvent::VolumeChanged { .. } => "VolumeChanged",
            LooplineEvent::MuteChanged { .. } => "MuteChanged",
            LooplineEvent::PlaybackRateChanged { .. } => "PlaybackRateChanged",
            LooplineEvent::ErrorReported { .. } => "ErrorReported",
        }
    }
}

/// Event bus for one-to-many event broadcasting
///
/// Wraps tokio::sync::broadcast. Subscribers receive all events emitted
/// after subscription; slow subscribers may observe lagged errors, never
/// blocked senders.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LooplineEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use loopline_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(256);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<LooplineEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: LooplineEvent,
    ) -> Result<usize, broadcast::error::SendError<LooplineEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// The player runs headless-capable: every notification it produces is
    /// acceptable to drop when no observer is attached.
    pub fn emit_lossy(&self, event: LooplineEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
