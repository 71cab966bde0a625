//! Event types for the Level Up Live event system
//!
//! Provides the shared notification enum and the EventBus every service
//! publishes through.

mod sound_types;
mod xp_types;

pub use sound_types::{CueMetadata, SoundCue, SoundCueKind};
pub use xp_types::{XpEvent, XpSource, XpState, XpStatus};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Level Up Live event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
/// All notifications use this central enum so consumers get exhaustive
/// matching instead of string event names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LiveEvent {
    /// XP was granted
    ///
    /// Triggers:
    /// - SSE: Update XP bar, combo counter and floating "+N XP" text
    XpAdded {
        /// Final XP granted
        xp: u64,
        /// XP before multipliers
        base_xp: u64,
        /// Combined multiplier applied (1.0 for fixed grants)
        multiplier: f64,
        /// Combo count after this grant
        combo_count: u32,
        /// State after the grant, including any level-ups it caused
        status: XpStatus,
        timestamp: DateTime<Utc>,
    },

    /// A level threshold was crossed
    ///
    /// Emitted once per level crossed, in increasing level order.
    ///
    /// Triggers:
    /// - SSE: Stage swaps to the new level's scene
    LevelUp {
        new_level: u32,
        /// Cumulative XP at the moment of the level-up
        xp: u64,
        state: XpState,
        timestamp: DateTime<Utc>,
    },

    /// Combo expired during a lull
    ComboDecay {
        /// Always 0 after a decay
        combo_count: u32,
        /// Combo count that expired
        previous_combo: u32,
        timestamp: DateTime<Utc>,
    },

    /// XP session was reset to level 1
    SessionReset {
        status: XpStatus,
        timestamp: DateTime<Utc>,
    },

    /// Level thresholds were reloaded from the catalog
    ///
    /// Triggers:
    /// - SSE: Level editor and stage refetch level definitions
    LevelsChanged {
        /// Number of levels in the catalog
        level_count: usize,
        /// Highest level reachable with the loaded thresholds
        max_level: u32,
        timestamp: DateTime<Utc>,
    },

    /// Live session started
    SessionStarted {
        session_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Live session stopped and its summary persisted
    SessionStopped {
        session_id: String,
        final_level: u32,
        total_xp: u64,
        duration_seconds: i64,
        timestamp: DateTime<Utc>,
    },

    /// A sound cue should be played by connected clients
    SoundTriggered {
        cue: SoundCue,
        timestamp: DateTime<Utc>,
    },
}

impl LiveEvent {
    /// Get event type as string for filtering and SSE event names
    pub fn event_type(&self) -> &'static str {
        match self {
            LiveEvent::XpAdded { .. } => "XpAdded",
            LiveEvent::LevelUp { .. } => "LevelUp",
            LiveEvent::ComboDecay { .. } => "ComboDecay",
            LiveEvent::SessionReset { .. } => "SessionReset",
            LiveEvent::LevelsChanged { .. } => "LevelsChanged",
            LiveEvent::SessionStarted { .. } => "SessionStarted",
            LiveEvent::SessionStopped { .. } => "SessionStopped",
            LiveEvent::SoundTriggered { cue, .. } => cue.kind.event_name(),
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus for application-wide events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use levelup_common::events::{EventBus, LiveEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(LiveEvent::SessionStarted {
///     session_id: "s-1".to_string(),
///     timestamp: chrono::Utc::now(),
/// });
///
/// let received = rx.try_recv().unwrap();
/// assert_eq!(received.event_type(), "SessionStarted");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LiveEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// * `capacity` - Number of events to buffer before slow subscribers lag
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: LiveEvent) -> Result<usize, broadcast::error::SendError<LiveEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Broadcasts are side effects of XP mutations and must never fail them.
    pub fn emit_lossy(&self, event: LiveEvent) {
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
