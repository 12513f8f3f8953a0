//! Event types for the VGMQ event system
//!
//! Provides shared event definitions and EventBus for the lobby services.

mod lobby_types;

pub use lobby_types::{EmptyReason, LobbyStatus};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// VGMQ event types
///
/// Events are broadcast via EventBus and serialized for the lobby's
/// websocket room by the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VgmqEvent {
    /// Lobby status changed
    ///
    /// Triggers:
    /// - Lobby room: refresh lobby header
    /// - Lobby list: refresh listing
    LobbyStatusChanged {
        /// Lobby UUID
        lobby_id: Uuid,
        /// Lobby join code
        code: String,
        /// Status after change
        status: LobbyStatus,
        /// When status changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Round composition progress
    ///
    /// Emitted once per filled slot. Lossy: composition never waits on it.
    LobbyLoadProgress {
        /// Lobby UUID
        lobby_id: Uuid,
        /// Filled slots as a percentage of the requested track count
        percent: u8,
        /// Progress timestamp
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Composition finished without any entry
    ///
    /// Triggers:
    /// - Lobby room: toast with `reason.message()`
    LobbyEmpty {
        /// Lobby UUID
        lobby_id: Uuid,
        /// Why nothing was composed
        reason: EmptyReason,
        /// When composition ended
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Round composed and persisted
    RoundComposed {
        /// Lobby UUID
        lobby_id: Uuid,
        /// Number of entries in the playlist
        entry_count: usize,
        /// When the round was saved
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Composition aborted on an internal error
    CompositionFailed {
        /// Lobby UUID
        lobby_id: Uuid,
        /// Error description
        error: String,
        /// When composition aborted
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl VgmqEvent {
    /// Event name, matching the serde tag
    pub fn event_type(&self) -> &str {
        match self {
            VgmqEvent::LobbyStatusChanged { .. } => "LobbyStatusChanged",
            VgmqEvent::LobbyLoadProgress { .. } => "LobbyLoadProgress",
            VgmqEvent::LobbyEmpty { .. } => "LobbyEmpty",
            VgmqEvent::RoundComposed { .. } => "RoundComposed",
            VgmqEvent::CompositionFailed { .. } => "CompositionFailed",
        }
    }

    /// Lobby the event belongs to
    pub fn lobby_id(&self) -> Uuid {
        match self {
            VgmqEvent::LobbyStatusChanged { lobby_id, .. }
            | VgmqEvent::LobbyLoadProgress { lobby_id, .. }
            | VgmqEvent::LobbyEmpty { lobby_id, .. }
            | VgmqEvent::RoundComposed { lobby_id, .. }
            | VgmqEvent::CompositionFailed { lobby_id, .. } => *lobby_id,
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
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
/// use vgmq_common::events::{EventBus, VgmqEvent};
/// use std::sync::Arc;
/// use uuid::Uuid;
///
/// let event_bus = Arc::new(EventBus::new(100));
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(VgmqEvent::LobbyLoadProgress {
///     lobby_id: Uuid::new_v4(),
///     percent: 50,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert_eq!(rx.try_recv().unwrap().event_type(), "LobbyLoadProgress");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<VgmqEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<VgmqEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: VgmqEvent,
    ) -> Result<usize, broadcast::error::SendError<VgmqEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Used for progress notifications, which are fire-and-forget.
    pub fn emit_lossy(&self, event: VgmqEvent) {
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
