//! Error types for vgmq-lobby
//!
//! Only fatal conditions live here. Slot-level misses that the composer
//! recovers from are `compose::selector::SelectionMiss` and never become an
//! `Error`.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for vgmq-lobby
#[derive(Error, Debug)]
pub enum Error {
    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Errors surfaced by vgmq-common helpers
    #[error(transparent)]
    Common(#[from] vgmq_common::Error),

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog returned data the composer cannot use
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Lobby, track or game not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Lobby settings violate composition preconditions
    #[error("Invalid lobby: {0}")]
    InvalidLobby(String),

    /// No host or player to own slots
    #[error("No eligible players in lobby")]
    NoEligiblePlayers,

    /// Fewer than the required hint choices exist in the whole catalog
    #[error("Insufficient hint pool for track {track_id}: found {found} of {needed} choices")]
    InsufficientHintPool {
        track_id: Uuid,
        found: usize,
        needed: usize,
    },

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using vgmq-lobby Error
pub type Result<T> = std::result::Result<T, Error>;
