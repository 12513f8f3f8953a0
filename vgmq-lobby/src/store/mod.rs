//! Lobby persistence
//!
//! The composer never writes; the loader hands a finished playlist to a
//! [`LobbyStore`] in one call.

pub mod sqlite;

pub use sqlite::SqliteLobbyStore;

use crate::error::Result;
use crate::model::{Lobby, Player, RoundEntry};
use async_trait::async_trait;
use uuid::Uuid;
use vgmq_common::events::LobbyStatus;

#[async_trait]
pub trait LobbyStore: Send + Sync {
    /// Lobby settings, `NotFound` when the lobby does not exist
    async fn load_lobby(&self, lobby_id: Uuid) -> Result<Lobby>;

    /// Connected lobby members whose role participates in composition
    async fn participants(&self, lobby_id: Uuid) -> Result<Vec<Player>>;

    /// Replace the lobby's playlist with `entries` atomically
    async fn save_composed_round(&self, lobby_id: Uuid, entries: &[RoundEntry]) -> Result<()>;

    async fn set_status(&self, lobby_id: Uuid, status: LobbyStatus) -> Result<()>;

    async fn mark_waiting(&self, lobby_id: Uuid) -> Result<()> {
        self.set_status(lobby_id, LobbyStatus::Waiting).await
    }

    async fn mark_loading(&self, lobby_id: Uuid) -> Result<()> {
        self.set_status(lobby_id, LobbyStatus::Loading).await
    }

    async fn mark_playing(&self, lobby_id: Uuid) -> Result<()> {
        self.set_status(lobby_id, LobbyStatus::Playing).await
    }
}
