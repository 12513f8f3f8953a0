//! SQLite lobby store

use super::LobbyStore;
use crate::error::{Error, Result};
use crate::model::{DifficultyBands, Lobby, Player, PlayerRole, RoundEntry};
use async_trait::async_trait;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::{debug, warn};
use uuid::Uuid;
use vgmq_common::events::LobbyStatus;
use vgmq_common::uuid_utils::{generate, parse_guid};

#[derive(Clone)]
pub struct SqliteLobbyStore {
    pool: SqlitePool,
}

impl SqliteLobbyStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn insert_entry(
        tx: &mut Transaction<'_, Sqlite>,
        lobby_id: Uuid,
        entry: &RoundEntry,
    ) -> Result<()> {
        let lobby_track_id = generate();

        sqlx::query(
            r#"
            INSERT INTO lobby_tracks (guid, lobby_id, track_id, position, start_at, end_at, exploration)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(lobby_track_id.to_string())
        .bind(lobby_id.to_string())
        .bind(entry.track.id.to_string())
        .bind(entry.position as i64)
        .bind(entry.start_at)
        .bind(entry.end_at)
        .bind(entry.exploration)
        .execute(&mut **tx)
        .await?;

        for game in &entry.accepted_answers {
            sqlx::query("INSERT INTO lobby_track_answers (lobby_track_id, game_id) VALUES (?, ?)")
                .bind(lobby_track_id.to_string())
                .bind(game.id.to_string())
                .execute(&mut **tx)
                .await?;
        }

        for (ordinal, game) in entry.hint_games.iter().enumerate() {
            sqlx::query(
                "INSERT INTO lobby_track_hints (lobby_track_id, game_id, ordinal) VALUES (?, ?, ?)",
            )
            .bind(lobby_track_id.to_string())
            .bind(game.id.to_string())
            .bind(ordinal as i64)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl LobbyStore for SqliteLobbyStore {
    async fn load_lobby(&self, lobby_id: Uuid) -> Result<Lobby> {
        let row = sqlx::query(
            r#"
            SELECT guid, code, track_count, difficulty, guess_time, allow_duplicates,
                   allow_exploration, reveal_extends_window, status
            FROM lobbies
            WHERE guid = ?
            "#,
        )
        .bind(lobby_id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("lobby {}", lobby_id)))?;

        let status: String = row.get("status");
        let track_count: i64 = row.get("track_count");

        Ok(Lobby {
            id: parse_guid("lobbies.guid", &row.get::<String, _>("guid"))?,
            code: row.get("code"),
            track_count: u32::try_from(track_count)
                .map_err(|_| Error::InvalidLobby(format!("track count {}", track_count)))?,
            difficulty: DifficultyBands::parse(&row.get::<String, _>("difficulty"))?,
            guess_time: row.get("guess_time"),
            allow_duplicates: row.get::<i64, _>("allow_duplicates") != 0,
            allow_exploration: row.get::<i64, _>("allow_exploration") != 0,
            reveal_extends_window: row.get::<i64, _>("reveal_extends_window") != 0,
            status: LobbyStatus::from_str(&status)
                .ok_or_else(|| Error::InvalidLobby(format!("unknown status '{}'", status)))?,
        })
    }

    async fn participants(&self, lobby_id: Uuid) -> Result<Vec<Player>> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, role
            FROM lobby_users
            WHERE lobby_id = ? AND disconnected = 0
            ORDER BY user_id
            "#,
        )
        .bind(lobby_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut players = Vec::with_capacity(rows.len());
        for row in rows {
            let role: String = row.get("role");
            let Some(role) = PlayerRole::from_str(&role) else {
                warn!(%lobby_id, role = %role, "Skipping lobby user with unknown role");
                continue;
            };
            if !role.participates() {
                continue;
            }
            players.push(Player {
                id: parse_guid("lobby_users.user_id", &row.get::<String, _>("user_id"))?,
                role,
            });
        }

        Ok(players)
    }

    async fn save_composed_round(&self, lobby_id: Uuid, entries: &[RoundEntry]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // Answer and hint rows cascade with their lobby track
        sqlx::query("DELETE FROM lobby_tracks WHERE lobby_id = ?")
            .bind(lobby_id.to_string())
            .execute(&mut *tx)
            .await?;

        for entry in entries {
            Self::insert_entry(&mut tx, lobby_id, entry).await?;
        }

        tx.commit().await?;

        debug!(%lobby_id, entries = entries.len(), "Composed round saved");
        Ok(())
    }

    async fn set_status(&self, lobby_id: Uuid, status: LobbyStatus) -> Result<()> {
        let result = sqlx::query(
            "UPDATE lobbies SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
        )
        .bind(status.as_str())
        .bind(lobby_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("lobby {}", lobby_id)));
        }
        Ok(())
    }
}
