//! Downstream job trigger
//!
//! After a round is saved, a buffering job prepares its audio. Jobs carry an
//! idempotency key so a retried load never buffers twice.

use crate::error::Result;
use crate::model::Lobby;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use vgmq_common::uuid_utils::generate;

pub const LOBBY_QUEUE: &str = "lobby";
pub const BUFFER_MUSIC_JOB: &str = "bufferMusic";

/// Idempotency key of the buffering job for a lobby
pub fn buffer_job_key(code: &str) -> String {
    format!("lobby{}bufferMusic1", code)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    pub queue: String,
    pub name: String,
    /// Second enqueue with the same key is ignored
    pub key: String,
    pub payload: serde_json::Value,
}

impl JobRequest {
    /// Buffer the audio of a lobby's composed round
    pub fn buffer_tracks(lobby: &Lobby) -> Self {
        Self {
            queue: LOBBY_QUEUE.to_string(),
            name: BUFFER_MUSIC_JOB.to_string(),
            key: buffer_job_key(&lobby.code),
            payload: serde_json::json!({ "code": lobby.code, "lobbyId": lobby.id }),
        }
    }
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue `job`; returns false when a job with the same key exists
    async fn enqueue(&self, job: &JobRequest) -> Result<bool>;
}

/// Job queue stored in the `jobs` table
#[derive(Clone)]
pub struct SqliteJobQueue {
    pool: SqlitePool,
}

impl SqliteJobQueue {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobQueue for SqliteJobQueue {
    async fn enqueue(&self, job: &JobRequest) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO jobs (guid, queue, name, job_key, payload)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(generate().to_string())
        .bind(&job.queue)
        .bind(&job.name)
        .bind(&job.key)
        .bind(job.payload.to_string())
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() > 0;
        debug!(key = %job.key, inserted, "Job enqueue");
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DifficultyBands;
    use uuid::Uuid;
    use vgmq_common::events::LobbyStatus;

    #[test]
    fn test_buffer_job_key_format() {
        assert_eq!(buffer_job_key("AB12"), "lobbyAB12bufferMusic1");
    }

    #[test]
    fn test_buffer_tracks_request() {
        let lobby = Lobby {
            id: Uuid::new_v4(),
            code: "QZ7K".to_string(),
            track_count: 10,
            difficulty: DifficultyBands::all(),
            guess_time: 20.0,
            allow_duplicates: false,
            allow_exploration: true,
            reveal_extends_window: false,
            status: LobbyStatus::Loading,
        };

        let job = JobRequest::buffer_tracks(&lobby);
        assert_eq!(job.queue, "lobby");
        assert_eq!(job.name, "bufferMusic");
        assert_eq!(job.key, "lobbyQZ7KbufferMusic1");
        assert_eq!(job.payload["code"], "QZ7K");
    }
}
