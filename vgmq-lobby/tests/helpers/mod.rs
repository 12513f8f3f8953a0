//! Shared fixtures: a file-backed temporary database and seeding helpers

#![allow(dead_code)]

use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::broadcast;
use uuid::Uuid;
use vgmq_common::db::init_database;
use vgmq_common::events::{EventBus, VgmqEvent};

pub struct TestDb {
    _dir: TempDir,
    pub pool: SqlitePool,
}

impl TestDb {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("vgmq.db")).await.unwrap();
        Self { _dir: dir, pool }
    }
}

pub async fn add_user(pool: &SqlitePool, username: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (guid, username) VALUES (?, ?)")
        .bind(id.to_string())
        .bind(username)
        .execute(pool)
        .await
        .unwrap();
    id
}

pub async fn add_game(pool: &SqlitePool, name: &str, enabled: bool) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO games (guid, name, enabled) VALUES (?, ?, ?)")
        .bind(id.to_string())
        .bind(name)
        .bind(enabled)
        .execute(pool)
        .await
        .unwrap();
    id
}

pub async fn own(pool: &SqlitePool, game: Uuid, user: Uuid) {
    sqlx::query("INSERT INTO game_owners (game_id, user_id) VALUES (?, ?)")
        .bind(game.to_string())
        .bind(user.to_string())
        .execute(pool)
        .await
        .unwrap();
}

pub async fn link_similar(pool: &SqlitePool, game: Uuid, similar: Uuid) {
    sqlx::query("INSERT INTO similar_games (game_id, similar_id) VALUES (?, ?)")
        .bind(game.to_string())
        .bind(similar.to_string())
        .execute(pool)
        .await
        .unwrap();
}

pub async fn add_track(pool: &SqlitePool, game: Uuid, duration: f64, score: Option<f64>) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO tracks (guid, game_id, title, duration, kind, difficulty_score) VALUES (?, ?, ?, ?, 'Original', ?)",
    )
    .bind(id.to_string())
    .bind(game.to_string())
    .bind(format!("Track {}", &id.to_string()[..8]))
    .bind(duration)
    .bind(score)
    .execute(pool)
    .await
    .unwrap();
    id
}

pub async fn add_derivative(pool: &SqlitePool, game: Uuid, original: Uuid, duration: f64) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO tracks (guid, game_id, title, duration, kind, original_track_id) VALUES (?, ?, 'Arrangement', ?, 'Derivative', ?)",
    )
    .bind(id.to_string())
    .bind(game.to_string())
    .bind(duration)
    .bind(original.to_string())
    .execute(pool)
    .await
    .unwrap();
    id
}

/// Games with one track each, owned by nobody; feeds the last hint tier
pub async fn add_filler_games(pool: &SqlitePool, count: usize) -> Vec<Uuid> {
    let mut games = Vec::with_capacity(count);
    for i in 0..count {
        let game = add_game(pool, &format!("Filler {}", i), true).await;
        add_track(pool, game, 90.0, None).await;
        games.push(game);
    }
    games
}

/// Games owned by `user` with one track each
pub async fn add_owned_games(
    pool: &SqlitePool,
    user: Uuid,
    count: usize,
    duration: f64,
    score: Option<f64>,
) -> Vec<Uuid> {
    let mut games = Vec::with_capacity(count);
    for i in 0..count {
        let game = add_game(pool, &format!("Game {} of {}", i, &user.to_string()[..8]), true).await;
        own(pool, game, user).await;
        add_track(pool, game, duration, score).await;
        games.push(game);
    }
    games
}

pub struct LobbyRow {
    pub code: String,
    pub track_count: i64,
    pub difficulty: String,
    pub guess_time: f64,
    pub allow_duplicates: bool,
    pub allow_exploration: bool,
    pub reveal_extends_window: bool,
}

impl Default for LobbyRow {
    fn default() -> Self {
        Self {
            code: format!("L{}", &Uuid::new_v4().simple().to_string()[..5]),
            track_count: 3,
            difficulty: "Easy,Medium,Hard".to_string(),
            guess_time: 20.0,
            allow_duplicates: false,
            allow_exploration: false,
            reveal_extends_window: false,
        }
    }
}

pub async fn add_lobby(pool: &SqlitePool, row: LobbyRow) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO lobbies (guid, code, track_count, difficulty, guess_time, allow_duplicates,
                             allow_exploration, reveal_extends_window)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(&row.code)
    .bind(row.track_count)
    .bind(&row.difficulty)
    .bind(row.guess_time)
    .bind(row.allow_duplicates)
    .bind(row.allow_exploration)
    .bind(row.reveal_extends_window)
    .execute(pool)
    .await
    .unwrap();
    id
}

pub async fn join(pool: &SqlitePool, lobby: Uuid, user: Uuid, role: &str) {
    sqlx::query("INSERT INTO lobby_users (lobby_id, user_id, role) VALUES (?, ?, ?)")
        .bind(lobby.to_string())
        .bind(user.to_string())
        .bind(role)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn count(pool: &SqlitePool, sql: &str) -> i64 {
    sqlx::query_scalar(sql).fetch_one(pool).await.unwrap()
}

pub fn event_bus() -> Arc<EventBus> {
    Arc::new(EventBus::new(256))
}

/// Every event already sitting in the receiver
pub fn drain(rx: &mut broadcast::Receiver<VgmqEvent>) -> Vec<VgmqEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
