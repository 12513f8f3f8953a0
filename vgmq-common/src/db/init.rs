//! Database initialization
//!
//! Opens (or creates) the SQLite database and applies the schema. Every
//! statement is `CREATE ... IF NOT EXISTS`, so initialization is idempotent.
//!
//! Identifiers are UUIDs stored as TEXT guids. Durations and offsets are REAL
//! seconds.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Pragmas go on the connect options so every pooled connection gets them
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    init_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    create_users_table(pool).await?;
    create_games_table(pool).await?;
    create_game_owners_table(pool).await?;
    create_similar_games_table(pool).await?;
    create_tracks_table(pool).await?;

    create_lobbies_table(pool).await?;
    create_lobby_users_table(pool).await?;
    create_lobby_tracks_table(pool).await?;
    create_lobby_track_games_tables(pool).await?;

    create_jobs_table(pool).await?;

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            guid TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_games_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS games (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            enabled INTEGER NOT NULL DEFAULT 1,
            parent_guid TEXT REFERENCES games(guid) ON DELETE SET NULL,
            version_parent_guid TEXT REFERENCES games(guid) ON DELETE SET NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_game_owners_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS game_owners (
            game_id TEXT NOT NULL REFERENCES games(guid) ON DELETE CASCADE,
            user_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            PRIMARY KEY (game_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_game_owners_user ON game_owners(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Similarity is undirected; a single row links both games
async fn create_similar_games_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS similar_games (
            game_id TEXT NOT NULL REFERENCES games(guid) ON DELETE CASCADE,
            similar_id TEXT NOT NULL REFERENCES games(guid) ON DELETE CASCADE,
            PRIMARY KEY (game_id, similar_id),
            CHECK (game_id <> similar_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_tracks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tracks (
            guid TEXT PRIMARY KEY,
            game_id TEXT NOT NULL REFERENCES games(guid) ON DELETE CASCADE,
            title TEXT NOT NULL DEFAULT '',
            duration REAL NOT NULL CHECK (duration >= 0),
            kind TEXT NOT NULL DEFAULT 'Original' CHECK (kind IN ('Original', 'Derivative')),
            original_track_id TEXT REFERENCES tracks(guid) ON DELETE SET NULL,
            play_count INTEGER NOT NULL DEFAULT 0,
            difficulty_score REAL CHECK (difficulty_score IS NULL OR (difficulty_score >= 0 AND difficulty_score <= 1)),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tracks_game ON tracks(game_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tracks_original ON tracks(original_track_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_lobbies_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lobbies (
            guid TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL DEFAULT '',
            track_count INTEGER NOT NULL CHECK (track_count > 0),
            difficulty TEXT NOT NULL DEFAULT 'Easy,Medium,Hard',
            guess_time REAL NOT NULL,
            allow_duplicates INTEGER NOT NULL DEFAULT 0,
            allow_exploration INTEGER NOT NULL DEFAULT 0,
            reveal_extends_window INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'Waiting',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_lobby_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lobby_users (
            lobby_id TEXT NOT NULL REFERENCES lobbies(guid) ON DELETE CASCADE,
            user_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            role TEXT NOT NULL CHECK (role IN ('Host', 'Player', 'Spectator')),
            disconnected INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (lobby_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_lobby_tracks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lobby_tracks (
            guid TEXT PRIMARY KEY,
            lobby_id TEXT NOT NULL REFERENCES lobbies(guid) ON DELETE CASCADE,
            track_id TEXT NOT NULL REFERENCES tracks(guid) ON DELETE CASCADE,
            position INTEGER NOT NULL CHECK (position > 0),
            start_at REAL NOT NULL,
            end_at REAL NOT NULL,
            exploration INTEGER NOT NULL DEFAULT 0,
            UNIQUE (lobby_id, position)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Accepted answers and hint choices of each lobby track
async fn create_lobby_track_games_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lobby_track_answers (
            lobby_track_id TEXT NOT NULL REFERENCES lobby_tracks(guid) ON DELETE CASCADE,
            game_id TEXT NOT NULL REFERENCES games(guid) ON DELETE CASCADE,
            PRIMARY KEY (lobby_track_id, game_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lobby_track_hints (
            lobby_track_id TEXT NOT NULL REFERENCES lobby_tracks(guid) ON DELETE CASCADE,
            game_id TEXT NOT NULL REFERENCES games(guid) ON DELETE CASCADE,
            ordinal INTEGER NOT NULL,
            PRIMARY KEY (lobby_track_id, game_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Background job queue; `job_key` deduplicates retried enqueues
async fn create_jobs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            guid TEXT PRIMARY KEY,
            queue TEXT NOT NULL,
            name TEXT NOT NULL,
            job_key TEXT NOT NULL UNIQUE,
            payload TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'Pending',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
