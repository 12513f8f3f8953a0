//! SQLite catalog queries
//!
//! Game queries sample games first (`ORDER BY RANDOM() LIMIT ?`) and then
//! join their qualifying tracks, so the limit applies to games and not to
//! track rows.

use super::{Catalog, GameCandidate, GameFilter, TrackFilter};
use crate::error::{Error, Result};
use crate::model::{Game, Lineage, Track, TrackKind};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::HashMap;
use uuid::Uuid;
use vgmq_common::uuid_utils::parse_guid;

/// Catalog backed by the lobby database
#[derive(Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Shared game sampler; `similar_to` adds the undirected similarity join
    async fn sample_games(
        &self,
        similar_to: Option<Uuid>,
        filter: &GameFilter,
    ) -> Result<Vec<GameCandidate>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT g.guid, g.name, g.enabled, t.guid AS track_guid, t.difficulty_score \
             FROM (SELECT g.guid, g.name, g.enabled FROM games g WHERE 1 = 1",
        );

        if filter.enabled_only {
            qb.push(" AND g.enabled = 1");
        }

        if let Some(owners) = &filter.owners {
            if owners.is_empty() {
                // No owner can match an empty owner set
                qb.push(" AND 0");
            } else {
                qb.push(" AND EXISTS (SELECT 1 FROM game_owners o WHERE o.game_id = g.guid AND o.user_id IN (");
                let mut ids = qb.separated(", ");
                for owner in owners {
                    ids.push_bind(owner.to_string());
                }
                ids.push_unseparated("))");
            }
        }

        if !filter.excluded.is_empty() {
            qb.push(" AND g.guid NOT IN (");
            let mut ids = qb.separated(", ");
            for id in &filter.excluded {
                ids.push_bind(id.to_string());
            }
            ids.push_unseparated(")");
        }

        if let Some(game_id) = similar_to {
            qb.push(" AND EXISTS (SELECT 1 FROM similar_games s WHERE (s.game_id = ")
                .push_bind(game_id.to_string())
                .push(" AND s.similar_id = g.guid) OR (s.similar_id = ")
                .push_bind(game_id.to_string())
                .push(" AND s.game_id = g.guid))");
        }

        if let Some(min_duration) = filter.min_track_duration {
            qb.push(" AND EXISTS (SELECT 1 FROM tracks tt WHERE tt.game_id = g.guid AND tt.duration >= ")
                .push_bind(min_duration)
                .push(")");
        }

        // SQLite treats a negative LIMIT as unbounded
        let limit = filter.limit.map(|l| l as i64).unwrap_or(-1);
        qb.push(" ORDER BY RANDOM() LIMIT ")
            .push_bind(limit)
            .push(") g LEFT JOIN tracks t ON t.game_id = g.guid AND t.duration >= ")
            .push_bind(filter.min_track_duration.unwrap_or(0.0));

        let rows = qb.build().fetch_all(&self.pool).await?;
        group_candidates(&rows)
    }

    async fn games_of_derivatives(&self, original_id: Uuid) -> Result<Vec<Game>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT g.guid, g.name, g.enabled
            FROM tracks t
            JOIN games g ON g.guid = t.game_id
            WHERE t.original_track_id = ?
            "#,
        )
        .bind(original_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(game_from_row).collect()
    }

    async fn game_of_track(&self, track_id: Uuid) -> Result<Option<Game>> {
        let row = sqlx::query(
            r#"
            SELECT g.guid, g.name, g.enabled
            FROM tracks t
            JOIN games g ON g.guid = t.game_id
            WHERE t.guid = ?
            "#,
        )
        .bind(track_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(game_from_row).transpose()
    }
}

#[async_trait]
impl Catalog for SqliteCatalog {
    async fn query_games(&self, filter: &GameFilter) -> Result<Vec<GameCandidate>> {
        self.sample_games(None, filter).await
    }

    async fn query_similar_games(
        &self,
        game_id: Uuid,
        filter: &GameFilter,
    ) -> Result<Vec<GameCandidate>> {
        self.sample_games(Some(game_id), filter).await
    }

    async fn query_tracks(&self, game_id: Uuid, filter: &TrackFilter) -> Result<Vec<Track>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT t.guid, t.title, t.duration, t.kind, t.original_track_id, t.play_count, \
             t.difficulty_score, g.guid AS game_guid, g.name AS game_name, g.enabled AS game_enabled \
             FROM tracks t JOIN games g ON g.guid = t.game_id WHERE t.game_id = ",
        );
        qb.push_bind(game_id.to_string())
            .push(" AND t.duration >= ")
            .push_bind(filter.min_duration);

        if !filter.excluded.is_empty() {
            qb.push(" AND t.guid NOT IN (");
            let mut ids = qb.separated(", ");
            for id in &filter.excluded {
                ids.push_bind(id.to_string());
            }
            ids.push_unseparated(")");
        }

        qb.push(" ORDER BY RANDOM()");

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(track_from_row).collect()
    }

    async fn lineage(&self, track: &Track) -> Result<Lineage> {
        match track.kind {
            TrackKind::Original => Ok(Lineage {
                original_game: Some(track.game.clone()),
                derivative_games: self.games_of_derivatives(track.id).await?,
            }),
            TrackKind::Derivative {
                original_id: Some(original_id),
            } => Ok(Lineage {
                original_game: self.game_of_track(original_id).await?,
                derivative_games: self.games_of_derivatives(original_id).await?,
            }),
            TrackKind::Derivative { original_id: None } => Ok(Lineage::default()),
        }
    }

    async fn difficulty_coverage(&self, owners: &[Uuid], min_duration: f64) -> Result<f64> {
        if owners.is_empty() {
            return Ok(1.0);
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT COUNT(*) AS total, COUNT(t.difficulty_score) AS scored \
             FROM tracks t JOIN games g ON g.guid = t.game_id \
             WHERE g.enabled = 1 AND t.duration >= ",
        );
        qb.push_bind(min_duration);
        qb.push(" AND EXISTS (SELECT 1 FROM game_owners o WHERE o.game_id = g.guid AND o.user_id IN (");
        let mut ids = qb.separated(", ");
        for owner in owners {
            ids.push_bind(owner.to_string());
        }
        ids.push_unseparated("))");

        let row = qb.build().fetch_one(&self.pool).await?;
        let total: i64 = row.get("total");
        let scored: i64 = row.get("scored");

        if total == 0 {
            return Ok(1.0);
        }
        Ok(scored as f64 / total as f64)
    }

    async fn increment_play_count(&self, track_id: Uuid) -> Result<i64> {
        sqlx::query_scalar(
            "UPDATE tracks SET play_count = play_count + 1 WHERE guid = ? RETURNING play_count",
        )
        .bind(track_id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("track {}", track_id)))
    }
}

fn game_from_row(row: &SqliteRow) -> Result<Game> {
    Ok(Game {
        id: parse_guid("games.guid", &row.get::<String, _>("guid"))?,
        name: row.get("name"),
        enabled: row.get::<i64, _>("enabled") != 0,
    })
}

fn track_from_row(row: &SqliteRow) -> Result<Track> {
    let kind = match row.get::<String, _>("kind").as_str() {
        "Original" => TrackKind::Original,
        "Derivative" => TrackKind::Derivative {
            original_id: row
                .get::<Option<String>, _>("original_track_id")
                .map(|s| parse_guid("tracks.original_track_id", &s))
                .transpose()?,
        },
        other => return Err(Error::Catalog(format!("unknown track kind '{}'", other))),
    };

    Ok(Track {
        id: parse_guid("tracks.guid", &row.get::<String, _>("guid"))?,
        game: Game {
            id: parse_guid("games.guid", &row.get::<String, _>("game_guid"))?,
            name: row.get("game_name"),
            enabled: row.get::<i64, _>("game_enabled") != 0,
        },
        title: row.get("title"),
        duration: row.get("duration"),
        kind,
        play_count: row.get("play_count"),
        difficulty_score: row.get("difficulty_score"),
    })
}

/// Fold game/track join rows into candidates, keeping the sampled game order
fn group_candidates(rows: &[SqliteRow]) -> Result<Vec<GameCandidate>> {
    let mut candidates: Vec<GameCandidate> = Vec::new();
    let mut index: HashMap<Uuid, usize> = HashMap::new();

    for row in rows {
        let game = game_from_row(row)?;
        let slot = *index.entry(game.id).or_insert_with(|| {
            candidates.push(GameCandidate {
                game,
                track_scores: Vec::new(),
            });
            candidates.len() - 1
        });

        if row.get::<Option<String>, _>("track_guid").is_some() {
            candidates[slot]
                .track_scores
                .push(row.get::<Option<f64>, _>("difficulty_score"));
        }
    }

    Ok(candidates)
}
