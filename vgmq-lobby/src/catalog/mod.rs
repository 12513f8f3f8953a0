//! Catalog query capability
//!
//! The composer reads games and tracks only through the [`Catalog`] trait.
//! Every query returns rows in random order, so callers may take a prefix
//! as a uniform sample.

pub mod sqlite;

pub use sqlite::SqliteCatalog;

use crate::error::Result;
use crate::model::{DifficultyBands, Game, Lineage, Track};
use crate::compose::policy::DifficultyProfile;
use async_trait::async_trait;
use std::collections::HashSet;
use uuid::Uuid;

/// Filters shared by every game query
#[derive(Debug, Clone, Default)]
pub struct GameFilter {
    /// Restrict to games owned by any of these users; `None` = any owner
    pub owners: Option<Vec<Uuid>>,
    /// Only games with `enabled = 1`
    pub enabled_only: bool,
    /// Game ids to leave out
    pub excluded: HashSet<Uuid>,
    /// Require at least one track of at least this many seconds
    pub min_track_duration: Option<f64>,
    /// Random sample size; `None` returns every match
    pub limit: Option<usize>,
}

impl GameFilter {
    pub fn owned_by(owners: &[Uuid]) -> Self {
        Self {
            owners: Some(owners.to_vec()),
            ..Self::default()
        }
    }

    pub fn enabled(mut self) -> Self {
        self.enabled_only = true;
        self
    }

    pub fn excluding<'a>(mut self, ids: impl IntoIterator<Item = &'a Uuid>) -> Self {
        self.excluded.extend(ids);
        self
    }

    pub fn with_tracks_of_at_least(mut self, seconds: f64) -> Self {
        self.min_track_duration = Some(seconds);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Filters for tracks inside one game
#[derive(Debug, Clone, Default)]
pub struct TrackFilter {
    /// Minimum duration in seconds
    pub min_duration: f64,
    /// Track ids to leave out
    pub excluded: HashSet<Uuid>,
}

/// Game plus the accuracy scores of its qualifying tracks
///
/// `track_scores` holds one entry per track that passed the duration filter,
/// so the difficulty policy can classify the game by its tracks.
#[derive(Debug, Clone, PartialEq)]
pub struct GameCandidate {
    pub game: Game,
    pub track_scores: Vec<Option<f64>>,
}

impl DifficultyProfile for GameCandidate {
    fn has_unscored(&self) -> bool {
        self.track_scores.iter().any(|score| score.is_none())
    }

    fn scored_within(&self, bands: &DifficultyBands) -> bool {
        self.track_scores
            .iter()
            .any(|score| score.is_some_and(|s| bands.matches(s)))
    }
}

/// Read access to games and tracks, plus the play-count counter
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Games matching `filter`
    async fn query_games(&self, filter: &GameFilter) -> Result<Vec<GameCandidate>>;

    /// Games similar to `game_id` (either direction of the relation) matching `filter`
    async fn query_similar_games(
        &self,
        game_id: Uuid,
        filter: &GameFilter,
    ) -> Result<Vec<GameCandidate>>;

    /// Tracks of `game_id` matching `filter`
    async fn query_tracks(&self, game_id: Uuid, filter: &TrackFilter) -> Result<Vec<Track>>;

    /// Original game and derivative games of the track's lineage
    async fn lineage(&self, track: &Track) -> Result<Lineage>;

    /// Fraction of the owners' qualifying tracks that carry an accuracy score
    ///
    /// Qualifying means enabled game and duration of at least
    /// `min_duration`. Returns 1.0 when no track qualifies.
    async fn difficulty_coverage(&self, owners: &[Uuid], min_duration: f64) -> Result<f64>;

    /// Atomically increment a track's play count, returning the new value
    async fn increment_play_count(&self, track_id: Uuid) -> Result<i64>;
}
