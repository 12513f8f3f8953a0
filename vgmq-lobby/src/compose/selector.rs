//! Candidate selection for one slot
//!
//! Picks a game from the owner's catalog and then a track inside that game,
//! running the difficulty policy at both levels.

use super::policy::{self, PolicyContext};
use crate::catalog::{Catalog, GameFilter, TrackFilter};
use crate::error::Result;
use crate::model::{Lobby, Track};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

/// Exclusions accumulated over one composition
#[derive(Debug, Default, Clone)]
pub struct ExclusionState {
    /// Games already in the playlist
    pub used_games: HashSet<Uuid>,
    /// Games with no selectable track left
    pub blacklisted_games: HashSet<Uuid>,
    /// Tracks already in the playlist
    pub used_tracks: HashSet<Uuid>,
}

/// Recoverable reasons a slot was not filled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMiss {
    /// No eligible game left in the owner's catalog
    OwnerExhausted,
    /// Chosen game had no eligible track; it is now blacklisted
    GameHadNoTrack(Uuid),
}

/// Track picked for a slot
#[derive(Debug, Clone)]
pub struct Selection {
    pub track: Track,
    /// Slot-level exploring flag after game selection
    pub exploring: bool,
}

#[derive(Debug)]
pub enum SlotOutcome {
    Selected(Selection),
    Miss(SelectionMiss),
}

/// Selects games and tracks for one lobby composition
pub struct CandidateSelector<'a> {
    catalog: &'a dyn Catalog,
    lobby: &'a Lobby,
    /// Share of the participants' catalog with recorded accuracy
    exploration_ratio: f64,
}

impl<'a> CandidateSelector<'a> {
    pub fn new(catalog: &'a dyn Catalog, lobby: &'a Lobby, exploration_ratio: f64) -> Self {
        Self {
            catalog,
            lobby,
            exploration_ratio,
        }
    }

    /// Per-slot exploration coin flip
    ///
    /// The less accuracy data the catalog has, the more often a slot explores.
    pub fn flip_exploring<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        self.lobby.allow_exploration && rng.gen::<f64>() > self.exploration_ratio
    }

    /// Try to fill one slot for `owner`
    ///
    /// On `GameHadNoTrack` the game has already been added to
    /// `state.blacklisted_games`.
    pub async fn select(
        &self,
        owner: Uuid,
        state: &mut ExclusionState,
        rng: &mut StdRng,
    ) -> Result<SlotOutcome> {
        let exploring = self.flip_exploring(rng);

        let mut filter = GameFilter::owned_by(&[owner])
            .enabled()
            .with_tracks_of_at_least(self.lobby.guess_time)
            .excluding(&state.blacklisted_games);
        if !self.lobby.allow_duplicates {
            filter = filter.excluding(&state.used_games);
        }

        let games = self.catalog.query_games(&filter).await?;
        let game_ctx = PolicyContext {
            exploring,
            bands: &self.lobby.difficulty,
            allow_exploration: self.lobby.allow_exploration,
        };

        let Some((game_index, exploring)) = policy::pick(&games, &game_ctx, rng) else {
            debug!(%owner, pool = games.len(), "Owner has no eligible game");
            return Ok(SlotOutcome::Miss(SelectionMiss::OwnerExhausted));
        };
        let game = &games[game_index].game;

        let track_filter = TrackFilter {
            min_duration: self.lobby.guess_time,
            excluded: state.used_tracks.clone(),
        };
        let tracks = self.catalog.query_tracks(game.id, &track_filter).await?;

        // Track-level fallback may switch to exploring locally only
        let track_ctx = PolicyContext {
            exploring,
            ..game_ctx
        };

        match policy::pick(&tracks, &track_ctx, rng) {
            Some((track_index, _)) => {
                let track = tracks[track_index].clone();
                debug!(%owner, game = %game.name, track = %track.id, exploring, "Slot candidate selected");
                Ok(SlotOutcome::Selected(Selection { track, exploring }))
            }
            None => {
                debug!(%owner, game = %game.name, "Game has no eligible track, blacklisting");
                state.blacklisted_games.insert(game.id);
                Ok(SlotOutcome::Miss(SelectionMiss::GameHadNoTrack(game.id)))
            }
        }
    }
}
