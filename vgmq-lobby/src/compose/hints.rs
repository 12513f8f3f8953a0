//! Hint-mode decoy resolution
//!
//! Hint mode shows a fixed number of choices, one of which is the answer.
//! The resolver fills the remaining choices with decoy games, widening the
//! search tier by tier:
//!
//! 1. similar games owned by a participant, with tracks
//! 2. any game owned by a participant, with tracks
//! 3. similar games owned by a participant
//! 4. any game owned by a participant
//! 5. any game with tracks
//!
//! All tiers only consider enabled games.

use crate::catalog::{Catalog, GameFilter};
use crate::error::{Error, Result};
use crate::model::{Game, Track};
use std::collections::HashSet;
use tracing::{debug, warn};
use uuid::Uuid;

/// Choices shown in hint mode, answer included
pub const DEFAULT_HINT_CHOICES: usize = 4;

#[derive(Debug, Clone, Copy)]
enum Scope {
    Similar,
    Any,
}

#[derive(Debug, Clone, Copy)]
struct SearchTier {
    scope: Scope,
    participants_only: bool,
    with_tracks: bool,
}

const TIERS: [SearchTier; 5] = [
    SearchTier { scope: Scope::Similar, participants_only: true, with_tracks: true },
    SearchTier { scope: Scope::Any, participants_only: true, with_tracks: true },
    SearchTier { scope: Scope::Similar, participants_only: true, with_tracks: false },
    SearchTier { scope: Scope::Any, participants_only: true, with_tracks: false },
    SearchTier { scope: Scope::Any, participants_only: false, with_tracks: true },
];

/// Finds decoy games for a selected track
pub struct HintResolver<'a> {
    catalog: &'a dyn Catalog,
    participants: &'a [Uuid],
    choices: usize,
}

impl<'a> HintResolver<'a> {
    pub fn new(catalog: &'a dyn Catalog, participants: &'a [Uuid], choices: usize) -> Self {
        Self {
            catalog,
            participants,
            choices,
        }
    }

    /// Decoys for `track`, `choices - 1` of them
    ///
    /// Accepted answers are excluded, so no decoy is a correct guess and the
    /// track's own game never appears. Fails with `InsufficientHintPool` when
    /// the catalog cannot supply enough distinct games.
    pub async fn resolve(&self, track: &Track, accepted_answers: &[Game]) -> Result<Vec<Game>> {
        let needed = self.choices.saturating_sub(1);
        let mut excluded: HashSet<Uuid> = accepted_answers.iter().map(|g| g.id).collect();
        excluded.insert(track.game.id);

        let mut decoys: Vec<Game> = Vec::with_capacity(needed);

        for (tier_index, tier) in TIERS.iter().enumerate() {
            if decoys.len() >= needed {
                break;
            }

            let mut filter = GameFilter::default()
                .enabled()
                .excluding(&excluded)
                .limit(needed - decoys.len());
            if tier.participants_only {
                filter.owners = Some(self.participants.to_vec());
            }
            if tier.with_tracks {
                filter.min_track_duration = Some(0.0);
            }

            let found = match tier.scope {
                Scope::Similar => self.catalog.query_similar_games(track.game.id, &filter).await?,
                Scope::Any => self.catalog.query_games(&filter).await?,
            };

            debug!(track = %track.id, tier = tier_index + 1, found = found.len(), "Hint tier searched");

            for candidate in found {
                if decoys.len() >= needed {
                    break;
                }
                if excluded.insert(candidate.game.id) {
                    decoys.push(candidate.game);
                }
            }
        }

        if decoys.len() < needed {
            warn!(track = %track.id, found = decoys.len(), needed, "Hint pool exhausted");
            return Err(Error::InsufficientHintPool {
                track_id: track.id,
                found: decoys.len() + 1,
                needed: self.choices,
            });
        }

        Ok(decoys)
    }
}
