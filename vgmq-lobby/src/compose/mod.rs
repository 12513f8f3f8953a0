//! Round composition
//!
//! [`RoundComposer`] turns a lobby and its participating players into an
//! ordered playlist:
//!
//! ```text
//! Planning -> Filling -> Finalizing -> Composed
//!                                  \-> Empty
//! ```
//!
//! Planning assigns slot owners ([`quota`]). Filling walks a queue of
//! pending slots, asking the [`selector`] for a track and borrowing another
//! player's catalog when the owner's is exhausted. Each filled slot gets a
//! playback window ([`window`]), its accepted answers and hint decoys
//! ([`hints`]). Finalizing numbers the entries.
//!
//! Apart from play counts, nothing is written here; the caller saves the
//! returned entries.

pub mod hints;
pub mod policy;
pub mod quota;
pub mod selector;
pub mod window;

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::model::{Lobby, RoundEntry};
use hints::HintResolver;
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::SeedableRng;
use selector::{CandidateSelector, ExclusionState, SelectionMiss, SlotOutcome};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use vgmq_common::events::{EmptyReason, EventBus, VgmqEvent};

/// Tunables of a composition pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionSettings {
    /// Seconds added to the guess time when the reveal extends playback
    pub reveal_extension_secs: f64,
    /// Choices shown in hint mode, answer included
    pub hint_choices: usize,
    /// Decimal places kept on playback offsets
    pub offset_decimals: u32,
}

impl Default for CompositionSettings {
    fn default() -> Self {
        Self {
            reveal_extension_secs: 10.0,
            hint_choices: hints::DEFAULT_HINT_CHOICES,
            offset_decimals: 4,
        }
    }
}

/// Composer lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerState {
    Planning,
    Filling,
    Finalizing,
    Composed,
    Empty,
}

/// Result of a composition that did not fail
#[derive(Debug, Clone)]
pub enum CompositionOutcome {
    /// Entries numbered 1..n in fill order
    Composed(Vec<RoundEntry>),
    /// Nothing to play
    Empty(EmptyReason),
}

/// Slot waiting for a track
#[derive(Debug)]
struct PendingSlot {
    owner: Uuid,
    /// Owners whose catalogs were exhausted for this slot
    tried: HashSet<Uuid>,
}

impl PendingSlot {
    fn new(owner: Uuid) -> Self {
        Self {
            owner,
            tried: HashSet::new(),
        }
    }
}

/// Composes one lobby round
pub struct RoundComposer {
    catalog: Arc<dyn Catalog>,
    events: Arc<EventBus>,
    settings: CompositionSettings,
    rng: StdRng,
    state: ComposerState,
}

impl RoundComposer {
    pub fn new(catalog: Arc<dyn Catalog>, events: Arc<EventBus>, settings: CompositionSettings) -> Self {
        Self::with_rng(catalog, events, settings, StdRng::from_entropy())
    }

    /// Deterministic composer for reproducible runs
    pub fn with_seed(
        catalog: Arc<dyn Catalog>,
        events: Arc<EventBus>,
        settings: CompositionSettings,
        seed: u64,
    ) -> Self {
        Self::with_rng(catalog, events, settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        catalog: Arc<dyn Catalog>,
        events: Arc<EventBus>,
        settings: CompositionSettings,
        rng: StdRng,
    ) -> Self {
        Self {
            catalog,
            events,
            settings,
            rng,
            state: ComposerState::Planning,
        }
    }

    pub fn state(&self) -> ComposerState {
        self.state
    }

    /// Compose a playlist for `lobby` from the catalogs of `players`
    ///
    /// `players` must already be restricted to participating roles. Emits
    /// `LobbyLoadProgress` per filled slot and `LobbyEmpty` when nothing can
    /// be played. Only catalog failures and an exhausted hint pool are errors.
    pub async fn compose(&mut self, lobby: &Lobby, players: &[Uuid]) -> Result<CompositionOutcome> {
        lobby.validate()?;
        self.state = ComposerState::Planning;

        let track_count = lobby.track_count as usize;
        let slots = match quota::plan_slots(players, track_count, &mut self.rng) {
            Ok(slots) => slots,
            Err(Error::NoEligiblePlayers) => {
                info!(lobby_id = %lobby.id, "No eligible players, nothing to compose");
                return Ok(self.finish_empty(lobby, EmptyReason::NoPlayers));
            }
            Err(e) => return Err(e),
        };

        let exploration_ratio = self
            .catalog
            .difficulty_coverage(players, lobby.guess_time)
            .await?;
        debug!(lobby_id = %lobby.id, slots = slots.len(), exploration_ratio, "Slots planned");

        self.state = ComposerState::Filling;

        let selector = CandidateSelector::new(self.catalog.as_ref(), lobby, exploration_ratio);
        let resolver = HintResolver::new(self.catalog.as_ref(), players, self.settings.hint_choices);
        let window_secs = lobby.playback_window(self.settings.reveal_extension_secs);

        let mut pending: VecDeque<PendingSlot> = slots.into_iter().map(PendingSlot::new).collect();
        let mut exclusions = ExclusionState::default();
        let mut entries: Vec<RoundEntry> = Vec::new();

        while let Some(mut slot) = pending.pop_front() {
            let selection = match selector.select(slot.owner, &mut exclusions, &mut self.rng).await? {
                SlotOutcome::Selected(selection) => selection,
                SlotOutcome::Miss(SelectionMiss::GameHadNoTrack(_)) => {
                    // Blacklist grew, so a fresh pick for the same owner makes progress
                    pending.push_front(slot);
                    continue;
                }
                SlotOutcome::Miss(SelectionMiss::OwnerExhausted) => {
                    slot.tried.insert(slot.owner);
                    let untried = players
                        .iter()
                        .filter(|p| !slot.tried.contains(*p))
                        .choose(&mut self.rng)
                        .copied();

                    match untried {
                        Some(next) => {
                            debug!(lobby_id = %lobby.id, from = %slot.owner, to = %next, "Borrowing slot");
                            slot.owner = next;
                            pending.push_back(slot);
                        }
                        None => {
                            debug!(lobby_id = %lobby.id, "Every player exhausted, dropping slot");
                        }
                    }
                    continue;
                }
            };

            let mut track = selection.track;
            let (start_at, end_at) = window::playback_window(
                track.duration,
                window_secs,
                self.settings.offset_decimals,
                &mut self.rng,
            );

            let lineage = self.catalog.lineage(&track).await?;
            let accepted_answers = window::accepted_answers(&track, &lineage);
            let hint_games = resolver.resolve(&track, &accepted_answers).await?;

            exclusions.used_games.insert(track.game.id);
            exclusions.used_tracks.insert(track.id);
            track.play_count = self.catalog.increment_play_count(track.id).await?;

            entries.push(RoundEntry {
                position: entries.len() as u32 + 1,
                track,
                start_at,
                end_at,
                accepted_answers,
                hint_games,
                exploration: selection.exploring,
            });

            self.events.emit_lossy(VgmqEvent::LobbyLoadProgress {
                lobby_id: lobby.id,
                percent: progress_percent(entries.len(), track_count),
                timestamp: chrono::Utc::now(),
            });
        }

        self.state = ComposerState::Finalizing;

        if entries.is_empty() {
            info!(lobby_id = %lobby.id, "No track could be selected");
            return Ok(self.finish_empty(lobby, EmptyReason::NoTracksFound));
        }

        if lobby.difficulty.is_all() {
            for entry in &mut entries {
                entry.exploration = false;
            }
        }

        info!(
            lobby_id = %lobby.id,
            entries = entries.len(),
            requested = track_count,
            "Round composed"
        );
        self.state = ComposerState::Composed;
        Ok(CompositionOutcome::Composed(entries))
    }

    fn finish_empty(&mut self, lobby: &Lobby, reason: EmptyReason) -> CompositionOutcome {
        self.state = ComposerState::Empty;
        self.events.emit_lossy(VgmqEvent::LobbyEmpty {
            lobby_id: lobby.id,
            reason,
            timestamp: chrono::Utc::now(),
        });
        CompositionOutcome::Empty(reason)
    }
}

/// Filled slots as a whole percentage of the requested count
pub fn progress_percent(filled: usize, track_count: usize) -> u8 {
    if track_count == 0 {
        return 100;
    }
    ((filled as f64 / track_count as f64) * 100.0).round().min(100.0) as u8
}
