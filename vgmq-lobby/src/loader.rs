//! Lobby music loader
//!
//! End-to-end handling of a "start game" request: load the lobby and its
//! participants, compose a round, persist it, update the lobby status and
//! trigger audio buffering.
//!
//! The lobby never stays in `Loading`: every failure path returns it to
//! `Waiting` before the error is reported.

use crate::catalog::Catalog;
use crate::compose::{CompositionOutcome, CompositionSettings, RoundComposer};
use crate::error::{Error, Result};
use crate::jobs::{JobQueue, JobRequest};
use crate::model::{Lobby, RoundEntry};
use crate::store::LobbyStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;
use vgmq_common::events::{EmptyReason, EventBus, LobbyStatus, VgmqEvent};

/// What a successful load produced
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", content = "detail")]
pub enum LoadOutcome {
    /// Round saved, lobby is `Playing`
    Playing(Vec<RoundEntry>),
    /// No playable track, lobby is back to `Waiting`
    Empty(EmptyReason),
}

pub struct LobbyMusicLoader {
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn LobbyStore>,
    jobs: Arc<dyn JobQueue>,
    events: Arc<EventBus>,
    settings: CompositionSettings,
    seed: Option<u64>,
}

impl LobbyMusicLoader {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        store: Arc<dyn LobbyStore>,
        jobs: Arc<dyn JobQueue>,
        events: Arc<EventBus>,
        settings: CompositionSettings,
    ) -> Self {
        Self {
            catalog,
            store,
            jobs,
            events,
            settings,
            seed: None,
        }
    }

    /// Seed every composition for reproducible playlists
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Compose and persist a round for `lobby_id`
    ///
    /// Fails with `NoEligiblePlayers` when no host or player is connected,
    /// and with the composition error when composing aborts. In both cases
    /// the lobby is back in `Waiting`.
    pub async fn load(&self, lobby_id: Uuid) -> Result<LoadOutcome> {
        let lobby = self.store.load_lobby(lobby_id).await?;
        let players: Vec<Uuid> = self
            .store
            .participants(lobby_id)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();

        info!(lobby_id = %lobby.id, code = %lobby.code, players = players.len(), "Loading lobby music");
        self.transition(&lobby, LobbyStatus::Loading).await?;

        let outcome = match self.compose(&lobby, &players).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(lobby_id = %lobby.id, error = %e, "Round composition failed");
                self.events.emit_lossy(VgmqEvent::CompositionFailed {
                    lobby_id: lobby.id,
                    error: e.to_string(),
                    timestamp: chrono::Utc::now(),
                });
                self.transition(&lobby, LobbyStatus::Waiting).await?;
                return Err(e);
            }
        };

        match outcome {
            CompositionOutcome::Empty(reason) => {
                warn!(lobby_id = %lobby.id, %reason, "{}", reason.message());
                self.transition(&lobby, LobbyStatus::Waiting).await?;
                match reason {
                    EmptyReason::NoPlayers => Err(Error::NoEligiblePlayers),
                    EmptyReason::NoTracksFound => Ok(LoadOutcome::Empty(reason)),
                }
            }
            CompositionOutcome::Composed(entries) => {
                if let Err(e) = self.store.save_composed_round(lobby.id, &entries).await {
                    error!(lobby_id = %lobby.id, error = %e, "Failed to save composed round");
                    self.transition(&lobby, LobbyStatus::Waiting).await?;
                    return Err(e);
                }

                self.transition(&lobby, LobbyStatus::Playing).await?;
                self.events.emit_lossy(VgmqEvent::RoundComposed {
                    lobby_id: lobby.id,
                    entry_count: entries.len(),
                    timestamp: chrono::Utc::now(),
                });

                let job = JobRequest::buffer_tracks(&lobby);
                if !self.jobs.enqueue(&job).await? {
                    info!(lobby_id = %lobby.id, key = %job.key, "Buffer job already queued");
                }

                Ok(LoadOutcome::Playing(entries))
            }
        }
    }

    async fn compose(&self, lobby: &Lobby, players: &[Uuid]) -> Result<CompositionOutcome> {
        let mut composer = match self.seed {
            Some(seed) => RoundComposer::with_seed(
                Arc::clone(&self.catalog),
                Arc::clone(&self.events),
                self.settings.clone(),
                seed,
            ),
            None => RoundComposer::new(
                Arc::clone(&self.catalog),
                Arc::clone(&self.events),
                self.settings.clone(),
            ),
        };
        composer.compose(lobby, players).await
    }

    async fn transition(&self, lobby: &Lobby, status: LobbyStatus) -> Result<()> {
        match status {
            LobbyStatus::Waiting => self.store.mark_waiting(lobby.id).await?,
            LobbyStatus::Loading => self.store.mark_loading(lobby.id).await?,
            LobbyStatus::Playing => self.store.mark_playing(lobby.id).await?,
        }
        self.events.emit_lossy(VgmqEvent::LobbyStatusChanged {
            lobby_id: lobby.id,
            code: lobby.code.clone(),
            status,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }
}
