//! Domain types for round composition
//!
//! These are the composition-side views of lobbies, players, games and
//! tracks. Storage rows are converted into them by the `catalog` and `store`
//! implementations.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;
use vgmq_common::events::LobbyStatus;

/// Difficulty band over historical guess accuracy
///
/// A high accuracy means the track is easy to recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Difficulty {
    /// Accuracy above 0.66
    Easy,
    /// Accuracy between 0.33 and 0.66 inclusive
    Medium,
    /// Accuracy below 0.33
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Whether a recorded accuracy falls in this band
    pub fn contains(&self, score: f64) -> bool {
        match self {
            Difficulty::Easy => score > 0.66,
            Difficulty::Medium => (0.33..=0.66).contains(&score),
            Difficulty::Hard => score < 0.33,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "Easy" => Some(Difficulty::Easy),
            "Medium" => Some(Difficulty::Medium),
            "Hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Non-empty set of difficulty bands selected by a lobby
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Difficulty>", into = "Vec<Difficulty>")]
pub struct DifficultyBands(BTreeSet<Difficulty>);

impl DifficultyBands {
    /// Build from any collection of bands; rejects an empty selection
    pub fn new(bands: impl IntoIterator<Item = Difficulty>) -> Result<Self> {
        let set: BTreeSet<Difficulty> = bands.into_iter().collect();
        if set.is_empty() {
            return Err(Error::InvalidLobby(
                "at least one difficulty band is required".to_string(),
            ));
        }
        Ok(Self(set))
    }

    /// Every band selected
    pub fn all() -> Self {
        Self(Difficulty::ALL.into_iter().collect())
    }

    /// True when Easy, Medium and Hard are all selected
    pub fn is_all(&self) -> bool {
        Difficulty::ALL.iter().all(|band| self.0.contains(band))
    }

    /// Whether a recorded accuracy falls in any selected band
    pub fn matches(&self, score: f64) -> bool {
        self.0.iter().any(|band| band.contains(score))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Difficulty> {
        self.0.iter()
    }

    /// Parse the comma-separated column format (`"Easy,Hard"`)
    pub fn parse(column: &str) -> Result<Self> {
        let bands = column
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                Difficulty::from_str(s)
                    .ok_or_else(|| Error::InvalidLobby(format!("unknown difficulty '{}'", s.trim())))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(bands)
    }

    /// Comma-separated column format
    pub fn to_column(&self) -> String {
        self.0
            .iter()
            .map(|band| band.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl TryFrom<Vec<Difficulty>> for DifficultyBands {
    type Error = Error;

    fn try_from(bands: Vec<Difficulty>) -> Result<Self> {
        Self::new(bands)
    }
}

impl From<DifficultyBands> for Vec<Difficulty> {
    fn from(bands: DifficultyBands) -> Self {
        bands.0.into_iter().collect()
    }
}

/// Lobby settings relevant to round composition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lobby {
    pub id: Uuid,
    /// Join code, also keys the buffering job
    pub code: String,
    /// Requested playlist length
    pub track_count: u32,
    pub difficulty: DifficultyBands,
    /// Seconds players have to guess
    pub guess_time: f64,
    pub allow_duplicates: bool,
    /// Prefer tracks without recorded accuracy on some slots
    pub allow_exploration: bool,
    /// Keep playing the track while the answer is revealed
    pub reveal_extends_window: bool,
    pub status: LobbyStatus,
}

impl Lobby {
    /// Check composition preconditions
    pub fn validate(&self) -> Result<()> {
        if self.track_count == 0 {
            return Err(Error::InvalidLobby(format!(
                "lobby {} requests zero tracks",
                self.code
            )));
        }
        if !self.guess_time.is_finite() || self.guess_time <= 0.0 {
            return Err(Error::InvalidLobby(format!(
                "lobby {} has invalid guess time {}",
                self.code, self.guess_time
            )));
        }
        Ok(())
    }

    /// Seconds of audio each round plays
    pub fn playback_window(&self, reveal_extension_secs: f64) -> f64 {
        if self.reveal_extends_window {
            self.guess_time + reveal_extension_secs
        } else {
            self.guess_time
        }
    }
}

/// Role of a user inside a lobby
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PlayerRole {
    Host,
    Player,
    Spectator,
}

impl PlayerRole {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Host" => Some(PlayerRole::Host),
            "Player" => Some(PlayerRole::Player),
            "Spectator" => Some(PlayerRole::Spectator),
            _ => None,
        }
    }

    /// Hosts and players contribute their catalogs; spectators do not
    pub fn participates(&self) -> bool {
        matches!(self, PlayerRole::Host | PlayerRole::Player)
    }
}

/// Lobby member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: Uuid,
    pub role: PlayerRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Game {
    pub id: Uuid,
    pub name: String,
    pub enabled: bool,
}

/// Original tracks stand alone; derivatives point at the original they rework
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "PascalCase")]
pub enum TrackKind {
    Original,
    Derivative { original_id: Option<Uuid> },
}

/// Game-to-music link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: Uuid,
    pub game: Game,
    pub title: String,
    /// Seconds
    pub duration: f64,
    pub kind: TrackKind,
    pub play_count: i64,
    /// Historical guess accuracy in [0, 1]; `None` until first recorded
    pub difficulty_score: Option<f64>,
}

/// Games sharing a track's Original/Derivative lineage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lineage {
    /// Game of the lineage's Original track, if one exists
    pub original_game: Option<Game>,
    /// Games of every Derivative of that Original
    pub derivative_games: Vec<Game>,
}

/// One composed round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundEntry {
    /// 1-based, contiguous in fill order
    pub position: u32,
    pub track: Track,
    /// Playback window start, seconds into the track
    pub start_at: f64,
    /// Playback window end, seconds into the track
    pub end_at: f64,
    /// Games accepted as a correct guess
    pub accepted_answers: Vec<Game>,
    /// Decoy choices shown in hint mode, never an accepted answer
    pub hint_games: Vec<Game>,
    /// Round chosen to gather missing accuracy data
    pub exploration: bool,
}
