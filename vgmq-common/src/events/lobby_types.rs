//! Lobby-related type definitions
//!
//! Supporting types for lobby lifecycle events.

use serde::{Deserialize, Serialize};

/// Lobby status as stored in `lobbies.status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum LobbyStatus {
    /// Players gathering, no round composed
    Waiting,
    /// Round composition in progress
    Loading,
    /// Round composed and handed to gameplay
    Playing,
}

impl LobbyStatus {
    /// Parse the stored column value
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Waiting" => Some(LobbyStatus::Waiting),
            "Loading" => Some(LobbyStatus::Loading),
            "Playing" => Some(LobbyStatus::Playing),
            _ => None,
        }
    }

    /// Column value for this status
    pub fn as_str(&self) -> &'static str {
        match self {
            LobbyStatus::Waiting => "Waiting",
            LobbyStatus::Loading => "Loading",
            LobbyStatus::Playing => "Playing",
        }
    }
}

impl std::fmt::Display for LobbyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a composition ended without a playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum EmptyReason {
    /// No host or player was in the lobby
    NoPlayers,
    /// Every slot was dropped after all owners were tried
    NoTracksFound,
}

impl EmptyReason {
    /// Toast message shown to the lobby
    pub fn message(&self) -> &'static str {
        match self {
            EmptyReason::NoPlayers => "No players are in the lobby!",
            EmptyReason::NoTracksFound => "No music were found!",
        }
    }
}

impl std::fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmptyReason::NoPlayers => write!(f, "NoPlayers"),
            EmptyReason::NoTracksFound => write!(f, "NoTracksFound"),
        }
    }
}
