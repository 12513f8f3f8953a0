//! # VGMQ Lobby Composer
//!
//! Composes the playlist of a music-quiz lobby round from the catalogs of
//! its players, then persists it and hands the lobby to gameplay.
//!
//! - [`compose`]: slot planning, candidate selection, hints
//! - [`catalog`]: read access to games and tracks
//! - [`store`]: lobby persistence
//! - [`loader`]: end-to-end load of a lobby's music

pub mod catalog;
pub mod compose;
pub mod config;
pub mod error;
pub mod jobs;
pub mod loader;
pub mod model;
pub mod store;

pub use catalog::{Catalog, SqliteCatalog};
pub use compose::{CompositionOutcome, CompositionSettings, RoundComposer};
pub use config::ComposerConfig;
pub use error::{Error, Result};
pub use jobs::{JobQueue, SqliteJobQueue};
pub use loader::{LoadOutcome, LobbyMusicLoader};
pub use store::{LobbyStore, SqliteLobbyStore};
