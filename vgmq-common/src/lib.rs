//! # VGMQ Common Library
//!
//! Shared code for the VGMQ lobby services including:
//! - Database schema initialization
//! - Lobby event types and the EventBus
//! - Configuration loading
//! - Utility functions

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod uuid_utils;

pub use error::{Error, Result};
