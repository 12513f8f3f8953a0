//! UUID utilities
//!
//! Identifiers are stored as TEXT guids in SQLite; these helpers convert
//! them back with a descriptive error.

use crate::{Error, Result};
use uuid::Uuid;

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse a stored guid column, naming the column in the error
pub fn parse_guid(column: &str, value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| Error::InvalidInput(format!("Invalid {} guid '{}': {}", column, value, e)))
}
