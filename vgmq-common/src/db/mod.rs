//! Database access layer
//!
//! Schema creation and connection setup shared by the lobby services.

pub mod init;

pub use init::{init_database, init_schema};
