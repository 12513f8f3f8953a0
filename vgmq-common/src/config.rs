//! Configuration loading and database path resolution

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable consulted for the database path
pub const DATABASE_ENV_VAR: &str = "VGMQ_DATABASE";

/// Database path resolution, highest priority first:
/// 1. Command-line argument
/// 2. Environment variable
/// 3. `database_path` key of the TOML config file
/// 4. OS-dependent compiled default
pub fn resolve_database_path(cli_arg: Option<&str>, env_var_name: &str) -> PathBuf {
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Ok(config_path) = locate_config_file() {
        if let Ok(Some(path)) = database_path_from_toml(&config_path) {
            return path;
        }
    }

    default_database_path()
}

/// Read the `database_path` key from a TOML config file
///
/// Returns `Ok(None)` when the file parses but carries no such key.
pub fn database_path_from_toml(config_path: &Path) -> Result<Option<PathBuf>> {
    let content = std::fs::read_to_string(config_path)?;
    let config = toml::from_str::<toml::Value>(&content)
        .map_err(|e| Error::Config(format!("{}: {}", config_path.display(), e)))?;

    Ok(config
        .get("database_path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from))
}

/// Get the configuration file path for the platform
///
/// Linux checks `~/.config/vgmq/config.toml` then `/etc/vgmq/config.toml`.
pub fn locate_config_file() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("vgmq").join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/vgmq/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Get OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("vgmq"))
        .unwrap_or_else(|| PathBuf::from("./vgmq_data"))
        .join("vgmq.db")
}
