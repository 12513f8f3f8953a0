//! vgmq-lobby specific configuration
//!
//! Read from the same TOML file as the database path. Every key is optional:
//!
//! ```toml
//! database_path = "/var/lib/vgmq/vgmq.db"
//! event_capacity = 1000
//! log_filter = "vgmq_lobby=debug"
//!
//! [composition]
//! reveal_extension_secs = 10.0
//! hint_choices = 4
//! offset_decimals = 4
//! ```

use crate::compose::CompositionSettings;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Lobby composer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// EventBus channel capacity
    pub event_capacity: usize,
    /// Tracing filter used when `RUST_LOG` is unset
    pub log_filter: String,
    pub composition: CompositionSettings,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            event_capacity: 1000,
            log_filter: "vgmq_lobby=info".to_string(),
            composition: CompositionSettings::default(),
        }
    }
}

impl ComposerConfig {
    /// Load from `path`, or defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.event_capacity == 0 {
            return Err(Error::Config("event_capacity must be positive".to_string()));
        }
        if self.composition.hint_choices < 2 {
            return Err(Error::Config("hint_choices must be at least 2".to_string()));
        }
        if !self.composition.reveal_extension_secs.is_finite()
            || self.composition.reveal_extension_secs < 0.0
        {
            return Err(Error::Config(
                "reveal_extension_secs must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_keys_use_defaults() {
        let config = ComposerConfig::from_toml("database_path = \"/tmp/x.db\"\n").unwrap();
        assert_eq!(config, ComposerConfig::default());
    }

    #[test]
    fn test_partial_composition_table() {
        let config = ComposerConfig::from_toml(
            r#"
            log_filter = "vgmq_lobby=debug"

            [composition]
            reveal_extension_secs = 5.0
            "#,
        )
        .unwrap();

        assert_eq!(config.log_filter, "vgmq_lobby=debug");
        assert_eq!(config.composition.reveal_extension_secs, 5.0);
        assert_eq!(config.composition.hint_choices, 4);
        assert_eq!(config.event_capacity, 1000);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(ComposerConfig::from_toml("event_capacity = 0").is_err());
        assert!(ComposerConfig::from_toml("[composition]\nhint_choices = 1").is_err());
        assert!(ComposerConfig::from_toml("event_capacity = \"many\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "event_capacity = 64").unwrap();

        let config = ComposerConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.event_capacity, 64);

        assert_eq!(ComposerConfig::load(None).unwrap(), ComposerConfig::default());
        assert!(ComposerConfig::load(Some(Path::new("/nonexistent/vgmq.toml"))).is_err());
    }
}
