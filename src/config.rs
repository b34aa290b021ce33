//! Configuration loading and management
//!
//! Handles parsing of `tk.toml` in the data directory.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Name of the configuration file inside the data directory
pub const CONFIG_FILE: &str = "tk.toml";

const MIN_HISTORY_STATES: usize = 2;
const MAX_HISTORY_STATES: usize = 1000;
const MAX_FIELD_LEN: usize = 10_000;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Undo/redo history configuration
    #[serde(default)]
    pub history: HistoryConfig,

    /// Persistence configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Task field limits
    #[serde(default)]
    pub tasks: TasksConfig,
}

/// History-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of snapshots kept, baseline included
    #[serde(default = "default_max_states")]
    pub max_states: usize,

    /// Keep the undo/redo session across invocations
    #[serde(default = "default_true")]
    pub persist: bool,
}

fn default_max_states() -> usize {
    crate::history::DEFAULT_MAX_HISTORY_STATES
}

fn default_true() -> bool {
    true
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_states: default_max_states(),
            persist: true,
        }
    }
}

/// Storage-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Write saved task data after every state-changing command
    #[serde(default = "default_true")]
    pub autosave: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { autosave: true }
    }
}

/// Task field limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    #[serde(default = "default_max_title_len")]
    pub max_title_len: usize,

    #[serde(default = "default_max_responsible_len")]
    pub max_responsible_len: usize,
}

fn default_max_title_len() -> usize {
    120
}

fn default_max_responsible_len() -> usize {
    80
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            max_title_len: default_max_title_len(),
            max_responsible_len: default_max_responsible_len(),
        }
    }
}

impl Config {
    /// Load configuration from a `tk.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a data directory, or return defaults
    ///
    /// A missing file yields defaults silently. An invalid file yields
    /// defaults plus the error that made it unusable, for the caller to
    /// report.
    pub fn load_from_dir(dir: &Path) -> (Self, Option<Error>) {
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return (Self::default(), None);
        }
        match Self::load(&config_path) {
            Ok(config) => (config, None),
            Err(err) => {
                tracing::warn!(path = %config_path.display(), error = %err, "ignoring invalid config");
                (Self::default(), Some(err))
            }
        }
    }

    fn validate(&self) -> Result<()> {
        self.history.validate()?;
        self.tasks.validate()?;
        Ok(())
    }
}

impl HistoryConfig {
    fn validate(&self) -> Result<()> {
        if !(MIN_HISTORY_STATES..=MAX_HISTORY_STATES).contains(&self.max_states) {
            return Err(Error::InvalidConfig(format!(
                "history.max_states must be between {MIN_HISTORY_STATES} and {MAX_HISTORY_STATES}"
            )));
        }
        Ok(())
    }
}

impl TasksConfig {
    fn validate(&self) -> Result<()> {
        validate_len(self.max_title_len, "tasks.max_title_len")?;
        validate_len(self.max_responsible_len, "tasks.max_responsible_len")?;
        Ok(())
    }
}

fn validate_len(value: usize, field: &str) -> Result<()> {
    if value == 0 || value > MAX_FIELD_LEN {
        return Err(Error::InvalidConfig(format!(
            "{field} must be between 1 and {MAX_FIELD_LEN}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.history.max_states, 20);
        assert!(cfg.history.persist);
        assert!(cfg.storage.autosave);
        assert_eq!(cfg.tasks.max_title_len, 120);
        assert_eq!(cfg.tasks.max_responsible_len, 80);
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"
[history]
max_states = 5
persist = false

[storage]
autosave = false
"#,
        )
        .expect("write config");

        let cfg = Config::load(&path).expect("load");
        assert_eq!(cfg.history.max_states, 5);
        assert!(!cfg.history.persist);
        assert!(!cfg.storage.autosave);
        assert_eq!(cfg.tasks.max_title_len, 120);
    }

    #[test]
    fn tiny_history_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[history]\nmax_states = 1\n").expect("write config");

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn zero_field_limit_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[tasks]\nmax_title_len = 0\n").expect("write config");

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn load_from_dir_defaults_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (cfg, err) = Config::load_from_dir(dir.path());
        assert_eq!(cfg.history.max_states, 20);
        assert!(err.is_none());
    }

    #[test]
    fn load_from_dir_falls_back_on_invalid() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(CONFIG_FILE), "history = [broken").expect("write config");
        let (cfg, err) = Config::load_from_dir(dir.path());
        assert_eq!(cfg.history.max_states, 20);
        assert!(matches!(err, Some(Error::TomlParse(_))));
    }
}
