//! Application configuration loaded from TOML.

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Default config file name.
pub const DEFAULT_CONFIG_FILE: &str = "ultimate.toml";

/// Runtime settings. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
pub struct AppConfig {
    /// SQLite file for saved games and rooms.
    #[serde(default = "default_store_path")]
    store_path: String,

    /// Milliseconds between replay playback steps.
    #[serde(default = "default_replay_interval_ms")]
    replay_interval_ms: u64,

    /// Milliseconds the AI "thinks" before moving.
    #[serde(default = "default_ai_delay_ms")]
    ai_delay_ms: u64,

    /// JSON policy weights; without it the AI is unavailable.
    #[serde(default)]
    model_path: Option<PathBuf>,

    /// Address a host listens on.
    #[serde(default = "default_listen_addr")]
    listen_addr: String,

    /// Directory recordings are written to.
    #[serde(default = "default_replay_dir")]
    replay_dir: PathBuf,

    /// Connection attempts before giving up on a peer.
    #[serde(default = "default_reconnect_attempts")]
    reconnect_attempts: u32,

    /// Milliseconds between connection attempts.
    #[serde(default = "default_reconnect_backoff_ms")]
    reconnect_backoff_ms: u64,
}

#[instrument]
fn default_store_path() -> String {
    "ultimate_games.db".to_string()
}

#[instrument]
fn default_replay_interval_ms() -> u64 {
    600
}

#[instrument]
fn default_ai_delay_ms() -> u64 {
    500
}

#[instrument]
fn default_listen_addr() -> String {
    "127.0.0.1:4747".to_string()
}

#[instrument]
fn default_replay_dir() -> PathBuf {
    PathBuf::from("replays")
}

#[instrument]
fn default_reconnect_attempts() -> u32 {
    5
}

#[instrument]
fn default_reconnect_backoff_ms() -> u64 {
    1000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            replay_interval_ms: default_replay_interval_ms(),
            ai_delay_ms: default_ai_delay_ms(),
            model_path: None,
            listen_addr: default_listen_addr(),
            replay_dir: default_replay_dir(),
            reconnect_attempts: default_reconnect_attempts(),
            reconnect_backoff_ms: default_reconnect_backoff_ms(),
        }
    }
}

impl AppConfig {
    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on parse or validation failure.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or is invalid.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(store = %config.store_path, "Config loaded successfully");
        Ok(config)
    }

    /// Loads `path` when it exists, otherwise returns defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an existing file is invalid.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            debug!("No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for zero intervals or an empty store path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.replay_interval_ms == 0 {
            return Err(ConfigError::new("replay_interval_ms must be positive".to_string()));
        }
        if self.ai_delay_ms == 0 {
            return Err(ConfigError::new("ai_delay_ms must be positive".to_string()));
        }
        if self.store_path.trim().is_empty() {
            return Err(ConfigError::new("store_path must not be empty".to_string()));
        }
        Ok(())
    }

    /// Replay tick as a duration.
    pub fn replay_interval(&self) -> Duration {
        Duration::from_millis(self.replay_interval_ms)
    }

    /// AI delay as a duration.
    pub fn ai_delay(&self) -> Duration {
        Duration::from_millis(self.ai_delay_ms)
    }

    /// Reconnect backoff as a duration.
    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_millis(self.reconnect_backoff_ms)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.replay_interval(), Duration::from_millis(600));
        assert_eq!(config.ai_delay(), Duration::from_millis(500));
        assert_eq!(config.listen_addr(), "127.0.0.1:4747");
    }

    #[test]
    fn test_partial_override() {
        let config = AppConfig::from_toml(
            "store_path = \"games.db\"\nmodel_path = \"policy.json\"\nai_delay_ms = 50\n",
        )
        .unwrap();
        assert_eq!(config.store_path(), "games.db");
        assert_eq!(config.model_path().as_deref(), Some(Path::new("policy.json")));
        assert_eq!(*config.ai_delay_ms(), 50);
        assert_eq!(*config.replay_interval_ms(), 600);
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(AppConfig::from_toml("replay_interval_ms = 0").is_err());
        assert!(AppConfig::from_toml("ai_delay_ms = 0").is_err());
        assert!(AppConfig::from_toml("ai_delay_ms = \"soon\"").is_err());
    }

    #[test]
    fn test_missing_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());

        let path = dir.path().join("ultimate.toml");
        std::fs::write(&path, "listen_addr = \"0.0.0.0:9000\"").unwrap();
        let config = AppConfig::load_or_default(&path).unwrap();
        assert_eq!(config.listen_addr(), "0.0.0.0:9000");
    }

    #[test]
    fn test_setters_override() {
        let config = AppConfig::default().with_store_path("other.db".to_string());
        assert_eq!(config.store_path(), "other.db");
    }
}
