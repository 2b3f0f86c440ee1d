use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use crate::ai::Difficulty;
use crate::error::ConfigError;
use crate::game::GameSettings;
use crate::streak::StreakPolicy;

/// Computer opponent settings.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub difficulty: Difficulty,
    /// Pause before the computer moves.
    pub think_delay_ms: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig {
            difficulty: Difficulty::Medium,
            think_delay_ms: 1000,
        }
    }
}

impl AiConfig {
    pub fn think_delay(&self) -> Duration {
        Duration::from_millis(self.think_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            data_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StreakConfig {
    /// Hours a win keeps the streak alive.
    pub window_hours: u32,
}

impl Default for StreakConfig {
    fn default() -> Self {
        StreakConfig { window_hours: 24 }
    }
}

impl StreakConfig {
    pub fn policy(&self) -> StreakPolicy {
        StreakPolicy::from_hours(self.window_hours)
    }
}

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub game: GameSettings,
    pub ai: AiConfig,
    pub store: StoreConfig,
    pub streak: StreakConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let game = &self.game;
        if game.rows == 0 {
            return Err(ConfigError::Validation("game.rows must be > 0".into()));
        }
        if game.cols == 0 {
            return Err(ConfigError::Validation("game.cols must be > 0".into()));
        }
        if game.win_length < 2 {
            return Err(ConfigError::Validation(
                "game.win_length must be >= 2".into(),
            ));
        }
        if game.win_length > game.rows.max(game.cols) {
            return Err(ConfigError::Validation(
                "game.win_length must fit on the board".into(),
            ));
        }
        if self.streak.window_hours == 0 {
            return Err(ConfigError::Validation(
                "streak.window_hours must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&AppConfig::default())
    }
}
