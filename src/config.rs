//! Configuration for the WPM meter.

use crate::core::autosave::DEFAULT_AUTOSAVE_INTERVAL;
use crate::core::counter::{APP_DIR_NAME, RECORD_FILE_NAME};
use crate::core::estimator::DEFAULT_WINDOW;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration for the meter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the keystroke record
    pub data_path: PathBuf,

    /// How often the keystroke counter is saved
    #[serde(with = "duration_serde")]
    pub autosave_interval: Duration,

    /// Length of the rolling WPM window
    #[serde(with = "duration_serde")]
    pub window: Duration,

    /// Whether keystroke accounting is currently paused
    pub paused: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME);

        Self {
            data_path: data_dir,
            autosave_interval: DEFAULT_AUTOSAVE_INTERVAL,
            window: DEFAULT_WINDOW,
            paused: false,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns the defaults when no config file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
            .join("config.json")
    }

    /// Location of the keystroke record.
    pub fn counter_path(&self) -> PathBuf {
        self.data_path.join(RECORD_FILE_NAME)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.window.is_zero() {
            return Err(ConfigError::Invalid("window must be at least 1 second".into()));
        }
        if self.autosave_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "autosave_interval must be at least 1 second".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration as whole seconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
