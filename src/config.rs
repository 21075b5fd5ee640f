use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::controller::backend::gilrs_backend::GilrsSettings;
use crate::controller::backend::{DEFAULT_MAX_SLOTS, MAX_SLOTS_LIMIT};

const CONFIG_DIR: &str = ".config/padbridge";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),

    #[error("Could not determine home directory")]
    NoHomeDir,
}

/// Bridge configuration, stored as TOML
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    /// Number of simultaneous controller slots
    pub max_slots: usize,
    /// Stick deadzone as a fraction of full travel
    pub stick_deadzone: f32,
    /// Background poll period
    pub poll_interval_ms: u64,
    /// Slots polled in the background
    pub poll_slots: Vec<i32>,
    /// Normalized deflection a stick needs before it points somewhere
    pub stick_direction_threshold: f32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            max_slots: DEFAULT_MAX_SLOTS,
            stick_deadzone: 0.05,
            poll_interval_ms: 16,
            poll_slots: vec![0],
            stick_direction_threshold: 0.5,
        }
    }
}

impl BridgeConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_slots == 0 {
            return Err(ConfigError::Invalid("max_slots must be at least 1".into()));
        }
        if self.max_slots > MAX_SLOTS_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_slots {} exceeds limit {}",
                self.max_slots, MAX_SLOTS_LIMIT
            )));
        }
        if !(0.0..1.0).contains(&self.stick_deadzone) {
            return Err(ConfigError::Invalid(format!(
                "stick_deadzone {} outside [0, 1)",
                self.stick_deadzone
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be at least 1".into(),
            ));
        }
        if let Some(slot) = self
            .poll_slots
            .iter()
            .find(|s| **s < 0 || **s as usize >= self.max_slots)
        {
            return Err(ConfigError::Invalid(format!(
                "poll slot {} outside 0..{}",
                slot, self.max_slots
            )));
        }
        if !(0.0..=1.0).contains(&self.stick_direction_threshold) {
            return Err(ConfigError::Invalid(format!(
                "stick_direction_threshold {} outside [0, 1]",
                self.stick_direction_threshold
            )));
        }
        Ok(())
    }

    pub fn gilrs_settings(&self) -> GilrsSettings {
        GilrsSettings {
            max_slots: self.max_slots,
            stick_deadzone: self.stick_deadzone,
        }
    }

    /// `~/.config/padbridge/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let mut path = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        Ok(path)
    }

    /// Load from `path`; a missing file yields the defaults
    pub async fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        if !exists {
            warn!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded config from {}", path.display());
        debug!("Config: {:?}", config);
        Ok(config)
    }

    pub async fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?).await
    }

    /// Write the defaults to `path` unless a file is already there
    pub async fn ensure_default_config(path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if tokio::fs::try_exists(path).await.map_err(io_err)? {
            debug!("Config already exists at {}", path.display());
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let content = Self::default().to_toml_string()?;
        tokio::fs::write(path, content).await.map_err(io_err)?;
        info!("Wrote default config to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let config = BridgeConfig::from_toml_str("poll_interval_ms = 8\n").unwrap();
        assert_eq!(config.poll_interval_ms, 8);
        assert_eq!(config.max_slots, 4);
        assert_eq!(config.poll_slots, vec![0]);
    }

    #[test]
    fn defaults_survive_toml() {
        let text = BridgeConfig::default().to_toml_string().unwrap();
        assert_eq!(
            BridgeConfig::from_toml_str(&text).unwrap(),
            BridgeConfig::default()
        );
    }

    #[test]
    fn rejects_poll_slot_past_max() {
        let err = BridgeConfig::from_toml_str("max_slots = 2\npoll_slots = [0, 2]\n");
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_huge_slot_count() {
        let err = BridgeConfig::from_toml_str("max_slots = 100000\n");
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
        let at_limit = format!("max_slots = {}\n", MAX_SLOTS_LIMIT);
        assert!(BridgeConfig::from_toml_str(&at_limit).is_ok());
    }

    #[test]
    fn rejects_full_deadzone() {
        let err = BridgeConfig::from_toml_str("stick_deadzone = 1.0\n");
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            BridgeConfig::from_toml_str("max_slots = \"four\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn missing_file_gives_defaults_and_ensure_writes_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        assert_eq!(
            BridgeConfig::load_from(&path).await.unwrap(),
            BridgeConfig::default()
        );

        BridgeConfig::ensure_default_config(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(
            BridgeConfig::load_from(&path).await.unwrap(),
            BridgeConfig::default()
        );
    }

    #[tokio::test]
    async fn ensure_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        tokio::fs::write(&path, "max_slots = 8\n").await.unwrap();

        BridgeConfig::ensure_default_config(&path).await.unwrap();
        let config = BridgeConfig::load_from(&path).await.unwrap();
        assert_eq!(config.max_slots, 8);
    }
}
