//! Persistent CLI configuration.

use std::env;
use std::path::{Path, PathBuf};

use basket_core::util::normalize_text_option;
use basket_core::SyncSettings;
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "cli-config.json";
const APP_DIR_NAME: &str = "basket";

pub const REMOTE_DIR_ENV: &str = "BASKET_REMOTE_DIR";
pub const DB_PATH_ENV: &str = "BASKET_DB_PATH";
pub const CONFIG_PATH_ENV: &str = "BASKET_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    #[serde(default)]
    pub remote_dir: Option<PathBuf>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub sync: SyncSettings,
}

const fn default_config_version() -> u32 {
    1
}

pub fn default_config_path() -> PathBuf {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join("basket.db")
}

fn non_empty_path(value: Option<PathBuf>) -> Option<PathBuf> {
    value.filter(|path| !path.as_os_str().is_empty())
}

fn env_path(name: &str) -> Option<PathBuf> {
    non_empty_path(env::var_os(name).map(PathBuf::from))
}

impl CliConfig {
    pub fn load() -> Result<Self, String> {
        Self::load_from_path(&default_config_path())
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        config
            .sync
            .validate()
            .map_err(|error| format!("Invalid config at {}: {}", path.display(), error))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, String> {
        let path = default_config_path();
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    /// Flag, then environment, then config file, then the platform data directory
    pub fn resolve_db_path(&self, explicit: Option<PathBuf>) -> PathBuf {
        non_empty_path(explicit)
            .or_else(|| env_path(DB_PATH_ENV))
            .or_else(|| self.db_path.clone())
            .unwrap_or_else(default_db_path)
    }

    /// Flag, then environment, then config file
    pub fn resolve_remote_dir(&self, explicit: Option<PathBuf>) -> Option<PathBuf> {
        non_empty_path(explicit)
            .or_else(|| env_path(REMOTE_DIR_ENV))
            .or_else(|| self.remote_dir.clone())
    }

    fn normalize(&mut self) {
        self.db_path = non_empty_path(self.db_path.take());
        self.remote_dir = non_empty_path(self.remote_dir.take());
        self.access_token = normalize_text_option(self.access_token.take());
    }
}
