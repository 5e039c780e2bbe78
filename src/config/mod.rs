//! Session configuration for gator.
//!
//! The config is a small JSON document at `~/.gatorconfig.json` holding the
//! database location and the name of the logged-in user. It is read once at
//! startup and written back only when a command changed it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = ".gatorconfig.json";

/// On-disk configuration and current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub db_url: String,
    #[serde(default)]
    pub current_user_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_url: default_db_url(),
            current_user_name: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from `path`.
    ///
    /// If the file doesn't exist, a default one is written and returned.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let data = serde_json::to_string(self).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        fs::write(path, data).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// `~/.gatorconfig.json`, or `./config.json` when there is no home directory.
    pub fn default_config_path() -> PathBuf {
        match dirs::home_dir() {
            Some(home) => home.join(CONFIG_FILE_NAME),
            None => PathBuf::from("./config.json"),
        }
    }

    /// Name of the logged-in user, if any.
    pub fn current_user(&self) -> Option<&str> {
        let name = self.current_user_name.as_str();
        (!name.trim().is_empty()).then_some(name)
    }

    pub fn set_user(&mut self, name: &str) {
        self.current_user_name = name.to_string();
    }
}

fn default_db_url() -> String {
    dirs::data_dir()
        .map(|d| d.join("gator").join("gator.db"))
        .unwrap_or_else(|| PathBuf::from("gator.db"))
        .to_string_lossy()
        .into_owned()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}
