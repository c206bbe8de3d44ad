//! Configuration management for hail.
//!
//! Loads configuration from ${HAIL_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Hail configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the agent engine server.
    pub engine_url: String,
    /// Bearer token sent to the engine, if it requires one.
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine_url: Config::DEFAULT_ENGINE_URL.to_string(),
            api_key: None,
        }
    }
}

impl Config {
    pub const DEFAULT_ENGINE_URL: &'static str = "http://127.0.0.1:8123";

    /// Loads configuration from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Writes a default config file if none exists.
    /// Returns whether a file was created.
    pub fn init() -> Result<bool> {
        Self::init_at(&paths::config_path())
    }

    /// Writes a default config file at a specific path if none exists.
    pub fn init_at(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(true)
    }
}

fn default_config_template() -> &'static str {
    r#"# hail configuration

# Base URL of the agent engine server.
engine_url = "http://127.0.0.1:8123"

# Bearer token sent to the engine, if it requires one.
# api_key = ""
"#
}

pub mod paths {
    //! HAIL_HOME resolution order:
    //! 1. HAIL_HOME environment variable (if set)
    //! 2. ~/.config/hail (default)

    use std::path::PathBuf;

    /// Returns the hail home directory.
    ///
    /// Checks HAIL_HOME env var first, falls back to ~/.config/hail
    ///
    /// # Panics
    /// Panics if the home directory cannot be determined.
    pub fn hail_home() -> PathBuf {
        if let Ok(home) = std::env::var("HAIL_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("hail"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        hail_home().join("config.toml")
    }
}
