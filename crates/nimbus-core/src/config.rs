//! Configuration and profile management
//!
//! Profiles are stored in TOML under the platform config directory and name
//! an API endpoint, the subscription to operate on, and the credentials to
//! use. Polling behavior (interval, timeout) can be tuned per profile.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::poller::PollOptions;

/// Errors that can occur during configuration operations
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load config from {path}: {source}")]
    LoadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to save config to {path}: {source}")]
    SaveError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("no profile configured; run 'nimbusctl profile set' or pass --profile")]
    NoProfileConfigured,

    #[error("failed to determine config directory")]
    ConfigDirError,
}

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Profile used when none is named on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    /// Map of profile name -> profile configuration
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// Individual profile configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Profile {
    /// Base URL of the Resource Manager endpoint
    pub api_url: String,
    /// Subscription all resource paths are scoped to
    pub subscription_id: String,
    /// Bearer token; can be omitted and supplied via NIMBUS_ACCESS_TOKEN
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Polling behavior for asynchronous operations
    #[serde(default)]
    pub poll: PollSettings,
}

/// Per-profile polling settings
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct PollSettings {
    /// Seconds between status polls
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Seconds to wait for an operation before giving up
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    10
}

fn default_timeout_secs() -> u64 {
    1800
}

impl From<PollSettings> for PollOptions {
    fn from(settings: PollSettings) -> Self {
        PollOptions::new(
            Duration::from_secs(settings.timeout_secs),
            Duration::from_secs(settings.interval_secs),
        )
    }
}

impl Config {
    /// Load from the default platform location; a missing file yields the
    /// default (empty) configuration
    pub fn load() -> ConfigResult<Self> {
        Self::load_from_path(&Self::default_path()?)
    }

    /// Load from an explicit path; a missing file yields the default
    /// configuration, a corrupt file is an error
    pub fn load_from_path(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::LoadError {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&raw)?)
    }

    pub fn save(&self) -> ConfigResult<()> {
        self.save_to_path(&Self::default_path()?)
    }

    pub fn save_to_path(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::SaveError {
                path: path.display().to_string(),
                source,
            })?;
        }
        let raw = toml::to_string_pretty(self)?;
        fs::write(path, raw).map_err(|source| ConfigError::SaveError {
            path: path.display().to_string(),
            source,
        })
    }

    /// Platform config file location (e.g. `~/.config/nimbusctl/config.toml`
    /// on Linux)
    pub fn default_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("dev", "nimbus-cloud", "nimbusctl").ok_or(ConfigError::ConfigDirError)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Resolve a profile by name, falling back to the configured default
    pub fn resolve_profile(&self, name: Option<&str>) -> ConfigResult<(String, &Profile)> {
        let name = match name {
            Some(name) => name.to_string(),
            None => match (&self.default_profile, self.profiles.keys().next()) {
                (Some(name), _) => name.clone(),
                // An only profile is an unambiguous default.
                (None, Some(only)) if self.profiles.len() == 1 => only.clone(),
                _ => return Err(ConfigError::NoProfileConfigured),
            },
        };

        let profile = self
            .profiles
            .get(&name)
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.clone() })?;
        Ok((name, profile))
    }
}
