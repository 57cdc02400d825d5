//! Configuration loading
//!
//! Stash-box registries are configured in a TOML file; an environment
//! variable can override each registry's API key so keys stay out of
//! checked-in config files. Resolution priority per key: environment
//! variable, then TOML.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::fingerprint::DEFAULT_PHASH_DISTANCE;
use crate::{Error, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote metadata registries, looked up by name
    #[serde(default)]
    pub stash_boxes: Vec<StashBoxConfig>,

    /// Override for the perceptual-hash match distance
    #[serde(default)]
    pub phash_distance: Option<u32>,
}

/// One remote stash-box registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StashBoxConfig {
    pub name: String,
    /// GraphQL endpoint URL
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
}

impl Config {
    /// Load configuration from an explicit path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("read {}: {e}", path.display())))?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("parse {}: {e}", path.display())))
    }

    /// Load configuration from the platform config directory.
    ///
    /// A missing file is not fatal: defaults are returned with a warning so
    /// callers can still operate on explicitly supplied registries.
    pub fn load_default() -> Result<Self> {
        let Some(path) = default_config_path() else {
            warn!("could not determine config directory, using defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load(&path)
    }

    /// Look up a configured registry by name.
    pub fn stash_box(&self, name: &str) -> Option<&StashBoxConfig> {
        self.stash_boxes.iter().find(|b| b.name == name)
    }

    /// The effective perceptual-hash match distance.
    pub fn phash_distance(&self) -> u32 {
        self.phash_distance.unwrap_or(DEFAULT_PHASH_DISTANCE)
    }
}

impl StashBoxConfig {
    /// Resolve the API key, preferring the per-registry environment
    /// variable (`STASH_BOX_<NAME>_API_KEY`) over the TOML value.
    pub fn resolved_api_key(&self) -> String {
        match std::env::var(self.api_key_env_var()) {
            Ok(key) if !key.trim().is_empty() => key,
            _ => self.api_key.clone(),
        }
    }

    /// Environment variable name for this registry's API key. Non-alphanumeric
    /// characters of the registry name map to underscores.
    pub fn api_key_env_var(&self) -> String {
        let mut name = String::with_capacity(self.name.len());
        for c in self.name.chars() {
            if c.is_ascii_alphanumeric() {
                name.push(c.to_ascii_uppercase());
            } else {
                name.push('_');
            }
        }
        format!("STASH_BOX_{name}_API_KEY")
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("stash").join("config.toml"))
}
