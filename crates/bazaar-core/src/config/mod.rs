//! Client configuration shared by every Bazaar front end.
//!
//! `ClientConfig` is stored as pretty JSON. Environment variables take
//! precedence over the stored file so a `.env` or shell export can point a
//! client at another backend without rewriting the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::util::{normalize_base_url, normalize_text_option};

/// Backend used when nothing is configured (local PocketBase dev server)
pub const DEFAULT_POCKETBASE_URL: &str = "http://127.0.0.1:8090";

pub const ENV_POCKETBASE_URL: &str = "BAZAAR_POCKETBASE_URL";
pub const ENV_CLOUD_SYNC: &str = "BAZAAR_CLOUD_SYNC";
pub const ENV_DB_PATH: &str = "BAZAAR_DB_PATH";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default = "default_pocketbase_url")]
    pub pocketbase_url: String,
    /// Mirror favorite writes to the backend while signed in
    #[serde(default = "default_cloud_sync")]
    pub cloud_sync: bool,
    /// Local favorites database; platform data dir when unset
    #[serde(default)]
    pub db_path: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            pocketbase_url: default_pocketbase_url(),
            cloud_sync: default_cloud_sync(),
            db_path: None,
        }
    }
}

fn default_pocketbase_url() -> String {
    DEFAULT_POCKETBASE_URL.to_string()
}

const fn default_cloud_sync() -> bool {
    true
}

impl ClientConfig {
    /// Read the config at `path`; a missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize()?;
        Ok(config)
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
        normalized.normalize()?;
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    /// Apply process environment overrides.
    pub fn with_env_overrides(self) -> Result<Self, String> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`. Blank values are ignored.
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, String> {
        if let Some(url) = normalize_text_option(lookup(ENV_POCKETBASE_URL)) {
            self.pocketbase_url = url;
        }
        if let Some(raw) = normalize_text_option(lookup(ENV_CLOUD_SYNC)) {
            self.cloud_sync = parse_flag(&raw)
                .ok_or_else(|| format!("{ENV_CLOUD_SYNC} must be true or false, got '{raw}'"))?;
        }
        if let Some(path) = normalize_text_option(lookup(ENV_DB_PATH)) {
            self.db_path = Some(path);
        }
        self.normalize()?;
        Ok(self)
    }

    /// Database location, if one is configured
    pub fn db_path(&self) -> Option<PathBuf> {
        self.db_path.as_deref().map(PathBuf::from)
    }

    fn normalize(&mut self) -> Result<(), String> {
        self.pocketbase_url = normalize_base_url(&self.pocketbase_url).ok_or_else(|| {
            format!(
                "pocketbase_url must include http:// or https://, got '{}'",
                self.pocketbase_url.trim()
            )
        })?;
        self.db_path = normalize_text_option(self.db_path.take());
        Ok(())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
