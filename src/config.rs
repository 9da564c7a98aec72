//! Configuration management for comic-mcp.

use crate::error::{ComicError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default Komga address when nothing else is configured.
pub const DEFAULT_KOMGA_URL: &str = "http://localhost:25600";

/// Default SQLite file name for the local catalog.
pub const DEFAULT_DATABASE_FILE: &str = "comics.db";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Local comic database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Komga connection settings.
    #[serde(default)]
    pub komga: KomgaConfig,
}

/// Local database configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite file. CLI argument and `COMIC_DB_PATH` take precedence.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Komga connection configuration.
///
/// Credential fields accept `$NAME` to read the value from the environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KomgaConfig {
    /// Server root, e.g. `http://nas.local:25600`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key, sent as `X-API-Key`. Wins over basic credentials.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Basic auth user.
    #[serde(default)]
    pub username: Option<String>,

    /// Basic auth password.
    #[serde(default)]
    pub password: Option<String>,

    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_KOMGA_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for KomgaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            username: None,
            password: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl KomgaConfig {
    /// Overlay `KOMGA_*` variables read through `lookup`.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("KOMGA_BASE_URL") {
            self.base_url = url;
        }
        if let Some(key) = non_empty("KOMGA_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(user) = non_empty("KOMGA_USERNAME") {
            self.username = Some(user);
        }
        if let Some(pass) = non_empty("KOMGA_PASSWORD") {
            self.password = Some(pass);
        }
    }

    /// Resolve `$NAME` references in the credential fields through `lookup`.
    pub fn resolve_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for field in [&mut self.api_key, &mut self.username, &mut self.password] {
            if let Some(value) = field.as_mut() {
                *value = resolve_env_with(value, &lookup);
            }
        }
        self.base_url = resolve_env_with(&self.base_url, &lookup);
    }

    /// Human-readable auth mode, never the secret itself.
    pub fn auth_mode(&self) -> &'static str {
        if self.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
            "api_key"
        } else if self.username.is_some() && self.password.is_some() {
            "basic"
        } else {
            "none"
        }
    }
}

impl Config {
    /// Get the default config file path.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ComicError::Config("Could not find config directory".to_string()))?;

        Ok(config_dir.join("comic-mcp").join("config.toml"))
    }

    /// Load configuration from a specific path, then apply the process environment.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::read_file(path)?;
        let lookup = |key: &str| std::env::var(key).ok();
        config.komga.resolve_with(lookup);
        config.komga.apply_env_with(lookup);
        Ok(config)
    }

    /// Parse the file without touching the environment. Missing file yields defaults.
    pub fn read_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Resolve environment variable references (values starting with $).
fn resolve_env_with<F>(value: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(var_name) = value.strip_prefix('$') {
        lookup(var_name).unwrap_or_else(|| {
            tracing::warn!("Environment variable {} not set", var_name);
            value.to_string()
        })
    } else {
        value.to_string()
    }
}
