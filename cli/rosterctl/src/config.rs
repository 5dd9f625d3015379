//! Configuration and credential storage.
//!
//! Handles:
//! - API endpoint configuration
//! - Slot catalog shape and navigation policy
//! - Bearer token storage

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use roster_grid::{
    CatalogError, SlotCatalog, DEFAULT_END_HOUR, DEFAULT_GRANULARITY_MINUTES, DEFAULT_START_HOUR,
};
use roster_reconcile::NavigationPolicy;
use serde::{Deserialize, Serialize};

/// Configuration file name.
const CONFIG_FILE: &str = "config.json";

/// Credentials file name.
const CREDENTIALS_FILE: &str = "credentials.json";

/// Get the config directory path.
pub fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("org", "roster", "roster")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// API endpoint URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default)]
    pub catalog: CatalogConfig,

    /// What `--date` switches do with pending edits.
    #[serde(default)]
    pub navigation_policy: NavigationPolicy,
}

fn default_api_url() -> String {
    std::env::var("ROSTER_API_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            catalog: CatalogConfig::default(),
            navigation_policy: NavigationPolicy::default(),
        }
    }
}

impl Config {
    /// Load config from the user config dir, or return default.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_dir()?)
    }

    pub fn load_from(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {:?}", path))
    }

    /// Get the API URL.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Save config to the user config dir.
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_dir()?)
    }

    pub fn save_to(&self, dir: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        write_private(dir, CONFIG_FILE, &contents)
    }
}

/// Shape of the day's slot catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub start_hour: u32,
    pub end_hour: u32,
    pub granularity_minutes: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            start_hour: DEFAULT_START_HOUR,
            end_hour: DEFAULT_END_HOUR,
            granularity_minutes: DEFAULT_GRANULARITY_MINUTES,
        }
    }
}

impl CatalogConfig {
    pub fn build(&self) -> Result<SlotCatalog, CatalogError> {
        SlotCatalog::generate(self.start_hour, self.end_hour, self.granularity_minutes)
    }
}

/// Stored credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Bearer token.
    pub token: String,

    /// When the token was stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Credentials {
    pub fn new(token: String) -> Self {
        Self {
            token,
            saved_at: Some(chrono::Utc::now()),
        }
    }

    /// Load credentials from the user config dir.
    pub fn load() -> Result<Option<Self>> {
        Self::load_from(&config_dir()?)
    }

    pub fn load_from(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(CREDENTIALS_FILE);

        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read credentials from {:?}", path))?;

        let creds: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse credentials from {:?}", path))?;

        Ok(Some(creds))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&config_dir()?)
    }

    pub fn save_to(&self, dir: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        write_private(dir, CREDENTIALS_FILE, &contents)
    }

    pub fn delete() -> Result<()> {
        Self::delete_from(&config_dir()?)
    }

    /// Delete stored credentials. Missing credentials are not an error.
    pub fn delete_from(dir: &Path) -> Result<()> {
        let path = dir.join(CREDENTIALS_FILE);

        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to delete credentials at {:?}", path))?;
        }

        Ok(())
    }
}

/// Write `contents` to `dir/name`, readable by the owner only on Unix.
fn write_private(dir: &Path, name: &str, contents: &str) -> Result<()> {
    fs::create_dir_all(dir)?;
    let path = dir.join(name);

    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(&path)
            .with_context(|| format!("Failed to open {:?}", path))?;
        file.write_all(contents.as_bytes())?;
    }

    #[cfg(not(unix))]
    {
        fs::write(&path, contents).with_context(|| format!("Failed to write {:?}", path))?;
    }

    Ok(())
}
