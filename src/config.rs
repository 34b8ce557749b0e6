use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::drag::FailurePolicy;
use crate::error::{ApiError, Error, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/";
const CONFIG_ENV: &str = "BOARDUST_CONFIG";
const API_URL_ENV: &str = "BOARDUST_API_URL";

/// Client settings. Every field has a default, so a partial file is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the REST API, e.g. `http://localhost:8000/api/`.
    pub api_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// What to do with the board when a drag cannot be confirmed.
    pub on_move_failure: FailurePolicy,
    /// Log file used by the interactive board.
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 10,
            on_move_failure: FailurePolicy::default(),
            log_file: None,
        }
    }
}

/// Returns the path to the config file (`config.json`).
///
/// The path is determined in the following order:
/// 1. `BOARDUST_CONFIG` environment variable.
/// 2. `~/.config/boardust/config.json` (on Linux).
/// 3. `./boardust.json` (fallback).
pub fn config_path() -> PathBuf {
    std::env::var(CONFIG_ENV).map(PathBuf::from).unwrap_or_else(|_| {
        match dirs::config_dir() {
            Some(mut p) => {
                p.push("boardust");
                p.push("config.json");
                p
            }
            None => PathBuf::from("boardust.json"),
        }
    })
}

impl Config {
    /// Loads the config file (if any) and applies environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Config::from_file(&config_path())?;
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.api_url = url;
            }
        }
        Ok(config)
    }

    /// Reads a config file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let s = fs::read_to_string(path)?;
        serde_json::from_str(&s).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Parsed base URL, always ending in `/` so relative joins keep the path.
    pub fn base_url(&self) -> std::result::Result<Url, ApiError> {
        let mut raw = self.api_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).map_err(|_| ApiError::InvalidUrl(self.api_url.clone()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Log file for the interactive board, next to the other local data.
    pub fn log_path(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(|| {
            let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
            p.push("boardust");
            p.push("boardust.log");
            p
        })
    }
}
