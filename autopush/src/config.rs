//! autopush configuration types and loading

use eyre::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::commit::DEFAULT_BATCH_SIZE;
use crate::push::DEFAULT_REMOTE;
use crate::waiter::{DEFAULT_POLL_INTERVAL, DEFAULT_RETRY_INTERVAL, DEFAULT_THRESHOLD};

/// Name of the config file looked up in the watched directory
pub const LOCAL_CONFIG_FILE: &str = ".autopush.yml";

/// Main autopush configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Changed files needed before a batch is committed
    pub threshold: usize,

    /// Files committed per batch (0 commits every changed file)
    #[serde(rename = "batch-size")]
    pub batch_size: usize,

    /// Seconds between polls while waiting for the threshold
    #[serde(rename = "poll-interval-secs")]
    pub poll_interval_secs: u64,

    /// Seconds to wait after a failed status read
    #[serde(rename = "retry-interval-secs")]
    pub retry_interval_secs: u64,

    /// Remote used when setting up an upstream
    pub remote: String,

    /// Prompt for a branch at startup
    #[serde(rename = "select-branch")]
    pub select_branch: bool,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            batch_size: DEFAULT_BATCH_SIZE,
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            retry_interval_secs: DEFAULT_RETRY_INTERVAL.as_secs(),
            remote: DEFAULT_REMOTE.to_string(),
            select_branch: true,
            log_level: None,
        }
    }
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        if self.threshold == 0 {
            return Err(eyre::eyre!("threshold must be at least 1"));
        }
        if self.poll_interval_secs == 0 {
            return Err(eyre::eyre!("poll-interval-secs must be at least 1"));
        }
        if self.retry_interval_secs == 0 {
            return Err(eyre::eyre!("retry-interval-secs must be at least 1"));
        }
        if self.remote.trim().is_empty() {
            return Err(eyre::eyre!("remote must not be empty"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    /// Load configuration with fallback chain
    ///
    /// An explicit path must load. Otherwise `.autopush.yml` in `work_dir`,
    /// then `<config dir>/autopush/autopush.yml`, then defaults.
    pub fn load(config_path: Option<&PathBuf>, work_dir: &Path) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::default_paths(work_dir) {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    pub fn load_log_level(config_path: Option<&PathBuf>, work_dir: &Path) -> Option<String> {
        let path = match config_path {
            Some(path) => path.clone(),
            None => Self::default_paths(work_dir).into_iter().find(|p| p.exists())?,
        };
        Self::load_from_file(&path).ok()?.log_level
    }

    fn default_paths(work_dir: &Path) -> Vec<PathBuf> {
        let mut paths = vec![work_dir.join(LOCAL_CONFIG_FILE)];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("autopush").join("autopush.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}
