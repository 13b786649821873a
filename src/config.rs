//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::immoweb::models::TransactionKind;
use crate::immoweb::query::PropertyCategory;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Search endpoint the query path is appended to.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// ISO country code sent as the `countries` parameter.
    #[serde(default = "default_country")]
    pub country: String,

    /// Categories used when a filter spec leaves them unset.
    #[serde(default = "default_categories")]
    pub default_categories: Vec<PropertyCategory>,

    /// Transaction kind used when a filter spec leaves it unset.
    #[serde(default = "default_transaction")]
    pub default_transaction: TransactionKind,

    /// Base pacing delay between requests in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Random jitter added to the pacing delay (0 to this value).
    #[serde(default = "default_delay_jitter_ms")]
    pub delay_jitter_ms: u64,

    /// How long to wait for the result grid to populate.
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,

    /// Re-fetch interval while waiting for the result grid.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// User-Agent header for all requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Cap on listings harvested per run.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Hard wall-clock budget for one watch run, in seconds.
    #[serde(default = "default_run_budget_secs")]
    pub run_budget_secs: u64,

    /// Snapshot store location; defaults to the XDG data directory.
    #[serde(default)]
    pub store_path: Option<PathBuf>,

    /// Telegram bot token for notifications.
    #[serde(default)]
    pub telegram_bot_token: Option<String>,

    /// Telegram chat id notifications are sent to.
    #[serde(default)]
    pub telegram_chat_id: Option<String>,
}

fn default_base_url() -> String {
    "https://www.immoweb.be/en/search".to_string()
}

fn default_country() -> String {
    "BE".to_string()
}

fn default_categories() -> Vec<PropertyCategory> {
    vec![PropertyCategory::HouseAndApartment]
}

fn default_transaction() -> TransactionKind {
    TransactionKind::Rental
}

fn default_delay_ms() -> u64 {
    2000
}

fn default_delay_jitter_ms() -> u64 {
    1000
}

fn default_wait_timeout_ms() -> u64 {
    10_000
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/131.0.0.0 Safari/537.36"
        .to_string()
}

fn default_max_results() -> usize {
    5
}

fn default_run_budget_secs() -> u64 {
    300
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            country: default_country(),
            default_categories: default_categories(),
            default_transaction: default_transaction(),
            delay_ms: default_delay_ms(),
            delay_jitter_ms: default_delay_jitter_ms(),
            wait_timeout_ms: default_wait_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            user_agent: default_user_agent(),
            max_results: default_max_results(),
            run_budget_secs: default_run_budget_secs(),
            store_path: None,
            telegram_bot_token: None,
            telegram_chat_id: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("immowatch").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(base_url) = std::env::var("IMMO_BASE_URL") {
            self.base_url = base_url;
        }

        if let Ok(delay) = std::env::var("IMMO_DELAY") {
            if let Ok(d) = delay.parse() {
                self.delay_ms = d;
            }
        }

        if let Ok(token) = std::env::var("IMMO_TELEGRAM_BOT_TOKEN") {
            self.telegram_bot_token = Some(token);
        }

        if let Ok(chat_id) = std::env::var("IMMO_TELEGRAM_CHAT_ID") {
            self.telegram_chat_id = Some(chat_id);
        }

        if let Ok(store) = std::env::var("IMMO_STORE") {
            self.store_path = Some(PathBuf::from(store));
        }

        self
    }

    /// Resolved store path: configured value or the XDG data directory.
    pub fn store_path(&self) -> PathBuf {
        if let Some(path) = &self.store_path {
            return path.clone();
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("immowatch")
            .join("snapshot.json")
    }
}
