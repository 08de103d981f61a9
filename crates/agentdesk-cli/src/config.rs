//! Configuration file support

use agentdesk_api::client::{BASE_URL_ENV, DEFAULT_TIMEOUT};
use agentdesk_sync::StoreConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Backend used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Configuration for agentdesk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL
    pub base_url: Option<String>,
    /// Agent to address when `--agent` is not given
    pub default_agent: Option<String>,
    pub search_debounce_ms: Option<u64>,
    pub scroll_threshold_px: Option<f64>,
    pub page_size: Option<usize>,
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("agentdesk")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("AGENTDESK_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file. A missing or broken file yields the defaults.
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Self::default()
            }),
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let store = StoreConfig::default();
        let default_config = Config {
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            default_agent: None,
            search_debounce_ms: Some(store.search_debounce.as_millis() as u64),
            scroll_threshold_px: Some(store.scroll_threshold_px),
            page_size: Some(store.page_size),
            request_timeout_secs: Some(DEFAULT_TIMEOUT.as_secs()),
        };

        default_config.save()?;
        Ok(path)
    }

    /// Resolve the backend URL: flag, then environment, then file, then default
    pub fn resolve_base_url(&self, flag: Option<String>) -> String {
        flag.or_else(|| std::env::var(BASE_URL_ENV).ok())
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Store settings, with unset keys at their defaults
    pub fn store_config(&self) -> StoreConfig {
        let defaults = StoreConfig::default();
        StoreConfig {
            search_debounce: self
                .search_debounce_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.search_debounce),
            scroll_threshold_px: self
                .scroll_threshold_px
                .unwrap_or(defaults.scroll_threshold_px),
            page_size: self.page_size.filter(|&n| n > 0).unwrap_or(defaults.page_size),
        }
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# agentdesk configuration file
# Place at ~/.config/agentdesk/config.toml (Linux) or set AGENTDESK_CONFIG_PATH

# Chat backend (AGENTDESK_BASE_URL and --base-url take precedence)
base_url = "http://localhost:8000"

# Agent addressed by `agentdesk chat` when --agent is not given
# default_agent = "Finance_Agent"

# Delay after the last keystroke before a search is sent
search_debounce_ms = 300

# Load the next page when this close to the bottom of the list
scroll_threshold_px = 100.0

# Conversations per page
page_size = 20

# Per-request timeout
request_timeout_secs = 60
"#
}
