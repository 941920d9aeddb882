use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::error::{Result, SubwatchError};
use crate::search::SearchRequest;

/// Default browser-like User-Agent sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Global subwatch configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// User-Agent header for page requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Pause between successive pages of the same search, in seconds
    #[serde(default = "default_page_delay")]
    pub page_delay_secs: u64,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Site origin and locale-specific extraction vocabulary
    #[serde(default)]
    pub marketplace: Marketplace,

    /// Configured recurring searches
    #[serde(default)]
    pub searches: Vec<SearchRequest>,
}

/// Site-specific knobs used by the listing extractor
///
/// The sold vocabulary is Italian because the default origin is an Italian
/// marketplace; other locales can override it in the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Marketplace {
    /// Scheme + host that relative links are resolved against
    #[serde(default = "default_origin")]
    pub origin: String,
    /// Word marking a sold listing (matched case-insensitively)
    #[serde(default = "default_sold_word")]
    pub sold_word: String,
    /// Phrase shown in the notice of a concluded deal
    #[serde(default = "default_deal_concluded_phrase")]
    pub deal_concluded_phrase: String,
    /// Words that, together with the sold word, mark a concluded deal
    #[serde(default = "default_deal_concluded_words")]
    pub deal_concluded_words: Vec<String>,
    /// Fraction of search terms a multi-term title must contain
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f64,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_page_delay() -> u64 {
    2
}

fn default_timeout() -> u64 {
    30
}

fn default_origin() -> String {
    "https://www.subito.it".to_string()
}

fn default_sold_word() -> String {
    "venduto".to_string()
}

fn default_deal_concluded_phrase() -> String {
    "concluso la trattativa".to_string()
}

fn default_deal_concluded_words() -> Vec<String> {
    vec!["concluso".to_string(), "trattativa".to_string()]
}

fn default_relevance_threshold() -> f64 {
    0.5
}

impl Default for Marketplace {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            sold_word: default_sold_word(),
            deal_concluded_phrase: default_deal_concluded_phrase(),
            deal_concluded_words: default_deal_concluded_words(),
            relevance_threshold: default_relevance_threshold(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            page_delay_secs: default_page_delay(),
            request_timeout_secs: default_timeout(),
            marketplace: Marketplace::default(),
            searches: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing the defaults there if it is absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            info!(path = %path.display(), "created default configuration");
            return Ok(config);
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, falling back to in-memory defaults on any failure
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let loaded = match path {
            Some(p) => Self::load_from(p),
            None => Self::load(),
        };
        loaded.unwrap_or_else(|e| {
            error!("failed to load configuration, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubwatchError::ConfigError(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Supports SUBWATCH_CONFIG environment variable for test isolation
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("SUBWATCH_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        let dirs = project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the log directory path
    ///
    /// Supports SUBWATCH_LOG_DIR environment variable
    pub fn log_dir() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("SUBWATCH_LOG_DIR") {
            return Ok(PathBuf::from(path));
        }
        let dirs = project_dirs()?;
        Ok(dirs.data_dir().join("logs"))
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "subwatch")
        .ok_or_else(|| SubwatchError::ConfigError("Could not determine config directory".into()))
}
