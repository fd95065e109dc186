use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::calendar::session::DEFAULT_PAGE_SIZE;
use crate::theme::ThemeConfig;

pub const APP_NAME: &str = "pethealth-tui";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub token: Option<String>,
    pub page_size: u32,
    pub log_level: String,
    pub theme: ThemeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000/api".to_string(),
            token: None,
            page_size: DEFAULT_PAGE_SIZE,
            log_level: "info".to_string(),
            theme: ThemeConfig::default(),
        }
    }
}

impl Config {
    /// Load `config.toml` from the user config dir, then apply env overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config = match config_path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    /// A missing file yields the defaults; an unreadable or invalid one is an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.page_size = config.page_size.max(1);
        Ok(config)
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("PETHEALTH_API_URL").filter(|v| !v.is_empty()) {
            self.api_url = url;
        }
        if let Some(token) = lookup("PETHEALTH_TOKEN").filter(|v| !v.is_empty()) {
            self.token = Some(token);
        }
        self
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME).join("config.toml"))
}

pub fn log_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join(APP_NAME).join(format!("{}.log", APP_NAME)))
}
