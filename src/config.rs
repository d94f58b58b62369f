use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::actors::DataFlow;
use crate::log::LogLevel;
use crate::query::DEFAULT_QUERY_TIMEOUT;
use crate::{vlog_debug, Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
    #[serde(default)]
    pub method: DataFlow,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
}

fn default_query_timeout_ms() -> u64 {
    DEFAULT_QUERY_TIMEOUT.as_millis() as u64
}

impl Default for Config {
    fn default() -> Self {
        Self {
            query_timeout_ms: default_query_timeout_ms(),
            method: DataFlow::default(),
            log_level: None,
            log_file: None,
        }
    }
}

impl Config {
    pub fn vertex_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".vertex"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::vertex_dir()?.join("vertex.toml"))
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// Configured log level; unparseable values fall back to the default.
    pub fn log_level(&self) -> Option<LogLevel> {
        self.log_level.as_deref().and_then(|s| s.parse().ok())
    }

    /// Configured log file, or `~/.vertex/vertex.log`.
    pub fn log_path(&self) -> Result<PathBuf> {
        match self.log_file.as_deref() {
            Some(file) => Ok(expand_tilde(file)),
            None => Ok(Self::vertex_dir()?.join("vertex.log")),
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        vlog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            vlog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        vlog_debug!(
            "Config loaded: query_timeout_ms={}, method={}, log_level={:?}",
            config.query_timeout_ms,
            config.method,
            config.log_level
        );
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                vlog_debug!("Creating config directory: {}", dir.display());
                fs::create_dir_all(dir)?;
            }
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        vlog_debug!("Config saved to {}", path.display());
        Ok(())
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
