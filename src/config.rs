//! TOML configuration with environment overrides.
//!
//! Looked up at `<config dir>/sprintsync/config.toml` unless a path is given.
//! A missing default file yields `Config::default()`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

const APP_DIR: &str = "sprintsync";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub cookie_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub reload_delay_ms: u64,
    pub toast_ttl_ms: u64,
    pub tick_rate_ms: u64,
    pub request_timeout_secs: Option<u64>,
    /// Raw cookie string taking precedence over `cookie_file`. Only set from the environment.
    #[serde(skip)]
    pub cookie_override: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: DEFAULT_BASE_URL.to_string(),
            cookie_file: None,
            log_file: None,
            reload_delay_ms: 1000,
            toast_ttl_ms: 3000,
            tick_rate_ms: 100,
            request_timeout_secs: None,
            cookie_override: None,
        }
    }
}

impl Config {
    /// Loads from `path`, or from the default location when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => {
                let path = default_config_path();
                if path.exists() {
                    Self::load_from_path(&path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })
    }

    /// Applies `SPRINTSYNC_BASE_URL` and `SPRINTSYNC_COOKIE`.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var("SPRINTSYNC_BASE_URL").ok(),
            std::env::var("SPRINTSYNC_COOKIE").ok(),
        );
    }

    fn apply_overrides(&mut self, base_url: Option<String>, cookie: Option<String>) {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(cookie) = cookie {
            self.cookie_override = Some(cookie);
        }
    }

    pub fn cookie_path(&self) -> PathBuf {
        self.cookie_file
            .clone()
            .unwrap_or_else(|| data_dir().join("cookies"))
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| data_dir().join("sprintsync.log"))
    }

    pub fn reload_delay(&self) -> Duration {
        Duration::from_millis(self.reload_delay_ms)
    }

    pub fn toast_ttl(&self) -> Duration {
        Duration::from_millis(self.toast_ttl_ms)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(1))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}
