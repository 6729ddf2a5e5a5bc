//! Configuration for docchat.
//!
//! `~/.docchat/config.toml` is optional; every field has a default supplied by
//! the crate that consumes it. String values may reference environment
//! variables as `${NAME}`.
//!
//! ```toml
//! [server]
//! base_url = "http://localhost:8000/api"
//! request_timeout_secs = 30
//! chat_timeout_secs = 120
//! connect_timeout_secs = 10
//!
//! [app]
//! view = "ask"
//! ```

mod atomic_write;
mod credentials;

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use serde::Deserialize;
use thiserror::Error;

use docchat_types::ViewMode;

pub use credentials::CredentialStore;

/// Overrides `server.base_url` when set and non-empty.
pub const API_URL_ENV: &str = "DOCCHAT_API_URL";

const DATA_DIR: &str = ".docchat";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Default, Deserialize)]
pub struct DocchatConfig {
    pub server: Option<ServerConfig>,
    pub app: Option<AppConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ServerConfig {
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    /// Raised to the client's floor when lower.
    pub chat_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Initial tab: `ask` or `knowledge`.
    pub view: Option<String>,
}

pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                if !name.is_empty() {
                    out.push_str(&env::var(name).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                // Unclosed reference stays literal.
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

impl DocchatConfig {
    /// Load `~/.docchat/config.toml`. `Ok(None)` when there is no file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// Backend base URL: [`API_URL_ENV`] first, then `server.base_url`.
    /// `None` means use the client default.
    #[must_use]
    pub fn base_url(&self) -> Option<String> {
        self.resolve_base_url(env::var(API_URL_ENV).ok())
    }

    fn resolve_base_url(&self, env_override: Option<String>) -> Option<String> {
        env_override
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .or_else(|| {
                self.server
                    .as_ref()
                    .and_then(|server| server.base_url.as_deref())
                    .map(|raw| expand_env_vars(raw).trim().to_string())
                    .filter(|value| !value.is_empty())
            })
    }

    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.server_secs(|server| server.request_timeout_secs)
    }

    #[must_use]
    pub fn chat_timeout(&self) -> Option<Duration> {
        self.server_secs(|server| server.chat_timeout_secs)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.server_secs(|server| server.connect_timeout_secs)
    }

    fn server_secs(&self, field: impl Fn(&ServerConfig) -> Option<u64>) -> Option<Duration> {
        self.server
            .as_ref()
            .and_then(field)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Initial view mode. Unknown values fall back to the default with a warning.
    #[must_use]
    pub fn view_mode(&self) -> ViewMode {
        let Some(raw) = self.app.as_ref().and_then(|app| app.view.as_deref()) else {
            return ViewMode::default();
        };
        ViewMode::parse(raw).unwrap_or_else(|| {
            tracing::warn!(view = raw, "Unknown view in config; using default");
            ViewMode::default()
        })
    }
}

/// `~/.docchat`, home of the config file, the credential and the logs.
#[must_use]
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DATA_DIR))
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join(CONFIG_FILE))
}
