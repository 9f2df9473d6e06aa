// ABOUTME: Configuration loading for the client and the PTY host
// Reads ~/.termlink/config.toml (or an explicit path); missing keys fall back to defaults

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_DIR: &str = ".termlink";
const CONFIG_FILE: &str = "config.toml";
const DEFAULT_BIND: &str = "127.0.0.1:8080";
const DEFAULT_TERM: &str = "xterm-256color";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub client: ClientConfig,
    pub server: ServerConfig,
}

/// Settings for `termlink connect`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Page or WebSocket URL used when none is given on the command line
    pub url: Option<String>,
    /// Translate bare LF in session output into CRLF
    pub convert_eol: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: None,
            convert_eol: true,
        }
    }
}

/// Settings for `termlink serve`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP/WebSocket listener binds to
    pub bind: String,
    /// Program spawned in the PTY for each session
    pub command: String,
    pub args: Vec<String>,
    /// TERM exported to the child
    pub term: String,
    /// Initial PTY geometry, used until the client reports its own
    pub cols: u16,
    pub rows: u16,
    /// Query keys passed on to the child as `--key=value`
    pub forward_query: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            command: std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string()),
            args: Vec::new(),
            term: DEFAULT_TERM.to_string(),
            cols: 120,
            rows: 40,
            forward_query: Vec::new(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `path` is `None`.
    ///
    /// An explicit path must exist. A missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Self::from_file(path)
            }
            None => match default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn base_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR))
        .unwrap_or_else(|| PathBuf::from(CONFIG_DIR))
}

/// `~/.termlink/config.toml`
pub fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Directory client log files are written to.
pub fn log_dir() -> PathBuf {
    base_dir().join("logs")
}
