//! Exporter configuration file: discovery, decoding and env overrides.

use std::path::{Path, PathBuf};

use maintenance_core::WindowDefinition;
use serde::Deserialize;
use thiserror::Error;

/// File names tried in every search directory, in order.
const FILE_NAMES: &[&str] = &["config.yaml", "config.yml"];

const ENV_ADDR: &str = "MAINTENANCE_EXPORTER_ADDR";
const ENV_TIMEZONE: &str = "MAINTENANCE_EXPORTER_TIMEZONE";
const ENV_LOGFORMAT: &str = "MAINTENANCE_EXPORTER_LOGFORMAT";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no config file found (searched: {})", .searched.join(", "))]
    NotFound { searched: Vec<String> },

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

// ── Top-level config ────────────────────────────────────────────────

/// The whole configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub config: ExporterConfig,

    /// Window definitions in file order.
    #[serde(default)]
    pub windows: Vec<WindowDefinition>,
}

/// The `config:` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExporterConfig {
    /// Listen address; a leading `:` binds every interface.
    #[serde(default = "default_addr")]
    pub addr: String,

    /// Process default timezone.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default)]
    pub logformat: LogFormat,
}

fn default_addr() -> String {
    ":9099".into()
}

fn default_timezone() -> String {
    "UTC".into()
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            timezone: default_timezone(),
            logformat: LogFormat::default(),
        }
    }
}

impl ExporterConfig {
    /// Address in a form `TcpListener::bind` accepts.
    pub fn listen_addr(&self) -> String {
        match self.addr.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{port}"),
            None => self.addr.clone(),
        }
    }
}

/// Log output format. Anything other than `json` means text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl From<String> for LogFormat {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<&str> for LogFormat {
    fn from(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

// ── Loading ─────────────────────────────────────────────────────────

impl Config {
    /// Parse config from a YAML string, then apply environment overrides.
    pub fn from_yaml(yaml: &str, origin: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load config from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content, &path.display().to_string())
    }

    // ── Environment variable overrides ──────────────────────────────

    /// Convention: `MAINTENANCE_EXPORTER_KEY` overrides `config.key`.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup(ENV_ADDR) {
            self.config.addr = v;
        }
        if let Some(v) = lookup(ENV_TIMEZONE) {
            self.config.timezone = v;
        }
        if let Some(v) = lookup(ENV_LOGFORMAT) {
            self.config.logformat = LogFormat::from(v);
        }
    }
}

// ── Discovery ───────────────────────────────────────────────────────

/// Directories searched when no explicit path is given.
pub fn search_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![PathBuf::from("/etc/maintenance-exporter")];
    if let Some(home) = std::env::var_os("HOME") {
        dirs.push(PathBuf::from(home).join(".maintenance-exporter"));
    }
    dirs.push(PathBuf::from("."));
    dirs
}

/// Resolve the config file: the explicit path if given, otherwise the first
/// match in [`search_dirs`].
pub fn discover(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    find_in(&search_dirs())
}

fn find_in(dirs: &[PathBuf]) -> Result<PathBuf, ConfigError> {
    let mut searched = Vec::new();
    for dir in dirs {
        for name in FILE_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Ok(candidate);
            }
            searched.push(candidate.display().to_string());
        }
    }
    Err(ConfigError::NotFound { searched })
}
