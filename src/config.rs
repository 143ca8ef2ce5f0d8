use std::path::PathBuf;

use crate::model::Language;

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5480;
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_MAX_CONNECTIONS: usize = 64;

/// Server settings, read once from `VACAPLAN_*` environment variables.
///
/// Unparseable values fall back to the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub max_connections: usize,
    pub metrics_port: Option<u16>,
    pub language: Language,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            metrics_port: None,
            language: Language::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let language = match lookup("VACAPLAN_LANG") {
            Some(code) => Language::from_code(&code).unwrap_or_else(|| {
                tracing::warn!("unknown VACAPLAN_LANG {code:?}, using English");
                Language::English
            }),
            None => defaults.language,
        };
        Self {
            bind: lookup("VACAPLAN_BIND").unwrap_or(defaults.bind),
            port: lookup("VACAPLAN_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            data_dir: lookup("VACAPLAN_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            max_connections: lookup("VACAPLAN_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_connections),
            metrics_port: lookup("VACAPLAN_METRICS_PORT").and_then(|s| s.parse().ok()),
            language,
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
