//! Runtime configuration.
//!
//! A `Config` is constructed once in `main` from an optional TOML file plus
//! `LETRAS_*` environment overrides and passed into every component
//! constructor. There is no ambient global lookup.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_BASE_URL: &str = "https://www.letras.mus.br";
const DEFAULT_INDEX_PATH: &str = "/estilos/gospelreligioso/todosartistas.html";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site root, without a trailing slash
    pub base_url: String,
    /// Path of the artist index page relative to `base_url`
    pub index_path: String,
    /// Concurrent in-flight request cap (clamped to 1..=50)
    pub max_workers: usize,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// SQLite database file
    pub database_path: PathBuf,
    /// Include a store snapshot in the release archive
    pub snapshot_in_release: bool,
    pub filters: FilterConfig,
}

/// Exclusion rules applied to scraped content.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Case-insensitive substrings that disqualify an artist name
    pub artist_exclude: Vec<String>,
    /// Case-insensitive substrings that disqualify a song title.
    /// Also matched against full lyrics bodies.
    pub title_exclude: Vec<String>,
    /// Inclusive lower bound on lyrics length (characters)
    pub min_length: usize,
    /// Inclusive upper bound on lyrics length (characters)
    pub max_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            index_path: DEFAULT_INDEX_PATH.to_string(),
            max_workers: 28,
            timeout_secs: 30,
            database_path: PathBuf::from("letras.db"),
            snapshot_in_release: true,
            filters: FilterConfig::default(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            artist_exclude: Vec::new(),
            title_exclude: Vec::new(),
            min_length: 100,
            max_length: 15_000,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, then apply environment overrides.
    ///
    /// A missing file is only an error when its path was given explicitly;
    /// the default `letras.toml` is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from("letras.toml"), false),
        };

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?
        } else if required {
            return Err(Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        } else {
            Config::default()
        };

        if let Ok(url) = std::env::var("LETRAS_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(db) = std::env::var("LETRAS_DATABASE") {
            config.database_path = PathBuf::from(db);
        }
        if let Ok(workers) = std::env::var("LETRAS_MAX_WORKERS") {
            config.max_workers = workers
                .parse()
                .map_err(|_| Error::Config(format!("invalid LETRAS_MAX_WORKERS: {}", workers)))?;
        }

        config.max_workers = config.max_workers.clamp(1, 50);
        if config.filters.min_length > config.filters.max_length {
            return Err(Error::Config(format!(
                "filters.min_length ({}) exceeds filters.max_length ({})",
                config.filters.min_length, config.filters.max_length
            )));
        }

        Ok(config)
    }
}
