use std::env;
use std::path::PathBuf;

use crate::error::SochiError;
use crate::select::{DEFAULT_MAX_SAMPLE, DEFAULT_RECENT_LIMIT};

pub const DEFAULT_PAGES_BASE_URL: &str = "https://souchi-lab.github.io/sochi-blocks";

/// Runtime configuration for the publishing tools.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// JSON catalog file.
    pub catalog_path: PathBuf,
    /// Root of the published static site.
    pub docs_dir: PathBuf,
    /// Where pretty viewer documents are staged before publishing.
    pub staging_dir: PathBuf,
    /// Public URL of `docs_dir`, without trailing slash.
    pub pages_base_url: String,
    /// Size of the recency window.
    pub recent_limit: usize,
    /// Cap on candidates scored per selection.
    pub max_sample: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("sochi_catalog.json"),
            docs_dir: PathBuf::from("docs"),
            staging_dir: PathBuf::from("frontend/public/puzzles"),
            pages_base_url: DEFAULT_PAGES_BASE_URL.to_string(),
            recent_limit: DEFAULT_RECENT_LIMIT,
            max_sample: DEFAULT_MAX_SAMPLE,
        }
    }
}

impl Config {
    /// Defaults overridden by `SOCHI_*` environment variables.
    pub fn from_env() -> Result<Self, SochiError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SochiError> {
        let mut cfg = Self::default();
        if let Some(v) = lookup("SOCHI_CATALOG") {
            cfg.catalog_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("SOCHI_DOCS_DIR") {
            cfg.docs_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("SOCHI_STAGING_DIR") {
            cfg.staging_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("SOCHI_PAGES_URL") {
            cfg.pages_base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("SOCHI_RECENT_LIMIT") {
            cfg.recent_limit = parse_count("SOCHI_RECENT_LIMIT", &v)?;
        }
        if let Some(v) = lookup("SOCHI_MAX_SAMPLE") {
            cfg.max_sample = parse_count("SOCHI_MAX_SAMPLE", &v)?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), SochiError> {
        if self.max_sample == 0 {
            return Err(SochiError::Config("max_sample must be at least 1".into()));
        }
        Ok(())
    }
}

fn parse_count(key: &str, value: &str) -> Result<usize, SochiError> {
    value
        .trim()
        .parse()
        .map_err(|_| SochiError::Config(format!("{key} must be a non-negative integer, got {value:?}")))
}
