//! Configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::results::PASSING_SCORE;

/// Top-level ledgerexam configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerExamConfig {
    /// Directory (or single file) holding exam TOML files.
    #[serde(default = "default_catalog_dir")]
    pub catalog_dir: PathBuf,
    /// JSON file the result history is kept in.
    #[serde(default = "default_history_file")]
    pub history_file: PathBuf,
    /// Minimum score counted as a pass.
    #[serde(default = "default_passing_score")]
    pub passing_score: u32,
}

fn default_catalog_dir() -> PathBuf {
    PathBuf::from("./exams")
}
fn default_history_file() -> PathBuf {
    PathBuf::from("./ledgerexam-history.json")
}
fn default_passing_score() -> u32 {
    PASSING_SCORE
}

impl Default for LedgerExamConfig {
    fn default() -> Self {
        Self {
            catalog_dir: default_catalog_dir(),
            history_file: default_history_file(),
            passing_score: default_passing_score(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Unset variables expand to the empty string.
pub fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `ledgerexam.toml` in the current directory
/// 2. `~/.config/ledgerexam/config.toml`
///
/// Environment variable overrides: `LEDGEREXAM_CATALOG_DIR`,
/// `LEDGEREXAM_HISTORY_FILE`.
pub fn load_config() -> Result<LedgerExamConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<LedgerExamConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("ledgerexam.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => LedgerExamConfig::default(),
    };

    // Apply env var overrides
    if let Ok(dir) = std::env::var("LEDGEREXAM_CATALOG_DIR") {
        config.catalog_dir = PathBuf::from(dir);
    }
    if let Ok(file) = std::env::var("LEDGEREXAM_HISTORY_FILE") {
        config.history_file = PathBuf::from(file);
    }

    config.catalog_dir = resolve_path(&config.catalog_dir);
    config.history_file = resolve_path(&config.history_file);

    Ok(config)
}

/// Parse a config TOML string without env overrides.
pub fn parse_config_str(content: &str) -> Result<LedgerExamConfig> {
    Ok(toml::from_str(content)?)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("ledgerexam"))
}
