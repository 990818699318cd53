use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Explicit application configuration. Passed into each component rather than
/// living in ambient globals; loadable from a YAML file, every field optional.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Directory for processed-data artifacts (user downloads).
    pub data_dir: PathBuf,
    /// DuckDB database file.
    pub db_path: PathBuf,
    /// Destination table for cleaned engagement rows.
    pub engagement_table: String,
    /// Destination table for delegate authorizations.
    pub delegates_table: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            data_dir: PathBuf::from("data/loading"),
            db_path: PathBuf::from("data/etc_tracker.duckdb"),
            engagement_table: "engagement_data".to_string(),
            delegates_table: "engagement_delegates".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file. Missing fields fall back to the
    /// defaults; a missing file is [`Error::NotFound`].
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)?;
        serde_yaml::from_str(&text).map_err(|e| Error::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Create the artifact directory and the database file's parent directory.
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
