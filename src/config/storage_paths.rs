//! On-disk layout under the application data directory.

use crate::error::ApiError;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.yaml";

/// Resolved locations of the config file, store, and thumbnail cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    pub data_dir: PathBuf,
    pub config_file: PathBuf,
    pub kv_path: PathBuf,
    pub thumbnail_dir: PathBuf,
}

impl StoragePaths {
    /// Layout: `config.yaml`, `data/kv.db`, `data/thumbnails/`.
    pub fn under(data_dir: &Path) -> Self {
        let data = data_dir.join("data");
        Self {
            data_dir: data_dir.to_path_buf(),
            config_file: data_dir.join(CONFIG_FILENAME),
            kv_path: data.join("kv.db"),
            thumbnail_dir: data.join("thumbnails"),
        }
    }

    /// Create the data and thumbnail directories if missing.
    pub fn ensure(&self) -> Result<(), ApiError> {
        for dir in [&self.data_dir, &self.thumbnail_dir] {
            std::fs::create_dir_all(dir).map_err(|e| {
                ApiError::ConfigError(format!(
                    "Failed to create directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}
