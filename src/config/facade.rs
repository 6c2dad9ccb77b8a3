//! ConfigLoader facade delegating to merge service and validation.

use super::merge::service::MergeService;
use super::validation::validate_config;
use super::{GridConfig, CONFIG_TEMPLATE};
use crate::error::ApiError;
use std::path::Path;
use tracing::{info, warn};

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from a specific file.
    ///
    /// Any parse or validation failure is `ConfigInvalid`; callers decide
    /// whether that is fatal (startup) or retained-previous (reload).
    pub fn load_from_file(path: &Path) -> Result<GridConfig, ApiError> {
        let config = MergeService::load_from_file(path)?;
        validate_config(&config).map_err(ApiError::ConfigInvalid)?;
        Ok(config)
    }

    /// Load configuration, writing the template first if the file is missing.
    pub fn load_or_init(path: &Path) -> Result<GridConfig, ApiError> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ApiError::ConfigError(format!(
                        "Failed to create config directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
            std::fs::write(path, CONFIG_TEMPLATE).map_err(|e| {
                ApiError::ConfigError(format!(
                    "Failed to write config template to {}: {}",
                    path.display(),
                    e
                ))
            })?;
            warn!(path = %path.display(), "Config file not found, wrote template");
        }

        let config = Self::load_from_file(path)?;
        info!(
            path = %path.display(),
            folders = config.folders.len(),
            "Loaded config"
        );
        Ok(config)
    }
}
