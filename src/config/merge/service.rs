//! MergeService: orchestrates sources, applies merge policy, deserializes to GridConfig.

use crate::config::sources::{environment, yaml_file};
use crate::config::GridConfig;
use config::{ConfigError, Map};
use std::path::Path;

use super::merge_policy;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Load config from a file with environment overlay.
    /// Precedence: defaults (lowest) -> YAML file -> environment (highest).
    pub fn load_from_file(path: &Path) -> Result<GridConfig, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// As [`MergeService::load_from_file`], overlaying `vars` instead of the
    /// process environment when given.
    pub fn load_with_env(
        path: &Path,
        vars: Option<Map<String, String>>,
    ) -> Result<GridConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = yaml_file::add_to_builder(builder, path)?;
        let builder = environment::add_vars_to_builder(builder, vars)?;

        let config = builder.build()?;
        config.try_deserialize()
    }
}
