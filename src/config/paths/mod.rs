//! Application data directory resolution.

use crate::error::ApiError;
use std::path::PathBuf;

pub const DATA_DIR_ENV: &str = "MEDIAGRID_DATA_DIR";

/// Resolve the application data directory.
///
/// Precedence: explicit argument (CLI), `MEDIAGRID_DATA_DIR`, then the
/// platform data directory from `ProjectDirs`.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf, ApiError> {
    if let Some(p) = explicit {
        if !p.as_os_str().is_empty() {
            return Ok(p);
        }
    }
    if let Ok(env_path) = std::env::var(DATA_DIR_ENV) {
        if !env_path.is_empty() {
            return Ok(PathBuf::from(env_path));
        }
    }
    default_data_dir()
}

fn default_data_dir() -> Result<PathBuf, ApiError> {
    let project_dirs = directories::ProjectDirs::from("", "mediagrid", "mediagrid").ok_or_else(|| {
        ApiError::ConfigError("Could not determine platform data directory".to_string())
    })?;
    Ok(project_dirs.data_dir().to_path_buf())
}
