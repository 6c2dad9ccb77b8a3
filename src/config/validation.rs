//! Configuration validation.

use super::GridConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Validate a deserialized configuration.
///
/// Root folders are the security boundary, so a relative or empty entry rejects
/// the whole configuration rather than being skipped.
pub fn validate_config(config: &GridConfig) -> Result<(), String> {
    for folder in &config.folders {
        if folder.as_os_str().is_empty() {
            return Err("Folder entries cannot be empty".to_string());
        }
        if !folder.is_absolute() {
            return Err(format!(
                "Folder {} must be an absolute path",
                folder.display()
            ));
        }
    }

    if config.ffmpeg.as_os_str().is_empty() || config.ffprobe.as_os_str().is_empty() {
        return Err("ffmpeg and ffprobe paths cannot be empty".to_string());
    }

    if config.port == 0 {
        return Err("Port must be between 1 and 65535".to_string());
    }

    if config.host.trim().is_empty() {
        return Err("Host cannot be empty".to_string());
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(format!(
            "Invalid log level: {} (must be one of {})",
            config.logging.level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.logging.format != "json" && config.logging.format != "text" {
        return Err(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            config.logging.format
        ));
    }

    Ok(())
}
