//! Configuration
//!
//! Loads the root-folder configuration from `config.yaml`, validates it, and
//! publishes immutable snapshots that the path gateway reads on every check.

pub mod facade;
pub mod lifecycle;
pub mod merge;
pub mod paths;
pub mod sources;
pub mod storage_paths;
pub mod validation;
pub mod watch;

pub use facade::ConfigLoader;
pub use lifecycle::{check_dirs, ConfigHandle, RootState, RootStatus};
pub use storage_paths::StoragePaths;
pub use watch::{reload_into, ConfigWatcher};

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub(crate) fn default_host() -> String {
    "127.0.0.1".to_string()
}

pub(crate) fn default_port() -> u16 {
    60001
}

fn default_true() -> bool {
    true
}

pub(crate) fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

pub(crate) fn default_ffprobe() -> PathBuf {
    PathBuf::from("ffprobe")
}

/// Root folders plus display and touch behaviour.
///
/// Replaced wholesale on reload; never mutated while a reader holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Listening host, owned by the transport layer
    #[serde(default = "default_host")]
    pub host: String,

    /// Listening port, owned by the transport layer
    #[serde(default = "default_port")]
    pub port: u16,

    /// Absolute paths of the served root folders, in display order
    #[serde(default)]
    pub folders: Vec<PathBuf>,

    /// Skip entries whose name starts with a dot
    #[serde(default = "default_true")]
    pub hide_dotfiles: bool,

    #[serde(default = "default_true")]
    pub launch_browser: bool,

    /// Touch the parent folder's access time when a file is opened
    #[serde(default)]
    pub bring_folder_to_top: bool,

    /// Touch the parent folder's access time when a file is marked done
    #[serde(default)]
    pub bring_folder_to_top_done: bool,

    /// Touch the opened file's own access time
    #[serde(default)]
    pub update_date_accessed: bool,

    /// ffmpeg executable, resolved through PATH when relative
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: PathBuf,

    #[serde(default = "default_ffprobe")]
    pub ffprobe: PathBuf,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            folders: Vec::new(),
            hide_dotfiles: true,
            launch_browser: true,
            bring_folder_to_top: false,
            bring_folder_to_top_done: false,
            update_date_accessed: false,
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
            logging: LoggingConfig::default(),
        }
    }
}

impl GridConfig {
    /// Configuration serving exactly the given roots, everything else default.
    pub fn with_folders<I, P>(folders: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            folders: folders.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Written to the data directory when no config file exists yet.
pub const CONFIG_TEMPLATE: &str = r#"# MediaGrid configuration
#
# Changes to this file are picked up while the catalog is running.

# Listening address of the local API (localhost only is recommended)
host: 127.0.0.1
port: 60001

# Absolute paths of the folders to serve
folders: []

# Hide files and folders starting with "."
hide_dotfiles: true

launch_browser: true

# Update the parent folder's access time when a video is opened
bring_folder_to_top: false

# Update the parent folder's access time when a video is marked done
bring_folder_to_top_done: false

# Update the video's own access time when it is opened
update_date_accessed: false

# External tools used for thumbnails and video info
ffmpeg: ffmpeg
ffprobe: ffprobe
"#;
