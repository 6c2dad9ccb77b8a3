//! Annotation & Cache Store
//!
//! Per-identity annotations (watched flag, last playback position), probed
//! video metadata, and per-directory display preferences. Every key lives in
//! one of four namespaces so a namespace can be dropped in bulk.

pub mod persistence;

pub use persistence::SledCatalogStore;

use crate::error::StorageError;
use crate::types::{DirConfig, EntryId, VideoInfo};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Key namespace inside the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Done,
    LastPosition,
    VideoInfo,
    DirConfig,
}

impl Namespace {
    pub const ALL: [Namespace; 4] = [
        Namespace::Done,
        Namespace::LastPosition,
        Namespace::VideoInfo,
        Namespace::DirConfig,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Done => "done",
            Namespace::LastPosition => "lastPosition",
            Namespace::VideoInfo => "videoInfo",
            Namespace::DirConfig => "dirConfig",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Namespace::ALL
            .into_iter()
            .find(|ns| ns.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "Unknown namespace: {} (expected one of done, lastPosition, videoInfo, dirConfig)",
                    s
                )
            })
    }
}

/// Store interface
///
/// Records that fail to decode are deleted and reported as absent.
pub trait CatalogStore: Send + Sync {
    /// Watched flag, false when never set.
    fn done(&self, id: &EntryId) -> Result<bool, StorageError>;
    fn set_done(&self, id: &EntryId, done: bool) -> Result<(), StorageError>;

    /// Cached playback position in seconds.
    fn last_position(&self, id: &EntryId) -> Result<Option<f64>, StorageError>;
    fn set_last_position(&self, id: &EntryId, seconds: f64) -> Result<(), StorageError>;
    fn clear_last_position(&self, id: &EntryId) -> Result<(), StorageError>;

    fn video_info(&self, id: &EntryId) -> Result<Option<VideoInfo>, StorageError>;
    fn set_video_info(&self, id: &EntryId, info: &VideoInfo) -> Result<(), StorageError>;

    /// Display preference of a directory, keyed by its absolute path.
    fn dir_config(&self, dir: &Path) -> Result<Option<DirConfig>, StorageError>;
    fn set_dir_config(&self, dir: &Path, config: &DirConfig) -> Result<(), StorageError>;

    /// Remove every record in `namespace`, returning how many were removed.
    fn delete_prefix(&self, namespace: Namespace) -> Result<usize, StorageError>;

    fn flush(&self) -> Result<(), StorageError>;
}
