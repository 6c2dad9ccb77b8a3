//! Core types shared across the catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// EntryId: path hash plus a kilobyte-resolution size bucket.
///
/// Two entries with the same absolute path and the same size bucket share an
/// identity. Resizing a file across a kilobyte boundary produces a new one, which
/// invalidates every cache keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn derive(absolute_path: &Path, size: u64) -> Self {
        let path_hash = blake3::hash(absolute_path.to_string_lossy().as_bytes());
        let kb = size / 1024;
        EntryId(format!("{}_{:x}", path_hash.to_hex(), kb))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of a filesystem object served by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

/// Probed stream information for a video file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub codec_name: String,
    pub width: u32,
    pub height: u32,
    pub duration: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Name,
    Size,
    DateModified,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    List,
    Grid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemSize {
    Small,
    #[default]
    Medium,
    Large,
}

/// Per-directory display preference; absent fields take their defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DirConfig {
    pub sort: SortKey,
    pub order: SortOrder,
    pub view: ViewMode,
    pub item_size: ItemSize,
}

/// Optional enrichment attached to a display record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_position: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_info: Option<VideoInfo>,
}

/// Externally-facing representation of an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRecord {
    pub name: String,
    pub is_directory: bool,
    pub is_file: bool,
    pub absolute_path: String,
    pub done: bool,
    /// Size in bytes, or -1 when the entry could not be stat'ed
    pub size: i64,
    pub date_modified: DateTime<Utc>,
    /// Set when the entry vanished or could not be read
    #[serde(default)]
    pub missing: bool,
    pub extra_info: ExtraInfo,
}
