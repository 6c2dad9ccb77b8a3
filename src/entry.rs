//! Entry: one file or directory seen through the catalog.
//!
//! An `Entry` lives for a single operation. It memoizes its stat the first
//! time it is asked, so identity, display record and thumbnail resolution all
//! agree on the same size even if the file changes underneath.

use crate::catalog::Catalog;
use crate::error::ApiError;
use crate::history::{self, HistorySnapshot, UNKNOWN_POSITION};
use crate::stat_cache::FileStat;
use crate::types::{DisplayRecord, EntryId, EntryKind, ExtraInfo, VideoInfo};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

pub struct Entry {
    catalog: Arc<Catalog>,
    name: String,
    absolute_path: PathBuf,
    kind: EntryKind,
    stat: OnceCell<FileStat>,
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("name", &self.name)
            .field("absolute_path", &self.absolute_path)
            .field("kind", &self.kind)
            .finish()
    }
}

impl Entry {
    pub(crate) fn new(
        catalog: Arc<Catalog>,
        name: String,
        absolute_path: PathBuf,
        kind: EntryKind,
    ) -> Self {
        Self {
            catalog,
            name,
            absolute_path,
            kind,
            stat: OnceCell::new(),
        }
    }

    /// Entry whose stat is already known, as produced by a lookup.
    pub(crate) fn with_stat(
        catalog: Arc<Catalog>,
        name: String,
        absolute_path: PathBuf,
        stat: FileStat,
    ) -> Self {
        let kind = stat.kind;
        Self {
            catalog,
            name,
            absolute_path,
            kind,
            stat: OnceCell::new_with(Some(stat)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.absolute_path
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Metadata, fetched through the stat cache at most once per entry.
    pub async fn stat(&self) -> Result<&FileStat, ApiError> {
        self.stat
            .get_or_try_init(|| async {
                self.catalog
                    .stats()
                    .stat(&self.absolute_path)
                    .await
                    .map_err(|e| ApiError::from_io(&self.absolute_path, e))
            })
            .await
    }

    pub async fn id(&self) -> Result<EntryId, ApiError> {
        let stat = self.stat().await?;
        Ok(EntryId::derive(&self.absolute_path, stat.size))
    }

    /// Where this file's generated thumbnail lives, whether or not it exists yet.
    pub async fn thumbnail_path(&self) -> Result<PathBuf, ApiError> {
        let id = self.id().await?;
        Ok(self.catalog.thumbnails().file_thumbnail_path(&id))
    }

    /// Resolve (generating if needed) a representative image for this entry.
    pub async fn generate_thumbnail(&self) -> Result<PathBuf, ApiError> {
        self.catalog.thumbnails().resolve(self).await
    }

    /// Last playback position in seconds, or -1 when unknown or a directory.
    pub async fn last_position(&self, snapshot: &HistorySnapshot) -> Result<f64, ApiError> {
        if self.is_dir() {
            return Ok(UNKNOWN_POSITION);
        }
        let id = self.id().await?;
        Ok(history::last_position(
            self.catalog.store(),
            &id,
            &self.absolute_path,
            snapshot,
        )?)
    }

    pub async fn clear_last_position(&self) -> Result<(), ApiError> {
        let id = self.id().await?;
        self.catalog.store().clear_last_position(&id)?;
        Ok(())
    }

    /// Probed stream info, cached by identity. `None` for directories.
    pub async fn video_info(&self) -> Result<Option<VideoInfo>, ApiError> {
        if !self.is_file() {
            return Ok(None);
        }
        let id = self.id().await?;
        if let Some(cached) = self.catalog.store().video_info(&id)? {
            return Ok(Some(cached));
        }

        let info = self
            .catalog
            .tool()
            .probe_video_info(&self.absolute_path)
            .await?;
        self.catalog.store().set_video_info(&id, &info)?;
        debug!(path = %self.absolute_path.display(), ?info, "Cached video info");
        Ok(Some(info))
    }

    pub async fn done(&self) -> Result<bool, ApiError> {
        let id = self.id().await?;
        Ok(self.catalog.store().done(&id)?)
    }

    pub async fn set_done(&self, done: bool) -> Result<(), ApiError> {
        let id = self.id().await?;
        self.catalog.store().set_done(&id, done)?;
        Ok(())
    }

    /// Build the externally-facing record. Never fails.
    ///
    /// A vanished entry comes back tagged missing with size -1 and the epoch
    /// as its modification time. Extra info degrades field by field.
    pub async fn to_display_record(
        &self,
        include_extra: bool,
        snapshot: &HistorySnapshot,
    ) -> DisplayRecord {
        let mut record = DisplayRecord {
            name: self.name.clone(),
            is_directory: self.is_dir(),
            is_file: self.is_file(),
            absolute_path: self.absolute_path.to_string_lossy().into_owned(),
            done: false,
            size: -1,
            date_modified: DateTime::<Utc>::from(std::time::UNIX_EPOCH),
            missing: false,
            extra_info: ExtraInfo::default(),
        };

        match self.stat().await {
            Ok(stat) => {
                record.size = i64::try_from(stat.size).unwrap_or(i64::MAX);
                if let Some(modified) = stat.modified {
                    record.date_modified = DateTime::<Utc>::from(modified);
                }
            }
            Err(e) => {
                debug!(path = %self.absolute_path.display(), error = %e, "Entry is missing");
                record.missing = true;
                return record;
            }
        }

        match self.done().await {
            Ok(done) => record.done = done,
            Err(e) => warn!(path = %self.absolute_path.display(), error = %e, "Failed to read done flag"),
        }

        if include_extra {
            match self.last_position(snapshot).await {
                Ok(seconds) => record.extra_info.last_position = Some(seconds),
                Err(e) => warn!(path = %self.absolute_path.display(), error = %e, "Failed to read last position"),
            }
            match self.video_info().await {
                Ok(info) => record.extra_info.video_info = info,
                Err(e) => warn!(path = %self.absolute_path.display(), error = %e, "Failed to probe video info"),
            }
        }

        record
    }
}
