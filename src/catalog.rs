//! Catalog
//!
//! Owns the shared state every [`Entry`] delegates to: config snapshots, the
//! path gateway, the stat cache, the store, the external tools and the
//! thumbnail cache. Every operation taking a path authorizes it first.

use crate::config::{check_dirs, ConfigHandle, ConfigLoader, StoragePaths};
use crate::entry::Entry;
use crate::error::ApiError;
use crate::gateway::PathGateway;
use crate::history::{HistorySnapshot, HistorySource};
use crate::lister::DirListing;
use crate::media::MediaTool;
use crate::sorting::sort_records;
use crate::stat_cache::StatCache;
use crate::store::{CatalogStore, Namespace, SledCatalogStore};
use crate::thumbnail::ThumbnailResolver;
use crate::types::{DirConfig, DisplayRecord, VideoInfo};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime};
use tracing::{debug, info, warn};

/// Display records built concurrently per listing
const LIST_CONCURRENCY: usize = 16;

/// One directory's worth of display records, sorted by its preference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub is_top_level: bool,
    /// Parent directory, empty for a configured root
    pub previous_dir: String,
    pub dir_config: DirConfig,
    pub extra_info: bool,
    pub records: Vec<DisplayRecord>,
}

/// Command used to hand a file to the desktop's default application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opener {
    program: PathBuf,
    args: Vec<OsString>,
}

impl Opener {
    pub fn new(program: impl Into<PathBuf>, args: Vec<OsString>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Self::new("cmd", vec!["/C".into(), "start".into(), "".into()])
        } else if cfg!(target_os = "macos") {
            Self::new("open", Vec::new())
        } else {
            Self::new("xdg-open", Vec::new())
        }
    }

    fn spawn(&self, path: &Path) -> Result<(), ApiError> {
        tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| {
                ApiError::tool_failure(
                    &self.program.display().to_string(),
                    "spawn",
                    e.to_string().as_bytes(),
                )
            })?;
        Ok(())
    }
}

pub struct Catalog {
    config: ConfigHandle,
    gateway: PathGateway,
    stats: StatCache,
    store: Arc<dyn CatalogStore>,
    tool: Arc<dyn MediaTool>,
    history: Arc<dyn HistorySource>,
    thumbnails: ThumbnailResolver,
    opener: Opener,
}

impl Catalog {
    /// Assemble a catalog from already-open parts.
    pub fn new(
        config: ConfigHandle,
        store: Arc<dyn CatalogStore>,
        tool: Arc<dyn MediaTool>,
        history: Arc<dyn HistorySource>,
        thumbnail_dir: impl Into<PathBuf>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            gateway: PathGateway::new(config.clone()),
            config,
            stats: StatCache::new(),
            store,
            tool,
            history,
            thumbnails: ThumbnailResolver::new(thumbnail_dir)?,
            opener: Opener::platform_default(),
        })
    }

    /// Open the catalog living under a data directory.
    ///
    /// Writes a config template when none exists. An invalid config is fatal.
    pub fn create(
        paths: &StoragePaths,
        tool: Arc<dyn MediaTool>,
        history: Arc<dyn HistorySource>,
    ) -> Result<Arc<Self>, ApiError> {
        paths.ensure()?;
        let config = ConfigLoader::load_or_init(&paths.config_file)?;
        check_dirs(&config);
        let store = SledCatalogStore::open(&paths.kv_path)?;
        let catalog = Self::new(
            ConfigHandle::new(config),
            Arc::new(store),
            tool,
            history,
            paths.thumbnail_dir.clone(),
        )?;
        info!(data_dir = %paths.data_dir.display(), "Catalog ready");
        Ok(Arc::new(catalog))
    }

    pub fn with_opener(mut self, opener: Opener) -> Self {
        self.opener = opener;
        self
    }

    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    pub fn gateway(&self) -> &PathGateway {
        &self.gateway
    }

    pub fn stats(&self) -> &StatCache {
        &self.stats
    }

    pub fn store(&self) -> &dyn CatalogStore {
        self.store.as_ref()
    }

    pub fn tool(&self) -> &dyn MediaTool {
        self.tool.as_ref()
    }

    pub fn thumbnails(&self) -> &ThumbnailResolver {
        &self.thumbnails
    }

    /// Fresh export of the external player's history.
    pub async fn history_snapshot(&self) -> HistorySnapshot {
        self.history.snapshot().await
    }

    /// One directory entry per configured root, in config order.
    pub fn home(self: &Arc<Self>) -> Vec<Entry> {
        self.config
            .snapshot()
            .folders
            .iter()
            .map(|root| {
                Entry::new(
                    Arc::clone(self),
                    root.to_string_lossy().into_owned(),
                    root.clone(),
                    crate::types::EntryKind::Directory,
                )
            })
            .collect()
    }

    /// Display records for the roots. Missing roots are tagged, never dropped.
    pub async fn home_display(self: &Arc<Self>) -> Vec<DisplayRecord> {
        let snapshot = HistorySnapshot::new();
        let mut records = Vec::new();
        for root in self.home() {
            records.push(root.to_display_record(false, &snapshot).await);
        }
        records
    }

    pub async fn entry(self: &Arc<Self>, path: &Path) -> Result<Entry, ApiError> {
        self.gateway.assert_allowed(path)?;
        let stat = self
            .stats
            .stat(path)
            .await
            .map_err(|e| ApiError::from_io(path, e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(Entry::with_stat(Arc::clone(self), name, path.to_path_buf(), stat))
    }

    pub async fn list(self: &Arc<Self>, dir: &Path) -> Result<DirListing, ApiError> {
        DirListing::open(Arc::clone(self), dir).await
    }

    /// List a directory as sorted display records.
    ///
    /// With `include_extra`, one history snapshot is taken for the whole
    /// listing and each record carries its position and video info.
    pub async fn list_display(
        self: &Arc<Self>,
        dir: &Path,
        include_extra: bool,
    ) -> Result<Listing, ApiError> {
        let started = Instant::now();
        self.gateway.assert_allowed(dir)?;
        let dir_config = self.dir_config(dir)?;
        let snapshot = if include_extra {
            self.history.snapshot().await
        } else {
            HistorySnapshot::new()
        };

        let entries = self.list(dir).await?.collect().await?;
        let snapshot = &snapshot;
        let mut records: Vec<DisplayRecord> = stream::iter(entries)
            .map(|entry| async move { entry.to_display_record(include_extra, snapshot).await })
            .buffer_unordered(LIST_CONCURRENCY)
            .collect()
            .await;
        sort_records(&mut records, &dir_config);

        debug!(
            dir = %dir.display(),
            count = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Listed directory"
        );

        Ok(Listing {
            is_top_level: self.is_top_level(dir),
            previous_dir: self
                .previous_dir(dir)
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            dir_config,
            extra_info: include_extra,
            records,
        })
    }

    pub fn dir_config(&self, dir: &Path) -> Result<DirConfig, ApiError> {
        self.gateway.assert_allowed(dir)?;
        Ok(self.store.dir_config(dir)?.unwrap_or_default())
    }

    pub fn set_dir_config(&self, dir: &Path, config: &DirConfig) -> Result<(), ApiError> {
        self.gateway.assert_allowed(dir)?;
        self.store.set_dir_config(dir, config)?;
        Ok(())
    }

    pub fn is_top_level(&self, path: &Path) -> bool {
        self.gateway.is_top_level(path)
    }

    /// Parent of `path`, or `None` when `path` is a root.
    pub fn previous_dir(&self, path: &Path) -> Option<PathBuf> {
        if self.is_top_level(path) {
            return None;
        }
        path.parent().map(Path::to_path_buf)
    }

    /// Launch the file with the desktop opener, then apply the configured touches.
    pub async fn open(&self, path: &Path) -> Result<(), ApiError> {
        self.gateway.assert_allowed(path)?;
        debug!(path = %path.display(), "Opening path");
        self.opener.spawn(path)?;

        let config = self.config.snapshot();
        if config.bring_folder_to_top {
            self.bring_folder_to_top(path).await?;
        }
        if config.update_date_accessed {
            self.update_date_accessed(path).await?;
        }
        Ok(())
    }

    pub async fn set_done(self: &Arc<Self>, path: &Path, done: bool) -> Result<(), ApiError> {
        let entry = self.entry(path).await?;
        debug!(path = %path.display(), done, "Setting done");
        entry.set_done(done).await?;

        if done && self.config.snapshot().bring_folder_to_top_done {
            self.bring_folder_to_top(path).await?;
        }
        Ok(())
    }

    /// Set the access time to now, keeping the modification time.
    pub async fn update_date_accessed(&self, path: &Path) -> Result<(), ApiError> {
        self.gateway.assert_allowed(path)?;
        let stat = self
            .stats
            .stat(path)
            .await
            .map_err(|e| ApiError::from_io(path, e))?;

        let now = SystemTime::now();
        let modified = stat.modified.unwrap_or(now);
        let target = path.to_path_buf();
        tokio::task::spawn_blocking(move || touch(&target, now, modified))
            .await
            .map_err(|e| ApiError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
            .map_err(|e| ApiError::from_io(path, e))?;

        self.stats.invalidate(path);
        debug!(path = %path.display(), "Updated date accessed");
        Ok(())
    }

    /// Touch the access time of the folder containing `path`.
    ///
    /// A parent outside every root is left alone.
    pub async fn bring_folder_to_top(&self, path: &Path) -> Result<(), ApiError> {
        self.gateway.assert_allowed(path)?;
        let Some(dir) = path.parent() else {
            return Ok(());
        };
        if !self.gateway.is_allowed(dir) {
            debug!(dir = %dir.display(), "Parent is outside the roots, not bringing to top");
            return Ok(());
        }
        let stat = self
            .stats
            .stat(dir)
            .await
            .map_err(|e| ApiError::from_io(dir, e))?;
        if !stat.is_dir() {
            return Ok(());
        }
        debug!(dir = %dir.display(), "Bringing folder to top");
        self.update_date_accessed(dir).await
    }

    /// Image for `path`, or the placeholder when none can be produced.
    ///
    /// Authorization failures are returned, never replaced by the placeholder.
    pub async fn thumbnail(self: &Arc<Self>, path: &Path) -> Result<PathBuf, ApiError> {
        let resolved = match self.entry(path).await {
            Ok(entry) => entry.generate_thumbnail().await,
            Err(e) => Err(e),
        };
        match resolved {
            Ok(image) => Ok(image),
            Err(e) if e.is_security_violation() => Err(e),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Thumbnail failed, using placeholder");
                Ok(self.thumbnails.placeholder().to_path_buf())
            }
        }
    }

    pub async fn video_info(self: &Arc<Self>, path: &Path) -> Result<Option<VideoInfo>, ApiError> {
        self.entry(path).await?.video_info().await
    }

    /// Drop every cached record in a namespace.
    pub fn clear_cache(&self, namespace: Namespace) -> Result<usize, ApiError> {
        let removed = self.store.delete_prefix(namespace)?;
        info!(%namespace, removed, "Cleared cache");
        Ok(removed)
    }

    pub fn close(&self) -> Result<(), ApiError> {
        self.store.flush()?;
        self.stats.invalidate_all();
        info!("Catalog closed");
        Ok(())
    }
}

fn touch(path: &Path, accessed: SystemTime, modified: SystemTime) -> std::io::Result<()> {
    let times = std::fs::FileTimes::new()
        .set_accessed(accessed)
        .set_modified(modified);
    open_for_times(path)?.set_times(times)
}

#[cfg(not(windows))]
fn open_for_times(path: &Path) -> std::io::Result<std::fs::File> {
    std::fs::File::open(path)
}

#[cfg(windows)]
fn open_for_times(path: &Path) -> std::io::Result<std::fs::File> {
    use std::os::windows::fs::OpenOptionsExt;
    const FILE_WRITE_ATTRIBUTES: u32 = 0x0100;
    const FILE_FLAG_BACKUP_SEMANTICS: u32 = 0x0200_0000;
    std::fs::OpenOptions::new()
        .access_mode(FILE_WRITE_ATTRIBUTES)
        .custom_flags(FILE_FLAG_BACKUP_SEMANTICS)
        .open(path)
}
