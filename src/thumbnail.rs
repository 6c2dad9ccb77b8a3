//! Thumbnail Resolver
//!
//! Files get a generated frame stored as `{id}.jpg` in the thumbnail
//! directory. Directories borrow an image: an explicit cover first, otherwise
//! the first descendant that resolves to something other than the placeholder.

use crate::concurrency::FlightLocks;
use crate::entry::Entry;
use crate::error::ApiError;
use crate::media::seek_target;
use crate::sorting::natural_cmp;
use crate::types::{EntryId, EntryKind};
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const PLACEHOLDER_FILE: &str = "placeholder.png";

const COVER_FILES: [&str; 2] = ["cover.jpg", "cover.png"];

/// Transparent 1x1 PNG
const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0a, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

#[derive(Debug)]
pub struct ThumbnailResolver {
    dir: PathBuf,
    placeholder: PathBuf,
    flights: FlightLocks,
}

impl ThumbnailResolver {
    /// Use `dir` as the thumbnail cache, writing the placeholder image if absent.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ApiError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let placeholder = dir.join(PLACEHOLDER_FILE);
        if !placeholder.is_file() {
            std::fs::write(&placeholder, PLACEHOLDER_PNG)?;
            debug!(path = %placeholder.display(), "Wrote placeholder image");
        }
        Ok(Self {
            dir,
            placeholder,
            flights: FlightLocks::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn placeholder(&self) -> &Path {
        &self.placeholder
    }

    pub fn is_placeholder(&self, path: &Path) -> bool {
        path == self.placeholder
    }

    pub fn file_thumbnail_path(&self, id: &EntryId) -> PathBuf {
        self.dir.join(format!("{}.jpg", id))
    }

    /// Representative image for `entry`.
    ///
    /// Authorization failures always propagate. For directories, children
    /// that fail to resolve are skipped.
    pub async fn resolve(&self, entry: &Entry) -> Result<PathBuf, ApiError> {
        let mut visited = HashSet::new();
        self.resolve_inner(entry, &mut visited).await
    }

    fn resolve_inner<'a>(
        &'a self,
        entry: &'a Entry,
        visited: &'a mut HashSet<PathBuf>,
    ) -> BoxFuture<'a, Result<PathBuf, ApiError>> {
        async move {
            entry.catalog().gateway().assert_allowed(entry.path())?;
            let stat = entry.stat().await?;
            match stat.kind {
                EntryKind::File => self.resolve_file(entry).await,
                EntryKind::Directory => self.resolve_directory(entry, visited).await,
                EntryKind::Other => Err(ApiError::UnsupportedKind(entry.path().to_path_buf())),
            }
        }
        .boxed()
    }

    async fn resolve_file(&self, entry: &Entry) -> Result<PathBuf, ApiError> {
        let id = entry.id().await?;
        let target = self.file_thumbnail_path(&id);
        if exists(&target).await {
            return Ok(target);
        }

        let _flight = self.flights.acquire(&id).await;
        // Another task may have finished it while we waited.
        if exists(&target).await {
            return Ok(target);
        }

        self.generate(entry.catalog().tool(), entry.path(), &target)
            .await?;
        info!(video = %entry.path().display(), thumbnail = %target.display(), "Thumbnail generated");
        Ok(target)
    }

    /// Extract a frame into a temp file next to `target`, then rename it in place.
    ///
    /// A cancelled extraction leaves nothing behind: the temp file is removed on
    /// drop and the tool process is killed with its handle.
    async fn generate(
        &self,
        tool: &dyn crate::media::MediaTool,
        video: &Path,
        target: &Path,
    ) -> Result<(), ApiError> {
        let duration = tool.probe_duration(video).await?;

        let temp = tempfile::Builder::new()
            .prefix(".thumb-")
            .suffix(".jpg")
            .tempfile_in(&self.dir)?;
        tool.extract_frame(video, seek_target(duration), temp.path())
            .await?;

        let written = tokio::fs::metadata(temp.path()).await?.len();
        if written == 0 {
            return Err(ApiError::tool_failure("ffmpeg", 0, b"no frame written"));
        }

        temp.persist(target).map_err(|e| ApiError::Io(e.error))?;
        Ok(())
    }

    async fn resolve_directory(
        &self,
        entry: &Entry,
        visited: &mut HashSet<PathBuf>,
    ) -> Result<PathBuf, ApiError> {
        let canonical = tokio::fs::canonicalize(entry.path())
            .await
            .map(|p| dunce::simplified(&p).to_path_buf())
            .map_err(|e| ApiError::from_io(entry.path(), e))?;
        if !visited.insert(canonical) {
            warn!(path = %entry.path().display(), "Directory already visited, skipping symlink cycle");
            return Ok(self.placeholder.clone());
        }

        for cover in COVER_FILES {
            let cover_path = entry.path().join(cover);
            if let Ok(stat) = entry.catalog().stats().stat(&cover_path).await {
                if stat.is_file() {
                    return Ok(cover_path);
                }
            }
        }

        let mut children = entry.catalog().list(entry.path()).await?.collect().await?;
        children.sort_by(|a, b| {
            b.is_file()
                .cmp(&a.is_file())
                .then_with(|| natural_cmp(a.name(), b.name()))
        });

        for child in &children {
            match self.resolve_inner(child, visited).await {
                Ok(path) if !self.is_placeholder(&path) => return Ok(path),
                Ok(_) => {}
                Err(e) if e.is_security_violation() => return Err(e),
                Err(e) => {
                    warn!(path = %child.path().display(), error = %e, "Skipping child thumbnail");
                }
            }
        }

        debug!(path = %entry.path().display(), "No usable image in directory, using placeholder");
        Ok(self.placeholder.clone())
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
