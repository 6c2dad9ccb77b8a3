//! Directory Lister
//!
//! Lazily enumerates a directory's children as [`Entry`] values, in whatever
//! order the filesystem yields them.

use crate::catalog::Catalog;
use crate::entry::Entry;
use crate::error::ApiError;
use crate::media::is_video_name;
use crate::types::EntryKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{DirEntry, ReadDir};
use tracing::warn;

/// An open directory enumeration.
///
/// Dotfiles are skipped when configured; plain files pass only with a video
/// extension; directories always pass; anything else is skipped.
pub struct DirListing {
    catalog: Arc<Catalog>,
    dir: PathBuf,
    read_dir: ReadDir,
    hide_dotfiles: bool,
}

impl DirListing {
    pub(crate) async fn open(catalog: Arc<Catalog>, dir: &Path) -> Result<Self, ApiError> {
        catalog.gateway().assert_allowed(dir)?;

        let stat = catalog
            .stats()
            .stat(dir)
            .await
            .map_err(|e| ApiError::from_io(dir, e))?;
        if !stat.is_dir() {
            return Err(ApiError::NotADirectory(dir.to_path_buf()));
        }

        let read_dir = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| ApiError::from_io(dir, e))?;
        let hide_dotfiles = catalog.config().snapshot().hide_dotfiles;

        Ok(Self {
            catalog,
            dir: dir.to_path_buf(),
            read_dir,
            hide_dotfiles,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Next child passing the filters, or `None` when exhausted.
    pub async fn next_entry(&mut self) -> Result<Option<Entry>, ApiError> {
        while let Some(child) = self
            .read_dir
            .next_entry()
            .await
            .map_err(|e| ApiError::from_io(&self.dir, e))?
        {
            let name = child.file_name().to_string_lossy().into_owned();
            if self.hide_dotfiles && name.starts_with('.') {
                continue;
            }

            let kind = match child_kind(&child).await {
                Ok(kind) => kind,
                Err(e) => {
                    warn!(path = %child.path().display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            match kind {
                EntryKind::File if !is_video_name(&name) => continue,
                EntryKind::Other => continue,
                _ => {}
            }

            return Ok(Some(Entry::new(
                Arc::clone(&self.catalog),
                name,
                self.dir.join(child.file_name()),
                kind,
            )));
        }
        Ok(None)
    }

    /// Drain the listing.
    pub async fn collect(mut self) -> Result<Vec<Entry>, ApiError> {
        let mut entries = Vec::new();
        while let Some(entry) = self.next_entry().await? {
            entries.push(entry);
        }
        Ok(entries)
    }
}

/// Kind of a child, following symlinks so linked media is listed by its target.
async fn child_kind(child: &DirEntry) -> std::io::Result<EntryKind> {
    let file_type = child.file_type().await?;
    let file_type = if file_type.is_symlink() {
        tokio::fs::metadata(child.path()).await?.file_type()
    } else {
        file_type
    };
    Ok(if file_type.is_dir() {
        EntryKind::Directory
    } else if file_type.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    })
}
