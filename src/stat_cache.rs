//! Stat Cache
//!
//! Short-TTL memoization of filesystem metadata. Listing and thumbnail
//! resolution stat the same paths repeatedly; size and timestamps rarely change
//! within a minute. Anything that mutates a path's timestamps must call
//! [`StatCache::invalidate`] afterwards, otherwise staleness is bounded only by
//! the TTL.

use crate::types::EntryKind;
use dashmap::DashMap;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant, SystemTime};

pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Expired entries are swept once per this many cache misses.
pub const SWEEP_EVERY: usize = 256;

/// Snapshot of the metadata the catalog cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub kind: EntryKind,
    pub size: u64,
    pub modified: Option<SystemTime>,
    pub accessed: Option<SystemTime>,
}

impl FileStat {
    pub fn from_metadata(meta: &Metadata) -> Self {
        let kind = if meta.is_dir() {
            EntryKind::Directory
        } else if meta.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        };
        Self {
            kind,
            size: meta.len(),
            modified: meta.modified().ok(),
            accessed: meta.accessed().ok(),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Path-keyed metadata cache, sharded so unrelated directories don't contend.
#[derive(Debug)]
pub struct StatCache {
    entries: DashMap<PathBuf, (FileStat, Instant)>,
    ttl: Duration,
    misses: AtomicUsize,
}

impl StatCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            misses: AtomicUsize::new(0),
        }
    }

    /// Like `tokio::fs::metadata`, but served from cache while fresh.
    pub async fn stat(&self, path: &Path) -> std::io::Result<FileStat> {
        if let Some(hit) = self.fresh(path) {
            return Ok(hit);
        }
        let meta = tokio::fs::metadata(path).await?;
        let stat = FileStat::from_metadata(&meta);
        if (self.misses.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_EVERY == 0 {
            self.sweep_expired();
        }
        self.entries
            .insert(path.to_path_buf(), (stat.clone(), Instant::now()));
        Ok(stat)
    }

    fn fresh(&self, path: &Path) -> Option<FileStat> {
        {
            // The shard guard must be released before remove_if takes the write lock.
            let entry = self.entries.get(path)?;
            let (stat, inserted) = entry.value();
            if inserted.elapsed() < self.ttl {
                return Some(stat.clone());
            }
        }
        self.entries
            .remove_if(path, |_, (_, inserted)| inserted.elapsed() >= self.ttl);
        None
    }

    /// Drop every entry older than the TTL.
    pub fn sweep_expired(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, (_, inserted)| inserted.elapsed() < ttl);
    }

    pub fn invalidate(&self, path: &Path) {
        self.entries.remove(path);
    }

    pub fn invalidate_all(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StatCache {
    fn default() -> Self {
        Self::new()
    }
}
