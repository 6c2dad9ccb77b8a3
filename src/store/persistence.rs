//! Sled-backed store
//!
//! Keys are `namespace \0 key`; values are JSON so records stay readable
//! across schema changes and a drifted record can be detected and dropped.

use super::{CatalogStore, Namespace};
use crate::error::StorageError;
use crate::gateway::normalize_lexically;
use crate::types::{DirConfig, EntryId, VideoInfo};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

const KEY_SEPARATOR: u8 = 0;

/// Store handle, opened once at startup and closed once at shutdown.
#[derive(Clone)]
pub struct SledCatalogStore {
    db: sled::Db,
}

impl SledCatalogStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = sled::open(path)?;
        info!(path = %path.display(), "Opened catalog store");
        Ok(Self { db })
    }

    /// In-memory database discarded on drop.
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    pub fn from_db(db: sled::Db) -> Self {
        Self { db }
    }

    /// Flush pending writes; the handle must not be used afterwards.
    pub fn close(self) -> Result<(), StorageError> {
        self.db.flush()?;
        info!("Closed catalog store");
        Ok(())
    }

    fn key(namespace: Namespace, key: &str) -> Vec<u8> {
        let mut bytes = Self::prefix(namespace);
        bytes.extend_from_slice(key.as_bytes());
        bytes
    }

    fn prefix(namespace: Namespace) -> Vec<u8> {
        let mut bytes = namespace.as_str().as_bytes().to_vec();
        bytes.push(KEY_SEPARATOR);
        bytes
    }

    fn decode<T: DeserializeOwned>(
        namespace: Namespace,
        key: &str,
        bytes: &[u8],
    ) -> Result<T, StorageError> {
        serde_json::from_slice(bytes).map_err(|_| StorageError::Corrupt {
            namespace: namespace.to_string(),
            key: key.to_string(),
        })
    }

    /// Read a record, dropping it when it no longer decodes.
    fn read<T: DeserializeOwned>(
        &self,
        namespace: Namespace,
        key: &str,
    ) -> Result<Option<T>, StorageError> {
        let db_key = Self::key(namespace, key);
        let Some(bytes) = self.db.get(&db_key)? else {
            return Ok(None);
        };
        match Self::decode(namespace, key, &bytes) {
            Ok(value) => Ok(Some(value)),
            Err(StorageError::Corrupt { namespace, key }) => {
                warn!(%namespace, %key, "Dropping corrupt cached record");
                self.db.remove(&db_key)?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn write<T: Serialize + ?Sized>(
        &self,
        namespace: Namespace,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(value)?;
        self.db.insert(Self::key(namespace, key), bytes)?;
        Ok(())
    }

    fn remove(&self, namespace: Namespace, key: &str) -> Result<(), StorageError> {
        self.db.remove(Self::key(namespace, key))?;
        Ok(())
    }

    #[cfg(test)]
    fn put_raw(&self, namespace: Namespace, key: &str, bytes: &[u8]) {
        self.db.insert(Self::key(namespace, key), bytes).unwrap();
    }

    #[cfg(test)]
    fn contains(&self, namespace: Namespace, key: &str) -> bool {
        self.db.contains_key(Self::key(namespace, key)).unwrap()
    }
}

/// Spellings of the same directory share one key.
fn dir_key(dir: &Path) -> String {
    normalize_lexically(dir).to_string_lossy().into_owned()
}

impl CatalogStore for SledCatalogStore {
    fn done(&self, id: &EntryId) -> Result<bool, StorageError> {
        Ok(self.read(Namespace::Done, id.as_str())?.unwrap_or(false))
    }

    fn set_done(&self, id: &EntryId, done: bool) -> Result<(), StorageError> {
        self.write(Namespace::Done, id.as_str(), &done)
    }

    fn last_position(&self, id: &EntryId) -> Result<Option<f64>, StorageError> {
        self.read(Namespace::LastPosition, id.as_str())
    }

    fn set_last_position(&self, id: &EntryId, seconds: f64) -> Result<(), StorageError> {
        self.write(Namespace::LastPosition, id.as_str(), &seconds)
    }

    fn clear_last_position(&self, id: &EntryId) -> Result<(), StorageError> {
        self.remove(Namespace::LastPosition, id.as_str())
    }

    fn video_info(&self, id: &EntryId) -> Result<Option<VideoInfo>, StorageError> {
        self.read(Namespace::VideoInfo, id.as_str())
    }

    fn set_video_info(&self, id: &EntryId, info: &VideoInfo) -> Result<(), StorageError> {
        self.write(Namespace::VideoInfo, id.as_str(), info)
    }

    fn dir_config(&self, dir: &Path) -> Result<Option<DirConfig>, StorageError> {
        self.read(Namespace::DirConfig, &dir_key(dir))
    }

    fn set_dir_config(&self, dir: &Path, config: &DirConfig) -> Result<(), StorageError> {
        self.write(Namespace::DirConfig, &dir_key(dir), config)
    }

    fn delete_prefix(&self, namespace: Namespace) -> Result<usize, StorageError> {
        let mut batch = sled::Batch::default();
        let mut removed = 0;
        for item in self.db.scan_prefix(Self::prefix(namespace)) {
            let (key, _) = item?;
            batch.remove(key);
            removed += 1;
        }
        self.db.apply_batch(batch)?;
        debug!(%namespace, removed, "Deleted namespace");
        Ok(removed)
    }

    fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}
