//! Current-config slot and root folder checks.

use super::GridConfig;
use parking_lot::RwLock;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;

/// Shared slot holding the current configuration snapshot.
///
/// Readers take an `Arc` to an immutable snapshot and keep using it for the
/// whole operation; a reload swaps the slot without touching snapshots that
/// are already out.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    slot: Arc<RwLock<Arc<GridConfig>>>,
}

impl ConfigHandle {
    pub fn new(config: GridConfig) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<GridConfig> {
        Arc::clone(&self.slot.read())
    }

    /// Publish a new snapshot, returning the previous one.
    pub fn replace(&self, config: GridConfig) -> Arc<GridConfig> {
        let next = Arc::new(config);
        std::mem::replace(&mut *self.slot.write(), next)
    }
}

/// State of one configured root folder on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RootState {
    Ok,
    Missing,
    NotADirectory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootStatus {
    pub path: PathBuf,
    pub state: RootState,
}

/// Check every configured folder, logging the ones that cannot be served.
///
/// Not fatal: a root may be an unplugged drive that comes back later.
pub fn check_dirs(config: &GridConfig) -> Vec<RootStatus> {
    config
        .folders
        .iter()
        .map(|dir| {
            let state = match std::fs::metadata(dir) {
                Ok(meta) if meta.is_dir() => RootState::Ok,
                Ok(_) => {
                    error!(
                        path = %dir.display(),
                        "Configured path is not a directory. Please check your config.yaml."
                    );
                    RootState::NotADirectory
                }
                Err(_) => {
                    error!(
                        path = %dir.display(),
                        "Configured directory does not exist. Please check your config.yaml."
                    );
                    RootState::Missing
                }
            };
            RootStatus {
                path: dir.clone(),
                state,
            }
        })
        .collect()
}
