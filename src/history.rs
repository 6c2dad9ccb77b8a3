//! History Reconciler
//!
//! Merges a point-in-time export of an external player's playback history
//! with the positions cached in the store. The snapshot wins whenever it has
//! the file; otherwise the cache answers, because the player trims its own
//! history and silently forgets older files.

use crate::error::StorageError;
use crate::store::CatalogStore;
use crate::types::EntryId;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, warn};

/// Position reported when neither the snapshot nor the cache knows the file.
pub const UNKNOWN_POSITION: f64 = -1.0;

pub const MPC_HC_HISTORY_KEY: &str = r"HKEY_CURRENT_USER\Software\MPC-HC\MPC-HC\MediaHistory";

const SHORT_HASH_LEN: usize = 12;

/// MPC-HC's short hash of a media path.
///
/// SHA-1 over the UTF-16LE bytes of the lowercased path, base64 encoded,
/// truncated to 12 characters.
pub fn rfe_hash(path: &str) -> String {
    let lowered = path.to_lowercase();
    let bytes: Vec<u8> = lowered
        .encode_utf16()
        .flat_map(|unit| unit.to_le_bytes())
        .collect();
    let digest = Sha1::digest(&bytes);
    let mut encoded = STANDARD.encode(digest);
    encoded.truncate(SHORT_HASH_LEN);
    encoded
}

/// Path-hash to position-in-seconds mapping exported from the player.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistorySnapshot {
    positions: HashMap<String, f64>,
}

impl HistorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, hash: impl Into<String>, seconds: f64) {
        self.positions.insert(hash.into(), seconds);
    }

    /// Record a position for a media path, hashing it the way the player does.
    pub fn insert_path(&mut self, path: &Path, seconds: f64) {
        self.insert(rfe_hash(&path.to_string_lossy()), seconds);
    }

    pub fn position_for(&self, path: &Path) -> Option<f64> {
        self.positions
            .get(&rfe_hash(&path.to_string_lossy()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Source of history snapshots, queried once per top-level listing.
///
/// Failures are not errors for callers: a source that cannot be read yields
/// an empty snapshot and the cache answers instead.
#[async_trait]
pub trait HistorySource: Send + Sync {
    async fn snapshot(&self) -> HistorySnapshot;
}

/// Source that never knows anything
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyHistory;

#[async_trait]
impl HistorySource for EmptyHistory {
    async fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot::new()
    }
}

/// Reads MPC-HC's media history from the Windows registry via `reg.exe`.
#[derive(Debug, Clone)]
pub struct MpcHcHistory {
    reg_exe: PathBuf,
}

impl MpcHcHistory {
    pub fn new() -> Self {
        Self {
            reg_exe: PathBuf::from("reg.exe"),
        }
    }
}

impl Default for MpcHcHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistorySource for MpcHcHistory {
    async fn snapshot(&self) -> HistorySnapshot {
        if !cfg!(windows) {
            debug!("MPC-HC history is only available on Windows");
            return HistorySnapshot::new();
        }

        let output = Command::new(&self.reg_exe)
            .args(["query", MPC_HC_HISTORY_KEY, "/s", "/v", "FilePosition"])
            .kill_on_drop(true)
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                let snapshot = parse_reg_output(&String::from_utf8_lossy(&output.stdout));
                debug!(entries = snapshot.len(), "Read MPC-HC media history");
                snapshot
            }
            Ok(output) => {
                warn!(
                    status = ?output.status.code(),
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "Error executing reg.exe"
                );
                HistorySnapshot::new()
            }
            Err(e) => {
                warn!(error = %e, "Failed to run reg.exe");
                HistorySnapshot::new()
            }
        }
    }
}

/// Parse `reg query ... /s /v FilePosition` output.
///
/// Each history key line is followed by its `FilePosition REG_DWORD 0x...`
/// line holding milliseconds. Positions of zero are dropped.
pub fn parse_reg_output(output: &str) -> HistorySnapshot {
    let prefix = format!("{}\\", MPC_HC_HISTORY_KEY);
    let lines: Vec<&str> = output.lines().collect();
    let mut snapshot = HistorySnapshot::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if !line.contains(&prefix) {
            i += 1;
            continue;
        }

        let hash = line.trim().rsplit('\\').next().unwrap_or_default();
        let seconds = lines
            .get(i + 1)
            .and_then(|next| next.split_whitespace().nth(2))
            .and_then(parse_dword)
            .map(|ms| ms as f64 / 1000.0);

        if let Some(seconds) = seconds {
            if seconds > 0.0 && !hash.is_empty() {
                snapshot.insert(hash, seconds);
            }
        }
        i += 2;
    }

    snapshot
}

fn parse_dword(value: &str) -> Option<u64> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u64::from_str_radix(digits, 16).ok()
}

/// Last playback position of a file in seconds, or [`UNKNOWN_POSITION`].
///
/// A snapshot hit is written through to the cache.
pub fn last_position(
    store: &dyn CatalogStore,
    id: &EntryId,
    path: &Path,
    snapshot: &HistorySnapshot,
) -> Result<f64, StorageError> {
    match snapshot.position_for(path) {
        Some(seconds) => {
            store.set_last_position(id, seconds)?;
            Ok(seconds)
        }
        None => Ok(store.last_position(id)?.unwrap_or(UNKNOWN_POSITION)),
    }
}
