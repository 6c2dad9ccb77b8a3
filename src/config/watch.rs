//! Config file watcher: reloads `config.yaml` on change and publishes snapshots.

use super::facade::ConfigLoader;
use super::lifecycle::{check_dirs, ConfigHandle};
use crate::error::ApiError;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Reload the config file into `handle`.
///
/// On failure the previous snapshot stays published and the error is returned.
pub fn reload_into(config_path: &Path, handle: &ConfigHandle) -> Result<(), ApiError> {
    match ConfigLoader::load_from_file(config_path) {
        Ok(config) => {
            check_dirs(&config);
            debug!(?config, "New config snapshot");
            handle.replace(config);
            info!(path = %config_path.display(), "Reload config file successfully");
            Ok(())
        }
        Err(e) => {
            error!(
                path = %config_path.display(),
                error = %e,
                "Reload config file failed, keeping previous config"
            );
            Err(e)
        }
    }
}

/// Background watcher owning write access to the config slot.
pub struct ConfigWatcher {
    running: Arc<RwLock<bool>>,
    thread: Option<JoinHandle<()>>,
}

impl ConfigWatcher {
    /// Start watching `config_path`; changes settle for `debounce` before reloading.
    pub fn spawn(
        config_path: PathBuf,
        handle: ConfigHandle,
        debounce: Duration,
    ) -> Result<Self, ApiError> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            if let Err(e) = tx.send(res) {
                error!("Error sending watch event: {}", e);
            }
        })
        .map_err(|e| ApiError::ConfigError(format!("Failed to create watcher: {}", e)))?;

        // Editors often replace the file through a rename, so watch the directory.
        let watch_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .map_err(|e| {
                ApiError::ConfigError(format!(
                    "Failed to watch {}: {}",
                    watch_dir.display(),
                    e
                ))
            })?;

        info!(path = %config_path.display(), "Watching config file");

        let running = Arc::new(RwLock::new(true));
        let thread_running = Arc::clone(&running);
        let thread = std::thread::Builder::new()
            .name("config-watcher".to_string())
            .spawn(move || {
                watch_loop(watcher, rx, config_path, handle, debounce, thread_running);
            })
            .map_err(|e| ApiError::ConfigError(format!("Failed to start watcher thread: {}", e)))?;

        Ok(Self {
            running,
            thread: Some(thread),
        })
    }

    /// Stop the watcher and wait for its thread to exit.
    pub fn stop(&mut self) {
        *self.running.write() = false;
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Config watcher thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        *self.running.read() && self.thread.is_some()
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn watch_loop(
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<notify::Result<Event>>,
    config_path: PathBuf,
    handle: ConfigHandle,
    debounce: Duration,
    running: Arc<RwLock<bool>>,
) {
    let mut pending_since: Option<Instant> = None;

    while *running.read() {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(Ok(event)) => {
                if is_config_change(&event, &config_path) {
                    pending_since = Some(Instant::now());
                }
            }
            Ok(Err(e)) => {
                warn!("Watch error: {}", e);
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                error!("Watcher channel disconnected");
                break;
            }
        }

        if let Some(since) = pending_since {
            if since.elapsed() >= debounce {
                pending_since = None;
                if reload_into(&config_path, &handle).is_err() {
                    debug!("Keeping previous config snapshot");
                }
            }
        }
    }

    debug!("Config watcher stopped");
}

fn is_config_change(event: &Event, config_path: &Path) -> bool {
    let relevant_kind = matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_));
    let file_name = config_path.file_name();
    relevant_kind
        && event
            .paths
            .iter()
            .any(|p| p == config_path || (file_name.is_some() && p.file_name() == file_name))
}
