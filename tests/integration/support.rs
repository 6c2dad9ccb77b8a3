use async_trait::async_trait;
use mediagrid::catalog::{Catalog, Opener};
use mediagrid::config::{ConfigHandle, GridConfig};
use mediagrid::error::ApiError;
use mediagrid::history::{EmptyHistory, HistorySnapshot, HistorySource};
use mediagrid::media::MediaTool;
use mediagrid::store::SledCatalogStore;
use mediagrid::types::VideoInfo;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Media tool double counting calls; extraction can be slowed to force overlap.
#[derive(Debug, Default)]
pub struct CountingTool {
    pub extractions: AtomicUsize,
    pub probes: AtomicUsize,
    pub extract_delay: Duration,
    pub fail: bool,
}

impl CountingTool {
    pub fn slow(delay: Duration) -> Self {
        Self {
            extract_delay: delay,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn extractions(&self) -> usize {
        self.extractions.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    fn failure() -> ApiError {
        ApiError::ExternalToolFailure {
            tool: "ffprobe".to_string(),
            status: "1".to_string(),
            stderr: "Invalid data found when processing input".to_string(),
        }
    }
}

#[async_trait]
impl MediaTool for CountingTool {
    async fn probe_duration(&self, _video: &Path) -> Result<f64, ApiError> {
        if self.fail {
            return Err(Self::failure());
        }
        Ok(600.0)
    }

    async fn probe_video_info(&self, _video: &Path) -> Result<VideoInfo, ApiError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Self::failure());
        }
        Ok(VideoInfo {
            codec_name: "hevc".to_string(),
            width: 1280,
            height: 720,
            duration: 600.0,
        })
    }

    async fn extract_frame(
        &self,
        _video: &Path,
        at_seconds: u64,
        output: &Path,
    ) -> Result<(), ApiError> {
        self.extractions.fetch_add(1, Ordering::SeqCst);
        assert_eq!(at_seconds, 120);
        if !self.extract_delay.is_zero() {
            tokio::time::sleep(self.extract_delay).await;
        }
        tokio::fs::write(output, b"\xff\xd8\xff\xe0frame").await?;
        Ok(())
    }
}

/// History source answering with whatever snapshot the test last set.
#[derive(Default)]
pub struct ScriptedHistory {
    snapshot: Mutex<HistorySnapshot>,
}

impl ScriptedHistory {
    pub fn set(&self, snapshot: HistorySnapshot) {
        *self.snapshot.lock() = snapshot;
    }
}

#[async_trait]
impl HistorySource for ScriptedHistory {
    async fn snapshot(&self) -> HistorySnapshot {
        self.snapshot.lock().clone()
    }
}

pub struct Harness {
    pub temp: tempfile::TempDir,
    pub root: PathBuf,
    pub tool: Arc<CountingTool>,
    pub catalog: Arc<Catalog>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(CountingTool::default(), Arc::new(EmptyHistory), |_| {})
    }

    pub fn with_tool(tool: CountingTool) -> Self {
        Self::build(tool, Arc::new(EmptyHistory), |_| {})
    }

    pub fn build(
        tool: CountingTool,
        history: Arc<dyn HistorySource>,
        configure: impl FnOnce(&mut GridConfig),
    ) -> Self {
        let temp = tempfile::tempdir().unwrap();
        let root = dunce::canonicalize(temp.path()).unwrap().join("videos");
        std::fs::create_dir_all(&root).unwrap();

        let mut config = GridConfig::with_folders([root.clone()]);
        configure(&mut config);
        let tool = Arc::new(tool);
        let catalog = Catalog::new(
            ConfigHandle::new(config),
            Arc::new(SledCatalogStore::temporary().unwrap()),
            tool.clone(),
            history,
            temp.path().join("thumbnails"),
        )
        .unwrap()
        .with_opener(Opener::new("true", Vec::new()));

        Self {
            temp,
            root,
            tool,
            catalog: Arc::new(catalog),
        }
    }

    /// Write `bytes` zero bytes at `rel` under the root, creating parents.
    pub fn write(&self, rel: &str, bytes: usize) -> PathBuf {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, vec![0u8; bytes]).unwrap();
        path
    }

    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.root.join(rel);
        std::fs::create_dir_all(&path).unwrap();
        path
    }

    pub fn thumbnail_dir(&self) -> PathBuf {
        self.temp.path().join("thumbnails")
    }
}
