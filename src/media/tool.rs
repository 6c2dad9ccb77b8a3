//! External probe and frame-extraction tools.
//!
//! The catalog only depends on [`MediaTool`]; [`FfmpegTool`] is the production
//! implementation shelling out to `ffprobe` and `ffmpeg`.

use crate::error::ApiError;
use crate::types::VideoInfo;
use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

/// Thumbnails are scaled to this width, keeping the aspect ratio.
pub const THUMBNAIL_WIDTH: u32 = 512;

#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Container duration in seconds.
    async fn probe_duration(&self, video: &Path) -> Result<f64, ApiError>;

    /// Codec, dimensions and duration of the first video stream.
    async fn probe_video_info(&self, video: &Path) -> Result<VideoInfo, ApiError>;

    /// Write a single downscaled frame taken at `at_seconds` to `output`.
    async fn extract_frame(
        &self,
        video: &Path,
        at_seconds: u64,
        output: &Path,
    ) -> Result<(), ApiError>;
}

/// Seek position for a representative frame: 20% into the video.
pub fn seek_target(duration: f64) -> u64 {
    if duration.is_finite() && duration > 0.0 {
        (duration * 0.2).floor() as u64
    } else {
        0
    }
}

#[derive(Debug, Clone)]
pub struct FfmpegTool {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegTool {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    async fn run<I, S>(&self, program: &Path, args: I) -> Result<Output, ApiError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let tool = program.display().to_string();
        let output = Command::new(program)
            .args(args)
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ApiError::tool_failure(&tool, "spawn", e.to_string().as_bytes()))?;

        if !output.status.success() {
            let status = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            return Err(ApiError::tool_failure(&tool, status, &output.stderr));
        }
        Ok(output)
    }
}

impl Default for FfmpegTool {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

#[async_trait]
impl MediaTool for FfmpegTool {
    async fn probe_duration(&self, video: &Path) -> Result<f64, ApiError> {
        let output = self
            .run(
                &self.ffprobe,
                [
                    OsStr::new("-v"),
                    OsStr::new("error"),
                    OsStr::new("-show_entries"),
                    OsStr::new("format=duration"),
                    OsStr::new("-of"),
                    OsStr::new("default=noprint_wrappers=1:nokey=1"),
                    video.as_os_str(),
                ],
            )
            .await?;
        let duration = parse_duration(&output.stdout)?;
        debug!(video = %video.display(), duration, "Probed video duration");
        Ok(duration)
    }

    async fn probe_video_info(&self, video: &Path) -> Result<VideoInfo, ApiError> {
        let output = self
            .run(
                &self.ffprobe,
                [
                    OsStr::new("-v"),
                    OsStr::new("error"),
                    OsStr::new("-select_streams"),
                    OsStr::new("v:0"),
                    OsStr::new("-show_entries"),
                    OsStr::new("stream=codec_name,width,height"),
                    OsStr::new("-show_entries"),
                    OsStr::new("format=duration"),
                    OsStr::new("-of"),
                    OsStr::new("json"),
                    video.as_os_str(),
                ],
            )
            .await?;
        parse_video_info(&output.stdout)
    }

    async fn extract_frame(
        &self,
        video: &Path,
        at_seconds: u64,
        output: &Path,
    ) -> Result<(), ApiError> {
        let seek = at_seconds.to_string();
        let scale = format!("scale={}:-1", THUMBNAIL_WIDTH);
        self.run(
            &self.ffmpeg,
            [
                OsStr::new("-v"),
                OsStr::new("error"),
                OsStr::new("-y"),
                OsStr::new("-ss"),
                OsStr::new(&seek),
                OsStr::new("-i"),
                video.as_os_str(),
                OsStr::new("-vf"),
                OsStr::new(&scale),
                OsStr::new("-vframes"),
                OsStr::new("1"),
                output.as_os_str(),
            ],
        )
        .await?;
        debug!(video = %video.display(), output = %output.display(), "Frame extracted");
        Ok(())
    }
}

fn parse_duration(stdout: &[u8]) -> Result<f64, ApiError> {
    let text = String::from_utf8_lossy(stdout);
    text.trim()
        .parse::<f64>()
        .map_err(|_| ApiError::tool_failure("ffprobe", 0, format!("unparseable duration {:?}", text.trim()).as_bytes()))
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

fn parse_video_info(stdout: &[u8]) -> Result<VideoInfo, ApiError> {
    let probe: ProbeOutput = serde_json::from_slice(stdout)
        .map_err(|e| ApiError::tool_failure("ffprobe", 0, e.to_string().as_bytes()))?;
    let stream = probe
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::tool_failure("ffprobe", 0, b"no video stream"))?;
    let duration = probe
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(VideoInfo {
        codec_name: stream.codec_name.unwrap_or_default(),
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
        duration,
    })
}
