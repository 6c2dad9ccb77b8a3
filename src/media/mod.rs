//! Media helpers: the video extension allow-list and the external tool contract.

pub mod extensions;
pub mod tool;

pub use extensions::{is_video_name, VIDEO_EXTENSIONS};
pub use tool::{seek_target, FfmpegTool, MediaTool};
