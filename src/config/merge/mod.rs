//! Merge policy and service for config composition.

pub mod service;

pub(crate) mod merge_policy {
    use crate::config::{default_host, default_port};
    use config::builder::DefaultState;
    use config::{Config, ConfigBuilder, ConfigError};

    /// Builder seeded with the scalar defaults; collection defaults come from serde.
    pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("host", default_host())?
            .set_default("port", default_port() as i64)?
            .set_default("hide_dotfiles", true)?
            .set_default("launch_browser", true)?
            .set_default("bring_folder_to_top", false)?
            .set_default("bring_folder_to_top_done", false)?
            .set_default("update_date_accessed", false)?
            .set_default("ffmpeg", "ffmpeg")?
            .set_default("ffprobe", "ffprobe")
    }
}
