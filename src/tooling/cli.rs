//! CLI Tooling
//!
//! Command-line interface over the catalog. Every path argument goes through
//! the same authorization as any other caller.

use crate::catalog::{Catalog, Listing};
use crate::config::{check_dirs, ConfigLoader, ConfigWatcher, GridConfig, RootState, RootStatus, StoragePaths};
use crate::error::{ApiError, StorageError};
use crate::history::{MpcHcHistory, UNKNOWN_POSITION};
use crate::logging::LoggingConfig;
use crate::media::FfmpegTool;
use crate::store::Namespace;
use crate::types::{DirConfig, DisplayRecord, VideoInfo};
use clap::{ArgAction, Parser, Subcommand};
use comfy_table::{Cell, Color, Table};
use owo_colors::OwoColorize;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// MediaGrid CLI - browse and annotate local video folders
#[derive(Parser)]
#[command(name = "mediagrid")]
#[command(about = "Root-scoped media catalog with thumbnails and watch history")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Application data directory (config.yaml, store, thumbnails)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Fold the logging flags over the configured logging section.
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.file = Some(file.clone());
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the configured root folders
    Home {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List a directory's folders and videos
    List {
        /// Directory to list
        dir: PathBuf,
        /// Include last position and video info
        #[arg(long)]
        extra: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the image path representing a file or directory
    Thumbnail {
        path: PathBuf,
    },
    /// Mark a file as watched or not
    Done {
        path: PathBuf,
        /// true or false
        #[arg(action = ArgAction::Set)]
        done: bool,
    },
    /// Open a file with the desktop's default application
    Open {
        path: PathBuf,
    },
    /// Show or update a directory's display preference
    DirConfig {
        dir: PathBuf,
        /// Sort key (name, size, dateModified)
        #[arg(long)]
        sort: Option<String>,
        /// Sort order (asc, desc)
        #[arg(long)]
        order: Option<String>,
        /// View mode (list, grid)
        #[arg(long)]
        view: Option<String>,
        /// Item size (small, medium, large)
        #[arg(long)]
        item_size: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Probe a video's codec, resolution and duration
    Probe {
        path: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Cache maintenance
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Reload config.yaml on change until interrupted
    Watch {
        /// Debounce window in milliseconds
        #[arg(long, default_value = "200")]
        debounce_ms: u64,
    },
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Drop every record in a namespace (done, lastPosition, videoInfo, dirConfig)
    Clear {
        namespace: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Load and validate config.yaml and report each root folder
    Check {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Home { .. } => "home",
        Commands::List { .. } => "list",
        Commands::Thumbnail { .. } => "thumbnail",
        Commands::Done { .. } => "done",
        Commands::Open { .. } => "open",
        Commands::DirConfig { .. } => "dir-config",
        Commands::Probe { .. } => "probe",
        Commands::Cache { .. } => "cache",
        Commands::Config { .. } => "config",
        Commands::Watch { .. } => "watch",
    }
}

/// CLI context for executing commands
pub struct CliContext {
    paths: StoragePaths,
    catalog: Arc<Catalog>,
}

impl CliContext {
    /// Open the catalog under `paths`, using the tools named in `config`.
    pub fn new(paths: StoragePaths, config: &GridConfig) -> Result<Self, ApiError> {
        let tool = Arc::new(FfmpegTool::new(
            config.ffmpeg.clone(),
            config.ffprobe.clone(),
        ));
        let catalog = Catalog::create(&paths, tool, Arc::new(MpcHcHistory::new()))?;
        Ok(Self { paths, catalog })
    }

    pub fn with_catalog(paths: StoragePaths, catalog: Arc<Catalog>) -> Self {
        Self { paths, catalog }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Execute a CLI command
    pub async fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let result = self.execute_inner(command).await;
        debug!(
            command = command_name(command),
            ok = result.is_ok(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    /// Flush the store before exit.
    pub fn close(&self) -> Result<(), ApiError> {
        self.catalog.close()
    }

    async fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Home { format } => {
                let records = self.catalog.home_display().await;
                format_home(&records, format)
            }
            Commands::List { dir, extra, format } => {
                let dir = absolute(dir)?;
                let listing = self.catalog.list_display(&dir, *extra).await?;
                format_listing(&dir, &listing, format)
            }
            Commands::Thumbnail { path } => {
                let path = absolute(path)?;
                let image = self.catalog.thumbnail(&path).await?;
                Ok(image.display().to_string())
            }
            Commands::Done { path, done } => {
                let path = absolute(path)?;
                self.catalog.set_done(&path, *done).await?;
                let mark = if *done { "watched" } else { "unwatched" };
                Ok(format!("Marked {} as {}", path.display(), mark.green()))
            }
            Commands::Open { path } => {
                let path = absolute(path)?;
                self.catalog.open(&path).await?;
                Ok(format!("Opened {}", path.display()))
            }
            Commands::DirConfig {
                dir,
                sort,
                order,
                view,
                item_size,
                format,
            } => {
                let dir = absolute(dir)?;
                let mut config = self.catalog.dir_config(&dir)?;
                let mut changed = false;
                if let Some(sort) = sort {
                    config.sort = parse_choice("sort", sort)?;
                    changed = true;
                }
                if let Some(order) = order {
                    config.order = parse_choice("order", order)?;
                    changed = true;
                }
                if let Some(view) = view {
                    config.view = parse_choice("view", view)?;
                    changed = true;
                }
                if let Some(item_size) = item_size {
                    config.item_size = parse_choice("item size", item_size)?;
                    changed = true;
                }
                if changed {
                    self.catalog.set_dir_config(&dir, &config)?;
                    info!(dir = %dir.display(), ?config, "Updated dir config");
                }
                format_dir_config(&dir, &config, format)
            }
            Commands::Probe { path, format } => {
                let path = absolute(path)?;
                let info = self.catalog.video_info(&path).await?;
                format_video_info(&path, info.as_ref(), format)
            }
            Commands::Cache { command } => match command {
                CacheCommands::Clear { namespace, yes } => self.handle_cache_clear(namespace, *yes),
            },
            Commands::Config { command } => match command {
                ConfigCommands::Check { format } => self.handle_config_check(format),
            },
            Commands::Watch { debounce_ms } => self.handle_watch(*debounce_ms).await,
        }
    }

    fn handle_cache_clear(&self, namespace: &str, yes: bool) -> Result<String, ApiError> {
        let namespace: Namespace = namespace.parse().map_err(ApiError::ConfigError)?;
        if !yes {
            use dialoguer::Confirm;
            let confirmed = Confirm::new()
                .with_prompt(format!("Clear every cached '{}' record?", namespace))
                .default(false)
                .interact()
                .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))?;

            if !confirmed {
                return Ok("Clear cancelled".to_string());
            }
        }

        let removed = self.catalog.clear_cache(namespace)?;
        Ok(format!("Removed {} '{}' record(s)", removed, namespace))
    }

    fn handle_config_check(&self, format: &str) -> Result<String, ApiError> {
        let config = ConfigLoader::load_from_file(&self.paths.config_file)?;
        let statuses = check_dirs(&config);
        format_root_statuses(&self.paths.config_file, &statuses, format)
    }

    async fn handle_watch(&self, debounce_ms: u64) -> Result<String, ApiError> {
        let mut watcher = ConfigWatcher::spawn(
            self.paths.config_file.clone(),
            self.catalog.config().clone(),
            Duration::from_millis(debounce_ms),
        )?;
        println!(
            "{} {} (Ctrl-C to stop)",
            "Watching".bold(),
            self.paths.config_file.display()
        );

        tokio::signal::ctrl_c().await?;
        watcher.stop();
        Ok(format!(
            "Stopped watching {}",
            self.paths.config_file.display()
        ))
    }
}

/// Make a CLI path absolute against the working directory, without resolving it.
fn absolute(path: &Path) -> Result<PathBuf, ApiError> {
    std::path::absolute(path).map_err(|e| ApiError::from_io(path, e))
}

/// Parse a wire-name choice such as `dateModified` into its enum.
fn parse_choice<T: DeserializeOwned>(field: &str, value: &str) -> Result<T, ApiError> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| ApiError::ConfigError(format!("Invalid {}: {}", field, value)))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value).map_err(|e| ApiError::StorageError(StorageError::from(e)))
}

fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Human-readable byte count; negative sizes mean unknown.
fn format_size(size: i64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if size < 0 {
        return "-".to_string();
    }
    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", size)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// `h:mm:ss` playback position; the unknown sentinel prints as `-`.
fn format_position(seconds: f64) -> String {
    if seconds <= UNKNOWN_POSITION || !seconds.is_finite() {
        return "-".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}

fn name_cell(record: &DisplayRecord) -> Cell {
    if record.missing {
        Cell::new(format!("{} (missing)", record.name)).fg(Color::Red)
    } else if record.is_directory {
        Cell::new(format!("{}/", record.name)).fg(Color::Blue)
    } else {
        Cell::new(&record.name)
    }
}

fn format_home(records: &[DisplayRecord], format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(records);
    }
    if records.is_empty() {
        return Ok("No folders configured. Add absolute paths under 'folders' in config.yaml.".to_string());
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Folder", "Modified"]);
    for record in records {
        let modified = if record.missing {
            "-".to_string()
        } else {
            record.date_modified.format("%Y-%m-%d %H:%M").to_string()
        };
        table.add_row(vec![name_cell(record), Cell::new(modified)]);
    }
    Ok(format!("{}\n{}", format_section_heading("Home"), table))
}

fn format_listing(dir: &Path, listing: &Listing, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(listing);
    }

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    let mut header = vec!["Name", "Size", "Modified", "Done"];
    if listing.extra_info {
        header.extend(["Position", "Codec", "Resolution"]);
    }
    table.set_header(header);

    for record in &listing.records {
        let done = if record.done {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("")
        };
        let mut row = vec![
            name_cell(record),
            Cell::new(format_size(record.size)),
            Cell::new(record.date_modified.format("%Y-%m-%d %H:%M").to_string()),
            done,
        ];
        if listing.extra_info {
            let position = record
                .extra_info
                .last_position
                .map(format_position)
                .unwrap_or_else(|| "-".to_string());
            let (codec, resolution) = match &record.extra_info.video_info {
                Some(info) => (
                    info.codec_name.clone(),
                    format!("{}x{}", info.width, info.height),
                ),
                None => ("-".to_string(), "-".to_string()),
            };
            row.extend([Cell::new(position), Cell::new(codec), Cell::new(resolution)]);
        }
        table.add_row(row);
    }

    let mut output = format_section_heading(&dir.display().to_string());
    if !listing.previous_dir.is_empty() {
        output.push_str(&format!("\nUp: {}", listing.previous_dir));
    }
    output.push('\n');
    output.push_str(&table.to_string());
    Ok(output)
}

fn format_dir_config(dir: &Path, config: &DirConfig, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(config);
    }
    // Reuse the wire names so the output can be pasted back as flags.
    let value = serde_json::to_value(config).map_err(|e| ApiError::StorageError(e.into()))?;
    let field = |key: &str| {
        value
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Setting", "Value"]);
    table.add_row(vec!["sort".to_string(), field("sort")]);
    table.add_row(vec!["order".to_string(), field("order")]);
    table.add_row(vec!["view".to_string(), field("view")]);
    table.add_row(vec!["item-size".to_string(), field("itemSize")]);
    Ok(format!(
        "{}\n{}",
        format_section_heading(&dir.display().to_string()),
        table
    ))
}

fn format_video_info(
    path: &Path,
    info: Option<&VideoInfo>,
    format: &str,
) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(&json!({
            "path": path,
            "videoInfo": info,
        }));
    }
    let Some(info) = info else {
        return Ok(format!("{} is not a file", path.display()));
    };
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Codec", "Resolution", "Duration"]);
    table.add_row(vec![
        info.codec_name.clone(),
        format!("{}x{}", info.width, info.height),
        format_position(info.duration),
    ]);
    Ok(format!(
        "{}\n{}",
        format_section_heading(&path.display().to_string()),
        table
    ))
}

fn format_root_statuses(
    config_file: &Path,
    statuses: &[RootStatus],
    format: &str,
) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(&json!({
            "configFile": config_file,
            "roots": statuses,
        }));
    }
    if statuses.is_empty() {
        return Ok(format!(
            "{} is valid but lists no folders",
            config_file.display()
        ));
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Folder", "State"]);
    for status in statuses {
        let state = match status.state {
            RootState::Ok => Cell::new("ok").fg(Color::Green),
            RootState::Missing => Cell::new("missing").fg(Color::Red),
            RootState::NotADirectory => Cell::new("not a directory").fg(Color::Red),
        };
        table.add_row(vec![Cell::new(status.path.display()), state]);
    }
    Ok(format!(
        "{}\n{}",
        format_section_heading(&config_file.display().to_string()),
        table
    ))
}
