//! MediaGrid: a root-scoped media catalog over local folders.
//!
//! Lists configured video folders, annotates files with watched state and
//! playback position, and resolves representative thumbnails for files and
//! directories. Every path crossing the API is authorized against the
//! configured roots first.

pub mod catalog;
pub mod concurrency;
pub mod config;
pub mod entry;
pub mod error;
pub mod gateway;
pub mod history;
pub mod lister;
pub mod logging;
pub mod media;
pub mod sorting;
pub mod stat_cache;
pub mod store;
pub mod thumbnail;
pub mod tooling;
pub mod types;

pub use catalog::{Catalog, Listing, Opener};
pub use entry::Entry;
pub use error::{ApiError, StorageError};
pub use gateway::PathGateway;
pub use types::{DirConfig, DisplayRecord, EntryId, EntryKind, VideoInfo};
