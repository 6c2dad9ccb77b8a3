//! Tooling
//!
//! Command-line access to the catalog for scripting and maintenance.

pub mod cli;

pub use cli::{CacheCommands, Cli, CliContext, Commands, ConfigCommands};
