//! Integration tests for the MediaGrid catalog

mod cli_parse;
mod config_reload;
mod display_records;
mod gateway;
mod history;
mod listing;
mod support;
mod thumbnails;
