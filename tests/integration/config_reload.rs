#![cfg(unix)]

use crate::support::CountingTool;
use mediagrid::catalog::Catalog;
use mediagrid::config::{reload_into, StoragePaths};
use mediagrid::error::ApiError;
use mediagrid::history::EmptyHistory;
use std::path::Path;
use std::sync::Arc;

fn write_config(paths: &StoragePaths, roots: &[&Path]) {
    let mut yaml = String::from("folders:\n");
    for root in roots {
        yaml.push_str(&format!("  - \"{}\"\n", root.display()));
    }
    std::fs::write(&paths.config_file, yaml).unwrap();
}

fn open(paths: &StoragePaths) -> Arc<Catalog> {
    Catalog::create(
        paths,
        Arc::new(CountingTool::default()),
        Arc::new(EmptyHistory),
    )
    .unwrap()
}

#[tokio::test]
async fn create_writes_template_when_config_is_missing() {
    let temp = tempfile::tempdir().unwrap();
    let paths = StoragePaths::under(&temp.path().join("app"));

    let catalog = open(&paths);

    assert!(paths.config_file.is_file());
    assert!(paths.thumbnail_dir.join("placeholder.png").is_file());
    assert!(catalog.home().is_empty());
}

#[tokio::test]
async fn invalid_config_at_startup_is_fatal() {
    let temp = tempfile::tempdir().unwrap();
    let paths = StoragePaths::under(temp.path());
    paths.ensure().unwrap();
    std::fs::write(&paths.config_file, "folders:\n  - relative/videos\n").unwrap();

    let result = Catalog::create(
        &paths,
        Arc::new(CountingTool::default()),
        Arc::new(EmptyHistory),
    );
    assert!(matches!(result, Err(ApiError::ConfigInvalid(_))));
}

#[tokio::test]
async fn reload_swaps_roots_and_keeps_previous_on_error() {
    let temp = tempfile::tempdir().unwrap();
    let base = dunce::canonicalize(temp.path()).unwrap();
    let videos = base.join("videos");
    let media = base.join("media");
    std::fs::create_dir_all(&videos).unwrap();
    std::fs::create_dir_all(&media).unwrap();
    let paths = StoragePaths::under(&base.join("app"));
    paths.ensure().unwrap();
    write_config(&paths, &[&videos]);

    let catalog = open(&paths);
    assert!(catalog.list_display(&videos, false).await.is_ok());

    write_config(&paths, &[&media]);
    reload_into(&paths.config_file, catalog.config()).unwrap();
    let err = catalog.list_display(&videos, false).await.unwrap_err();
    assert!(err.is_security_violation());
    assert!(catalog.list_display(&media, false).await.is_ok());

    std::fs::write(&paths.config_file, "folders: [unterminated\n").unwrap();
    assert!(reload_into(&paths.config_file, catalog.config()).is_err());
    assert!(catalog.list_display(&media, false).await.is_ok());
}

#[tokio::test]
async fn annotations_survive_reopen() {
    let temp = tempfile::tempdir().unwrap();
    let base = dunce::canonicalize(temp.path()).unwrap();
    let videos = base.join("videos");
    std::fs::create_dir_all(&videos).unwrap();
    let video = videos.join("ep1.mkv");
    std::fs::write(&video, vec![0u8; 2048]).unwrap();
    let paths = StoragePaths::under(&base.join("app"));
    paths.ensure().unwrap();
    write_config(&paths, &[&videos]);

    {
        let catalog = open(&paths);
        catalog.set_done(&video, true).await.unwrap();
        catalog.close().unwrap();
    }

    let catalog = open(&paths);
    let listing = catalog.list_display(&videos, false).await.unwrap();
    assert!(listing.records[0].done);
}
