#![cfg(unix)]

use crate::support::{CountingTool, Harness};
use mediagrid::config::GridConfig;
use mediagrid::history::HistorySnapshot;
use std::sync::Arc;

#[tokio::test]
async fn vanished_entry_is_tagged_missing() {
    let harness = Harness::new();
    let video = harness.write("ep1.mkv", 4096);
    let entries = harness.catalog.list(&harness.root).await.unwrap().collect().await.unwrap();
    std::fs::remove_file(&video).unwrap();

    let record = entries[0]
        .to_display_record(true, &HistorySnapshot::new())
        .await;

    assert!(record.missing);
    assert_eq!(record.size, -1);
    assert_eq!(record.date_modified.timestamp(), 0);
    assert_eq!(record.name, "ep1.mkv");
    assert_eq!(harness.tool.probes(), 0);
}

#[tokio::test]
async fn home_keeps_missing_roots_in_config_order() {
    let gone = std::env::temp_dir().join("mediagrid-root-that-does-not-exist");
    let harness = Harness::build(
        CountingTool::default(),
        Arc::new(mediagrid::history::EmptyHistory),
        |config: &mut GridConfig| config.folders.insert(0, gone.clone()),
    );

    let records = harness.catalog.home_display().await;

    assert_eq!(records.len(), 2);
    assert!(records[0].missing);
    assert_eq!(records[0].name, gone.to_string_lossy());
    assert!(!records[1].missing);
    assert!(records[1].is_directory);
}

#[tokio::test]
async fn failing_probe_only_drops_video_info() {
    let harness = Harness::with_tool(CountingTool::failing());
    let video = harness.write("ep1.mkv", 4096);
    harness.catalog.set_done(&video, true).await.unwrap();

    let listing = harness.catalog.list_display(&harness.root, true).await.unwrap();
    let record = &listing.records[0];

    assert!(!record.missing);
    assert!(record.done);
    assert_eq!(record.size, 4096);
    assert_eq!(record.extra_info.video_info, None);
    assert_eq!(record.extra_info.last_position, Some(-1.0));
}

#[tokio::test]
async fn record_serializes_with_camel_case_fields() {
    let harness = Harness::new();
    harness.write("ep1.mkv", 2048);

    let listing = harness.catalog.list_display(&harness.root, false).await.unwrap();
    let value = serde_json::to_value(&listing).unwrap();

    assert_eq!(value["isTopLevel"], true);
    let record = &value["records"][0];
    assert_eq!(record["isFile"], true);
    assert_eq!(record["isDirectory"], false);
    assert_eq!(record["size"], 2048);
    assert!(record["absolutePath"].as_str().unwrap().ends_with("ep1.mkv"));
}
