#![cfg(unix)]

use crate::support::{CountingTool, Harness, ScriptedHistory};
use mediagrid::history::{rfe_hash, HistorySnapshot, UNKNOWN_POSITION};
use std::sync::Arc;

fn position_of(listing: &mediagrid::catalog::Listing, name: &str) -> Option<f64> {
    listing
        .records
        .iter()
        .find(|r| r.name == name)
        .and_then(|r| r.extra_info.last_position)
}

#[tokio::test]
async fn player_history_wins_and_is_remembered() {
    let history = Arc::new(ScriptedHistory::default());
    let harness = Harness::build(CountingTool::default(), history.clone(), |_| {});
    let ep1 = harness.write("ep1.mkv", 2048);
    harness.write("ep2.mkv", 2048);

    let mut snapshot = HistorySnapshot::new();
    snapshot.insert_path(&ep1, 42.0);
    history.set(snapshot);

    let listing = harness.catalog.list_display(&harness.root, true).await.unwrap();
    assert_eq!(position_of(&listing, "ep1.mkv"), Some(42.0));
    assert_eq!(position_of(&listing, "ep2.mkv"), Some(UNKNOWN_POSITION));

    // The player forgot the file; the cached value answers.
    history.set(HistorySnapshot::new());
    let listing = harness.catalog.list_display(&harness.root, true).await.unwrap();
    assert_eq!(position_of(&listing, "ep1.mkv"), Some(42.0));
}

#[tokio::test]
async fn newer_history_overwrites_cache() {
    let history = Arc::new(ScriptedHistory::default());
    let harness = Harness::build(CountingTool::default(), history.clone(), |_| {});
    let ep1 = harness.write("ep1.mkv", 2048);

    for seconds in [10.0, 95.5] {
        let mut snapshot = HistorySnapshot::new();
        snapshot.insert_path(&ep1, seconds);
        history.set(snapshot);
        let listing = harness.catalog.list_display(&harness.root, true).await.unwrap();
        assert_eq!(position_of(&listing, "ep1.mkv"), Some(seconds));
    }
}

#[tokio::test]
async fn clearing_last_position_forgets_cache() {
    let history = Arc::new(ScriptedHistory::default());
    let harness = Harness::build(CountingTool::default(), history.clone(), |_| {});
    let ep1 = harness.write("ep1.mkv", 2048);
    let mut snapshot = HistorySnapshot::new();
    snapshot.insert_path(&ep1, 30.0);
    history.set(snapshot);
    harness.catalog.list_display(&harness.root, true).await.unwrap();

    history.set(HistorySnapshot::new());
    harness
        .catalog
        .entry(&ep1)
        .await
        .unwrap()
        .clear_last_position()
        .await
        .unwrap();

    let listing = harness.catalog.list_display(&harness.root, true).await.unwrap();
    assert_eq!(position_of(&listing, "ep1.mkv"), Some(UNKNOWN_POSITION));
}

#[test]
fn hash_is_case_insensitive() {
    assert_eq!(
        rfe_hash("D:\\Anime\\EP1.MKV"),
        rfe_hash("d:\\anime\\ep1.mkv")
    );
    assert_eq!(rfe_hash("D:\\Anime\\ep1.mkv").len(), 12);
}
