#![cfg(unix)]

use crate::support::{CountingTool, Harness};
use mediagrid::error::ApiError;
use mediagrid::thumbnail::PLACEHOLDER_FILE;
use std::time::Duration;

fn leftover_temp_files(harness: &Harness) -> Vec<String> {
    std::fs::read_dir(harness.thumbnail_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(".thumb-"))
        .collect()
}

#[tokio::test]
async fn file_thumbnail_is_generated_once() {
    let harness = Harness::new();
    let video = harness.write("Anime/ep1.mkv", 4096);

    let first = harness.catalog.thumbnail(&video).await.unwrap();
    let second = harness.catalog.thumbnail(&video).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.parent().unwrap(), harness.thumbnail_dir());
    assert!(first.to_string_lossy().ends_with(".jpg"));
    assert!(first.is_file());
    assert_eq!(harness.tool.extractions(), 1);
}

#[tokio::test]
async fn concurrent_requests_share_one_extraction() {
    let harness = Harness::with_tool(CountingTool::slow(Duration::from_millis(100)));
    let video = harness.write("ep1.mkv", 4096);

    let requests = (0..8).map(|_| {
        let catalog = harness.catalog.clone();
        let video = video.clone();
        tokio::spawn(async move { catalog.thumbnail(&video).await })
    });
    let results = futures::future::join_all(requests).await;

    let paths: Vec<_> = results
        .into_iter()
        .map(|r| r.unwrap().unwrap())
        .collect();
    assert!(paths.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(harness.tool.extractions(), 1);
    assert!(leftover_temp_files(&harness).is_empty());
}

#[tokio::test]
async fn empty_directory_resolves_to_placeholder() {
    let harness = Harness::new();
    let dir = harness.mkdir("Empty");

    let image = harness.catalog.thumbnail(&dir).await.unwrap();

    assert_eq!(image, harness.thumbnail_dir().join(PLACEHOLDER_FILE));
    assert_eq!(harness.tool.extractions(), 0);
}

#[tokio::test]
async fn cover_image_wins_over_videos() {
    let harness = Harness::new();
    harness.write("Show/ep1.mkv", 4096);
    let cover = harness.write("Show/cover.jpg", 10);

    let image = harness
        .catalog
        .thumbnail(&harness.root.join("Show"))
        .await
        .unwrap();

    assert_eq!(image, cover);
    assert_eq!(harness.tool.extractions(), 0);
}

#[tokio::test]
async fn directory_borrows_first_video_in_natural_order() {
    let harness = Harness::new();
    let ep10 = harness.write("Show/ep10.mkv", 4096);
    let ep2 = harness.write("Show/ep2.mkv", 4096);
    harness.write("Show/Season 2/ep1.mkv", 4096);

    let image = harness
        .catalog
        .thumbnail(&harness.root.join("Show"))
        .await
        .unwrap();

    let ep2_thumb = harness.catalog.entry(&ep2).await.unwrap().thumbnail_path().await.unwrap();
    let ep10_thumb = harness.catalog.entry(&ep10).await.unwrap().thumbnail_path().await.unwrap();
    assert_eq!(image, ep2_thumb);
    assert!(!ep10_thumb.exists());
    assert_eq!(harness.tool.extractions(), 1);
}

#[tokio::test]
async fn nested_directory_descends_until_an_image_is_found() {
    let harness = Harness::new();
    harness.mkdir("Show/Empty");
    harness.write("Show/Season 1/ep1.mkv", 4096);

    let image = harness
        .catalog
        .thumbnail(&harness.root.join("Show"))
        .await
        .unwrap();

    assert_ne!(image, harness.thumbnail_dir().join(PLACEHOLDER_FILE));
    assert_eq!(harness.tool.extractions(), 1);
}

#[tokio::test]
async fn symlink_cycle_terminates_with_placeholder() {
    let harness = Harness::new();
    let dir = harness.mkdir("Loop");
    std::os::unix::fs::symlink(&dir, dir.join("again")).unwrap();

    let image = tokio::time::timeout(Duration::from_secs(10), harness.catalog.thumbnail(&dir))
        .await
        .expect("resolution must terminate")
        .unwrap();

    assert_eq!(image, harness.thumbnail_dir().join(PLACEHOLDER_FILE));
}

#[tokio::test]
async fn tool_failure_falls_back_without_leaving_files() {
    let harness = Harness::with_tool(CountingTool::failing());
    let video = harness.write("broken.mkv", 4096);

    let image = harness.catalog.thumbnail(&video).await.unwrap();
    let target = harness
        .catalog
        .entry(&video)
        .await
        .unwrap()
        .thumbnail_path()
        .await
        .unwrap();

    assert_eq!(image, harness.thumbnail_dir().join(PLACEHOLDER_FILE));
    assert!(!target.exists());
    assert!(leftover_temp_files(&harness).is_empty());
}

#[tokio::test]
async fn path_outside_roots_is_an_error_not_a_placeholder() {
    let harness = Harness::new();
    let outside = harness.temp.path().join("elsewhere.mkv");
    std::fs::write(&outside, b"x").unwrap();

    let err = harness.catalog.thumbnail(&outside).await.unwrap_err();

    assert!(matches!(err, ApiError::PathNotAllowed(_)));
    assert_eq!(harness.tool.extractions(), 0);
}
