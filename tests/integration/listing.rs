#![cfg(unix)]

use crate::support::Harness;
use mediagrid::error::ApiError;
use mediagrid::types::{DirConfig, SortKey, SortOrder};

fn names(listing: &mediagrid::catalog::Listing) -> Vec<&str> {
    listing.records.iter().map(|r| r.name.as_str()).collect()
}

#[tokio::test]
async fn lists_videos_and_folders_only() {
    let harness = Harness::new();
    harness.write("Anime/ep1.mkv", 2048);
    harness.write("Anime/ep2.mkv", 2048);
    harness.write("Anime/notes.txt", 10);
    harness.write("Anime/.hidden.mkv", 10);
    harness.mkdir("Anime/Specials");

    let dir = harness.root.join("Anime");
    let listing = harness.catalog.list_display(&dir, false).await.unwrap();

    assert_eq!(names(&listing), vec!["ep1.mkv", "ep2.mkv", "Specials"]);
    assert!(!listing.is_top_level);
    assert_eq!(listing.previous_dir, harness.root.to_string_lossy());
    assert_eq!(listing.dir_config, DirConfig::default());
}

#[tokio::test]
async fn root_listing_is_top_level_with_no_previous_dir() {
    let harness = Harness::new();
    harness.write("a.mp4", 10);

    let listing = harness.catalog.list_display(&harness.root, false).await.unwrap();

    assert!(listing.is_top_level);
    assert_eq!(listing.previous_dir, "");
}

#[tokio::test]
async fn stored_dir_config_orders_the_listing() {
    let harness = Harness::new();
    harness.write("small.mkv", 10);
    harness.write("large.mkv", 50_000);
    harness.write("medium.mkv", 5_000);
    let config = DirConfig {
        sort: SortKey::Size,
        order: SortOrder::Desc,
        ..DirConfig::default()
    };
    harness.catalog.set_dir_config(&harness.root, &config).unwrap();

    let listing = harness.catalog.list_display(&harness.root, false).await.unwrap();

    assert_eq!(listing.dir_config, config);
    assert_eq!(names(&listing), vec!["large.mkv", "medium.mkv", "small.mkv"]);
}

#[tokio::test]
async fn listing_a_file_is_not_a_directory() {
    let harness = Harness::new();
    let file = harness.write("a.mkv", 10);

    let err = harness.catalog.list_display(&file, false).await.unwrap_err();
    assert!(matches!(err, ApiError::NotADirectory(_)));

    let err = harness
        .catalog
        .list_display(&harness.root.join("nope"), false)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn done_flag_follows_identity() {
    let harness = Harness::new();
    let video = harness.write("ep1.mkv", 100);

    harness.catalog.set_done(&video, true).await.unwrap();
    let listing = harness.catalog.list_display(&harness.root, false).await.unwrap();
    assert!(listing.records[0].done);

    // Growing past a kilobyte boundary is a different file as far as annotations go.
    harness.write("ep1.mkv", 5_000);
    harness.catalog.stats().invalidate(&video);
    let listing = harness.catalog.list_display(&harness.root, false).await.unwrap();
    assert!(!listing.records[0].done);
}

#[tokio::test]
async fn extra_info_probes_each_file_once() {
    let harness = Harness::new();
    harness.write("ep1.mkv", 2048);
    harness.write("ep2.mkv", 2048);
    harness.mkdir("Extras");

    for _ in 0..2 {
        let listing = harness.catalog.list_display(&harness.root, true).await.unwrap();
        assert!(listing.extra_info);
        let extras = listing.records.iter().find(|r| r.name == "Extras").unwrap();
        assert_eq!(extras.extra_info.video_info, None);
        let ep1 = listing.records.iter().find(|r| r.name == "ep1.mkv").unwrap();
        assert_eq!(ep1.extra_info.video_info.as_ref().unwrap().codec_name, "hevc");
        assert_eq!(ep1.extra_info.last_position, Some(-1.0));
    }
    assert_eq!(harness.tool.probes(), 2);
}
