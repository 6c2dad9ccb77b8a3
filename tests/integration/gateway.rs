#![cfg(unix)]

use crate::support::Harness;
use mediagrid::config::GridConfig;
use mediagrid::error::ApiError;
use mediagrid::types::DirConfig;

#[tokio::test]
async fn traversal_out_of_a_root_is_rejected() {
    let harness = Harness::new();
    harness.write("ep1.mkv", 10);
    let sneaky = harness.root.join("..").join("videos").join("ep1.mkv");

    let err = harness.catalog.entry(&sneaky).await.unwrap_err();
    assert!(err.is_security_violation());
    assert!(!harness.catalog.gateway().is_allowed(&sneaky));
}

#[tokio::test]
async fn sibling_with_shared_prefix_is_not_inside() {
    let harness = Harness::new();
    let sibling = harness.root.with_file_name("videos2");
    std::fs::create_dir_all(&sibling).unwrap();

    let err = harness.catalog.list_display(&sibling, false).await.unwrap_err();
    assert!(matches!(err, ApiError::PathNotAllowed(_)));
}

#[tokio::test]
async fn every_mutation_is_authorized() {
    let harness = Harness::new();
    let outside = harness.temp.path().join("outside");
    std::fs::create_dir_all(&outside).unwrap();
    let file = outside.join("a.mkv");
    std::fs::write(&file, b"x").unwrap();

    assert!(harness.catalog.set_done(&file, true).await.unwrap_err().is_security_violation());
    assert!(harness.catalog.open(&file).await.unwrap_err().is_security_violation());
    assert!(harness
        .catalog
        .set_dir_config(&outside, &DirConfig::default())
        .unwrap_err()
        .is_security_violation());
    assert!(harness
        .catalog
        .update_date_accessed(&file)
        .await
        .unwrap_err()
        .is_security_violation());
}

#[tokio::test]
async fn replaced_config_takes_effect_on_the_next_call() {
    let harness = Harness::new();
    let other = harness.temp.path().join("other");
    std::fs::create_dir_all(&other).unwrap();
    let other = dunce::canonicalize(other).unwrap();

    assert!(harness.catalog.gateway().is_allowed(&harness.root));
    harness
        .catalog
        .config()
        .replace(GridConfig::with_folders([other.clone()]));

    assert!(!harness.catalog.gateway().is_allowed(&harness.root));
    assert!(harness.catalog.list_display(&other, false).await.is_ok());
}
