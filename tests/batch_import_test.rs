#![cfg(feature = "test-utils")]

mod support;

use lode::config::ImportConfig;
use lode::events::{ImportEvent, ReportLevel};
use lode::import::ImportService;
use lode::test_support::MockHost;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::support::tracing_init;

/// Create `<root>/<rel>/main_assets/<payload>` and return the bundle path.
fn make_bundle(root: &Path, rel: &str, payload: &str) -> PathBuf {
    let bundle = root.join(rel).join("main_assets");
    fs::create_dir_all(&bundle).unwrap();
    fs::write(bundle.join(payload), b"payload").unwrap();
    bundle
}

/// Give a bundle a pre-rendered thumbnail next to it.
fn add_thumbnail(bundle: &Path, name: &str) {
    let thumbs = bundle.parent().unwrap().join("thumbnail");
    fs::create_dir_all(&thumbs).unwrap();
    fs::write(thumbs.join(name), b"image").unwrap();
}

fn test_config() -> ImportConfig {
    ImportConfig {
        settle_delay: Duration::from_millis(1),
        thumbnail_tool: None,
        trash_command: Vec::new(),
        ..ImportConfig::default()
    }
}

/// Drain events until the batch finishes; returns (progress pairs, statuses, summary).
async fn collect_run(
    mut events: UnboundedReceiver<ImportEvent>,
) -> (
    Vec<(usize, usize)>,
    Vec<(String, ReportLevel)>,
    lode::import::BatchSummary,
) {
    let mut progress = Vec::new();
    let mut statuses = Vec::new();

    loop {
        let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
            .await
            .expect("batch did not finish in time")
            .expect("event channel closed before the batch finished");

        match event {
            ImportEvent::Progress { current, total } => progress.push((current, total)),
            ImportEvent::Status { message, level } => statuses.push((message, level)),
            ImportEvent::Finished { summary } => return (progress, statuses, summary),
            ImportEvent::Log { .. } => {}
        }
    }
}

#[tokio::test]
async fn test_batch_continues_past_a_failed_thumbnail() {
    tracing_init();

    let root_dir = TempDir::new().unwrap();
    let library = TempDir::new().unwrap();
    let root = root_dir.path();

    for (rel, payload) in [
        ("CatA/pack1", "asset1.bin"),
        ("CatA/pack2", "asset2.bin"),
        ("CatB/pack3", "asset3.bin"),
    ] {
        let bundle = make_bundle(root, rel, payload);
        add_thumbnail(&bundle, "cover.png");
    }

    let host = Arc::new(MockHost::new(library.path()));
    host.fail_thumbnail_for(&["asset2.bin"]);

    let handle = ImportService::start(host.clone(), test_config());
    let events = handle.subscribe();
    handle
        .start_batch(root.to_path_buf(), vec!["Incoming".to_string()])
        .unwrap();

    let (progress, _, summary) = collect_run(events).await;

    // Progress is reported for every bundle regardless of outcome.
    assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);

    assert_eq!(summary.total, 3);
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.imported, 3);
    assert_eq!(summary.failed, 0);
    // Only the bundles whose every step succeeded were cleaned.
    assert_eq!(summary.cleaned, 2);

    let items = host.items();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].name, "asset1.bin");
    assert_eq!(items[0].tags, vec!["CatA", "pack1"]);
    assert_eq!(items[0].folders, vec!["Incoming"]);
    assert!(host.thumbnail_for(&items[0].id).is_some());
    assert!(host.thumbnail_for(&items[1].id).is_none());
    assert!(host.thumbnail_for(&items[2].id).is_some());
}

#[tokio::test]
async fn test_empty_root_reports_nothing_to_do() {
    tracing_init();

    let root_dir = TempDir::new().unwrap();
    let library = TempDir::new().unwrap();
    fs::create_dir_all(root_dir.path().join("A/B")).unwrap();

    let host = Arc::new(MockHost::new(library.path()));
    let handle = ImportService::start(host.clone(), test_config());
    let events = handle.subscribe();
    handle
        .start_batch(root_dir.path().to_path_buf(), Vec::new())
        .unwrap();

    let (progress, statuses, summary) = collect_run(events).await;

    assert!(progress.is_empty());
    assert_eq!(summary.total, 0);
    assert!(host.items().is_empty());
    assert!(statuses
        .iter()
        .any(|(message, _)| message.contains("nothing to do")));
}

#[tokio::test]
async fn test_invalid_bundles_are_skipped_without_host_calls() {
    tracing_init();

    let root_dir = TempDir::new().unwrap();
    let library = TempDir::new().unwrap();
    let root = root_dir.path();

    // Empty bundle.
    fs::create_dir_all(root.join("empty/main_assets")).unwrap();
    // Ambiguous bundle.
    let ambiguous = make_bundle(root, "ambiguous", "one.bin");
    fs::write(ambiguous.join("two.bin"), b"payload").unwrap();
    // Valid bundle.
    make_bundle(root, "valid", "asset.bin");

    let host = Arc::new(MockHost::new(library.path()));
    let handle = ImportService::start(host.clone(), test_config());
    let events = handle.subscribe();
    handle.start_batch(root.to_path_buf(), Vec::new()).unwrap();

    let (progress, _, summary) = collect_run(events).await;

    assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
    assert_eq!(summary.imported, 1);
    assert_eq!(summary.failed, 2);

    let items = host.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "asset.bin");
}

#[tokio::test]
async fn test_missing_thumbnail_without_generator_tags_but_still_cleans() {
    tracing_init();

    let root_dir = TempDir::new().unwrap();
    let library = TempDir::new().unwrap();
    make_bundle(root_dir.path(), "Textures/Wood", "planks.png");

    let host = Arc::new(MockHost::new(library.path()));
    let handle = ImportService::start(host.clone(), test_config());
    let events = handle.subscribe();
    handle
        .start_batch(root_dir.path().to_path_buf(), Vec::new())
        .unwrap();

    let (_, _, summary) = collect_run(events).await;

    assert_eq!(summary.imported, 1);
    // No thumbnail step was required, so nothing blocked cleanup.
    assert_eq!(summary.cleaned, 1);

    let items = host.items();
    assert_eq!(items[0].tags, vec!["Textures", "Wood", "no_thumbnail"]);
}

#[tokio::test]
async fn test_second_start_is_rejected_while_busy() {
    tracing_init();

    let root_dir = TempDir::new().unwrap();
    let library = TempDir::new().unwrap();
    for index in 0..3 {
        make_bundle(root_dir.path(), &format!("pack{index}"), "asset.bin");
    }

    let host = Arc::new(MockHost::new(library.path()));
    let mut config = test_config();
    config.settle_delay = Duration::from_millis(50);

    let handle = ImportService::start(host, config);
    let events = handle.subscribe();

    handle
        .start_batch(root_dir.path().to_path_buf(), Vec::new())
        .unwrap();
    let second = handle.start_batch(root_dir.path().to_path_buf(), Vec::new());
    assert!(second.is_err());
    assert!(handle.is_busy());

    let (_, _, summary) = collect_run(events).await;
    assert_eq!(summary.processed, 3);
    assert!(!handle.is_busy());
}

#[cfg(unix)]
#[tokio::test]
async fn test_cleanup_sends_parents_to_the_trash_utility() {
    use std::os::unix::fs::PermissionsExt;

    tracing_init();

    let root_dir = TempDir::new().unwrap();
    let library = TempDir::new().unwrap();
    let trash = TempDir::new().unwrap();
    let root = root_dir.path();

    // Stand-in trash utility: moves the directory into a holding area.
    let tool = trash.path().join("trash.sh");
    fs::write(
        &tool,
        format!("#!/bin/sh\nmv \"$1\" \"{}/\"\n", trash.path().display()),
    )
    .unwrap();
    fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

    let good = make_bundle(root, "good", "asset1.bin");
    add_thumbnail(&good, "cover.png");
    let bad = make_bundle(root, "bad", "asset2.bin");
    add_thumbnail(&bad, "cover.png");

    let host = Arc::new(MockHost::new(library.path()));
    host.fail_thumbnail_for(&["asset2.bin"]);

    let mut config = test_config();
    config.trash_command = vec![tool.to_string_lossy().into_owned()];

    let handle = ImportService::start(host, config);
    let events = handle.subscribe();
    handle.start_batch(root.to_path_buf(), Vec::new()).unwrap();

    let (_, _, summary) = collect_run(events).await;
    assert_eq!(summary.cleaned, 1);

    // Deletion is fire-and-forget; give the spawned utility a moment.
    let moved = trash.path().join("good");
    for _ in 0..50 {
        if moved.is_dir() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert!(moved.is_dir(), "fully imported bundle was not trashed");
    assert!(!root.join("good").exists());
    assert!(
        root.join("bad").is_dir(),
        "bundle with a failed step must keep its source tree"
    );
}
