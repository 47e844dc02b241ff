//! End-to-end runtime bundle sync against a mock registry and CDN.

use crate::helpers::{BundleFixture, ENGINE, EventLog, LOADER, PACKAGE, ignore, truncating_cdn};
use assetsync::{SyncError, SyncOutcome, TransferEvent};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn newer_registry_version_replaces_bundle() {
    let fx = BundleFixture::start().await;
    fx.install("0.12.6", "old loader", "old engine");
    fx.mock_latest("0.12.10").await;
    fx.mock_file("0.12.10", LOADER, "new loader", 1).await;
    fx.mock_file("0.12.10", ENGINE, "new engine", 1).await;

    let log = EventLog::default();
    let outcome = fx.sync.sync(&log.callback()).await.unwrap();

    assert_eq!(
        outcome,
        SyncOutcome::Updated {
            previous: Some("0.12.6".to_owned()),
            version: "0.12.10".to_owned(),
        }
    );
    assert_eq!(fx.sync.store().read().as_deref(), Some("0.12.10"));
    assert_eq!(fx.read_installed(LOADER), "new loader");
    assert_eq!(fx.read_installed(ENGINE), "new engine");

    let events = log.events();
    for file in [LOADER, ENGINE] {
        let mine: Vec<_> = events.iter().filter(|e| e.file() == file).collect();
        assert!(matches!(mine.first(), Some(TransferEvent::Started { .. })));
        assert!(matches!(mine.last(), Some(TransferEvent::Finished { .. })));
    }
}

#[tokio::test]
async fn equal_version_fetches_nothing() {
    let fx = BundleFixture::start().await;
    fx.install("0.12.10", "loader", "engine");
    fx.mock_latest("0.12.10").await;
    fx.mock_file("0.12.10", LOADER, "unused", 0).await;
    fx.mock_file("0.12.10", ENGINE, "unused", 0).await;

    let log = EventLog::default();
    let outcome = fx.sync.sync(&log.callback()).await.unwrap();

    assert_eq!(
        outcome,
        SyncOutcome::UpToDate {
            version: "0.12.10".to_owned()
        }
    );
    assert!(log.events().is_empty());
    assert_eq!(fx.read_installed(LOADER), "loader");
    assert_eq!(fx.read_installed(ENGINE), "engine");
}

#[tokio::test]
async fn registry_failure_leaves_state_untouched() {
    let fx = BundleFixture::start().await;
    fx.install("0.12.6", "loader", "engine");
    Mock::given(method("GET"))
        .and(path(format!("/{PACKAGE}")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&fx.server)
        .await;

    let err = fx.sync.sync(&ignore).await.unwrap_err();

    assert!(matches!(err, SyncError::Network(_)), "got {err}");
    assert_eq!(fx.sync.store().read().as_deref(), Some("0.12.6"));
    assert_eq!(fx.read_installed(ENGINE), "engine");
}

#[tokio::test]
async fn one_failed_file_aborts_whole_update() {
    let fx = BundleFixture::start().await;
    fx.install("0.12.6", "old loader", "old engine");
    fx.mock_latest("0.12.10").await;
    // The loader request may be cancelled once the engine fails, so no hit count.
    Mock::given(method("GET"))
        .and(path(format!("/{PACKAGE}@0.12.10/dist/esm/{LOADER}")))
        .respond_with(ResponseTemplate::new(200).set_body_string("new loader"))
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/{PACKAGE}@0.12.10/dist/esm/{ENGINE}")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&fx.server)
        .await;

    let err = fx.sync.sync(&ignore).await.unwrap_err();

    assert!(matches!(err, SyncError::Transfer(_)), "got {err}");
    assert_eq!(fx.sync.store().read().as_deref(), Some("0.12.6"));
    assert_eq!(fx.read_installed(LOADER), "old loader");
    assert_eq!(fx.read_installed(ENGINE), "old engine");

    // No staging leftovers next to the install dir.
    let leftovers: Vec<_> = std::fs::read_dir(fx.dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().contains(".staging-"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn transfer_cut_mid_stream_keeps_old_version() {
    let fx = BundleFixture::start_with_cdn(Some(truncating_cdn().await)).await;
    fx.install("0.12.6", "old loader", "old engine");
    fx.mock_latest("0.12.10").await;

    let log = EventLog::default();
    let err = fx.sync.sync(&log.callback()).await.unwrap_err();

    assert!(matches!(err, SyncError::Transfer(_)), "got {err}");
    assert_eq!(fx.sync.store().read().as_deref(), Some("0.12.6"));
    assert_eq!(fx.read_installed(LOADER), "old loader");
    assert_eq!(fx.read_installed(ENGINE), "old engine");
    assert!(
        !log.events()
            .iter()
            .any(|e| matches!(e, TransferEvent::Finished { .. }))
    );
}

#[tokio::test]
async fn unreadable_record_forces_update() {
    let fx = BundleFixture::start().await;
    fx.install("0.12.10", "loader", "engine");
    std::fs::write(fx.version_file(), "not json").unwrap();
    fx.mock_latest("0.12.10").await;
    fx.mock_file("0.12.10", LOADER, "fresh loader", 1).await;
    fx.mock_file("0.12.10", ENGINE, "fresh engine", 1).await;

    let outcome = fx.sync.sync(&ignore).await.unwrap();

    assert_eq!(
        outcome,
        SyncOutcome::Updated {
            previous: None,
            version: "0.12.10".to_owned(),
        }
    );
    assert_eq!(fx.sync.store().read().as_deref(), Some("0.12.10"));
    assert_eq!(fx.read_installed(ENGINE), "fresh engine");
}

#[tokio::test]
async fn first_install_without_record() {
    let fx = BundleFixture::start().await;
    fx.mock_latest("0.12.10").await;
    fx.mock_file("0.12.10", LOADER, "loader", 1).await;
    fx.mock_file("0.12.10", ENGINE, "engine", 1).await;

    let outcome = fx.sync.sync(&ignore).await.unwrap();

    assert!(matches!(outcome, SyncOutcome::Updated { previous: None, .. }));
    assert!(fx.sync.status().complete);
    assert_eq!(fx.read_installed(LOADER), "loader");
}

#[tokio::test]
async fn missing_installed_file_forces_update() {
    let fx = BundleFixture::start().await;
    fx.install("0.12.10", "loader", "engine");
    std::fs::remove_file(fx.install_dir().join(ENGINE)).unwrap();
    fx.mock_latest("0.12.10").await;
    fx.mock_file("0.12.10", LOADER, "loader", 1).await;
    fx.mock_file("0.12.10", ENGINE, "engine", 1).await;

    let status = fx.sync.status();
    assert_eq!(status.recorded_version.as_deref(), Some("0.12.10"));
    assert!(!status.complete);

    let outcome = fx.sync.sync(&ignore).await.unwrap();
    assert!(matches!(outcome, SyncOutcome::Updated { .. }));
    assert!(fx.sync.status().complete);
}

#[tokio::test]
async fn force_reinstalls_current_version() {
    let fx = BundleFixture::start().await;
    fx.install("0.12.10", "tampered", "tampered");
    fx.mock_latest("0.12.10").await;
    fx.mock_file("0.12.10", LOADER, "loader", 1).await;
    fx.mock_file("0.12.10", ENGINE, "engine", 1).await;

    let outcome = fx.sync.sync_with(true, &ignore).await.unwrap();

    assert_eq!(
        outcome,
        SyncOutcome::Updated {
            previous: Some("0.12.10".to_owned()),
            version: "0.12.10".to_owned(),
        }
    );
    assert_eq!(fx.read_installed(ENGINE), "engine");
}

#[tokio::test]
async fn check_reports_without_installing() {
    let fx = BundleFixture::start().await;
    fx.install("0.12.6", "loader", "engine");
    fx.mock_latest("0.12.10").await;
    fx.mock_file("0.12.10", LOADER, "unused", 0).await;
    fx.mock_file("0.12.10", ENGINE, "unused", 0).await;

    let plan = fx.sync.check().await.unwrap();

    assert_eq!(plan.remote_version(), Some("0.12.10"));
    assert_eq!(fx.sync.store().read().as_deref(), Some("0.12.6"));
}

#[tokio::test]
async fn interrupted_swap_is_recovered_before_sync() {
    let fx = BundleFixture::start().await;
    fx.install("0.12.10", "loader", "engine");
    // Crash between moving the install aside and renaming staging in.
    let backup = fx.dir.path().join(".bundle.previous");
    std::fs::rename(fx.install_dir(), &backup).unwrap();
    std::fs::create_dir(fx.dir.path().join(".bundle.staging-stale")).unwrap();
    fx.mock_latest("0.12.10").await;
    fx.mock_file("0.12.10", LOADER, "unused", 0).await;
    fx.mock_file("0.12.10", ENGINE, "unused", 0).await;

    let outcome = fx.sync.sync(&ignore).await.unwrap();

    assert!(matches!(outcome, SyncOutcome::UpToDate { .. }));
    assert_eq!(fx.read_installed(ENGINE), "engine");
    assert!(!backup.exists());
    assert!(!fx.dir.path().join(".bundle.staging-stale").exists());
}
