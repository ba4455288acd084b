#![cfg(feature = "test-utils")]

mod support;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;

use crate::support::{fake_video, tracing_init};
use vidshare::file_picker::FilePicker;
use vidshare::test_support::{MockFilePicker, MockRemoteService, RemoteCall};
use vidshare::upload::{UploadCoordinator, UploadError, UploadPhase, UploadProgress};
use vidshare::CatalogStore;

struct UploadFixture {
    remote: Arc<MockRemoteService>,
    coordinator: UploadCoordinator,
    temp_dir: TempDir,
}

impl UploadFixture {
    fn new() -> Self {
        tracing_init();

        let remote = Arc::new(MockRemoteService::new());
        let coordinator =
            UploadCoordinator::new(remote.clone(), tokio::runtime::Handle::current());

        Self {
            remote,
            coordinator,
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Collect events until the attempt completes or fails
    async fn collect_until_done(
        rx: &mut tokio::sync::mpsc::UnboundedReceiver<UploadProgress>,
    ) -> Vec<UploadProgress> {
        let mut events = Vec::new();
        loop {
            let progress = timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("Timed out waiting for upload progress")
                .expect("Progress channel closed");
            let finished = matches!(
                progress,
                UploadProgress::Complete { .. } | UploadProgress::Failed { .. }
            );
            events.push(progress);
            if finished {
                return events;
            }
        }
    }
}

#[tokio::test]
async fn test_success_path_reports_checkpoints_in_order() {
    let fixture = UploadFixture::new();
    let file = fake_video(&fixture.temp_dir, "demo.mp4");
    let mut progress_rx = fixture.coordinator.subscribe_progress();

    let outcome = fixture
        .coordinator
        .submit(Some(file), "Demo")
        .await
        .expect("Upload should succeed");

    let events = UploadFixture::collect_until_done(&mut progress_rx).await;
    let percents: Vec<u8> = events.iter().filter_map(|e| e.percent()).collect();
    assert_eq!(percents, vec![0, 20, 40, 80, 100]);
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert!(matches!(
        events.last(),
        Some(UploadProgress::Complete { storage_key, .. }) if *storage_key == outcome.storage_key
    ));

    assert_eq!(fixture.coordinator.phase(), UploadPhase::Done);
    assert_eq!(fixture.coordinator.progress(), 100);

    let calls = fixture.remote.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0], RemoteCall::AcquireUploadTarget);
    assert!(matches!(calls[1], RemoteCall::Transfer { .. }));
    assert_eq!(
        calls[2],
        RemoteCall::CommitMetadata {
            title: "Demo".to_string(),
            filename: outcome.storage_key.clone(),
        }
    );
}

#[tokio::test]
async fn test_empty_title_makes_no_remote_calls() {
    let fixture = UploadFixture::new();
    let file = fake_video(&fixture.temp_dir, "demo.mp4");

    let result = fixture.coordinator.submit(Some(file), "   ").await;

    assert!(matches!(result, Err(UploadError::Validation(_))));
    assert!(fixture.remote.calls().is_empty());
    assert_eq!(fixture.coordinator.phase(), UploadPhase::Idle);
}

#[tokio::test]
async fn test_transfer_failure_never_commits() {
    let fixture = UploadFixture::new();
    fixture.remote.transfer_status(500);
    let file = fake_video(&fixture.temp_dir, "demo.mp4");
    let mut progress_rx = fixture.coordinator.subscribe_progress();

    let result = fixture.coordinator.submit(Some(file), "Demo").await;

    assert!(matches!(result, Err(UploadError::Transfer { status: 500 })));
    assert_eq!(
        fixture
            .remote
            .count(|call| matches!(call, RemoteCall::CommitMetadata { .. })),
        0
    );
    assert_eq!(
        fixture
            .remote
            .count(|call| matches!(call, RemoteCall::AcquireUploadTarget)),
        1
    );

    let session = fixture.coordinator.session().unwrap();
    assert_eq!(session.phase, UploadPhase::Failed);
    assert_eq!(session.progress, 0);
    assert!(session.last_error.is_some());

    let events = UploadFixture::collect_until_done(&mut progress_rx).await;
    match events.last() {
        Some(UploadProgress::Failed { phase, .. }) => {
            assert_eq!(*phase, UploadPhase::Transferring)
        }
        other => panic!("Expected failure event, got {:?}", other),
    }
}

#[tokio::test]
async fn test_retry_after_failure_starts_from_scratch() {
    let fixture = UploadFixture::new();
    fixture.remote.fail_acquire(502, "Bad Gateway");
    let file = fake_video(&fixture.temp_dir, "demo.mp4");

    let first = fixture.coordinator.submit(Some(file.clone()), "Demo").await;
    assert!(matches!(first, Err(UploadError::Network { .. })));

    fixture.remote.clear_failures();
    let second = fixture.coordinator.submit(Some(file), "Demo").await;
    assert!(second.is_ok());
    assert_eq!(fixture.coordinator.phase(), UploadPhase::Done);

    assert_eq!(
        fixture
            .remote
            .count(|call| matches!(call, RemoteCall::AcquireUploadTarget)),
        2
    );
}

#[tokio::test]
async fn test_submit_and_refresh_updates_catalog_and_resets() {
    let fixture = UploadFixture::new();
    let catalog = CatalogStore::new(fixture.remote.clone());
    let file = fake_video(&fixture.temp_dir, "demo.mp4");

    let outcome = fixture
        .coordinator
        .submit_and_refresh(&catalog, Some(file), "Demo")
        .await
        .unwrap();

    let videos = catalog.videos().await;
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].filename, outcome.storage_key);
    assert_eq!(fixture.coordinator.phase(), UploadPhase::Idle);
}

#[tokio::test]
async fn test_cancelled_picker_starts_no_session() {
    let fixture = UploadFixture::new();
    let picker = MockFilePicker::cancelled();

    let selection = picker.pick_video().await;
    let result = fixture
        .coordinator
        .submit(selection.into_file(), "Demo")
        .await;

    assert!(matches!(result, Err(UploadError::Validation(_))));
    assert!(fixture.coordinator.session().is_none());
    assert!(fixture.remote.calls().is_empty());
}

#[tokio::test]
async fn test_picked_file_uploads() {
    let fixture = UploadFixture::new();
    let picker = MockFilePicker::selecting(fake_video(&fixture.temp_dir, "clip.mov"));

    let file = picker.pick_video().await.into_file();
    let outcome = fixture.coordinator.submit(file, "Clip").await.unwrap();

    assert_eq!(outcome.title, "Clip");
    assert_eq!(fixture.remote.committed_metadata().len(), 1);
}
