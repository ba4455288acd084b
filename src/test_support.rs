// Test support utilities for both unit and integration tests

use crate::file_picker::{FilePicker, FileSelection, LocalFile};
use crate::models::{UploadTarget, VideoMetadata, VideoRecord, VideoStatus};
use crate::playback::{EngineCommand, EngineError, EngineStatus, MediaEngine};
use crate::remote::{RemoteError, RemoteService};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc as tokio_mpsc, Notify};
use tokio_stream::wrappers::UnboundedReceiverStream;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Build a ready video record with sensible defaults
pub fn sample_video(id: &str, title: &str) -> VideoRecord {
    VideoRecord {
        id: id.to_string(),
        title: title.to_string(),
        description: None,
        thumbnail: None,
        duration: Some("2:30".to_string()),
        views: 0,
        likes: 0,
        uploaded_at: None,
        channel_name: Some("Test Channel".to_string()),
        channel_avatar: None,
        filename: format!("{}.mp4", id),
        status: VideoStatus::Ready,
    }
}

/// Remote call as recorded by `MockRemoteService`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    AcquireUploadTarget,
    Transfer { target_url: String },
    CommitMetadata { title: String, filename: String },
    ListReady,
    FetchVideo { id: String },
    ResolvePlaybackUrl { id: String },
    DeleteVideo { id: String },
}

#[derive(Default)]
struct MockFailures {
    acquire: Option<(u16, String)>,
    transfer_status: Option<u16>,
    transfer_io: Option<String>,
    commit: Option<(u16, String)>,
    list: Option<(u16, String)>,
    delete: Option<(u16, String)>,
}

/// Mock remote service for testing
///
/// Keeps the catalog in memory and records every call in order.
#[derive(Default)]
pub struct MockRemoteService {
    calls: Mutex<Vec<RemoteCall>>,
    videos: Mutex<Vec<VideoRecord>>,
    playback_urls: Mutex<HashMap<String, String>>,
    failures: Mutex<MockFailures>,
    next_key: Mutex<u32>,
    transfer_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockRemoteService {
    #[allow(unused)] // Used in tests
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_videos(videos: Vec<VideoRecord>) -> Self {
        let mock = Self::default();
        *lock(&mock.videos) = videos;
        mock
    }

    pub fn set_playback_url(&self, id: &str, url: &str) {
        lock(&self.playback_urls).insert(id.to_string(), url.to_string());
    }

    pub fn fail_acquire(&self, code: u16, text: &str) {
        lock(&self.failures).acquire = Some((code, text.to_string()));
    }

    /// Make the byte transfer report `status` instead of 200
    pub fn transfer_status(&self, status: u16) {
        lock(&self.failures).transfer_status = Some(status);
    }

    /// Make the byte transfer fail below HTTP, as a dropped connection would
    pub fn fail_transfer_io(&self, message: &str) {
        lock(&self.failures).transfer_io = Some(message.to_string());
    }

    /// Hold every transfer until the returned gate is notified
    pub fn gate_transfers(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.transfer_gate) = Some(gate.clone());
        gate
    }

    pub fn fail_commit(&self, code: u16, text: &str) {
        lock(&self.failures).commit = Some((code, text.to_string()));
    }

    pub fn fail_list(&self, code: u16, text: &str) {
        lock(&self.failures).list = Some((code, text.to_string()));
    }

    pub fn fail_delete(&self, code: u16, text: &str) {
        lock(&self.failures).delete = Some((code, text.to_string()));
    }

    pub fn clear_failures(&self) {
        *lock(&self.failures) = MockFailures::default();
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        lock(&self.calls).clone()
    }

    pub fn count(&self, matches: impl Fn(&RemoteCall) -> bool) -> usize {
        lock(&self.calls).iter().filter(|call| matches(call)).count()
    }

    pub fn committed_metadata(&self) -> Vec<VideoMetadata> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                RemoteCall::CommitMetadata { title, filename } => Some(VideoMetadata {
                    title: title.clone(),
                    filename: filename.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: RemoteCall) {
        lock(&self.calls).push(call);
    }

    fn failure(
        &self,
        operation: &'static str,
        pick: impl Fn(&MockFailures) -> Option<(u16, String)>,
    ) -> Result<(), RemoteError> {
        match pick(&lock(&self.failures)) {
            Some((code, text)) => Err(RemoteError::status(operation, code, text)),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl RemoteService for MockRemoteService {
    async fn acquire_upload_target(&self) -> Result<UploadTarget, RemoteError> {
        self.record(RemoteCall::AcquireUploadTarget);
        self.failure("acquire upload target", |f| f.acquire.clone())?;

        let key = {
            let mut next = lock(&self.next_key);
            *next += 1;
            format!("upload-{}.mp4", *next)
        };
        Ok(UploadTarget {
            target_url: format!("https://storage.test/{}", key),
            storage_key: key,
        })
    }

    async fn transfer(&self, target_url: &str, _file: &LocalFile) -> Result<u16, RemoteError> {
        self.record(RemoteCall::Transfer {
            target_url: target_url.to_string(),
        });

        let gate = lock(&self.transfer_gate).clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let failures = lock(&self.failures);
        if let Some(message) = &failures.transfer_io {
            return Err(RemoteError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                message.clone(),
            )));
        }
        Ok(failures.transfer_status.unwrap_or(200))
    }

    async fn commit_metadata(&self, metadata: &VideoMetadata) -> Result<(), RemoteError> {
        self.record(RemoteCall::CommitMetadata {
            title: metadata.title.clone(),
            filename: metadata.filename.clone(),
        });
        self.failure("commit metadata", |f| f.commit.clone())?;

        let mut video = sample_video(&metadata.filename, &metadata.title);
        video.filename = metadata.filename.clone();
        lock(&self.videos).push(video);
        Ok(())
    }

    async fn list_ready(&self) -> Result<Vec<VideoRecord>, RemoteError> {
        self.record(RemoteCall::ListReady);
        self.failure("list videos", |f| f.list.clone())?;

        Ok(lock(&self.videos)
            .iter()
            .filter(|video| video.status.is_ready())
            .cloned()
            .collect())
    }

    async fn fetch_video(&self, id: &str) -> Result<VideoRecord, RemoteError> {
        self.record(RemoteCall::FetchVideo { id: id.to_string() });
        lock(&self.videos)
            .iter()
            .find(|video| video.id == id)
            .cloned()
            .ok_or_else(|| RemoteError::status("fetch video", 404, "Not Found"))
    }

    async fn resolve_playback_url(&self, id: &str) -> Result<String, RemoteError> {
        self.record(RemoteCall::ResolvePlaybackUrl { id: id.to_string() });
        lock(&self.playback_urls)
            .get(id)
            .cloned()
            .ok_or_else(|| RemoteError::status("resolve playback url", 404, "Not Found"))
    }

    async fn delete_video(&self, id: &str) -> Result<(), RemoteError> {
        self.record(RemoteCall::DeleteVideo { id: id.to_string() });
        self.failure("delete video", |f| f.delete.clone())?;

        let mut videos = lock(&self.videos);
        let before = videos.len();
        videos.retain(|video| video.id != id);
        if videos.len() == before {
            return Err(RemoteError::status("delete video", 404, "Not Found"));
        }
        Ok(())
    }
}

/// Engine call as recorded by `MockMediaEngine`
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Load { url: String, should_play: bool },
    Unload,
    Command(EngineCommand),
}

/// Mock media engine for testing
///
/// Acknowledges every command immediately unless told to reject one.
/// Statuses are pushed by the test through `engine_status_channel`.
#[derive(Default)]
pub struct MockMediaEngine {
    calls: Mutex<Vec<EngineCall>>,
    reject: Mutex<Option<&'static str>>,
}

impl MockMediaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        lock(&self.calls).clone()
    }

    pub fn commands(&self) -> Vec<EngineCommand> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                EngineCall::Command(command) => Some(*command),
                _ => None,
            })
            .collect()
    }

    /// Reject every command with this name (see `EngineCommand::name`)
    pub fn reject(&self, command: &'static str) {
        *lock(&self.reject) = Some(command);
    }

    fn record(&self, call: EngineCall) -> Result<(), EngineError> {
        let name = match &call {
            EngineCall::Load { .. } => "load",
            EngineCall::Unload => "unload",
            EngineCall::Command(command) => command.name(),
        };
        lock(&self.calls).push(call);

        if *lock(&self.reject) == Some(name) {
            return Err(EngineError::Rejected {
                command: name,
                reason: "rejected by mock".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl MediaEngine for MockMediaEngine {
    async fn load(&self, url: &str, should_play: bool) -> Result<(), EngineError> {
        self.record(EngineCall::Load {
            url: url.to_string(),
            should_play,
        })
    }

    async fn unload(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Unload)
    }

    async fn play(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Command(EngineCommand::Play))
    }

    async fn pause(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Command(EngineCommand::Pause))
    }

    async fn seek(&self, position_millis: u64) -> Result<(), EngineError> {
        self.record(EngineCall::Command(EngineCommand::Seek(position_millis)))
    }

    async fn set_rate(&self, rate: f32) -> Result<(), EngineError> {
        self.record(EngineCall::Command(EngineCommand::SetRate(rate)))
    }

    async fn set_muted(&self, muted: bool) -> Result<(), EngineError> {
        self.record(EngineCall::Command(EngineCommand::SetMuted(muted)))
    }
}

/// Channel standing in for the engine's status stream
pub fn engine_status_channel() -> (
    tokio_mpsc::UnboundedSender<EngineStatus>,
    UnboundedReceiverStream<EngineStatus>,
) {
    let (tx, rx) = tokio_mpsc::unbounded_channel();
    (tx, UnboundedReceiverStream::new(rx))
}

/// File picker that returns a fixed answer
pub struct MockFilePicker {
    selection: FileSelection,
}

impl MockFilePicker {
    pub fn selecting(file: LocalFile) -> Self {
        Self {
            selection: FileSelection::Selected(file),
        }
    }

    pub fn cancelled() -> Self {
        Self {
            selection: FileSelection::Cancelled,
        }
    }
}

#[async_trait::async_trait]
impl FilePicker for MockFilePicker {
    async fn pick_video(&self) -> FileSelection {
        self.selection.clone()
    }
}
