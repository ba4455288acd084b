// # Remote Service
//
// Boundary to the video service API. The core only talks to the
// `RemoteService` trait; `HttpRemoteService` is the production client and
// `test_support::MockRemoteService` the in-memory double.

mod client;

use crate::file_picker::LocalFile;
use crate::models::{DecodeError, UploadTarget, VideoMetadata, VideoRecord};
use thiserror::Error;

pub use client::HttpRemoteService;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{operation} failed: {code} {text}")]
    Status {
        operation: &'static str,
        code: u16,
        text: String,
    },
    #[error("Invalid response: {0}")]
    Decode(#[from] DecodeError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RemoteError {
    pub fn status(operation: &'static str, code: u16, text: impl Into<String>) -> Self {
        RemoteError::Status {
            operation,
            code,
            text: text.into(),
        }
    }
}

/// Trait for the remote video service (allows mocking for tests)
///
/// Implementations hold no per-call state and can be shared across
/// concurrent callers.
#[async_trait::async_trait]
pub trait RemoteService: Send + Sync {
    /// Request a one-time upload destination and a storage key
    async fn acquire_upload_target(&self) -> Result<UploadTarget, RemoteError>;

    /// PUT the file's bytes to `target_url` and report the HTTP status.
    /// A non-200 status is returned, not raised; the caller decides.
    async fn transfer(&self, target_url: &str, file: &LocalFile) -> Result<u16, RemoteError>;

    /// Create the catalog entry for an uploaded file
    async fn commit_metadata(&self, metadata: &VideoMetadata) -> Result<(), RemoteError>;

    async fn list_ready(&self) -> Result<Vec<VideoRecord>, RemoteError>;

    async fn fetch_video(&self, id: &str) -> Result<VideoRecord, RemoteError>;

    async fn resolve_playback_url(&self, id: &str) -> Result<String, RemoteError>;

    async fn delete_video(&self, id: &str) -> Result<(), RemoteError>;
}
