use crate::file_picker::LocalFile;
use crate::remote::RemoteError;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub const PROGRESS_ACQUIRING: u8 = 20;
pub const PROGRESS_TRANSFERRING: u8 = 40;
pub const PROGRESS_COMMITTING: u8 = 80;
pub const PROGRESS_DONE: u8 = 100;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("{operation} failed: {status}")]
    Network {
        operation: &'static str,
        status: String,
    },
    #[error("Transfer failed with status {status}")]
    Transfer { status: u16 },
    #[error("{operation} failed: {source}")]
    Remote {
        operation: &'static str,
        #[source]
        source: RemoteError,
    },
}

impl UploadError {
    /// Classify a remote failure: a non-success status is a network error
    /// carrying its status text, anything else keeps the underlying cause.
    pub fn from_remote(operation: &'static str, error: RemoteError) -> Self {
        match error {
            RemoteError::Status { code, text, .. } => UploadError::Network {
                operation,
                status: format!("{} {}", code, text),
            },
            source => UploadError::Remote { operation, source },
        }
    }
}

/// Where an upload attempt currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    AcquiringTarget,
    Transferring,
    Committing,
    Done,
    Failed,
}

impl UploadPhase {
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            UploadPhase::AcquiringTarget | UploadPhase::Transferring | UploadPhase::Committing
        )
    }
}

/// One upload attempt. No session at all means the coordinator is idle.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadSession {
    pub id: String,
    pub file: LocalFile,
    /// Title with surrounding whitespace removed
    pub title: String,
    pub phase: UploadPhase,
    /// 0..=100, only moves forward until a failure resets it to 0
    pub progress: u8,
    pub last_error: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl UploadSession {
    pub fn new(file: LocalFile, title: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file,
            title,
            phase: UploadPhase::AcquiringTarget,
            progress: 0,
            last_error: None,
            started_at: Utc::now(),
        }
    }

    pub(crate) fn advance(&mut self, phase: UploadPhase, progress: u8) {
        debug_assert!(progress >= self.progress, "upload progress went backwards");
        self.phase = phase;
        self.progress = progress.max(self.progress);
    }

    pub(crate) fn fail(&mut self, error: &UploadError) {
        self.phase = UploadPhase::Failed;
        self.progress = 0;
        self.last_error = Some(error.to_string());
    }
}

/// Progress updates during an upload
#[derive(Debug, Clone, PartialEq)]
pub enum UploadProgress {
    Started {
        session_id: String,
        title: String,
    },
    PhaseChanged {
        session_id: String,
        phase: UploadPhase,
        percent: u8,
    },
    Complete {
        session_id: String,
        storage_key: String,
    },
    Failed {
        session_id: String,
        phase: UploadPhase,
        error: String,
    },
}

impl UploadProgress {
    pub fn session_id(&self) -> &str {
        match self {
            UploadProgress::Started { session_id, .. }
            | UploadProgress::PhaseChanged { session_id, .. }
            | UploadProgress::Complete { session_id, .. }
            | UploadProgress::Failed { session_id, .. } => session_id,
        }
    }

    /// Progress value this event reports, if it reports one
    pub fn percent(&self) -> Option<u8> {
        match self {
            UploadProgress::Started { .. } | UploadProgress::Failed { .. } => Some(0),
            UploadProgress::PhaseChanged { percent, .. } => Some(*percent),
            UploadProgress::Complete { .. } => None,
        }
    }
}

/// Successful upload. The caller should refresh the catalog listing and
/// then dismiss the session to get the coordinator back to idle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub session_id: String,
    pub storage_key: String,
    pub title: String,
}
