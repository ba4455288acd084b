use super::types::{
    UploadError, UploadOutcome, UploadPhase, UploadProgress, UploadSession, PROGRESS_ACQUIRING,
    PROGRESS_COMMITTING, PROGRESS_DONE, PROGRESS_TRANSFERRING,
};
use crate::catalog::CatalogStore;
use crate::file_picker::LocalFile;
use crate::models::VideoMetadata;
use crate::progress::ProgressHandle;
use crate::remote::RemoteService;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc as tokio_mpsc;
use tracing::{error, info, warn};

/// Drives the acquire → transfer → commit sequence for one upload at a time.
///
/// Each phase is attempted once. The first failure ends the attempt, the
/// session is marked failed with its progress back at 0, and nothing that
/// already happened server-side is rolled back.
#[derive(Clone)]
pub struct UploadCoordinator {
    remote: Arc<dyn RemoteService>,
    session: Arc<Mutex<Option<UploadSession>>>,
    progress_tx: tokio_mpsc::UnboundedSender<UploadProgress>,
    progress_handle: ProgressHandle<UploadProgress>,
}

impl UploadCoordinator {
    pub fn new(remote: Arc<dyn RemoteService>, runtime_handle: tokio::runtime::Handle) -> Self {
        let (progress_tx, progress_rx) = tokio_mpsc::unbounded_channel();
        let progress_handle = ProgressHandle::new(progress_rx, runtime_handle);

        Self {
            remote,
            session: Arc::new(Mutex::new(None)),
            progress_tx,
            progress_handle,
        }
    }

    /// Subscribe to progress of every upload run by this coordinator
    pub fn subscribe_progress(&self) -> tokio_mpsc::UnboundedReceiver<UploadProgress> {
        self.progress_handle.subscribe_all()
    }

    /// Subscribe to progress of a single session
    pub fn subscribe_session(
        &self,
        session_id: String,
    ) -> tokio_mpsc::UnboundedReceiver<UploadProgress> {
        self.progress_handle
            .subscribe_matching(move |progress| progress.session_id() == session_id)
    }

    /// Snapshot of the current session, `None` while idle
    pub fn session(&self) -> Option<UploadSession> {
        self.lock_session().clone()
    }

    pub fn phase(&self) -> UploadPhase {
        self.lock_session()
            .as_ref()
            .map_or(UploadPhase::Idle, |session| session.phase)
    }

    pub fn progress(&self) -> u8 {
        self.lock_session()
            .as_ref()
            .map_or(0, |session| session.progress)
    }

    /// Whether an attempt is between its first and last remote call
    pub fn is_busy(&self) -> bool {
        self.phase().is_in_flight()
    }

    /// Return to idle after a finished or failed attempt, e.g. when the
    /// user dismisses the result.
    ///
    /// Returns false, leaving the session alone, if an attempt is in flight.
    pub fn dismiss(&self) -> bool {
        let mut session = self.lock_session();
        match session.as_ref() {
            Some(current) if current.phase.is_in_flight() => {
                warn!("Refusing to dismiss upload {} while in flight", current.id);
                false
            }
            _ => {
                *session = None;
                true
            }
        }
    }

    /// Validate the input and run the three-phase upload.
    ///
    /// A missing file or blank title is rejected before any remote call.
    pub async fn submit(
        &self,
        file: Option<LocalFile>,
        title: &str,
    ) -> Result<UploadOutcome, UploadError> {
        let (file, title) = validate(file, title)?;

        if self.is_busy() {
            warn!("Starting an upload while another is still in flight");
        }

        let session = UploadSession::new(file, title);
        let session_id = session.id.clone();
        info!(
            "Upload {} started: {:?} from {}",
            session_id,
            session.title,
            session.file.path.display()
        );
        self.emit(UploadProgress::Started {
            session_id: session_id.clone(),
            title: session.title.clone(),
        });
        let file = session.file.clone();
        let title = session.title.clone();
        *self.lock_session() = Some(session);

        match self.run_phases(&session_id, &file, &title).await {
            Ok(storage_key) => {
                self.update_session(&session_id, |s| s.advance(UploadPhase::Done, PROGRESS_DONE));
                self.emit(UploadProgress::PhaseChanged {
                    session_id: session_id.clone(),
                    phase: UploadPhase::Done,
                    percent: PROGRESS_DONE,
                });
                self.emit(UploadProgress::Complete {
                    session_id: session_id.clone(),
                    storage_key: storage_key.clone(),
                });
                info!("Upload {} complete ({})", session_id, storage_key);

                Ok(UploadOutcome {
                    session_id,
                    storage_key,
                    title,
                })
            }
            Err((failed_phase, e)) => {
                error!("Upload {} failed during {:?}: {}", session_id, failed_phase, e);
                self.update_session(&session_id, |s| s.fail(&e));
                self.emit(UploadProgress::Failed {
                    session_id,
                    phase: failed_phase,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Submit, then on success refresh the catalog and go back to idle.
    ///
    /// A failed refresh is logged but does not turn a finished upload into
    /// an error; the catalog keeps its previous listing.
    pub async fn submit_and_refresh(
        &self,
        catalog: &CatalogStore,
        file: Option<LocalFile>,
        title: &str,
    ) -> Result<UploadOutcome, UploadError> {
        let outcome = self.submit(file, title).await?;

        if let Err(e) = catalog.refresh().await {
            warn!("Catalog refresh after upload failed: {}", e);
        }
        self.dismiss();

        Ok(outcome)
    }

    async fn run_phases(
        &self,
        session_id: &str,
        file: &LocalFile,
        title: &str,
    ) -> Result<String, (UploadPhase, UploadError)> {
        let phase = UploadPhase::AcquiringTarget;
        self.enter_phase(session_id, phase, PROGRESS_ACQUIRING);
        let target = self
            .remote
            .acquire_upload_target()
            .await
            .map_err(|e| (phase, UploadError::from_remote("acquire upload target", e)))?;

        let phase = UploadPhase::Transferring;
        self.enter_phase(session_id, phase, PROGRESS_TRANSFERRING);
        let status = self
            .remote
            .transfer(&target.target_url, file)
            .await
            .map_err(|e| {
                warn!("Upload target {} left unused", target.storage_key);
                (phase, UploadError::from_remote("transfer", e))
            })?;
        if status != 200 {
            warn!(
                "Transfer returned {}; upload target {} left unused",
                status, target.storage_key
            );
            return Err((phase, UploadError::Transfer { status }));
        }

        let phase = UploadPhase::Committing;
        self.enter_phase(session_id, phase, PROGRESS_COMMITTING);
        let metadata = VideoMetadata {
            title: title.to_string(),
            filename: target.storage_key.clone(),
        };
        self.remote
            .commit_metadata(&metadata)
            .await
            .map_err(|e| (phase, UploadError::from_remote("commit metadata", e)))?;

        Ok(target.storage_key)
    }

    /// Checkpoint set before the phase's remote call is issued
    fn enter_phase(&self, session_id: &str, phase: UploadPhase, percent: u8) {
        self.update_session(session_id, |s| s.advance(phase, percent));
        self.emit(UploadProgress::PhaseChanged {
            session_id: session_id.to_string(),
            phase,
            percent,
        });
    }

    fn update_session<F>(&self, session_id: &str, update: F)
    where
        F: FnOnce(&mut UploadSession),
    {
        let mut session = self.lock_session();
        match session.as_mut() {
            Some(current) if current.id == session_id => update(current),
            _ => warn!("Upload session {} was replaced mid-flight", session_id),
        }
    }

    fn emit(&self, progress: UploadProgress) {
        let _ = self.progress_tx.send(progress);
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<UploadSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn validate(file: Option<LocalFile>, title: &str) -> Result<(LocalFile, String), UploadError> {
    let file = file.ok_or_else(|| UploadError::Validation("No video selected".to_string()))?;

    let title = title.trim();
    if title.is_empty() {
        return Err(UploadError::Validation("Title is required".to_string()));
    }

    if !file.exists() {
        return Err(UploadError::Validation(format!(
            "Selected file is not readable: {}",
            file.path.display()
        )));
    }

    Ok((file, title.to_string()))
}
