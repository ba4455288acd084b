use crate::models::VideoRecord;
use crate::remote::{RemoteError, RemoteService};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

/// In-memory snapshot of the ready catalog.
///
/// Failed refreshes and deletes leave the snapshot exactly as it was, so a
/// screen never goes blank because of a flaky request.
#[derive(Clone)]
pub struct CatalogStore {
    remote: Arc<dyn RemoteService>,
    videos: Arc<RwLock<Vec<VideoRecord>>>,
}

impl CatalogStore {
    pub fn new(remote: Arc<dyn RemoteService>) -> Self {
        Self {
            remote,
            videos: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Current snapshot
    pub async fn videos(&self) -> Vec<VideoRecord> {
        self.videos.read().await.clone()
    }

    /// Replace the snapshot with a fresh listing of ready videos
    pub async fn refresh(&self) -> Result<usize, RemoteError> {
        match self.remote.list_ready().await {
            Ok(videos) => {
                let count = videos.len();
                *self.videos.write().await = videos;
                info!("Catalog refreshed: {} video(s)", count);
                Ok(count)
            }
            Err(e) => {
                error!("Catalog refresh failed, keeping previous listing: {}", e);
                Err(e)
            }
        }
    }

    /// Fetch one record straight from the service
    pub async fn get(&self, id: &str) -> Result<VideoRecord, RemoteError> {
        self.remote.fetch_video(id).await.map_err(|e| {
            error!("Failed to fetch video {}: {}", id, e);
            e
        })
    }

    pub async fn playback_url(&self, id: &str) -> Result<String, RemoteError> {
        self.remote.resolve_playback_url(id).await.map_err(|e| {
            error!("Failed to resolve playback url for {}: {}", id, e);
            e
        })
    }

    /// Delete remotely, then drop the record from the snapshot
    pub async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        if let Err(e) = self.remote.delete_video(id).await {
            error!("Failed to delete video {}: {}", id, e);
            return Err(e);
        }

        self.videos.write().await.retain(|video| video.id != id);
        info!("Removed video {} from catalog", id);
        Ok(())
    }
}
