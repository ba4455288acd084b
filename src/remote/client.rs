use super::{RemoteError, RemoteService};
use crate::config::Config;
use crate::file_picker::LocalFile;
use crate::models::{
    decode_listing, decode_playback_url, UploadTarget, VideoMetadata, VideoRecord,
};
use reqwest::{
    header::{CONTENT_LENGTH, CONTENT_TYPE},
    Body, Client, Response,
};
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

const USER_AGENT: &str = "vidshare/0.1";

/// HTTP client for the video service JSON API
#[derive(Clone)]
pub struct HttpRemoteService {
    client: Client,
    base_url: String,
}

impl HttpRemoteService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn video_url(&self, id: &str, suffix: &str) -> String {
        self.url(&format!(
            "/api/videos/{}{}",
            urlencoding::encode(id),
            suffix
        ))
    }

    /// Turn a non-success response into a `RemoteError::Status`
    fn check(response: Response, operation: &'static str) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| status.to_string());
        warn!("✗ {} returned {}", operation, status);
        Err(RemoteError::status(operation, status.as_u16(), text))
    }
}

#[async_trait::async_trait]
impl RemoteService for HttpRemoteService {
    async fn acquire_upload_target(&self) -> Result<UploadTarget, RemoteError> {
        let url = self.url("/api/upload-url");
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let response = Self::check(response, "acquire upload target")?;
        let body = response.bytes().await?;

        let target = UploadTarget::from_json(&body)?;
        info!("Acquired upload target for key {}", target.storage_key);
        Ok(target)
    }

    async fn transfer(&self, target_url: &str, file: &LocalFile) -> Result<u16, RemoteError> {
        let handle = tokio::fs::File::open(&file.path).await?;
        let size = handle.metadata().await?.len();
        info!(
            "Transferring {} ({} bytes, {})",
            file.name,
            size,
            file.mime_type()
        );

        let response = self
            .client
            .put(target_url)
            .header(CONTENT_TYPE, file.mime_type())
            .header(CONTENT_LENGTH, size)
            .body(Body::wrap_stream(ReaderStream::new(handle)))
            .send()
            .await?;

        let status = response.status().as_u16();
        debug!("Transfer finished with status {}", status);
        Ok(status)
    }

    async fn commit_metadata(&self, metadata: &VideoMetadata) -> Result<(), RemoteError> {
        let url = self.url("/api/videos");
        debug!("POST {} title={:?}", url, metadata.title);

        let response = self.client.post(&url).json(metadata).send().await?;
        Self::check(response, "commit metadata")?;

        info!("Committed metadata for {}", metadata.filename);
        Ok(())
    }

    async fn list_ready(&self) -> Result<Vec<VideoRecord>, RemoteError> {
        let url = self.url("/api/videos");

        let response = self
            .client
            .get(&url)
            .query(&[("status", "ready")])
            .send()
            .await?;
        let response = Self::check(response, "list videos")?;
        let body = response.bytes().await?;

        let videos = decode_listing(&body)?;
        info!("Catalog listing returned {} video(s)", videos.len());
        Ok(videos)
    }

    async fn fetch_video(&self, id: &str) -> Result<VideoRecord, RemoteError> {
        let response = self.client.get(self.video_url(id, "")).send().await?;
        let response = Self::check(response, "fetch video")?;
        let body = response.bytes().await?;

        Ok(VideoRecord::from_json(&body)?)
    }

    async fn resolve_playback_url(&self, id: &str) -> Result<String, RemoteError> {
        let response = self.client.get(self.video_url(id, "/play")).send().await?;
        let response = Self::check(response, "resolve playback url")?;
        let body = response.bytes().await?;

        Ok(decode_playback_url(&body)?)
    }

    async fn delete_video(&self, id: &str) -> Result<(), RemoteError> {
        let response = self.client.delete(self.video_url(id, "")).send().await?;
        Self::check(response, "delete video")?;

        info!("Deleted video {}", id);
        Ok(())
    }
}
