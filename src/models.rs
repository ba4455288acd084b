use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Missing or empty field '{field}' in {context}")]
    MissingField {
        context: &'static str,
        field: &'static str,
    },
}

/// Server-side processing status of a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum VideoStatus {
    Processing,
    Ready,
    Failed,
    Other(String),
}

impl VideoStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "processing" | "pending" | "uploading" => VideoStatus::Processing,
            "ready" | "done" | "complete" => VideoStatus::Ready,
            "failed" | "error" => VideoStatus::Failed,
            other => VideoStatus::Other(other.to_string()),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, VideoStatus::Ready)
    }
}

/// A read-only snapshot of a catalog entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<String>,
    pub views: u64,
    pub likes: u64,
    pub uploaded_at: Option<String>,
    pub channel_name: Option<String>,
    pub channel_avatar: Option<String>,
    /// Server-assigned storage key of the media file
    pub filename: String,
    pub status: VideoStatus,
}

/// Video record as it arrives on the wire, before validation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVideoRecord {
    #[serde(alias = "_id")]
    id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    #[serde(alias = "thumbnailUrl", alias = "thumbnail_url")]
    thumbnail: Option<String>,
    duration: Option<String>,
    #[serde(default)]
    views: Option<u64>,
    #[serde(default)]
    likes: Option<u64>,
    #[serde(alias = "uploaded_at")]
    uploaded_at: Option<String>,
    #[serde(alias = "channel_name")]
    channel_name: Option<String>,
    #[serde(alias = "channel_avatar")]
    channel_avatar: Option<String>,
    filename: Option<String>,
    status: Option<String>,
}

fn required(
    value: Option<String>,
    context: &'static str,
    field: &'static str,
) -> Result<String, DecodeError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(DecodeError::MissingField { context, field })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TryFrom<RawVideoRecord> for VideoRecord {
    type Error = DecodeError;

    fn try_from(raw: RawVideoRecord) -> Result<Self, Self::Error> {
        Ok(VideoRecord {
            id: required(raw.id, "video", "id")?,
            title: required(raw.title, "video", "title")?,
            filename: required(raw.filename, "video", "filename")?,
            description: non_empty(raw.description),
            thumbnail: non_empty(raw.thumbnail),
            duration: non_empty(raw.duration),
            views: raw.views.unwrap_or(0),
            likes: raw.likes.unwrap_or(0),
            uploaded_at: non_empty(raw.uploaded_at),
            channel_name: non_empty(raw.channel_name),
            channel_avatar: non_empty(raw.channel_avatar),
            status: raw
                .status
                .as_deref()
                .map(VideoStatus::parse)
                .unwrap_or(VideoStatus::Processing),
        })
    }
}

impl VideoRecord {
    /// Decode and validate a single video record
    pub fn from_json(bytes: &[u8]) -> Result<Self, DecodeError> {
        let raw: RawVideoRecord = serde_json::from_slice(bytes)?;
        raw.try_into()
    }
}

#[derive(Debug, Deserialize)]
struct RawCatalogListing {
    videos: Vec<serde_json::Value>,
}

/// Decode a `{videos: [...]}` listing.
///
/// The envelope must be well-formed; individual entries that fail
/// validation are logged and skipped so one bad row does not blank the
/// whole catalog.
pub fn decode_listing(bytes: &[u8]) -> Result<Vec<VideoRecord>, DecodeError> {
    let listing: RawCatalogListing = serde_json::from_slice(bytes)?;

    let mut videos = Vec::with_capacity(listing.videos.len());
    for value in listing.videos {
        let decoded = serde_json::from_value::<RawVideoRecord>(value)
            .map_err(DecodeError::from)
            .and_then(VideoRecord::try_from);
        match decoded {
            Ok(video) => videos.push(video),
            Err(e) => warn!("Skipping malformed catalog entry: {}", e),
        }
    }

    Ok(videos)
}

/// One-time upload destination handed out by the remote service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    /// Server-chosen storage key, committed with the metadata later
    pub storage_key: String,
    pub target_url: String,
}

/// Each accepted spelling is its own field so a response carrying several
/// of them still decodes; the first non-empty one wins.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUploadTarget {
    filename: Option<String>,
    #[serde(alias = "storage_key")]
    storage_key: Option<String>,
    key: Option<String>,
    url: Option<String>,
    #[serde(alias = "upload_url")]
    upload_url: Option<String>,
}

impl UploadTarget {
    pub fn from_json(bytes: &[u8]) -> Result<Self, DecodeError> {
        let raw: RawUploadTarget = serde_json::from_slice(bytes)?;
        let storage_key = non_empty(raw.filename)
            .or_else(|| non_empty(raw.storage_key))
            .or_else(|| non_empty(raw.key));
        let target_url = non_empty(raw.url).or_else(|| non_empty(raw.upload_url));

        Ok(UploadTarget {
            storage_key: required(storage_key, "upload target", "filename")?,
            target_url: required(target_url, "upload target", "url")?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawPlaybackUrl {
    url: Option<String>,
    #[serde(rename = "playbackUrl", alias = "playback_url")]
    playback_url: Option<String>,
}

/// Decode a playback URL response.
///
/// The service has been seen answering with either `url` or `playbackUrl`;
/// both are accepted and `url` wins when both are present.
pub fn decode_playback_url(bytes: &[u8]) -> Result<String, DecodeError> {
    let raw: RawPlaybackUrl = serde_json::from_slice(bytes)?;
    non_empty(raw.url)
        .or_else(|| non_empty(raw.playback_url))
        .ok_or(DecodeError::MissingField {
            context: "playback url",
            field: "url",
        })
}

/// Metadata sent to the catalog once the bytes are in place
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoMetadata {
    pub title: String,
    /// Storage key returned by the acquire-target call
    pub filename: String,
}
