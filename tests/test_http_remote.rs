mod support;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        HeaderMap, HeaderName, StatusCode,
    },
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use crate::support::{fake_video, tracing_init};
use vidshare::models::{VideoMetadata, VideoStatus};
use vidshare::remote::{HttpRemoteService, RemoteError, RemoteService};

/// One PUT as received by the storage endpoint
#[derive(Clone)]
struct Upload {
    key: String,
    content_type: Option<String>,
    content_length: Option<u64>,
    bytes: Vec<u8>,
}

/// What the stub server saw
#[derive(Default)]
struct Recorded {
    uploaded: Option<Upload>,
    committed: Vec<Value>,
    list_query: HashMap<String, String>,
}

#[derive(Clone)]
struct StubState {
    base_url: String,
    recorded: Arc<Mutex<Recorded>>,
}

async fn upload_url(State(state): State<StubState>) -> impl IntoResponse {
    Json(json!({
        "filename": "k1.mp4",
        "uploadUrl": format!("{}/storage/k1.mp4", state.base_url),
    }))
}

async fn storage_put(
    State(state): State<StubState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let header = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    state.recorded.lock().unwrap().uploaded = Some(Upload {
        key,
        content_type: header(CONTENT_TYPE),
        content_length: header(CONTENT_LENGTH).and_then(|v| v.parse().ok()),
        bytes: body.to_vec(),
    });
    StatusCode::OK
}

async fn create_video(
    State(state): State<StubState>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.recorded.lock().unwrap().committed.push(body);
    (StatusCode::CREATED, Json(json!({ "ok": true })))
}

async fn list_videos(
    State(state): State<StubState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.recorded.lock().unwrap().list_query = params;
    Json(json!({
        "videos": [
            {
                "id": "v1",
                "title": "First",
                "filename": "k1.mp4",
                "duration": "2:30",
                "views": 12,
                "channelName": "Demo Channel",
                "status": "ready"
            },
            { "title": "No id, skipped", "filename": "bad.mp4" }
        ]
    }))
}

async fn get_video(Path(id): Path<String>) -> impl IntoResponse {
    if id != "v1" {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(json!({
        "id": "v1",
        "title": "First",
        "filename": "k1.mp4",
        "status": "ready"
    }))
    .into_response()
}

async fn play_video(Path(id): Path<String>) -> impl IntoResponse {
    Json(json!({ "playbackUrl": format!("https://cdn.example.com/{}.m3u8", id) }))
}

async fn delete_video(Path(id): Path<String>) -> StatusCode {
    if id == "locked" {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::NO_CONTENT
    }
}

/// Serve the stub API on an ephemeral port
async fn start_stub() -> (HttpRemoteService, Arc<Mutex<Recorded>>) {
    tracing_init();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let recorded = Arc::new(Mutex::new(Recorded::default()));

    let state = StubState {
        base_url: base_url.clone(),
        recorded: recorded.clone(),
    };
    let app = Router::new()
        .route("/api/upload-url", get(upload_url))
        .route("/storage/:key", put(storage_put))
        .route("/api/videos", get(list_videos).post(create_video))
        .route("/api/videos/:id", get(get_video).delete(delete_video))
        .route("/api/videos/:id/play", get(play_video))
        .with_state(state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (HttpRemoteService::new(base_url), recorded)
}

#[tokio::test]
async fn test_upload_round_trip_over_http() {
    let (remote, recorded) = start_stub().await;
    let temp_dir = TempDir::new().unwrap();
    let file = fake_video(&temp_dir, "clip.mp4");

    let target = remote.acquire_upload_target().await.unwrap();
    assert_eq!(target.storage_key, "k1.mp4");
    assert!(target.target_url.ends_with("/storage/k1.mp4"));

    let status = remote.transfer(&target.target_url, &file).await.unwrap();
    assert_eq!(status, 200);

    remote
        .commit_metadata(&VideoMetadata {
            title: "Clip".to_string(),
            filename: target.storage_key.clone(),
        })
        .await
        .unwrap();

    let expected = std::fs::read(&file.path).unwrap();
    let recorded = recorded.lock().unwrap();
    let upload = recorded.uploaded.clone().unwrap();
    assert_eq!(upload.key, "k1.mp4");
    assert_eq!(upload.content_type.as_deref(), Some("video/mp4"));
    assert_eq!(upload.content_length, Some(expected.len() as u64));
    assert_eq!(upload.bytes, expected);
    assert_eq!(
        recorded.committed,
        vec![json!({ "title": "Clip", "filename": "k1.mp4" })]
    );
}

#[tokio::test]
async fn test_transfer_sends_large_file_byte_exact() {
    let (remote, recorded) = start_stub().await;
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("long.mov");
    let content: Vec<u8> = (0..1_500_000u32).map(|i| (i % 251) as u8).collect();
    std::fs::write(&path, &content).unwrap();
    let file = vidshare::file_picker::LocalFile::from_path(&path);

    let target = remote.acquire_upload_target().await.unwrap();
    let status = remote.transfer(&target.target_url, &file).await.unwrap();

    assert_eq!(status, 200);
    let upload = recorded.lock().unwrap().uploaded.clone().unwrap();
    assert_eq!(upload.content_type.as_deref(), Some("video/quicktime"));
    assert_eq!(upload.content_length, Some(content.len() as u64));
    assert!(upload.bytes == content);
}

#[tokio::test]
async fn test_transfer_of_missing_file_is_io_error() {
    let (remote, recorded) = start_stub().await;
    let file = vidshare::file_picker::LocalFile::from_path("/definitely/not/here.mp4");

    let target = remote.acquire_upload_target().await.unwrap();
    let result = remote.transfer(&target.target_url, &file).await;

    assert!(matches!(result, Err(RemoteError::Io(_))));
    assert!(recorded.lock().unwrap().uploaded.is_none());
}

#[tokio::test]
async fn test_listing_filters_ready_and_skips_malformed() {
    let (remote, recorded) = start_stub().await;

    let videos = remote.list_ready().await.unwrap();

    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].id, "v1");
    assert_eq!(videos[0].views, 12);
    assert_eq!(videos[0].channel_name.as_deref(), Some("Demo Channel"));
    assert_eq!(videos[0].status, VideoStatus::Ready);
    assert_eq!(
        recorded.lock().unwrap().list_query.get("status").map(String::as_str),
        Some("ready")
    );
}

#[tokio::test]
async fn test_fetch_and_resolve_playback_url() {
    let (remote, _recorded) = start_stub().await;

    let video = remote.fetch_video("v1").await.unwrap();
    assert_eq!(video.title, "First");

    let missing = remote.fetch_video("nope").await;
    assert!(matches!(
        missing,
        Err(RemoteError::Status { code: 404, .. })
    ));

    let url = remote.resolve_playback_url("v1").await.unwrap();
    assert_eq!(url, "https://cdn.example.com/v1.m3u8");
}

#[tokio::test]
async fn test_delete_reports_status_text() {
    let (remote, _recorded) = start_stub().await;

    remote.delete_video("v1").await.unwrap();

    match remote.delete_video("locked").await {
        Err(RemoteError::Status {
            operation,
            code,
            text,
        }) => {
            assert_eq!(operation, "delete video");
            assert_eq!(code, 500);
            assert_eq!(text, "Internal Server Error");
        }
        other => panic!("Expected status error, got {:?}", other),
    }
}
