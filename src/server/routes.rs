use super::{error::ApiError, relay::relay, state::AppState};
use crate::{
    media::{build_metadata, ExtractorState, MediaMetadata},
    utils::{is_youtube_url, sanitize_filename},
};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::Response,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

#[derive(Debug, Deserialize)]
pub struct VideoInfoRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadQuery {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub format_id: String,
}

fn validate_url(url: &str) -> Result<&str, ApiError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ApiError::Validation(
            "Please enter a YouTube URL".to_string(),
        ));
    }
    if !is_youtube_url(url) {
        return Err(ApiError::Validation(
            "Please enter a valid YouTube URL. Example: https://www.youtube.com/watch?v=..."
                .to_string(),
        ));
    }
    Ok(url)
}

/// `POST /api/video-info`
pub async fn video_info(
    State(state): State<AppState>,
    payload: Result<Json<VideoInfoRequest>, JsonRejection>,
) -> Result<Json<MediaMetadata>, ApiError> {
    let extractor = state.extractor()?;
    let Json(request) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    let url = validate_url(&request.url)?;

    info!("📥 Fetching info for: {}", url);
    let info = extractor.probe(url).await.map_err(|e| {
        error!("❌ Error: {:#}", e);
        ApiError::InfoFetch(format!("{:#}", e))
    })?;
    info!("✅ Video: {}", info.title);

    let metadata = build_metadata(&info);
    info!("📊 Available formats: {}", metadata.formats.len());

    Ok(Json(metadata))
}

/// `GET /api/download?url=..&formatId=..`
pub async fn download(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let extractor = state.extractor()?;
    let url = validate_url(&query.url)?;
    let format_id = query.format_id.trim();
    if format_id.is_empty() {
        return Err(ApiError::Validation("Missing formatId".to_string()));
    }

    info!("⬇️ Downloading format: {}", format_id);

    // Fresh probe for the title; nothing from the info request is kept around.
    let info = extractor.probe(url).await.map_err(|e| {
        error!("❌ Download error: {:#}", e);
        ApiError::Download(format!("{:#}", e))
    })?;

    let filename = format!("{}.mp4", sanitize_filename(&info.title));
    info!("📁 Filename: {}", filename);

    let content_length = info
        .find_format(format_id)
        .and_then(|format| format.exact_size());

    let media = extractor.stream(url, format_id).await.map_err(|e| {
        error!("❌ Download error: {:#}", e);
        ApiError::Download(format!("{:#}", e))
    })?;

    relay(media, &filename, content_length)
        .await
        .inspect_err(|e| error!("❌ {}", e))
}

/// `GET /api/health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let extractor = match state.extractor_state() {
        ExtractorState::Ready { extractor, version } => json!({
            "state": "ready",
            "name": extractor.name(),
            "version": version,
        }),
        ExtractorState::Failed { reason } => json!({
            "state": "failed",
            "reason": reason,
        }),
        other => json!({ "state": other.label() }),
    };

    Json(json!({ "status": "ok", "extractor": extractor }))
}
