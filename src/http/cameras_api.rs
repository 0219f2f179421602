use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::http::status_error::StatusError;
use crate::http::utils::{image_to_response, AxumResult};
use crate::http::AppState;
use crate::library::ListError;
use crate::media::ProbeOutcome;
use crate::pipeline::{MediaKey, ThumbnailOutcome};
use crate::utils::{internal_error, now_millis};

/// Cache key suffix for the one representative thumbnail of a camera/hour.
const HOUR_THUMB_ID: &str = "thumb";

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/cameras", get(list_cameras))
        .route("/cameras/:camera_id/dates", get(list_dates))
        .route("/cameras/:camera_id/dates/:date/videos", get(list_videos))
        .route("/process-videos/:camera_id/:date", get(process_videos))
        .route(
            "/video-duration/:camera_id/:date/:video_id",
            get(video_duration),
        )
        .route("/thumbnails/:camera_id/:date_str", get(hour_thumbnail))
        .with_state(app_state)
}

async fn list_cameras(State(state): State<AppState>) -> AxumResult<impl IntoResponse> {
    let cameras = state.library.list_cameras().await.map_err(internal_error)?;
    Ok(Json(cameras))
}

async fn list_dates(
    State(state): State<AppState>,
    Path(camera_id): Path<String>,
) -> AxumResult<impl IntoResponse> {
    let dates = state
        .library
        .list_dates(&camera_id)
        .await
        .map_err(|e| match e {
            ListError::NotFound => StatusError::not_found("Cannot find specified camera"),
            ListError::Io(e) => internal_error(e),
        })?;
    Ok(Json(dates))
}

/// Returns the listing right away with placeholder durations; the batch run
/// spawned in the background streams real values to the room.
async fn list_videos(
    State(state): State<AppState>,
    Path((camera_id, date)): Path<(String, String)>,
) -> AxumResult<impl IntoResponse> {
    let videos = state
        .library
        .list_videos(&camera_id, &date)
        .await
        .map_err(|e| match e {
            ListError::NotFound => StatusError::not_found("Cannot find specified date directory"),
            ListError::Io(e) => internal_error(e),
        })?;

    state.scheduler.spawn_run(&camera_id, &date, videos.clone());
    Ok(Json(videos))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessResponse {
    status: &'static str,
    total_videos: usize,
    message: String,
}

async fn process_videos(
    State(state): State<AppState>,
    Path((camera_id, date)): Path<(String, String)>,
) -> AxumResult<impl IntoResponse> {
    let videos = state
        .library
        .list_videos(&camera_id, &date)
        .await
        .map_err(|e| match e {
            ListError::NotFound => StatusError::not_found("Cannot find specified date directory"),
            ListError::Io(e) => internal_error(e),
        })?;

    let total_videos = videos.len();
    state.scheduler.spawn_run(&camera_id, &date, videos);

    Ok(Json(ProcessResponse {
        status: "processing",
        total_videos,
        message: format!(
            "Started processing {total_videos} videos, progress is published over the WebSocket"
        ),
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DurationResponse {
    video_id: String,
    duration: String,
    timestamp: u64,
}

/// Synchronous single-video probe, bypassing the batch window entirely.
async fn video_duration(
    State(state): State<AppState>,
    Path((camera_id, date, video_id)): Path<(String, String, String)>,
) -> AxumResult<impl IntoResponse> {
    let source = state
        .library
        .find_video(&camera_id, &date, &video_id)
        .await
        .map_err(|e| match e {
            ListError::NotFound => StatusError::not_found("Cannot find specified date directory"),
            ListError::Io(e) => internal_error(e),
        })?
        .ok_or_else(|| StatusError::not_found("Cannot find specified video"))?;

    let key = MediaKey::new(&camera_id, &date, &video_id);
    let duration = match state.pipeline.fetch_duration(&key, &source).await {
        ProbeOutcome::Ok(duration) => duration,
        _ => "unknown".to_string(),
    };

    Ok(Json(DurationResponse {
        video_id,
        duration,
        timestamp: now_millis(),
    }))
}

#[derive(Serialize)]
struct ProcessingStatus {
    status: &'static str,
    message: &'static str,
}

/// One representative image per camera/hour, generated from the first video
/// of the directory with the same pipeline semantics as per-video thumbnails.
async fn hour_thumbnail(
    State(state): State<AppState>,
    Path((camera_id, date_str)): Path<(String, String)>,
) -> AxumResult<axum::response::Response> {
    let key = MediaKey::new(&camera_id, &date_str, HOUR_THUMB_ID);

    if state.pipeline.store().is_failed(&key).await {
        return Ok(image_to_response(state.storage.error_image())
            .await?
            .into_response());
    }

    if state.pipeline.store().is_in_flight(&key).await {
        let body = Json(ProcessingStatus {
            status: "processing",
            message: "Thumbnail is being generated, try again later",
        });
        return Ok((StatusCode::ACCEPTED, body).into_response());
    }

    let videos = match state.library.list_videos(&camera_id, &date_str).await {
        Ok(videos) => videos,
        Err(ListError::NotFound) => {
            state.pipeline.store().mark_failed(&key).await;
            return Err(StatusError::not_found("Cannot find specified date directory"));
        }
        Err(ListError::Io(e)) => return Err(internal_error(e)),
    };

    let Some(first) = videos.first() else {
        state.pipeline.store().mark_failed(&key).await;
        return Err(StatusError::not_found("No video found at specified time"));
    };

    let source = state.storage.video_path(&camera_id, &date_str, &first.name);
    let dest = state.storage.hour_thumbnail_path(&camera_id, &date_str);

    match state.pipeline.ensure_thumbnail(&key, &source, &dest).await {
        ThumbnailOutcome::Pending => {
            let body = Json(ProcessingStatus {
                status: "processing",
                message: "Thumbnail is being generated, try again later",
            });
            Ok((StatusCode::ACCEPTED, body).into_response())
        }
        // Ready after a generation failure means the fallback took over; the
        // latch is set before the fallback URL is handed out.
        ThumbnailOutcome::Ready(_) => {
            if state.pipeline.store().is_failed(&key).await {
                Ok(image_to_response(state.storage.error_image())
                    .await?
                    .into_response())
            } else {
                Ok(image_to_response(&dest).await?.into_response())
            }
        }
    }
}
