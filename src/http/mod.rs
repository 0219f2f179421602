use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_http::{cors, trace};
use tracing::Level;

use crate::library::VideoLibrary;
use crate::pipeline::MediaPipeline;
use crate::rooms::RoomRegistry;
use crate::scheduler::BatchScheduler;
use crate::utils::file_storage::VideoStorage;

mod cameras_api;
pub mod status_error;
pub mod utils;
mod ws_api;

pub fn router(app_state: AppState) -> Router {
    let ws_router = Router::new()
        .route("/ws", get(ws_api::ws_handler))
        .with_state(app_state.clone());

    Router::new()
        .nest("/api", cameras_api::router(app_state.clone()))
        .merge(ws_router)
        .nest_service("/videos", ServeDir::new(app_state.storage.video_root()))
        .nest_service(
            "/thumbnails",
            ServeDir::new(app_state.storage.thumbnail_root()),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::new().allow_origin(cors::Any))
}

#[derive(Clone)]
pub struct AppState {
    pub library: VideoLibrary,
    pub storage: VideoStorage,
    pub pipeline: MediaPipeline,
    pub scheduler: BatchScheduler,
    pub rooms: Arc<RoomRegistry>,
}
