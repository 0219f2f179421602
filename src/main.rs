use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::http::AppState;
use crate::library::VideoLibrary;
use crate::media::ffmpeg::FfmpegProbe;
use crate::pipeline::{MediaPipeline, MediaStore};
use crate::rooms::RoomRegistry;
use crate::scheduler::BatchScheduler;
use crate::utils::env_reader::EnvVariables;
use crate::utils::file_storage::VideoStorage;

mod http;
mod library;
mod media;
mod model;
mod pipeline;
mod rooms;
mod scheduler;
mod utils;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[tokio::main]
async fn main() {
    EnvVariables::init();
    let vars = EnvVariables::get_all();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().compact())
        .with(EnvFilter::from_default_env())
        .init();

    let probe = FfmpegProbe::new(
        vars.ffmpeg_path,
        vars.ffprobe_path,
        Duration::from_millis(vars.duration_timeout_ms),
        Duration::from_millis(vars.thumbnail_timeout_ms),
    );
    probe.check_installation();

    let storage = VideoStorage::new(vars.video_path, vars.thumbnail_path, vars.error_image_path);
    info!("Video directory path: {}", storage.video_root().display());
    if !storage.error_image().exists() {
        warn!(
            "Error image asset is missing at {}, failed thumbnails will use \
             the hardcoded fallback URL",
            storage.error_image().display()
        );
    }

    let library = VideoLibrary::new(
        storage.video_root().to_path_buf(),
        vars.camera_names,
        vars.video_sort,
    );
    let pipeline = MediaPipeline::new(
        Arc::new(MediaStore::new()),
        Arc::new(probe),
        storage.clone(),
    );
    let rooms = Arc::new(RoomRegistry::new());
    let scheduler = BatchScheduler::new(
        pipeline.clone(),
        rooms.clone(),
        storage.clone(),
        vars.batch_size,
        Duration::from_millis(vars.batch_interval_ms),
    );

    let app_state = AppState {
        library,
        storage,
        pipeline,
        scheduler,
        rooms,
    };

    info!("Server listening on port {}", vars.server_port);

    let addr = SocketAddr::from(([0, 0, 0, 0], vars.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Could not bind the server port");
    axum::serve(listener, http::router(app_state))
        .await
        .expect("Failed to start axum server");
}
