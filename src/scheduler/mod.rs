use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::media::ProbeOutcome;
use crate::model::video::VideoItem;
use crate::pipeline::{MediaKey, MediaPipeline, ThumbnailOutcome};
use crate::rooms::{RoomKey, RoomRegistry, ServerEvent};
use crate::utils::file_storage::VideoStorage;
use crate::utils::now_millis;

/// Duration value published when a probe reports an error for one item.
const PROCESSING_ERROR: &str = "processing error";
/// Duration value published when the probe timed out or came back empty.
const UNKNOWN_DURATION: &str = "unknown";

/// Walks a date directory's videos in fixed-size windows, publishing
/// per-item progress to the room as results come in.
///
/// The first video is always processed before anything else so the viewer
/// sees movement immediately; between windows the scheduler yields for a
/// short interval so request handling is never starved. A room that has
/// already finished short-circuits both fresh runs and stragglers.
#[derive(Clone)]
pub struct BatchScheduler {
    pipeline: MediaPipeline,
    rooms: Arc<RoomRegistry>,
    storage: VideoStorage,
    batch_size: usize,
    batch_interval: Duration,
}

impl BatchScheduler {
    pub fn new(
        pipeline: MediaPipeline,
        rooms: Arc<RoomRegistry>,
        storage: VideoStorage,
        batch_size: usize,
        batch_interval: Duration,
    ) -> Self {
        Self {
            pipeline,
            rooms,
            storage,
            batch_size: batch_size.max(1),
            batch_interval,
        }
    }

    /// Fire-and-forget entry point used by the HTTP handlers.
    pub fn spawn_run(&self, camera_id: &str, date: &str, videos: Vec<VideoItem>) {
        let scheduler = self.clone();
        let camera_id = camera_id.to_string();
        let date = date.to_string();
        tokio::spawn(async move { scheduler.run(&camera_id, &date, videos).await });
    }

    pub async fn run(&self, camera_id: &str, date: &str, videos: Vec<VideoItem>) {
        let room = RoomKey::new(camera_id, date);
        if !self.rooms.begin_run(&room).await {
            debug!("Room {room} is already processed, skipping run");
            return;
        }

        let total = videos.len();

        if let Some(first) = videos.first() {
            self.process_item(&room, first, 0, total, true).await;
        }

        let mut window_start = 0;
        loop {
            let window_end = usize::min(window_start + self.batch_size, total);

            for index in usize::max(window_start, 1)..window_end {
                if self.rooms.is_completed(&room).await {
                    debug!("Room {room} finished elsewhere, stopping current batch");
                    return;
                }
                self.process_item(&room, &videos[index], index, total, false)
                    .await;
            }

            if window_end >= total {
                break;
            }
            window_start = window_end;

            sleep(self.batch_interval).await;
            if self.rooms.is_completed(&room).await {
                debug!("Room {room} finished elsewhere, skipping remaining batches");
                return;
            }
        }

        if self.rooms.is_completed(&room).await {
            return;
        }
        self.rooms
            .publish(
                &room,
                &ServerEvent::ProcessingComplete {
                    total_videos: total,
                    timestamp: now_millis(),
                },
            )
            .await;
        self.rooms.complete_run(&room).await;
        info!("Room {room} processing completed ({total} videos)");
    }

    async fn process_item(
        &self,
        room: &RoomKey,
        video: &VideoItem,
        index: usize,
        total: usize,
        is_first: bool,
    ) {
        let key = MediaKey::new(&room.camera_id, &room.date, &video.id);
        let source = self
            .storage
            .video_path(&room.camera_id, &room.date, &video.name);

        let (duration, error) = match self.pipeline.fetch_duration(&key, &source).await {
            ProbeOutcome::Ok(duration) => (duration, false),
            ProbeOutcome::TimedOut => (UNKNOWN_DURATION.to_string(), false),
            ProbeOutcome::Failed(reason) => {
                warn!("Failed to process video {}: {reason}", video.name);
                (PROCESSING_ERROR.to_string(), true)
            }
        };

        if self.rooms.is_completed(room).await {
            return;
        }
        self.rooms
            .publish(
                room,
                &ServerEvent::DurationUpdated {
                    video_id: video.id.clone(),
                    duration,
                    timestamp: now_millis(),
                    index: Some(index),
                    total: Some(total),
                    is_first_video: is_first.then_some(true),
                    is_special_request: None,
                    error: error.then_some(true),
                },
            )
            .await;

        let dest = self
            .storage
            .thumbnail_path(&room.camera_id, &room.date, &video.id);
        if let ThumbnailOutcome::Ready(thumbnail) =
            self.pipeline.ensure_thumbnail(&key, &source, &dest).await
        {
            if !self.rooms.is_completed(room).await {
                self.rooms
                    .publish(
                        room,
                        &ServerEvent::ThumbnailGenerated {
                            video_id: video.id.clone(),
                            thumbnail,
                        },
                    )
                    .await;
            }
        }
    }
}
