use std::collections::HashMap;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::http::AppState;
use crate::media::ProbeOutcome;
use crate::pipeline::MediaKey;
use crate::rooms::{ClientEvent, RoomKey, ServerEvent, SubscriberId};
use crate::utils::now_millis;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Manages one connection after upgrade: a sender task forwards room events
/// to the sink while the current task dispatches inbound client events.
async fn handle_socket(socket: WebSocket, state: AppState) {
    info!("New WebSocket connection");

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(text) = serde_json::to_string(&event) else {
                continue;
            };
            if sink.send(Message::Text(text)).await.is_err() {
                debug!("WebSocket sink closed");
                break;
            }
        }
    });

    // Rooms this connection has joined; all memberships are dropped together
    // on disconnect.
    let mut joined: HashMap<RoomKey, SubscriberId> = HashMap::new();

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => dispatch(&state, &tx, &mut joined, event).await,
                Err(e) => debug!("Ignoring malformed client message: {e}"),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("WebSocket receive error: {e}");
                break;
            }
        }
    }

    for (room, id) in joined {
        state.rooms.unsubscribe(&room, id).await;
    }
    send_task.abort();
    info!("WebSocket client disconnected");
}

async fn dispatch(
    state: &AppState,
    tx: &mpsc::UnboundedSender<ServerEvent>,
    joined: &mut HashMap<RoomKey, SubscriberId>,
    event: ClientEvent,
) {
    match event {
        ClientEvent::JoinRoom { camera_id, date } => {
            let room = RoomKey::new(&camera_id, &date);
            if !joined.contains_key(&room) {
                let id = state.rooms.subscribe(&room, tx.clone()).await;
                info!("Client joined room {room}");
                joined.insert(room, id);
            }
        }
        ClientEvent::LeaveRoom { camera_id, date } => {
            let room = RoomKey::new(&camera_id, &date);
            if let Some(id) = joined.remove(&room) {
                state.rooms.unsubscribe(&room, id).await;
                info!("Client left room {room}");
            }
        }
        ClientEvent::RequestVideoInfo {
            camera_id,
            date,
            video_id,
        } => request_video_info(state, &camera_id, &date, &video_id).await,
    }
}

/// Out-of-band duration lookup for one video, published to the whole room
/// independent of any batch progress.
async fn request_video_info(state: &AppState, camera_id: &str, date: &str, video_id: &str) {
    let source = match state.library.find_video(camera_id, date, video_id).await {
        Ok(Some(path)) => path,
        Ok(None) => {
            warn!("Cannot find requested video: {video_id}");
            return;
        }
        Err(e) => {
            warn!("Failed to process video info request: {e}");
            return;
        }
    };

    let key = MediaKey::new(camera_id, date, video_id);
    let duration = match state.pipeline.fetch_duration(&key, &source).await {
        ProbeOutcome::Ok(duration) => duration,
        _ => "unknown".to_string(),
    };

    let room = RoomKey::new(camera_id, date);
    state
        .rooms
        .publish(
            &room,
            &ServerEvent::DurationUpdated {
                video_id: video_id.to_string(),
                duration,
                timestamp: now_millis(),
                index: None,
                total: None,
                is_first_video: None,
                is_special_request: Some(true),
                error: None,
            },
        )
        .await;
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap as StdHashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::library::{SortKey, VideoLibrary};
    use crate::media::testing::ScriptedProbe;
    use crate::media::MediaProbe;
    use crate::pipeline::{MediaPipeline, MediaStore};
    use crate::rooms::RoomRegistry;
    use crate::scheduler::BatchScheduler;
    use crate::utils::file_storage::VideoStorage;

    fn fixture() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let storage = VideoStorage::new(
            dir.path().join("videos").to_string_lossy().into_owned(),
            Some(dir.path().join("thumbs").to_string_lossy().into_owned()),
            None,
        );
        let date_dir = storage.date_dir("cam", "2024051114");
        std::fs::create_dir_all(&date_dir).unwrap();
        std::fs::write(date_dir.join("00M00S_1715774400.mp4"), b"mp4").unwrap();

        let rooms = Arc::new(RoomRegistry::new());
        let pipeline = MediaPipeline::new(
            Arc::new(MediaStore::new()),
            Arc::new(ScriptedProbe::ok(330.0)) as Arc<dyn MediaProbe>,
            storage.clone(),
        );
        let scheduler = BatchScheduler::new(
            pipeline.clone(),
            rooms.clone(),
            storage.clone(),
            5,
            Duration::from_millis(10),
        );
        let library = VideoLibrary::new(
            storage.video_root().to_path_buf(),
            StdHashMap::new(),
            SortKey::Filename,
        );

        let state = AppState {
            library,
            storage,
            pipeline,
            scheduler,
            rooms,
        };
        (dir, state)
    }

    #[tokio::test]
    async fn join_leave_and_video_info_flow() {
        let (_dir, state) = fixture();
        let room = RoomKey::new("cam", "2024051114");

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut joined = HashMap::new();

        dispatch(
            &state,
            &tx,
            &mut joined,
            ClientEvent::JoinRoom {
                camera_id: "cam".to_string(),
                date: "2024051114".to_string(),
            },
        )
        .await;
        assert_eq!(state.rooms.member_count(&room).await, 1);

        // Duplicate joins are ignored.
        dispatch(
            &state,
            &tx,
            &mut joined,
            ClientEvent::JoinRoom {
                camera_id: "cam".to_string(),
                date: "2024051114".to_string(),
            },
        )
        .await;
        assert_eq!(state.rooms.member_count(&room).await, 1);

        dispatch(
            &state,
            &tx,
            &mut joined,
            ClientEvent::RequestVideoInfo {
                camera_id: "cam".to_string(),
                date: "2024051114".to_string(),
                video_id: "00M00S_1715774400".to_string(),
            },
        )
        .await;

        match rx.recv().await.unwrap() {
            ServerEvent::DurationUpdated {
                video_id,
                duration,
                index,
                is_special_request,
                ..
            } => {
                assert_eq!(video_id, "00M00S_1715774400");
                assert_eq!(duration, "05:30");
                assert_eq!(index, None);
                assert_eq!(is_special_request, Some(true));
            }
            other => panic!("unexpected event: {other:?}"),
        }

        dispatch(
            &state,
            &tx,
            &mut joined,
            ClientEvent::LeaveRoom {
                camera_id: "cam".to_string(),
                date: "2024051114".to_string(),
            },
        )
        .await;
        assert_eq!(state.rooms.member_count(&room).await, 0);
        assert!(joined.is_empty());
    }

    #[tokio::test]
    async fn unknown_videos_publish_nothing() {
        let (_dir, state) = fixture();
        let room = RoomKey::new("cam", "2024051114");

        let (tx, mut rx) = mpsc::unbounded_channel();
        state.rooms.subscribe(&room, tx).await;

        request_video_info(&state, "cam", "2024051114", "missing").await;
        assert!(rx.try_recv().is_err());
    }
}
