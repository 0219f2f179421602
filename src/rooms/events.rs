use serde::{Deserialize, Serialize};

/// Messages a viewer sends over the WebSocket, e.g.
/// `{"event":"joinRoom","data":{"cameraId":"abc123","date":"2024051114"}}`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    JoinRoom { camera_id: String, date: String },
    #[serde(rename_all = "camelCase")]
    LeaveRoom { camera_id: String, date: String },
    /// Out-of-band duration request for one video, independent of any batch.
    #[serde(rename_all = "camelCase")]
    RequestVideoInfo {
        camera_id: String,
        date: String,
        video_id: String,
    },
}

/// Messages fanned out to every member of a room.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    DurationUpdated {
        video_id: String,
        duration: String,
        timestamp: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        total: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_first_video: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_special_request: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<bool>,
    },
    #[serde(rename_all = "camelCase")]
    ThumbnailGenerated { video_id: String, thumbnail: String },
    #[serde(rename_all = "camelCase")]
    ProcessingComplete { total_videos: usize, timestamp: u64 },
}
