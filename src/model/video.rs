use serde::Serialize;

/// Duration placeholder returned by the listing endpoint; replaced through
/// `durationUpdated` events once the background run has probed the file.
pub const DURATION_PLACEHOLDER: &str = "loading";

#[derive(Debug, Clone, Serialize)]
pub struct CameraEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DateEntry {
    pub date: String,
    pub label: String,
}

/// One recording inside a camera/date directory. Immutable once listed; the
/// directory layer is the only producer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    /// File name without the media extension, stable across listings.
    pub id: String,
    /// Raw file name.
    pub name: String,
    /// Unix timestamp embedded in the file name, 0 when absent.
    pub timestamp: i64,
    /// Display form of the start-time token, e.g. "05:30".
    pub start_time: String,
    pub duration: String,
    /// Predicted thumbnail URL; the image may not exist yet.
    pub thumbnail: String,
}
