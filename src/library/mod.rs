use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use tokio::fs;

use crate::model::video::{CameraEntry, DateEntry, VideoItem};

pub mod date;
pub mod filename;

/// Sort order for a date directory's videos. Lexical file-name order
/// coincides with chronological order as long as the device zero-pads its
/// file names; the embedded unix timestamp is the robust alternative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Filename,
    Timestamp,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "filename" => Ok(SortKey::Filename),
            "timestamp" => Ok(SortKey::Timestamp),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

#[derive(Debug)]
pub enum ListError {
    NotFound,
    Io(std::io::Error),
}

impl From<std::io::Error> for ListError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            ListError::NotFound
        } else {
            ListError::Io(err)
        }
    }
}

impl std::fmt::Display for ListError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListError::NotFound => write!(f, "directory not found"),
            ListError::Io(err) => write!(f, "{err}"),
        }
    }
}

/// Read-only view over the `camera/date/video` directory hierarchy.
#[derive(Clone)]
pub struct VideoLibrary {
    root: PathBuf,
    camera_names: HashMap<String, String>,
    sort_key: SortKey,
}

impl VideoLibrary {
    pub fn new(root: PathBuf, camera_names: HashMap<String, String>, sort_key: SortKey) -> Self {
        Self {
            root,
            camera_names,
            sort_key,
        }
    }

    pub fn camera_name(&self, camera_id: &str) -> String {
        self.camera_names
            .get(camera_id)
            .cloned()
            .unwrap_or_else(|| camera_id.to_string())
    }

    pub async fn list_cameras(&self) -> Result<Vec<CameraEntry>, ListError> {
        let mut cameras = Vec::new();

        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                let id = entry.file_name().to_string_lossy().into_owned();
                let name = self.camera_name(&id);
                cameras.push(CameraEntry { id, name });
            }
        }

        cameras.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(cameras)
    }

    pub async fn list_dates(&self, camera_id: &str) -> Result<Vec<DateEntry>, ListError> {
        let mut dates = Vec::new();

        let mut entries = fs::read_dir(self.root.join(camera_id)).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                let date = entry.file_name().to_string_lossy().into_owned();
                let label = date::parse_date_string(&date).formatted();
                dates.push(DateEntry { date, label });
            }
        }

        dates.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(dates)
    }

    pub async fn list_videos(&self, camera_id: &str, date: &str) -> Result<Vec<VideoItem>, ListError> {
        let mut videos = Vec::new();

        let mut entries = fs::read_dir(self.root.join(camera_id).join(date)).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if let Some(item) = filename::parse_video_file(camera_id, date, &file_name) {
                videos.push(item);
            }
        }

        match self.sort_key {
            SortKey::Filename => videos.sort_by(|a, b| a.name.cmp(&b.name)),
            SortKey::Timestamp => videos.sort_by_key(|v| v.timestamp),
        }
        Ok(videos)
    }

    /// Resolves a video id back to its file path, `Ok(None)` when the date
    /// directory exists but holds no such recording.
    pub async fn find_video(
        &self,
        camera_id: &str,
        date: &str,
        video_id: &str,
    ) -> Result<Option<PathBuf>, ListError> {
        let dir = self.root.join(camera_id).join(date);
        let candidate = dir.join(format!("{video_id}{}", filename::VIDEO_EXT));

        if !fs::try_exists(&dir).await? {
            return Err(ListError::NotFound);
        }
        Ok(fs::try_exists(&candidate).await?.then_some(candidate))
    }
}
