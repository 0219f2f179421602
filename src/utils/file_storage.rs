use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_THUMBNAIL_DIR: &str = ".thumbnails";
const DEFAULT_ERROR_IMAGE: &str = "assets/error_thumbnail.svg";

/// Thumbnail file name shared by the pipeline, the directory listing and the
/// static mount: `{camera}_{date}_{video}.jpg`.
pub fn thumbnail_file_name(camera_id: &str, date: &str, video_id: &str) -> String {
    format!("{camera_id}_{date}_{video_id}.jpg")
}

/// URL a client uses to fetch a per-video thumbnail, valid before the file
/// itself exists on disk.
pub fn public_thumbnail_url(camera_id: &str, date: &str, video_id: &str) -> String {
    format!(
        "/thumbnails/{camera_id}/{date}/{}",
        thumbnail_file_name(camera_id, date, video_id)
    )
}

#[derive(Clone)]
pub struct VideoStorage {
    video_root: PathBuf,
    thumbnail_root: PathBuf,
    error_image: PathBuf,
}

impl VideoStorage {
    pub fn new(
        video_path: String,
        thumbnail_path: Option<String>,
        error_image_path: Option<String>,
    ) -> VideoStorage {
        let video_root = PathBuf::from(video_path);

        let thumbnail_root = thumbnail_path.map(PathBuf::from).unwrap_or_else(|| {
            let mut path = video_root.clone();
            path.push(DEFAULT_THUMBNAIL_DIR);
            path
        });

        if !video_root.exists() {
            fs::create_dir_all(video_root.as_path()).expect("Could not create the video root path");
        } else {
            assert!(video_root.is_dir());
        }

        if !thumbnail_root.exists() {
            fs::create_dir_all(&thumbnail_root).unwrap_or_else(|_| {
                panic!(
                    "Failed to create thumbnail folder at {}",
                    thumbnail_root.display()
                )
            });
        } else {
            assert!(thumbnail_root.is_dir());
        }

        VideoStorage {
            video_root,
            thumbnail_root,
            error_image: error_image_path
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ERROR_IMAGE)),
        }
    }

    pub fn video_root(&self) -> &Path {
        &self.video_root
    }

    pub fn thumbnail_root(&self) -> &Path {
        &self.thumbnail_root
    }

    /// Static image substituted for thumbnails that could not be generated.
    pub fn error_image(&self) -> &Path {
        &self.error_image
    }

    pub fn date_dir(&self, camera_id: &str, date: &str) -> PathBuf {
        self.video_root.join(camera_id).join(date)
    }

    pub fn video_path(&self, camera_id: &str, date: &str, file_name: &str) -> PathBuf {
        self.date_dir(camera_id, date).join(file_name)
    }

    pub fn thumbnail_path(&self, camera_id: &str, date: &str, video_id: &str) -> PathBuf {
        self.thumbnail_root
            .join(camera_id)
            .join(date)
            .join(thumbnail_file_name(camera_id, date, video_id))
    }

    /// One representative thumbnail per camera/hour, kept directly under the
    /// camera directory since it does not belong to a single video.
    pub fn hour_thumbnail_path(&self, camera_id: &str, date: &str) -> PathBuf {
        self.thumbnail_root
            .join(camera_id)
            .join(format!("{camera_id}_{date}_thumb.jpg"))
    }

    /// Maps a generated thumbnail path back to the URL it is served under.
    pub fn thumbnail_url(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.thumbnail_root).ok()?;
        let mut url = String::from("/thumbnails");
        for component in relative.components() {
            url.push('/');
            url.push_str(&component.as_os_str().to_string_lossy());
        }
        Some(url)
    }
}
