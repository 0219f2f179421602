use crate::model::video::{VideoItem, DURATION_PLACEHOLDER};
use crate::utils::file_storage::public_thumbnail_url;

/// Media extension the recording device writes.
pub const VIDEO_EXT: &str = ".mp4";

/// Turns the compact start-time token into its display form:
/// `"05M30S"` becomes `"05:30"`.
pub fn display_start_time(token: &str) -> String {
    token
        .replacen(|c| c == 'M' || c == 'm', ":", 1)
        .trim_end_matches(|c| c == 'S' || c == 's')
        .to_string()
}

/// Parses a `{startTimeToken}_{unixTimestamp}.mp4` file name into a
/// `VideoItem`. Returns `None` for files with a different extension.
pub fn parse_video_file(camera_id: &str, date: &str, file_name: &str) -> Option<VideoItem> {
    let id = file_name.strip_suffix(VIDEO_EXT)?;

    let mut tokens = id.splitn(2, '_');
    let start_token = tokens.next().unwrap_or("");
    let timestamp = tokens
        .next()
        .and_then(|t| t.parse::<i64>().ok())
        .unwrap_or(0);

    Some(VideoItem {
        id: id.to_string(),
        name: file_name.to_string(),
        timestamp,
        start_time: display_start_time(start_token),
        duration: DURATION_PLACEHOLDER.to_string(),
        thumbnail: public_thumbnail_url(camera_id, date, id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_device_file_names() {
        let item = parse_video_file("abc123", "2024051114", "00M00S_1715774400.mp4").unwrap();
        assert_eq!(item.id, "00M00S_1715774400");
        assert_eq!(item.name, "00M00S_1715774400.mp4");
        assert_eq!(item.timestamp, 1715774400);
        assert_eq!(item.start_time, "00:00");
        assert_eq!(item.duration, "loading");
        assert_eq!(
            item.thumbnail,
            "/thumbnails/abc123/2024051114/abc123_2024051114_00M00S_1715774400.jpg"
        );

        let item = parse_video_file("abc123", "2024051114", "05M30S_1715774730.mp4").unwrap();
        assert_eq!(item.start_time, "05:30");
    }

    #[test]
    fn tolerates_missing_timestamp() {
        let item = parse_video_file("cam", "2024051114", "55M55S.mp4").unwrap();
        assert_eq!(item.timestamp, 0);
        assert_eq!(item.start_time, "55:55");
    }

    #[test]
    fn skips_non_video_files() {
        assert!(parse_video_file("cam", "2024051114", "notes.txt").is_none());
        assert!(parse_video_file("cam", "2024051114", "00M00S_1715774400.jpg").is_none());
    }

    #[test]
    fn start_time_token_forms() {
        assert_eq!(display_start_time("55M55S"), "55:55");
        assert_eq!(display_start_time("05m30s"), "05:30");
        assert_eq!(display_start_time(""), "");
    }
}
