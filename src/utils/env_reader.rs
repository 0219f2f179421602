use std::collections::HashMap;

use crate::library::SortKey;

fn required_env_var(var_name: &str) -> String {
    std::env::var(var_name).unwrap_or_else(|_| panic!("{var_name} must be set!"))
}

fn optional_env_var<V>(var_name: &str, default_value: V) -> V
where
    V: std::str::FromStr + Copy,
{
    std::env::var(var_name).map_or(default_value, |v| v.parse::<V>().unwrap_or(default_value))
}

/// Parses `CAMERA_NAMES` of the form `id1:Garage,id2:Balcony`.
fn parse_camera_names(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|pair| {
            let (id, name) = pair.split_once(':')?;
            let (id, name) = (id.trim(), name.trim());
            if id.is_empty() || name.is_empty() {
                None
            } else {
                Some((id.to_string(), name.to_string()))
            }
        })
        .collect()
}

pub struct EnvVariables {
    pub server_port: u16,
    pub video_path: String,
    pub thumbnail_path: Option<String>,
    pub error_image_path: Option<String>,
    pub camera_names: HashMap<String, String>,
    pub video_sort: SortKey,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub batch_size: usize,
    pub batch_interval_ms: u64,
    pub duration_timeout_ms: u64,
    pub thumbnail_timeout_ms: u64,
}

impl EnvVariables {
    pub fn init() {
        dotenvy::dotenv().ok();
        if std::env::var("RUST_LOG").is_err() {
            println!("Logging is disabled, set RUST_LOG to enable logging")
        }
        std::env::set_var("RUST_BACKTRACE", "1");
    }

    pub fn get_all() -> Self {
        Self {
            server_port: required_env_var("SERVER_PORT")
                .parse()
                .expect("SERVER_PORT must be a valid port number!"),
            video_path: required_env_var("VIDEO_PATH"),
            thumbnail_path: std::env::var("THUMBNAIL_PATH").ok(),
            error_image_path: std::env::var("ERROR_IMAGE_PATH").ok(),
            camera_names: std::env::var("CAMERA_NAMES")
                .map(|raw| parse_camera_names(&raw))
                .unwrap_or_default(),
            video_sort: std::env::var("VIDEO_SORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            ffmpeg_path: std::env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            ffprobe_path: std::env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            batch_size: optional_env_var("BATCH_SIZE", 5),
            batch_interval_ms: optional_env_var("BATCH_INTERVAL_MS", 500),
            duration_timeout_ms: optional_env_var("DURATION_TIMEOUT_MS", 15_000),
            thumbnail_timeout_ms: optional_env_var("THUMBNAIL_TIMEOUT_MS", 10_000),
        }
    }
}
