use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

/// Cache key for everything the pipeline remembers about one recording.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaKey {
    pub camera_id: String,
    pub date: String,
    pub video_id: String,
}

impl MediaKey {
    pub fn new(camera_id: &str, date: &str, video_id: &str) -> Self {
        Self {
            camera_id: camera_id.to_string(),
            date: date.to_string(),
            video_id: video_id.to_string(),
        }
    }
}

impl std::fmt::Display for MediaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}_{}", self.camera_id, self.date, self.video_id)
    }
}

/// Process-wide result cache for the thumbnail/duration pipeline.
///
/// Entries live for the lifetime of the process: there is no eviction or TTL,
/// and a failed key stays failed until restart.
#[derive(Default)]
pub struct MediaStore {
    durations: RwLock<HashMap<MediaKey, String>>,
    thumbnails: RwLock<HashMap<MediaKey, String>>,
    failed: RwLock<HashSet<MediaKey>>,
    in_flight: RwLock<HashSet<MediaKey>>,
}

impl MediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn cached_duration(&self, key: &MediaKey) -> Option<String> {
        self.durations.read().await.get(key).cloned()
    }

    pub async fn record_duration(&self, key: &MediaKey, duration: &str) {
        self.durations
            .write()
            .await
            .insert(key.clone(), duration.to_string());
    }

    pub async fn cached_thumbnail(&self, key: &MediaKey) -> Option<String> {
        self.thumbnails.read().await.get(key).cloned()
    }

    pub async fn record_thumbnail(&self, key: &MediaKey, url: &str) {
        self.thumbnails
            .write()
            .await
            .insert(key.clone(), url.to_string());
    }

    pub async fn is_failed(&self, key: &MediaKey) -> bool {
        self.failed.read().await.contains(key)
    }

    /// Permanent latch: the key will use the fallback image from now on.
    pub async fn mark_failed(&self, key: &MediaKey) {
        self.failed.write().await.insert(key.clone());
    }

    /// Claims the in-flight marker. Returns false when another generation for
    /// the same key is already underway; the caller must then report
    /// "not ready" instead of starting a duplicate attempt.
    pub async fn try_begin(&self, key: &MediaKey) -> bool {
        self.in_flight.write().await.insert(key.clone())
    }

    pub async fn finish(&self, key: &MediaKey) {
        self.in_flight.write().await.remove(key);
    }

    pub async fn is_in_flight(&self, key: &MediaKey) -> bool {
        self.in_flight.read().await.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_flight_marker_is_exclusive() {
        let store = MediaStore::new();
        let key = MediaKey::new("cam", "2024051114", "vid");

        assert!(store.try_begin(&key).await);
        assert!(!store.try_begin(&key).await);
        assert!(store.is_in_flight(&key).await);

        store.finish(&key).await;
        assert!(!store.is_in_flight(&key).await);
        assert!(store.try_begin(&key).await);
    }

    #[tokio::test]
    async fn caches_are_keyed_per_video() {
        let store = MediaStore::new();
        let a = MediaKey::new("cam", "2024051114", "a");
        let b = MediaKey::new("cam", "2024051114", "b");

        store.record_duration(&a, "01:00").await;
        assert_eq!(store.cached_duration(&a).await.unwrap(), "01:00");
        assert!(store.cached_duration(&b).await.is_none());

        store.mark_failed(&b).await;
        assert!(store.is_failed(&b).await);
        assert!(!store.is_failed(&a).await);
    }

    #[test]
    fn keys_display_as_room_style_identifiers() {
        let key = MediaKey::new("abc123", "2024051114", "00M00S_1715774400");
        assert_eq!(key.to_string(), "abc123_2024051114_00M00S_1715774400");
    }
}
