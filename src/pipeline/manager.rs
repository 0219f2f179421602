use std::path::Path;
use std::sync::Arc;

use tokio::fs;
use tracing::{debug, warn};

use crate::media::{format_duration, MediaProbe, ProbeOutcome};
use crate::pipeline::{MediaKey, MediaStore, FALLBACK_THUMBNAIL_URL};
use crate::utils::file_storage::VideoStorage;

/// Answer to a get-or-generate thumbnail request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailOutcome {
    /// URL the client can fetch now (possibly the fallback image).
    Ready(String),
    /// Another request is already generating this key; retry later.
    Pending,
}

/// Get-or-generate service over the media probe: caches results, collapses
/// concurrent duplicate requests and substitutes a placeholder image for
/// anything that cannot be generated.
#[derive(Clone)]
pub struct MediaPipeline {
    store: Arc<MediaStore>,
    probe: Arc<dyn MediaProbe>,
    storage: VideoStorage,
}

impl MediaPipeline {
    pub fn new(store: Arc<MediaStore>, probe: Arc<dyn MediaProbe>, storage: VideoStorage) -> Self {
        Self {
            store,
            probe,
            storage,
        }
    }

    pub fn store(&self) -> &MediaStore {
        &self.store
    }

    /// Duration lookup through the process-wide cache. Only successful probes
    /// are cached, so a timed-out file gets another chance on the next request.
    pub async fn fetch_duration(&self, key: &MediaKey, source: &Path) -> ProbeOutcome<String> {
        if let Some(duration) = self.store.cached_duration(key).await {
            return ProbeOutcome::Ok(duration);
        }

        match self.probe.probe_duration(source).await {
            ProbeOutcome::Ok(seconds) => {
                let formatted = format_duration(seconds);
                self.store.record_duration(key, &formatted).await;
                ProbeOutcome::Ok(formatted)
            }
            ProbeOutcome::TimedOut => {
                warn!("Duration probe timed out: {}", source.display());
                ProbeOutcome::TimedOut
            }
            ProbeOutcome::Failed(reason) => {
                warn!("Duration probe failed for {}: {reason}", source.display());
                ProbeOutcome::Failed(reason)
            }
        }
    }

    pub async fn ensure_thumbnail(
        &self,
        key: &MediaKey,
        source: &Path,
        dest: &Path,
    ) -> ThumbnailOutcome {
        // Known-failed keys go straight to the fallback image, no retry.
        if self.store.is_failed(key).await {
            return ThumbnailOutcome::Ready(self.fall_back(key, dest).await);
        }

        if let Some(url) = self.store.cached_thumbnail(key).await {
            return ThumbnailOutcome::Ready(url);
        }

        if !self.store.try_begin(key).await {
            debug!("Thumbnail {key} is already being generated, skipping duplicate request");
            return ThumbnailOutcome::Pending;
        }

        // The file may have been generated out of band.
        if fs::try_exists(dest).await.unwrap_or(false) {
            let url = self.resolve_url(dest);
            self.store.record_thumbnail(key, &url).await;
            self.store.finish(key).await;
            return ThumbnailOutcome::Ready(url);
        }

        if let Some(parent) = dest.parent() {
            if let Err(err) = fs::create_dir_all(parent).await {
                warn!("Could not create thumbnail directory {}: {err}", parent.display());
                return self.fail(key, dest).await;
            }
        }

        if !fs::try_exists(source).await.unwrap_or(false) {
            warn!("Video file does not exist: {}", source.display());
            return self.fail(key, dest).await;
        }

        match self.probe.generate_thumbnail(source, dest).await {
            ProbeOutcome::Ok(()) => {
                let url = self.resolve_url(dest);
                self.store.record_thumbnail(key, &url).await;
                self.store.finish(key).await;
                ThumbnailOutcome::Ready(url)
            }
            ProbeOutcome::TimedOut => {
                warn!("Thumbnail generation timed out: {}", source.display());
                self.fail(key, dest).await
            }
            ProbeOutcome::Failed(reason) => {
                warn!("Failed to generate thumbnail for {}: {reason}", source.display());
                self.fail(key, dest).await
            }
        }
    }

    async fn fail(&self, key: &MediaKey, dest: &Path) -> ThumbnailOutcome {
        self.store.mark_failed(key).await;
        self.store.finish(key).await;
        ThumbnailOutcome::Ready(self.fall_back(key, dest).await)
    }

    /// Copies the static error image next to the thumbnail slot so the
    /// regular static mount serves it. The copy keeps the asset's own
    /// extension: declaring SVG bytes as `.jpg` would give clients an
    /// undecodable image. When even the copy fails, clients get the
    /// hardcoded fallback URL instead of a file.
    async fn fall_back(&self, key: &MediaKey, dest: &Path) -> String {
        let error_image = self.storage.error_image();
        let slot = match error_image.extension() {
            Some(ext) => dest.with_extension(ext),
            None => dest.to_path_buf(),
        };

        match fs::copy(error_image, &slot).await {
            Ok(_) => {
                let url = self.resolve_url(&slot);
                self.store.record_thumbnail(key, &url).await;
                url
            }
            Err(err) => {
                warn!("Failed to copy error image: {err}");
                FALLBACK_THUMBNAIL_URL.to_string()
            }
        }
    }

    fn resolve_url(&self, dest: &Path) -> String {
        self.storage
            .thumbnail_url(dest)
            .unwrap_or_else(|| FALLBACK_THUMBNAIL_URL.to_string())
    }
}
