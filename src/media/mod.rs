use std::path::Path;

use async_trait::async_trait;

pub mod ffmpeg;

/// Result of an external-tool call. Timeouts are a first-class outcome so
/// callers can tell "the tool said no" apart from "the tool never answered".
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome<T> {
    Ok(T),
    TimedOut,
    Failed(String),
}

impl<T> ProbeOutcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, ProbeOutcome::Ok(_))
    }
}

/// Seam over the external media tool, so the pipeline and scheduler can be
/// exercised without ffmpeg on the path.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Container duration in seconds.
    async fn probe_duration(&self, source: &Path) -> ProbeOutcome<f64>;

    /// Extracts a single scaled frame from `source` into `dest`.
    async fn generate_thumbnail(&self, source: &Path, dest: &Path) -> ProbeOutcome<()>;
}

/// Formats seconds as zero-padded `MM:SS`. The minutes field keeps growing
/// past 59 for recordings of an hour or more.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
pub mod testing {
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{MediaProbe, ProbeOutcome};

    /// Scripted probe returning fixed outcomes, counting calls and optionally
    /// delaying so tests can overlap concurrent requests.
    pub struct ScriptedProbe {
        pub duration: ProbeOutcome<f64>,
        pub thumbnail: ProbeOutcome<()>,
        pub delay: Duration,
        pub duration_calls: AtomicUsize,
        pub thumbnail_calls: AtomicUsize,
    }

    impl ScriptedProbe {
        pub fn ok(seconds: f64) -> Self {
            Self {
                duration: ProbeOutcome::Ok(seconds),
                thumbnail: ProbeOutcome::Ok(()),
                delay: Duration::ZERO,
                duration_calls: AtomicUsize::new(0),
                thumbnail_calls: AtomicUsize::new(0),
            }
        }

        pub fn failing(reason: &str) -> Self {
            Self {
                duration: ProbeOutcome::Failed(reason.to_string()),
                thumbnail: ProbeOutcome::Failed(reason.to_string()),
                ..Self::ok(0.0)
            }
        }

        pub fn duration_call_count(&self) -> usize {
            self.duration_calls.load(Ordering::SeqCst)
        }

        pub fn thumbnail_call_count(&self) -> usize {
            self.thumbnail_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MediaProbe for ScriptedProbe {
        async fn probe_duration(&self, _source: &Path) -> ProbeOutcome<f64> {
            self.duration_calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.duration.clone()
        }

        async fn generate_thumbnail(&self, _source: &Path, dest: &Path) -> ProbeOutcome<()> {
            self.thumbnail_calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.thumbnail.is_ok() {
                let dest: PathBuf = dest.to_path_buf();
                std::fs::write(dest, b"jpeg").expect("test thumbnail write");
            }
            self.thumbnail.clone()
        }
    }
}
