use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task;
use tracing::{info, warn};
use wait_timeout::ChildExt;

use super::{MediaProbe, ProbeOutcome};

/// Fraction of the duration to seek to before grabbing the thumbnail frame,
/// far enough in to skip the black leading frames some cameras record.
const THUMBNAIL_SEEK_FRACTION: f64 = 0.05;
const THUMBNAIL_SIZE: &str = "320x180";

pub struct FfmpegProbe {
    ffmpeg_bin: String,
    ffprobe_bin: String,
    duration_timeout: Duration,
    thumbnail_timeout: Duration,
}

impl FfmpegProbe {
    pub fn new(
        ffmpeg_bin: String,
        ffprobe_bin: String,
        duration_timeout: Duration,
        thumbnail_timeout: Duration,
    ) -> Self {
        Self {
            ffmpeg_bin,
            ffprobe_bin,
            duration_timeout,
            thumbnail_timeout,
        }
    }

    /// Startup advisory: a missing tool degrades thumbnails and durations but
    /// never prevents the server from starting.
    pub fn check_installation(&self) {
        for bin in [&self.ffmpeg_bin, &self.ffprobe_bin] {
            match Command::new(bin)
                .arg("-version")
                .stdin(Stdio::null())
                .output()
            {
                Ok(output) if output.status.success() => {
                    let first_line = String::from_utf8_lossy(&output.stdout)
                        .lines()
                        .next()
                        .unwrap_or_default()
                        .to_string();
                    info!("Found {bin}: {first_line}");
                }
                Ok(output) => warn!("{bin} -version exited with {}", output.status),
                Err(err) => warn!(
                    "{bin} is not available ({err}), duration and thumbnail \
                     extraction will fall back to placeholders"
                ),
            }
        }
    }
}

#[async_trait]
impl MediaProbe for FfmpegProbe {
    async fn probe_duration(&self, source: &Path) -> ProbeOutcome<f64> {
        let bin = self.ffprobe_bin.clone();
        let source = source.to_path_buf();
        let timeout = self.duration_timeout;

        task::spawn_blocking(move || probe_duration_blocking(&bin, &source, timeout))
            .await
            .unwrap_or_else(|e| ProbeOutcome::Failed(e.to_string()))
    }

    async fn generate_thumbnail(&self, source: &Path, dest: &Path) -> ProbeOutcome<()> {
        let ffmpeg = self.ffmpeg_bin.clone();
        let ffprobe = self.ffprobe_bin.clone();
        let source = source.to_path_buf();
        let dest = dest.to_path_buf();
        let duration_timeout = self.duration_timeout;
        let timeout = self.thumbnail_timeout;

        task::spawn_blocking(move || {
            generate_thumbnail_blocking(&ffmpeg, &ffprobe, &source, &dest, duration_timeout, timeout)
        })
        .await
        .unwrap_or_else(|e| ProbeOutcome::Failed(e.to_string()))
    }
}

/// Waits for the child within `timeout`, killing and reaping it on expiry.
/// A timed-out tool may still have been writing output; callers discard it.
fn wait_or_kill(mut child: Child, timeout: Duration) -> ProbeOutcome<Child> {
    match child.wait_timeout(timeout) {
        Ok(Some(status)) if status.success() => ProbeOutcome::Ok(child),
        Ok(Some(status)) => ProbeOutcome::Failed(format!("tool exited with {status}")),
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            ProbeOutcome::TimedOut
        }
        Err(err) => ProbeOutcome::Failed(err.to_string()),
    }
}

fn probe_duration_blocking(bin: &str, source: &Path, timeout: Duration) -> ProbeOutcome<f64> {
    let child = match Command::new(bin)
        .arg("-v")
        .arg("error")
        .arg("-show_entries")
        .arg("format=duration")
        .arg("-of")
        .arg("default=noprint_wrappers=1:nokey=1")
        .arg(source)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(err) => return ProbeOutcome::Failed(format!("failed to spawn {bin}: {err}")),
    };

    let mut child = match wait_or_kill(child, timeout) {
        ProbeOutcome::Ok(child) => child,
        ProbeOutcome::TimedOut => return ProbeOutcome::TimedOut,
        ProbeOutcome::Failed(reason) => return ProbeOutcome::Failed(reason),
    };

    let mut raw = String::new();
    if let Some(mut stdout) = child.stdout.take() {
        if let Err(err) = stdout.read_to_string(&mut raw) {
            return ProbeOutcome::Failed(err.to_string());
        }
    }

    match raw.trim().parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => ProbeOutcome::Ok(seconds),
        _ => ProbeOutcome::Failed(format!("unparsable ffprobe duration: {raw:?}")),
    }
}

fn generate_thumbnail_blocking(
    ffmpeg: &str,
    ffprobe: &str,
    source: &Path,
    dest: &Path,
    duration_timeout: Duration,
    timeout: Duration,
) -> ProbeOutcome<()> {
    // An unknown duration falls back to the very first frame.
    let seek = match probe_duration_blocking(ffprobe, source, duration_timeout) {
        ProbeOutcome::Ok(seconds) => seconds * THUMBNAIL_SEEK_FRACTION,
        _ => 0.0,
    };

    let child = match Command::new(ffmpeg)
        .arg("-ss")
        .arg(format!("{seek:.3}"))
        .arg("-i")
        .arg(source)
        .arg("-frames:v")
        .arg("1")
        .arg("-s")
        .arg(THUMBNAIL_SIZE)
        .arg("-y")
        .arg(dest)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(err) => return ProbeOutcome::Failed(format!("failed to spawn {ffmpeg}: {err}")),
    };

    match wait_or_kill(child, timeout) {
        ProbeOutcome::Ok(_) => ProbeOutcome::Ok(()),
        ProbeOutcome::TimedOut => ProbeOutcome::TimedOut,
        ProbeOutcome::Failed(reason) => ProbeOutcome::Failed(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hung_tools_time_out_and_are_reaped() {
        let child = Command::new("sleep")
            .arg("30")
            .stdin(Stdio::null())
            .spawn()
            .unwrap();

        let started = std::time::Instant::now();
        let outcome = wait_or_kill(child, Duration::from_millis(200));
        assert!(matches!(outcome, ProbeOutcome::TimedOut));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn fast_tools_complete_within_the_deadline() {
        let child = Command::new("true").stdin(Stdio::null()).spawn().unwrap();
        assert!(wait_or_kill(child, Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn failing_tools_report_their_exit_status() {
        let child = Command::new("false").stdin(Stdio::null()).spawn().unwrap();
        assert!(matches!(
            wait_or_kill(child, Duration::from_secs(5)),
            ProbeOutcome::Failed(_)
        ));
    }

    #[test]
    fn missing_binaries_fail_to_spawn() {
        let outcome = probe_duration_blocking(
            "definitely-not-ffprobe",
            Path::new("/dev/null"),
            Duration::from_secs(1),
        );
        assert!(matches!(outcome, ProbeOutcome::Failed(_)));
    }
}
