//! Snapshot of what the host video player reports about the current playback.

use crate::hdr::{normalize_primaries, normalize_transfer};
use crate::utils::{file_url_from_path, FfmpegWrapper};
use std::path::Path;
use tracing::{debug, warn};

/// Values the host player runtime supplies for a capture.
///
/// Color names use the player's vocabulary (`pq`, `hlg`, `bt.2020`, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerState {
    /// Current source URL; only `file://` URLs can be captured.
    pub url: Option<String>,
    pub is_network_resource: bool,
    /// Playback position in seconds.
    pub position: Option<f64>,
    /// Transfer characteristic of the current video stream.
    pub gamma: Option<String>,
    pub primaries: Option<String>,
    /// File name without extension, used as the screenshot stem.
    pub filename_stem: Option<String>,
    /// Screenshot directory configured in the player, if any.
    pub screenshot_dir: Option<String>,
}

impl PlayerState {
    /// Builds a snapshot for a local file, taking the stem from its file name.
    pub fn for_local_file<P: AsRef<Path>>(path: P, position: f64) -> Self {
        let path = path.as_ref();
        Self {
            url: Some(file_url_from_path(path)),
            is_network_resource: false,
            position: Some(position),
            filename_stem: path
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string()),
            ..Default::default()
        }
    }

    pub fn with_color(mut self, gamma: Option<String>, primaries: Option<String>) -> Self {
        self.gamma = gamma;
        self.primaries = primaries;
        self
    }

    pub fn with_screenshot_dir(mut self, dir: Option<String>) -> Self {
        self.screenshot_dir = dir;
        self
    }

    /// Fills in missing color parameters from ffprobe, normalized to the
    /// player's vocabulary. Probe failures leave the fields empty (treated as SDR).
    pub async fn fill_color_from_probe<P: AsRef<Path>>(mut self, ffmpeg: &FfmpegWrapper, path: P) -> Self {
        if self.gamma.is_some() && self.primaries.is_some() {
            return self;
        }

        match ffmpeg.stream_color_params(path).await {
            Ok(params) => {
                debug!("Probed stream color parameters: {:?}", params);
                if self.gamma.is_none() {
                    self.gamma = params.color_transfer.as_deref().map(normalize_transfer);
                }
                if self.primaries.is_none() {
                    self.primaries = params.color_primaries.as_deref().map(normalize_primaries);
                }
            }
            Err(e) => warn!("Could not read stream color parameters: {}", e),
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::process::testing::ScriptedRunner;
    use std::sync::Arc;

    #[test]
    fn test_for_local_file() {
        let state = PlayerState::for_local_file("/videos/My Movie.mkv", 12.5);

        assert_eq!(state.url.as_deref(), Some("file:///videos/My%20Movie.mkv"));
        assert_eq!(state.filename_stem.as_deref(), Some("My Movie"));
        assert_eq!(state.position, Some(12.5));
        assert!(!state.is_network_resource);
    }

    #[tokio::test]
    async fn test_fill_color_from_probe_normalizes_names() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_stdout(r#"{"streams":[{"color_transfer":"smpte2084","color_primaries":"bt2020"}]}"#);
        let ffmpeg = FfmpegWrapper::new("ffmpeg".to_string(), "ffprobe".to_string(), runner.clone());

        let state = PlayerState::for_local_file("/videos/hdr.mkv", 1.0)
            .fill_color_from_probe(&ffmpeg, "/videos/hdr.mkv")
            .await;

        assert_eq!(state.gamma.as_deref(), Some("pq"));
        assert_eq!(state.primaries.as_deref(), Some("bt.2020"));
        assert_eq!(runner.calls()[0][0], "ffprobe");
    }

    #[tokio::test]
    async fn test_explicit_color_skips_probe() {
        let runner = Arc::new(ScriptedRunner::new());
        let ffmpeg = FfmpegWrapper::new("ffmpeg".to_string(), "ffprobe".to_string(), runner.clone());

        let state = PlayerState::for_local_file("/videos/hdr.mkv", 1.0)
            .with_color(Some("hlg".to_string()), Some("bt.2020".to_string()))
            .fill_color_from_probe(&ffmpeg, "/videos/hdr.mkv")
            .await;

        assert_eq!(state.gamma.as_deref(), Some("hlg"));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_probe_failure_leaves_color_empty() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push(1, &["/videos/missing.mkv: No such file or directory"]);
        let ffmpeg = FfmpegWrapper::new("ffmpeg".to_string(), "ffprobe".to_string(), runner);

        let state = PlayerState::for_local_file("/videos/missing.mkv", 1.0)
            .fill_color_from_probe(&ffmpeg, "/videos/missing.mkv")
            .await;

        assert_eq!(state.gamma, None);
        assert_eq!(state.primaries, None);
    }
}
