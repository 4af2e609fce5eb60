use crate::capture::filters::FilterGraph;
use crate::utils::{FfmpegWrapper, Result};
use std::path::Path;
use tracing::debug;

/// Result of one frame extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOutcome {
    /// Exit code, `None` if ffmpeg was killed by a signal.
    pub status: Option<i32>,
    /// ffmpeg's diagnostic lines, verbatim and in order.
    pub log: Vec<String>,
}

impl CaptureOutcome {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Header line with the status code followed by the non-blank log lines.
    pub fn error_report(&self) -> String {
        let status = self
            .status
            .map(|code| code.to_string())
            .unwrap_or_else(|| "signal".to_string());

        let mut lines = vec![format!("[FFmpeg Error | Status Code: {}]", status)];
        lines.extend(
            self.log
                .iter()
                .map(|line| line.trim_end())
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
        lines.join("\n")
    }
}

pub struct CaptureExecutor {
    ffmpeg: FfmpegWrapper,
}

impl CaptureExecutor {
    pub fn new(ffmpeg: FfmpegWrapper) -> Self {
        Self { ffmpeg }
    }

    pub fn capture_args(
        timestamp: f64,
        source_path: &Path,
        output_path: &Path,
        filter: &FilterGraph,
    ) -> Vec<String> {
        vec![
            "-loglevel".to_string(),
            "error".to_string(),
            "-ss".to_string(),
            timestamp.to_string(),
            "-i".to_string(),
            source_path.to_string_lossy().to_string(),
            "-map_metadata".to_string(),
            "-1".to_string(),
            "-map_chapters".to_string(),
            "-1".to_string(),
            "-vframes".to_string(),
            "1".to_string(),
            "-vf".to_string(),
            filter.to_string(),
            "-update".to_string(),
            "1".to_string(),
            "-y".to_string(),
            output_path.to_string_lossy().to_string(),
        ]
    }

    /// Extracts the frame at `timestamp` into `output_path`.
    ///
    /// A non-zero exit is reported through the outcome; only a launch failure
    /// (or timeout) is an error. On failure the output file may be partial or absent.
    pub async fn execute(
        &self,
        timestamp: f64,
        source_path: &Path,
        output_path: &Path,
        filter: &FilterGraph,
    ) -> Result<CaptureOutcome> {
        let args = Self::capture_args(timestamp, source_path, output_path, filter);
        debug!("Capture filter: {}", filter);

        let output = self.ffmpeg.run_ffmpeg(&args).await?;

        Ok(CaptureOutcome {
            status: output.status,
            log: output.stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::filters::sdr_graph;
    use crate::utils::process::testing::ScriptedRunner;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[test]
    fn test_capture_args() {
        let args = CaptureExecutor::capture_args(
            5.25,
            Path::new("/videos/movie.mkv"),
            Path::new("/out/movie-00-00-05-250-HDR.png"),
            &sdr_graph(),
        );

        assert_eq!(
            args,
            vec![
                "-loglevel", "error", "-ss", "5.25", "-i", "/videos/movie.mkv",
                "-map_metadata", "-1", "-map_chapters", "-1", "-vframes", "1",
                "-vf", "format=rgb24", "-update", "1", "-y",
                "/out/movie-00-00-05-250-HDR.png",
            ]
        );
    }

    #[test]
    fn test_whole_second_timestamp_has_no_fraction() {
        let args = CaptureExecutor::capture_args(
            5.0,
            Path::new("/a.mkv"),
            Path::new("/b.png"),
            &sdr_graph(),
        );
        assert_eq!(args[3], "5");
    }

    #[test]
    fn test_error_report() {
        let outcome = CaptureOutcome {
            status: Some(1),
            log: vec![
                "[in#0 @ 0x1] Error opening input: No such file or directory   ".to_string(),
                "".to_string(),
                "Error opening input files: No such file or directory".to_string(),
            ],
        };

        assert!(!outcome.success());
        assert_eq!(
            outcome.error_report(),
            "[FFmpeg Error | Status Code: 1]\n\
             [in#0 @ 0x1] Error opening input: No such file or directory\n\
             Error opening input files: No such file or directory"
        );
    }

    #[tokio::test]
    async fn test_execute_keeps_log_in_order() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push(187, &["first", "second"]);
        let ffmpeg = crate::utils::FfmpegWrapper::new("ffmpeg".to_string(), "ffprobe".to_string(), runner.clone());
        let executor = CaptureExecutor::new(ffmpeg);

        let outcome = executor
            .execute(1.0, Path::new("/a.mkv"), Path::new("/b.png"), &sdr_graph())
            .await
            .unwrap();

        assert_eq!(outcome.status, Some(187));
        assert_eq!(outcome.log, vec!["first", "second"]);
        assert_eq!(runner.calls()[0][0], "ffmpeg");
    }
}
