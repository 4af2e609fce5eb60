use crate::utils::process::{ProcessRunner, ToolOutput};
use crate::utils::{Error, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Color parameters of the first video stream, as ffprobe names them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamColorParams {
    pub color_transfer: Option<String>,
    pub color_primaries: Option<String>,
}

#[derive(Clone)]
pub struct FfmpegWrapper {
    ffmpeg_path: String,
    ffprobe_path: String,
    runner: Arc<dyn ProcessRunner>,
}

impl std::fmt::Debug for FfmpegWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegWrapper")
            .field("ffmpeg_path", &self.ffmpeg_path)
            .field("ffprobe_path", &self.ffprobe_path)
            .finish_non_exhaustive()
    }
}

impl FfmpegWrapper {
    pub fn new(ffmpeg_path: String, ffprobe_path: String, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            runner,
        }
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.ffmpeg_path
    }

    pub fn is_available(&self) -> bool {
        self.runner.is_available(&self.ffmpeg_path)
    }

    /// Run ffmpeg with custom arguments and collect its diagnostic stream.
    pub async fn run_ffmpeg(&self, args: &[String]) -> Result<ToolOutput> {
        self.runner.run(&self.ffmpeg_path, args).await
    }

    /// Looks up transfer characteristic and primaries of the first video stream.
    pub async fn stream_color_params<P: AsRef<Path>>(&self, input_path: P) -> Result<StreamColorParams> {
        let input_path = input_path.as_ref().to_string_lossy().to_string();
        let args: Vec<String> = [
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=color_transfer,color_primaries",
            "-print_format",
            "json",
            input_path.as_str(),
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        debug!("Probing stream color parameters for: {}", input_path);
        let output = self.runner.run(&self.ffprobe_path, &args).await?;

        if !output.success() {
            return Err(Error::ffmpeg(format!(
                "ffprobe failed: {}",
                output.stderr.join("\n")
            )));
        }

        parse_color_params(&output.stdout)
    }
}

fn parse_color_params(json_output: &str) -> Result<StreamColorParams> {
    let probe_data: serde_json::Value = serde_json::from_str(json_output)?;

    let stream = probe_data["streams"]
        .as_array()
        .and_then(|streams| streams.first())
        .ok_or_else(|| Error::parse("No video stream found"))?;

    let field = |name: &str| {
        stream[name]
            .as_str()
            .filter(|value| !value.is_empty() && *value != "unknown")
            .map(|value| value.to_string())
    };

    Ok(StreamColorParams {
        color_transfer: field("color_transfer"),
        color_primaries: field("color_primaries"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color_params() {
        let json = r#"{
            "programs": [],
            "streams": [
                { "color_transfer": "smpte2084", "color_primaries": "bt2020" }
            ]
        }"#;

        let params = parse_color_params(json).unwrap();
        assert_eq!(params.color_transfer.as_deref(), Some("smpte2084"));
        assert_eq!(params.color_primaries.as_deref(), Some("bt2020"));
    }

    #[test]
    fn test_parse_color_params_missing_fields() {
        let json = r#"{ "streams": [ { "color_primaries": "unknown" } ] }"#;

        let params = parse_color_params(json).unwrap();
        assert_eq!(params, StreamColorParams::default());
    }

    #[test]
    fn test_parse_color_params_no_stream() {
        assert!(matches!(
            parse_color_params(r#"{ "streams": [] }"#),
            Err(Error::Parse { .. })
        ));
        assert!(matches!(parse_color_params("not json"), Err(Error::Json(_))));
    }
}
