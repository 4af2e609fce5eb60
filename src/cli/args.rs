use crate::config::{Config, Tonemap};
use crate::player::PlayerState;
use crate::utils::{file_url_from_path, local_path_from_url, Error, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(name = "hdr-screenshot")]
#[command(about = "Capture a single video frame as PNG, tone-mapping HDR sources to SDR")]
#[command(long_about = "
Extracts the frame at a given position of a local video file into a PNG next to
the source (or into a configured screenshot folder). HDR sources (PQ, HLG or
BT.2020) are tone-mapped to BT.709 with FFmpeg; SDR sources are converted as-is.

EXAMPLES:
  # Capture the frame at 1m05s
  hdr-screenshot -i movie.mkv -t 65

  # Pick the tone-mapping operator and write into another folder
  hdr-screenshot -i movie.mkv -t 12.5 --tonemap hable --output-dir ~/Pictures/

  # Use the zscale pipeline (the tone-mapper detects the peak itself)
  hdr-screenshot -i movie.mkv -t 300 --zscale

  # Check a keybinding against bindings already in use
  hdr-screenshot --check-keybind 'ctrl+shift+h' --bound Ctrl+S
")]
pub struct CliArgs {
    /// Local video file to capture from
    #[arg(short, long, value_name = "PATH", conflicts_with = "url")]
    pub input: Option<PathBuf>,

    /// Source URL as reported by the player (only file:// URLs can be captured)
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Playback position in seconds
    #[arg(short, long, value_name = "SECONDS", allow_negative_numbers = true)]
    pub time: Option<f64>,

    /// Transfer characteristic of the video (pq, hlg, bt.1886, ...); probed when absent
    #[arg(long, value_name = "NAME")]
    pub gamma: Option<String>,

    /// Color primaries of the video (bt.2020, bt.709, ...); probed when absent
    #[arg(long, value_name = "NAME")]
    pub primaries: Option<String>,

    /// Screenshot folder, overriding the configured one
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<String>,

    /// Tone-mapping operator for HDR sources
    #[arg(long, value_name = "OPERATOR", value_parser = ["none", "clip", "reinhard", "hable", "mobius"])]
    pub tonemap: Option<String>,

    /// Use the zscale pipeline instead of scale
    #[arg(long)]
    pub zscale: bool,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Validate configuration file
    #[arg(long)]
    pub validate_config: bool,

    /// Sanitize, normalize and validate a keybinding
    #[arg(long, value_name = "KEY")]
    pub check_keybind: Option<String>,

    /// Binding already in use by the player (can be specified multiple times)
    #[arg(long = "bound", value_name = "KEY", action = clap::ArgAction::Append)]
    pub bound_keys: Vec<String>,
}

impl CliArgs {
    pub fn get_log_level<'a>(&self, config_level: &'a str) -> &'a str {
        if self.debug {
            "debug"
        } else {
            config_level
        }
    }

    pub fn should_use_color(&self) -> bool {
        !self.no_color
    }

    pub fn is_info_command(&self) -> bool {
        self.validate_config || self.check_keybind.is_some()
    }

    pub fn has_source(&self) -> bool {
        self.input.is_some() || self.url.is_some()
    }

    pub fn should_capture(&self) -> bool {
        !self.is_info_command() && self.has_source()
    }

    pub fn validate(&self) -> Result<()> {
        if self.should_capture() && self.time.is_none() {
            return Err(Error::validation(
                "A playback position (--time) is required for capturing",
            ));
        }

        if let Some(path) = &self.config {
            if !path.exists() {
                return Err(Error::validation(format!(
                    "Configuration file does not exist: {}",
                    path.display()
                )));
            }
        }

        Ok(())
    }

    /// Applies the capture overrides given on the command line.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(tonemap) = self.tonemap.as_deref().and_then(Tonemap::from_string) {
            config.capture.tonemap = tonemap.as_str().to_string();
        }
        if self.zscale {
            config.capture.zscale = true;
        }
        if let Some(dir) = self.output_dir.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            config.capture.screenshot_dir = Some(dir.to_string());
        }
    }

    /// Local path of the source, if it is a local file.
    pub fn source_path(&self) -> Option<PathBuf> {
        match (&self.input, &self.url) {
            (Some(path), _) => Some(path.clone()),
            (None, Some(url)) => local_path_from_url(url),
            (None, None) => None,
        }
    }

    /// Snapshot of the playback the capture is requested for. Color
    /// parameters are only those given explicitly.
    pub fn player_state(&self, config: &Config) -> PlayerState {
        let url = match (&self.input, &self.url) {
            (Some(path), _) => Some(file_url_from_path(absolute(path))),
            (None, url) => url.clone(),
        };
        let local = url.as_deref().and_then(local_path_from_url);

        PlayerState {
            is_network_resource: url.is_some() && local.is_none(),
            filename_stem: local
                .as_ref()
                .and_then(|path| path.file_stem())
                .map(|stem| stem.to_string_lossy().to_string()),
            url,
            position: self.time,
            ..Default::default()
        }
        .with_color(self.gamma.clone(), self.primaries.clone())
        .with_screenshot_dir(config.capture.screenshot_dir.clone())
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
