use crate::capture::executor::CaptureExecutor;
use crate::capture::filters::{FilterGraphBuilder, PipelineVariant};
use crate::capture::naming::{build_output_path, derive_output_dir};
use crate::capture::peak::LuminancePeakProber;
use crate::config::{Config, Tonemap};
use crate::hdr::is_hdr;
use crate::player::PlayerState;
use crate::utils::{local_path_from_url, FfmpegWrapper, ProcessRunner, Result};
use futures::FutureExt;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

/// User-facing result of a capture request. Every exit path ends in exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    InProgress,
    ToolNotFound,
    NotLocalFile,
    InvalidPosition,
    NoOutputDir,
    OutputDirMissing(String),
    NoOutputPath,
    Captured { hdr: bool, path: PathBuf },
    CaptureFailed { status: Option<i32> },
    PluginError,
}

impl Notice {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Captured { .. })
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => write!(f, "HDR screenshot in progress..."),
            Self::ToolNotFound => write!(f, "FFmpeg not found. Check Preferences"),
            Self::NotLocalFile => write!(f, "Only local files are supported"),
            Self::InvalidPosition => write!(f, "Failed to determine current time position"),
            Self::NoOutputDir => write!(f, "Failed to determine output folder"),
            Self::OutputDirMissing(dir) => write!(f, "Output folder: \"{}\" not found", dir),
            Self::NoOutputPath => write!(f, "Failed to determine output path"),
            Self::Captured { hdr: true, .. } => write!(f, "HDR Screenshot Captured"),
            Self::Captured { hdr: false, .. } => write!(f, "Screenshot Captured"),
            Self::CaptureFailed { .. } => write!(f, "FFmpeg capture failed. Check logs"),
            Self::PluginError => write!(f, "Plugin execution error. Check logs"),
        }
    }
}

/// Single-slot "capture in flight" flag. It is only process-wide as long as a
/// single [`CaptureOrchestrator`] owns it.
#[derive(Debug, Default)]
pub struct ProcessingLock {
    busy: AtomicBool,
}

impl ProcessingLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the slot, or returns `None` immediately if it is taken.
    pub fn try_acquire(&self) -> Option<ProcessingGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ProcessingGuard { lock: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the slot when dropped, including during unwinding.
#[derive(Debug)]
pub struct ProcessingGuard<'a> {
    lock: &'a ProcessingLock,
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.lock.busy.store(false, Ordering::Release);
    }
}

/// Settings read from the configuration for every capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    pub tonemap: Tonemap,
    pub variant: PipelineVariant,
}

impl CaptureSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            tonemap: config.capture.tonemap(),
            variant: PipelineVariant::from_zscale_flag(config.capture.zscale),
        }
    }
}

/// Everything one validated capture needs.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    pub source_path: PathBuf,
    pub timestamp: f64,
    pub output_dir: String,
    pub output_path: PathBuf,
    pub tonemap: Tonemap,
    pub variant: PipelineVariant,
    pub tool_path: String,
}

/// Entry point for capture requests.
///
/// Owns the busy flag and the peak cache, so exactly one instance must exist
/// per process and be shared (e.g. behind an `Arc`) by every caller. A second
/// instance would accept concurrent captures and probe sources again.
pub struct CaptureOrchestrator {
    ffmpeg: FfmpegWrapper,
    prober: LuminancePeakProber,
    executor: CaptureExecutor,
    settings: CaptureSettings,
    lock: ProcessingLock,
}

impl CaptureOrchestrator {
    pub fn new(config: &Config, runner: Arc<dyn ProcessRunner>) -> Self {
        let ffmpeg = FfmpegWrapper::new(
            config.tools.ffmpeg.clone(),
            config.tools.ffprobe.clone(),
            runner,
        );

        Self {
            prober: LuminancePeakProber::new(ffmpeg.clone(), config.capture.probe_frames),
            executor: CaptureExecutor::new(ffmpeg.clone()),
            settings: CaptureSettings::from_config(config),
            lock: ProcessingLock::new(),
            ffmpeg,
        }
    }

    pub fn ffmpeg(&self) -> &FfmpegWrapper {
        &self.ffmpeg
    }

    pub fn prober(&self) -> &LuminancePeakProber {
        &self.prober
    }

    pub fn is_busy(&self) -> bool {
        self.lock.is_busy()
    }

    /// Runs one capture. A request arriving while another is in flight is
    /// rejected with [`Notice::InProgress`] without touching any state.
    pub async fn capture(&self, player: &PlayerState) -> Notice {
        let Some(_guard) = self.lock.try_acquire() else {
            return Notice::InProgress;
        };

        match AssertUnwindSafe(self.run(player)).catch_unwind().await {
            Ok(Ok(notice)) => notice,
            Ok(Err(e)) => {
                error!("Execution error: {}", e);
                Notice::PluginError
            }
            Err(_) => {
                error!("Execution error: capture pipeline panicked");
                Notice::PluginError
            }
        }
    }

    async fn run(&self, player: &PlayerState) -> Result<Notice> {
        let request = match self.validate(player) {
            Ok(request) => request,
            Err(notice) => return Ok(notice),
        };

        let hdr = is_hdr(player.gamma.as_deref(), player.primaries.as_deref());
        let filter = FilterGraphBuilder::new(&self.prober)
            .build(hdr, &request.source_path, request.tonemap, request.variant)
            .await;

        let outcome = self
            .executor
            .execute(
                request.timestamp,
                &request.source_path,
                &request.output_path,
                &filter,
            )
            .await?;

        if outcome.success() {
            info!(
                "Captured {} frame at {}s to {}",
                if hdr { "HDR" } else { "SDR" },
                request.timestamp,
                request.output_path.display()
            );
            Ok(Notice::Captured {
                hdr,
                path: request.output_path,
            })
        } else {
            error!("{}", outcome.error_report());
            Ok(Notice::CaptureFailed {
                status: outcome.status,
            })
        }
    }

    /// Checks every precondition before anything is spawned.
    pub fn validate(&self, player: &PlayerState) -> std::result::Result<CaptureRequest, Notice> {
        if !self.ffmpeg.is_available() {
            return Err(Notice::ToolNotFound);
        }

        if player.is_network_resource {
            return Err(Notice::NotLocalFile);
        }
        let source_path = player
            .url
            .as_deref()
            .and_then(local_path_from_url)
            .ok_or(Notice::NotLocalFile)?;

        let timestamp = player
            .position
            .filter(|position| position.is_finite() && *position >= 0.0)
            .ok_or(Notice::InvalidPosition)?;

        let output_dir = derive_output_dir(player.screenshot_dir.as_deref(), &source_path)
            .ok_or(Notice::NoOutputDir)?;
        if !Path::new(&output_dir).is_dir() {
            return Err(Notice::OutputDirMissing(output_dir));
        }

        let stem = player.filename_stem.as_deref().unwrap_or_default();
        let output_path =
            build_output_path(&output_dir, stem, timestamp).ok_or(Notice::NoOutputPath)?;

        Ok(CaptureRequest {
            source_path,
            timestamp,
            output_dir,
            output_path,
            tonemap: self.settings.tonemap,
            variant: self.settings.variant,
            tool_path: self.ffmpeg.ffmpeg_path().to_string(),
        })
    }
}
