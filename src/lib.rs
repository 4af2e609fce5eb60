pub mod capture;
pub mod cli;
pub mod config;
pub mod hdr;
pub mod player;
pub mod utils;

pub use capture::{CaptureOrchestrator, Notice, PipelineVariant};
pub use config::{Config, Tonemap};
pub use player::PlayerState;
pub use utils::{Error, FfmpegWrapper, Result};
