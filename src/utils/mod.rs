pub mod error;
pub mod ffmpeg;
pub mod filesystem;
pub mod logging;
pub mod process;
pub mod progress;

pub use error::{Error, Result};
pub use ffmpeg::{FfmpegWrapper, StreamColorParams};
pub use filesystem::{file_url_from_path, local_path_from_url, sanitize_tool_path};
pub use logging::setup_logging;
pub use process::{ProcessRunner, SystemRunner, ToolOutput};
pub use progress::{CaptureSpinner, SuspendingStderr};
