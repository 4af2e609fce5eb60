pub mod executor;
pub mod filters;
pub mod naming;
pub mod orchestrator;
pub mod peak;

pub use executor::{CaptureExecutor, CaptureOutcome};
pub use filters::{FilterGraph, FilterGraphBuilder, FilterStage, PipelineVariant};
pub use naming::{build_output_path, derive_output_dir, format_timestamp};
pub use orchestrator::{CaptureOrchestrator, CaptureRequest, Notice, ProcessingLock};
pub use peak::{LuminancePeakProber, LuminanceReadings, PeakCache};
