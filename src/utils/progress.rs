use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Spinner currently drawn on stderr, if any. Log output suspends it.
static ACTIVE_SPINNER: Lazy<Mutex<Option<ProgressBar>>> = Lazy::new(|| Mutex::new(None));

fn active_spinner() -> Option<ProgressBar> {
    ACTIVE_SPINNER
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

fn set_active_spinner(bar: Option<ProgressBar>) {
    *ACTIVE_SPINNER
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = bar;
}

/// Indeterminate spinner shown while a capture runs.
pub struct CaptureSpinner {
    progress_bar: ProgressBar,
    start_time: Instant,
    registered: bool,
}

impl CaptureSpinner {
    pub fn new(message: &str) -> Self {
        let progress_bar = ProgressBar::new_spinner();

        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}") {
            progress_bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }
        progress_bar.set_message(message.to_string());
        progress_bar.enable_steady_tick(Duration::from_millis(100));
        set_active_spinner(Some(progress_bar.clone()));

        Self {
            progress_bar,
            start_time: Instant::now(),
            registered: true,
        }
    }

    /// A spinner that draws nothing, for non-interactive output.
    pub fn hidden() -> Self {
        Self {
            progress_bar: ProgressBar::hidden(),
            start_time: Instant::now(),
            registered: false,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn finish(&self) {
        if self.registered {
            set_active_spinner(None);
        }
        self.progress_bar.finish_and_clear();
    }
}

impl Drop for CaptureSpinner {
    fn drop(&mut self) {
        if !self.progress_bar.is_finished() {
            self.finish();
        }
    }
}

/// Stderr writer for log output: each write clears the active spinner,
/// prints, and redraws it, so multi-line reports are never interleaved
/// with spinner frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct SuspendingStderr;

impl Write for SuspendingStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match active_spinner() {
            Some(bar) => bar.suspend(|| io::stderr().write_all(buf))?,
            None => io::stderr().write_all(buf)?,
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_registers_for_log_suspension() {
        let spinner = CaptureSpinner::new("Capturing frame");
        assert!(active_spinner().is_some());

        let report = b"ERROR [FFmpeg Error | Status Code: 1]\n";
        let mut writer = SuspendingStderr;
        assert_eq!(writer.write(report).unwrap(), report.len());

        spinner.finish();
        assert!(active_spinner().is_none());
        assert!(spinner.progress_bar.is_finished());
    }

    #[test]
    fn test_hidden_spinner_is_not_registered() {
        let spinner = CaptureSpinner::hidden();
        spinner.finish();
        assert!(spinner.progress_bar.is_finished());
        let mut writer = SuspendingStderr;
        assert_eq!(writer.write(b"plain\n").unwrap(), 6);
    }
}
