use crate::utils::FfmpegWrapper;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, warn};

static MAX_CLL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"MaxCLL=\s*(\d+)").unwrap());

static MAX_LUMINANCE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"max_luminance=\s*(\d+)").unwrap());

/// Below this many nits the tone-mapper's own default peak is used.
const MIN_PEAK_NITS: u64 = 1000;

/// Memoized peak fragments keyed by source path.
///
/// Entries are never evicted or replaced: the first committed fragment for a
/// path stays for the lifetime of the process, even if the file changes on disk.
/// The map grows with the number of distinct sources captured.
#[derive(Debug, Default)]
pub struct PeakCache {
    entries: Mutex<HashMap<String, String>>,
}

impl PeakCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, source: &str) -> Option<String> {
        self.lock().get(source).cloned()
    }

    /// Stores `fragment` unless the path already has one; returns the committed value.
    pub fn commit(&self, source: &str, fragment: String) -> String {
        self.lock()
            .entry(source.to_string())
            .or_insert(fragment)
            .clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // The map is never left half-updated, so a poisoned lock is still usable.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Luminance markers scraped from ffmpeg's `showinfo` output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LuminanceReadings {
    pub max_cll: u64,
    pub max_luminance: u64,
}

impl LuminanceReadings {
    pub fn from_lines<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut readings = Self::default();
        for line in lines {
            readings.update_from_line(line);
        }
        readings
    }

    /// Later markers overwrite earlier ones; zero or unparsable values are ignored.
    pub fn update_from_line(&mut self, line: &str) {
        if let Some(value) = extract_value(&MAX_CLL_REGEX, line) {
            self.max_cll = value;
        }

        if let Some(value) = extract_value(&MAX_LUMINANCE_REGEX, line) {
            self.max_luminance = value;
        }
    }

    /// MaxCLL when it is at least 1000 nits, otherwise the mastering display peak.
    pub fn resolved_nits(&self) -> u64 {
        if self.max_cll >= MIN_PEAK_NITS {
            self.max_cll
        } else {
            self.max_luminance
        }
    }

    /// The `:peak=` parameter for the tonemap filter, or empty to keep its default.
    pub fn peak_fragment(&self) -> String {
        let nits = self.resolved_nits();
        if nits >= MIN_PEAK_NITS {
            format!(":peak={:.3}", nits as f64 / 1000.0)
        } else {
            String::new()
        }
    }
}

fn extract_value(regex: &Regex, line: &str) -> Option<u64> {
    regex
        .captures(line)
        .and_then(|captures| captures[1].parse::<u64>().ok())
        .filter(|value| *value > 0)
}

/// Best-effort detection of the source's peak luminance.
pub struct LuminancePeakProber {
    ffmpeg: FfmpegWrapper,
    cache: PeakCache,
    probe_frames: u32,
}

impl LuminancePeakProber {
    pub fn new(ffmpeg: FfmpegWrapper, probe_frames: u32) -> Self {
        Self {
            ffmpeg,
            cache: PeakCache::new(),
            probe_frames,
        }
    }

    pub fn cache(&self) -> &PeakCache {
        &self.cache
    }

    pub fn probe_args(&self, source_path: &Path) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-nostats".to_string(),
            "-loglevel".to_string(),
            "info".to_string(),
            "-i".to_string(),
            source_path.to_string_lossy().to_string(),
            "-vframes".to_string(),
            self.probe_frames.to_string(),
            "-vf".to_string(),
            "showinfo".to_string(),
            "-f".to_string(),
            "null".to_string(),
            "-".to_string(),
        ]
    }

    /// Returns the peak fragment for `source_path`, probing at most once per path.
    ///
    /// Never fails: a probe that exits non-zero, cannot be launched or times
    /// out yields an empty fragment, which is cached like any other result.
    pub async fn peak(&self, source_path: &Path) -> String {
        let key = source_path.to_string_lossy();
        if key.is_empty() {
            return String::new();
        }

        if let Some(fragment) = self.cache.get(&key) {
            debug!("Peak cache hit for {}: '{}'", key, fragment);
            return fragment;
        }

        let output = match self.ffmpeg.run_ffmpeg(&self.probe_args(source_path)).await {
            Ok(output) => output,
            Err(e) => {
                warn!("Peak luminance probe could not run: {}", e);
                return self.cache.commit(&key, String::new());
            }
        };

        let fragment = if output.success() {
            let readings = LuminanceReadings::from_lines(output.stderr.iter().map(String::as_str));
            debug!(
                "Peak probe for {}: MaxCLL={} max_luminance={}",
                key, readings.max_cll, readings.max_luminance
            );
            readings.peak_fragment()
        } else {
            debug!("Peak probe exited with {:?}, using tonemap default", output.status);
            String::new()
        };

        self.cache.commit(&key, fragment)
    }
}
