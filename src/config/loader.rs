use super::keybind::{self, KeybindStatus};
use super::types::*;
use crate::utils::{sanitize_tool_path, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CONFIG_FILE_NAME: &str = "config.yaml";
const APP_DIR_NAME: &str = "hdr-screenshot";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tools: ToolsConfig,
    pub capture: CaptureConfig,
    pub logging: LoggingConfig,
    /// Custom keybinding for the capture action, stored normalized.
    pub keybind: Option<String>,
    /// Substitutions made while loading. Loading usually happens before
    /// logging is set up, so callers report these with [`Config::log_warnings`].
    #[serde(skip)]
    pub warnings: Vec<String>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)?;
        Self::from_yaml(&config_str)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut config: Config = serde_yaml::from_str(yaml)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Loads the first configuration found: the explicit path, `config.yaml` in the
    /// working directory, then the per-user config directory. Falls back to defaults.
    pub fn load_with_fallback<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        let mut candidates: Vec<PathBuf> = Vec::new();

        if let Some(path) = config_path {
            let path = path.as_ref();
            if !path.exists() {
                return Err(Error::validation(format!(
                    "Configuration file does not exist: {}",
                    path.display()
                )));
            }
            candidates.push(path.to_path_buf());
        }

        candidates.push(PathBuf::from(CONFIG_FILE_NAME));
        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME));
        }

        for candidate in candidates {
            if candidate.is_file() {
                debug!("Loading configuration from {}", candidate.display());
                return Self::load(&candidate);
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Applies the load-time substitutions: sanitized tool paths, a known
    /// tone-map operator and a normalized keybinding.
    fn normalize(&mut self) {
        let defaults = ToolsConfig::default();
        self.tools.ffmpeg = sanitized_or(&self.tools.ffmpeg, &defaults.ffmpeg);
        self.tools.ffprobe = sanitized_or(&self.tools.ffprobe, &defaults.ffprobe);

        let tonemap = match Tonemap::from_string(&self.capture.tonemap) {
            Some(tonemap) => tonemap,
            None => {
                let valid: Vec<&str> = Tonemap::all().iter().map(|t| t.as_str()).collect();
                self.warnings.push(format!(
                    "Unknown tonemap '{}' (valid: {}), using {}",
                    self.capture.tonemap,
                    valid.join(", "),
                    Tonemap::default()
                ));
                Tonemap::default()
            }
        };
        self.capture.tonemap = tonemap.as_str().to_string();

        self.capture.screenshot_dir = self
            .capture
            .screenshot_dir
            .take()
            .map(|dir| dir.trim().to_string())
            .filter(|dir| !dir.is_empty());

        let warnings = &mut self.warnings;
        self.keybind = self.keybind.take().and_then(|raw| {
            let clean = keybind::sanitize(&raw);
            match keybind::validate(&clean) {
                KeybindStatus::Disabled => None,
                KeybindStatus::Invalid(message) => {
                    warnings.push(format!("Ignoring keybind '{}': {}", raw, message));
                    None
                }
                KeybindStatus::Warning(message) => {
                    warnings.push(format!("Keybind '{}': {}", raw, message));
                    Some(keybind::normalize(&clean))
                }
                KeybindStatus::Valid => Some(keybind::normalize(&clean)),
            }
        });
    }

    /// Emits the load-time substitutions as warnings.
    pub fn log_warnings(&self) {
        for message in &self.warnings {
            warn!("{}", message);
        }
    }

    fn validate(&self) -> Result<()> {
        if self.capture.probe_frames == 0 {
            return Err(Error::validation("probe_frames must be greater than 0"));
        }

        if self.tools.timeout_seconds == Some(0) {
            return Err(Error::validation(
                "timeout_seconds must be greater than 0 (omit it to disable the timeout)",
            ));
        }

        Ok(())
    }
}

fn sanitized_or(path: &str, default: &str) -> String {
    let clean = sanitize_tool_path(path);
    if clean.is_empty() {
        default.to_string()
    } else {
        clean
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_config_load_from_string() {
        let yaml = r#"
tools:
  ffmpeg: "/opt//homebrew/bin/ffmpeg "
  timeout_seconds: 30

capture:
  tonemap: " Hable"
  zscale: true
  screenshot_dir: "/shots"
  probe_frames: 8

logging:
  level: "debug"
  show_timestamps: true
  colored_output: false

keybind: "shift + meta + e"
"#;

        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.tools.ffmpeg, "/opt/homebrew/bin/ffmpeg");
        assert_eq!(config.tools.ffprobe, "ffprobe");
        assert_eq!(config.tools.timeout_seconds, Some(30));
        assert_eq!(config.capture.tonemap(), Tonemap::Hable);
        assert!(config.capture.zscale);
        assert_eq!(config.capture.screenshot_dir.as_deref(), Some("/shots"));
        assert_eq!(config.capture.probe_frames, 8);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.keybind.as_deref(), Some("Meta+Shift+e"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.capture.tonemap(), Tonemap::Reinhard);
        assert!(!config.capture.zscale);
        assert_eq!(config.capture.probe_frames, 5);
    }

    #[test]
    fn test_unknown_tonemap_substituted() {
        let config = Config::from_yaml("capture:\n  tonemap: aces\n").unwrap();
        assert_eq!(config.capture.tonemap, "reinhard");
        assert_eq!(
            config.warnings,
            vec!["Unknown tonemap 'aces' (valid: none, clip, reinhard, hable, mobius), using reinhard"]
        );
    }

    #[test]
    fn test_blank_values_fall_back() {
        let yaml = "tools:\n  ffmpeg: \"\\u0007  \"\ncapture:\n  screenshot_dir: \"  \"\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.tools.ffmpeg, "ffmpeg");
        assert_eq!(config.capture.screenshot_dir, None);
    }

    #[test]
    fn test_invalid_keybind_dropped() {
        let config = Config::from_yaml("keybind: \"Meta+Shift\"\n").unwrap();
        assert_eq!(config.keybind, None);
        assert_eq!(config.warnings.len(), 1);
        assert!(config.warnings[0].starts_with("Ignoring keybind 'Meta+Shift'"));
    }

    #[test]
    fn test_config_validation() {
        assert!(Config::from_yaml("capture:\n  probe_frames: 0\n").is_err());
        assert!(Config::from_yaml("tools:\n  timeout_seconds: 0\n").is_err());
    }

    #[test]
    fn test_load_with_fallback_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "capture:\n  tonemap: mobius").unwrap();

        let config = Config::load_with_fallback(Some(file.path())).unwrap();
        assert_eq!(config.capture.tonemap(), Tonemap::Mobius);
    }

    #[test]
    fn test_load_with_fallback_missing_explicit_path() {
        let result = Config::load_with_fallback(Some("/nonexistent/hdr-screenshot.yaml"));
        assert!(result.is_err());
    }
}
