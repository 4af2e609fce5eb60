use serde::{Deserialize, Serialize};

/// Tone-mapping operators understood by ffmpeg's `tonemap` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tonemap {
    None,
    Clip,
    #[default]
    Reinhard,
    Hable,
    Mobius,
}

impl Tonemap {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Clip => "clip",
            Self::Reinhard => "reinhard",
            Self::Hable => "hable",
            Self::Mobius => "mobius",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" => Some(Self::None),
            "clip" => Some(Self::Clip),
            "reinhard" => Some(Self::Reinhard),
            "hable" => Some(Self::Hable),
            "mobius" => Some(Self::Mobius),
            _ => None,
        }
    }

    pub fn all() -> &'static [Tonemap] {
        &[
            Self::None,
            Self::Clip,
            Self::Reinhard,
            Self::Hable,
            Self::Mobius,
        ]
    }
}

impl std::fmt::Display for Tonemap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg: String,
    pub ffprobe: String,
    /// Upper bound for a single ffmpeg/ffprobe run; `None` waits indefinitely.
    pub timeout_seconds: Option<u64>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Raw operator name as written in the file; resolved by [`CaptureConfig::tonemap`].
    pub tonemap: String,
    /// Selects the zscale filter family instead of scale.
    pub zscale: bool,
    pub screenshot_dir: Option<String>,
    pub probe_frames: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            tonemap: Tonemap::default().as_str().to_string(),
            zscale: false,
            screenshot_dir: None,
            probe_frames: 5,
        }
    }
}

impl CaptureConfig {
    /// Operator after load-time normalization; unknown names were already replaced.
    pub fn tonemap(&self) -> Tonemap {
        Tonemap::from_string(&self.tonemap).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub show_timestamps: bool,
    pub colored_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            show_timestamps: false,
            colored_output: true,
        }
    }
}
