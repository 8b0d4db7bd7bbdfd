use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::effects::{check_range, KenBurnsConfig};
use crate::error::{Result, ValidationError};

/// One still image shown for a window of time
///
/// A zero `duration` asks the composition service to compute timing, and a
/// missing `ken_burns` asks it to synthesize a default pan/zoom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageFrame {
    /// Path to the image file
    pub path: PathBuf,

    /// How long to display this image
    #[serde(default, with = "serde_secs")]
    pub duration: Duration,

    /// When this image starts in the video
    #[serde(default, with = "serde_secs")]
    pub start_time: Duration,

    /// Pan/zoom settings for this image
    #[serde(default)]
    pub ken_burns: Option<KenBurnsConfig>,
}

impl ImageFrame {
    /// Create a frame with timing and motion left for the service to fill in
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            duration: Duration::ZERO,
            start_time: Duration::ZERO,
            ken_burns: None,
        }
    }

    /// Set an explicit display duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set an explicit Ken Burns configuration
    pub fn with_ken_burns(mut self, ken_burns: KenBurnsConfig) -> Self {
        self.ken_burns = Some(ken_burns);
        self
    }

    /// Get the file extension, lowercased
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
    }
}

/// Output video settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    /// Video width in pixels (1080 for Shorts)
    pub width: u32,

    /// Video height in pixels (1920 for Shorts)
    pub height: u32,

    /// Frames per second
    pub fps: u32,

    /// Video bitrate (e.g. "2M")
    pub bitrate: String,

    /// Audio bitrate (e.g. "128k")
    pub audio_bitrate: String,

    /// Container format (mp4)
    pub format: String,

    /// Background music volume (0.0-1.0)
    pub background_music_volume: f64,

    /// Narration volume (0.0-1.0)
    pub narration_volume: f64,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 30,
            bitrate: "2M".to_string(),
            audio_bitrate: "128k".to_string(),
            format: "mp4".to_string(),
            background_music_volume: 0.3,
            narration_volume: 1.0,
        }
    }
}

impl VideoSettings {
    /// Dimensions and frame rate must be positive, volumes within `[0, 1]`
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("width", self.width), ("height", self.height), ("fps", self.fps)] {
            if value == 0 {
                return Err(ValidationError::NotPositive { field, value: 0.0 }.into());
            }
        }

        check_range("background_music_volume", self.background_music_volume, 0.0, 1.0)?;
        check_range("narration_volume", self.narration_volume, 0.0, 1.0)?;
        Ok(())
    }
}

/// Where and when to grab a thumbnail after rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailRequest {
    pub path: PathBuf,

    #[serde(default = "default_thumbnail_offset", with = "serde_secs")]
    pub offset: Duration,
}

fn default_thumbnail_offset() -> Duration {
    Duration::from_secs(1)
}

/// Everything needed to render one video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposeVideoRequest {
    /// Images with optional timing and motion
    pub images: Vec<ImageFrame>,

    /// Path to the narration track
    pub narration_audio_path: PathBuf,

    /// Optional background music track
    #[serde(default)]
    pub background_music_path: Option<PathBuf>,

    /// Where to write the final video (.mp4)
    pub output_path: PathBuf,

    #[serde(default)]
    pub settings: VideoSettings,

    /// Gap reserved for transitions between consecutive images
    #[serde(default, with = "serde_secs")]
    pub transition_duration: Duration,

    #[serde(default)]
    pub thumbnail: Option<ThumbnailRequest>,
}

/// Result of a successful composition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposeVideoResponse {
    pub output_path: PathBuf,

    #[serde(with = "serde_secs")]
    pub duration: Duration,

    pub file_size: u64,

    pub thumbnail_path: Option<PathBuf>,
}

/// Outcome of checking a rendered video against expected settings
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub width: u32,
    pub height: u32,
    pub duration: Duration,
    pub file_size: u64,
    pub format: String,
}

/// (De)serialize a `Duration` as fractional seconds
pub(crate) mod serde_secs {
    use std::time::Duration;

    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs)
            .map_err(|_| D::Error::custom(format!("invalid duration in seconds: {}", secs)))
    }
}
