use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    video::{derive_ffprobe_path, types::serde_secs, VideoSettings},
};

/// Main configuration for the shorts compositor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External tool locations and limits
    pub tools: ToolsConfig,

    /// Default output settings for manifests that omit them
    pub video: VideoSettings,

    /// Timing and validation heuristics
    pub composition: CompositionConfig,

    /// Default pan/zoom synthesis
    pub motion: MotionConfig,

    /// Filter graph options
    pub render: RenderConfig,

    /// Input checks
    pub validation: ValidationConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.tools.validate()?;
        self.video.validate().map_err(|e| ConfigError::InvalidValue {
            key: "video".to_string(),
            value: e.to_string(),
        })?;
        self.composition.validate()?;
        Ok(())
    }
}

/// Where to find ffmpeg/ffprobe and how long to let them run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// ffmpeg binary (bare names are looked up on PATH)
    pub ffmpeg_path: PathBuf,

    /// ffprobe binary; derived from `ffmpeg_path` when unset
    pub ffprobe_path: Option<PathBuf>,

    /// Upper bound for each external process, in seconds
    pub timeout_secs: Option<u64>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: None,
            timeout_secs: None,
        }
    }
}

impl ToolsConfig {
    pub fn ffprobe_path(&self) -> PathBuf {
        self.ffprobe_path
            .clone()
            .unwrap_or_else(|| derive_ffprobe_path(&self.ffmpeg_path))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.ffmpeg_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "tools.ffmpeg_path".to_string(),
                value: String::new(),
            }.into());
        }

        if self.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "tools.timeout_secs".to_string(),
                value: "0".to_string(),
            }.into());
        }

        Ok(())
    }
}

/// Composition heuristics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionConfig {
    /// Screen time per image when the total has to be estimated
    #[serde(with = "serde_secs")]
    pub seconds_per_image: Duration,

    /// Take the total length from the narration track when it can be probed
    pub probe_narration: bool,

    /// Check the rendered video against the requested settings (CLI)
    pub validate_output: bool,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            seconds_per_image: Duration::from_secs(3),
            probe_narration: false,
            validate_output: true,
        }
    }
}

impl CompositionConfig {
    fn validate(&self) -> Result<()> {
        if self.seconds_per_image.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "composition.seconds_per_image".to_string(),
                value: "0".to_string()
            }.into());
        }

        Ok(())
    }
}

/// Default pan/zoom synthesis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Seed for reproducible motion; fresh entropy per scene when unset
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Animate each still with its Ken Burns settings
    pub ken_burns: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Run ffprobe over audio inputs
    pub probe_audio: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { probe_audio: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tools.ffprobe_path(), PathBuf::from("ffprobe"));
        assert_eq!(config.tools.timeout(), None);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        original_config.tools.timeout_secs = Some(600);
        original_config.motion.seed = Some(42);
        original_config.composition.seconds_per_image = Duration::from_millis(2500);

        // Save and load
        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [tools]
            ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"

            [video]
            width = 720
            height = 1280
            "#,
        )
        .unwrap();

        assert_eq!(config.tools.ffprobe_path(), PathBuf::from("/opt/ffmpeg/bin/ffprobe"));
        assert_eq!(config.video.width, 720);
        assert_eq!(config.video.fps, 30);
        assert_eq!(config.composition.seconds_per_image, Duration::from_secs(3));
        assert!(config.validation.probe_audio);
    }

    #[test]
    fn test_invalid_video_settings() {
        let mut config = Config::default();
        config.video.fps = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.video.background_music_volume = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_tools_and_composition() {
        let mut config = Config::default();
        config.tools.timeout_secs = Some(0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.composition.seconds_per_image = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let err = Config::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(err.user_message().contains("absent.toml"));
    }
}
