use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::command;
use super::probe::parse_video_properties;
use super::runner::{CommandRunner, Invocation};
use super::types::{ValidationResult, VideoSettings};
use crate::config::Config;
use crate::error::{CompositionError, CompositorError, FileRole, RenderStage, Result, ValidationError};

pub const AUDIO_EXTENSIONS: [&str; 5] = ["mp3", "wav", "aac", "m4a", "ogg"];
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "gif", "webp"];

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Checks media files before and after composition
#[async_trait]
pub trait Validator: Send + Sync {
    /// Probe a rendered video and compare it to `expected`
    ///
    /// Mismatches are reported in the result; `Err` means the video could not
    /// be inspected at all.
    async fn validate_video(&self, path: &Path, expected: &VideoSettings) -> Result<ValidationResult>;

    async fn validate_audio_file(&self, path: &Path) -> Result<()>;

    async fn validate_image_file(&self, path: &Path) -> Result<()>;
}

/// [`Validator`] using file signatures and ffprobe
pub struct MediaValidator {
    runner: Arc<dyn CommandRunner>,
    ffprobe: PathBuf,
    probe_audio: bool,
}

impl MediaValidator {
    pub fn new<P: Into<PathBuf>>(runner: Arc<dyn CommandRunner>, ffprobe: P) -> Self {
        Self {
            runner,
            ffprobe: ffprobe.into(),
            probe_audio: true,
        }
    }

    pub fn from_config(config: &Config, runner: Arc<dyn CommandRunner>) -> Self {
        Self::new(runner, config.tools.ffprobe_path()).with_audio_probe(config.validation.probe_audio)
    }

    /// Toggle the ffprobe check on audio files
    pub fn with_audio_probe(mut self, enabled: bool) -> Self {
        self.probe_audio = enabled;
        self
    }
}

#[async_trait]
impl Validator for MediaValidator {
    async fn validate_video(&self, path: &Path, expected: &VideoSettings) -> Result<ValidationResult> {
        info!(
            "Validating video {:?} (expected {}x{} {} @ {}fps)",
            path, expected.width, expected.height, expected.format, expected.fps
        );

        let metadata = tokio::fs::metadata(path).await.map_err(|_| CompositorError::NotFound {
            role: FileRole::Video,
            path: path.to_path_buf(),
        })?;

        let invocation = Invocation::new(&self.ffprobe, command::video_probe_args(path), RenderStage::VideoProbe);
        let output = self.runner.run(&invocation).await?;
        if !output.success {
            return Err(CompositionError::ProcessFailed {
                stage: RenderStage::VideoProbe,
                path: path.to_path_buf(),
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            }
            .into());
        }

        let props = parse_video_properties(&output.stdout, path);
        let mut errors = Vec::new();

        let width_off = expected.width > 0 && props.width != expected.width;
        let height_off = expected.height > 0 && props.height != expected.height;
        if expected.width > 0 && expected.height > 0 {
            if width_off || height_off {
                errors.push(format!(
                    "video dimensions do not match expected: got {}x{}, expected {}x{}",
                    props.width, props.height, expected.width, expected.height
                ));
            }
        } else if width_off {
            errors.push(format!(
                "video width does not match expected: got {}, expected {}",
                props.width, expected.width
            ));
        } else if height_off {
            errors.push(format!(
                "video height does not match expected: got {}, expected {}",
                props.height, expected.height
            ));
        }

        if !expected.format.is_empty() && props.format != expected.format {
            errors.push(format!(
                "video format does not match expected: got {}, expected {}",
                props.format, expected.format
            ));
        }

        if expected.fps > 0 && props.fps > 0 && props.fps.abs_diff(expected.fps) > 1 {
            errors.push(format!(
                "video FPS does not match expected: got {}, expected {}",
                props.fps, expected.fps
            ));
        }

        if props.duration.as_secs() < 1 {
            errors.push("video duration is too short".to_string());
        }

        let result = ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            width: props.width,
            height: props.height,
            duration: props.duration,
            file_size: metadata.len(),
            format: props.format,
        };

        info!(
            "Video validation finished: valid={} ({} error(s))",
            result.is_valid,
            result.errors.len()
        );
        Ok(result)
    }

    async fn validate_audio_file(&self, path: &Path) -> Result<()> {
        debug!("Validating audio file {:?}", path);

        require_file(path, FileRole::Audio)?;
        check_extension(path, FileRole::Audio, &AUDIO_EXTENSIONS)?;

        if self.probe_audio {
            let invocation = Invocation::new(&self.ffprobe, command::audio_probe_args(path), RenderStage::AudioProbe);
            let output = self.runner.run(&invocation).await?;
            if !output.success {
                return Err(ValidationError::Unreadable {
                    role: FileRole::Audio,
                    path: path.to_path_buf(),
                    reason: output.stderr.trim().to_string(),
                }
                .into());
            }
        }

        debug!("Audio file passed validation: {:?}", path);
        Ok(())
    }

    async fn validate_image_file(&self, path: &Path) -> Result<()> {
        debug!("Validating image file {:?}", path);

        require_file(path, FileRole::ImageFile)?;
        let extension = check_extension(path, FileRole::ImageFile, &IMAGE_EXTENSIONS)?;

        let header = read_header(path)?;
        check_signature(path, &extension, &header)?;

        debug!("Image file passed validation: {:?}", path);
        Ok(())
    }
}

fn require_file(path: &Path, role: FileRole) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(CompositorError::NotFound {
            role,
            path: path.to_path_buf(),
        })
    }
}

/// Lowercased extension, if it is one of `allowed`
fn check_extension(path: &Path, role: FileRole, allowed: &[&'static str]) -> Result<String> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default();

    if allowed.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(ValidationError::InvalidExtension {
            role,
            path: path.to_path_buf(),
            extension,
            allowed: allowed.to_vec(),
        }
        .into())
    }
}

fn read_header(path: &Path) -> Result<Vec<u8>> {
    let file = std::fs::File::open(path).map_err(|e| ValidationError::Unreadable {
        role: FileRole::ImageFile,
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut header = Vec::with_capacity(PNG_SIGNATURE.len());
    file.take(PNG_SIGNATURE.len() as u64)
        .read_to_end(&mut header)
        .map_err(|e| ValidationError::Unreadable {
            role: FileRole::ImageFile,
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(header)
}

fn check_signature(path: &Path, extension: &str, header: &[u8]) -> Result<()> {
    if header.len() < 4 {
        return Err(ValidationError::FileTooSmall {
            path: path.to_path_buf(),
            len: header.len(),
        }
        .into());
    }

    let format = match extension {
        "jpg" | "jpeg" if !header.starts_with(&[0xFF, 0xD8, 0xFF]) => "JPEG",
        "png" if !header.starts_with(&PNG_SIGNATURE) => "PNG",
        "gif" if !(header.starts_with(b"GIF87a") || header.starts_with(b"GIF89a")) => "GIF",
        _ => return Ok(()),
    };

    Err(ValidationError::InvalidSignature {
        format,
        path: path.to_path_buf(),
    }
    .into())
}
