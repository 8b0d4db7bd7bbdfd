use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::command::{self, MultiImageInputs};
use super::runner::{CommandRunner, Invocation, ProcessOutput, ProcessRunner};
use super::types::{ComposeVideoRequest, ComposeVideoResponse, ImageFrame};
use crate::config::Config;
use crate::error::{CompositionError, CompositorError, FileRole, RenderStage, Result};

/// Longest stderr excerpt carried in an error
const STDERR_TAIL: usize = 2000;

/// Renders videos and extracts metadata from them
#[async_trait]
pub trait Composer: Send + Sync {
    /// Render the request's images and audio into a video file
    async fn compose_video(&self, request: &ComposeVideoRequest) -> Result<ComposeVideoResponse>;

    /// Write a single frame of `video` at `offset` to `output`
    async fn generate_thumbnail(&self, video: &Path, output: &Path, offset: Duration) -> Result<()>;

    /// Length of a media file as reported by ffprobe
    async fn get_duration(&self, path: &Path) -> Result<Duration>;
}

/// [`Composer`] backed by the ffmpeg and ffprobe command-line tools
pub struct FfmpegComposer {
    runner: Arc<dyn CommandRunner>,
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    ken_burns: bool,
}

impl FfmpegComposer {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(runner: Arc<dyn CommandRunner>, ffmpeg: P, ffprobe: Q) -> Self {
        Self {
            runner,
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            ken_burns: false,
        }
    }

    /// Build a composer running real processes with the configured tools
    pub fn from_config(config: &Config) -> Self {
        let runner = Arc::new(ProcessRunner::with_timeout(config.tools.timeout()));
        Self::new(runner, &config.tools.ffmpeg_path, config.tools.ffprobe_path())
            .with_ken_burns(config.render.ken_burns)
    }

    /// Animate stills with their Ken Burns settings instead of holding them
    pub fn with_ken_burns(mut self, enabled: bool) -> Self {
        self.ken_burns = enabled;
        self
    }

    fn check_inputs(&self, request: &ComposeVideoRequest) -> Result<()> {
        for (i, image) in request.images.iter().enumerate() {
            require_file(&image.path, FileRole::Image(i))?;
        }
        if let Some(narration) = non_empty(&request.narration_audio_path) {
            require_file(narration, FileRole::Narration)?;
        }
        if let Some(music) = request.background_music_path.as_deref().and_then(non_empty) {
            require_file(music, FileRole::BackgroundMusic)?;
        }
        Ok(())
    }

    fn render_invocation(&self, request: &ComposeVideoRequest) -> Result<Invocation> {
        let narration = non_empty(&request.narration_audio_path);
        let music = request.background_music_path.as_deref().and_then(non_empty);

        if request.images.len() == 1 && !self.ken_burns {
            let image = &request.images[0];
            let args = command::single_image_args(
                &image.path,
                narration.or(music),
                &request.settings,
                expected_duration(&request.images),
                &request.output_path,
            );
            return Ok(Invocation::new(&self.ffmpeg, args, RenderStage::SingleImage));
        }

        let inputs = MultiImageInputs {
            images: &request.images,
            narration,
            background_music: music,
            settings: &request.settings,
            ken_burns: self.ken_burns,
        };
        let args = command::multi_image_args(&inputs, &request.output_path)?;
        Ok(Invocation::new(&self.ffmpeg, args, RenderStage::MultiImage))
    }

    async fn run_checked(&self, invocation: &Invocation, subject: &Path) -> Result<ProcessOutput> {
        let output = self.runner.run(invocation).await?;
        if !output.success {
            warn!("{} failed for {:?} with {:?}", invocation.stage, subject, output.code);
            return Err(CompositionError::ProcessFailed {
                stage: invocation.stage,
                path: subject.to_path_buf(),
                code: output.code,
                stderr: stderr_tail(&output.stderr),
            }
            .into());
        }
        Ok(output)
    }
}

#[async_trait]
impl Composer for FfmpegComposer {
    async fn compose_video(&self, request: &ComposeVideoRequest) -> Result<ComposeVideoResponse> {
        info!(
            "Composing {} image(s) into {:?}",
            request.images.len(),
            request.output_path
        );
        debug!(
            "Narration: {:?}, background music: {:?}",
            request.narration_audio_path, request.background_music_path
        );

        if request.images.is_empty() {
            return Err(crate::error::ValidationError::Required { field: "images" }.into());
        }

        self.check_inputs(request)?;
        create_parent_dir(&request.output_path).await?;

        let started = Instant::now();
        let invocation = self.render_invocation(request)?;
        self.run_checked(&invocation, &request.output_path).await?;

        let metadata = tokio::fs::metadata(&request.output_path)
            .await
            .map_err(|e| CompositionError::OutputUnreadable {
                path: request.output_path.clone(),
                reason: e.to_string(),
            })?;

        let duration = match self.get_duration(&request.output_path).await {
            Ok(duration) => duration,
            Err(e) => {
                warn!("Failed to probe output duration, using image total: {}", e);
                expected_duration(&request.images)
            }
        };

        let thumbnail_path = match &request.thumbnail {
            Some(thumbnail) => {
                self.generate_thumbnail(&request.output_path, &thumbnail.path, thumbnail.offset)
                    .await?;
                Some(thumbnail.path.clone())
            }
            None => None,
        };

        info!(
            "Video composed: {:?} ({} bytes, {:.2}s) in {:.1}s",
            request.output_path,
            metadata.len(),
            duration.as_secs_f64(),
            started.elapsed().as_secs_f64()
        );

        Ok(ComposeVideoResponse {
            output_path: request.output_path.clone(),
            duration,
            file_size: metadata.len(),
            thumbnail_path,
        })
    }

    async fn generate_thumbnail(&self, video: &Path, output: &Path, offset: Duration) -> Result<()> {
        info!("Generating thumbnail for {:?} at {:.2}s", video, offset.as_secs_f64());

        require_file(video, FileRole::Video)?;
        create_parent_dir(output).await?;

        let invocation = Invocation::new(
            &self.ffmpeg,
            command::thumbnail_args(video, offset, output),
            RenderStage::Thumbnail,
        );
        self.run_checked(&invocation, video).await?;

        debug!("Thumbnail written to {:?}", output);
        Ok(())
    }

    async fn get_duration(&self, path: &Path) -> Result<Duration> {
        require_file(path, FileRole::Video)?;

        let invocation = Invocation::new(
            &self.ffprobe,
            command::duration_probe_args(path),
            RenderStage::DurationProbe,
        );
        let output = self.run_checked(&invocation, path).await?;

        super::probe::parse_duration(&output.stdout).ok_or_else(|| {
            CompositionError::ProbeParse {
                what: "duration",
                path: path.to_path_buf(),
            }
            .into()
        })
    }
}

/// Sum of the image durations, used when the output cannot be probed
fn expected_duration(images: &[ImageFrame]) -> Duration {
    images.iter().map(|image| image.duration).sum()
}

fn non_empty(path: &Path) -> Option<&Path> {
    (!path.as_os_str().is_empty()).then_some(path)
}

fn require_file(path: &Path, role: FileRole) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(CompositorError::NotFound {
            role,
            path: path.to_path_buf(),
        })
    }
}

async fn create_parent_dir(path: &Path) -> Result<()> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };

    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| CompositionError::OutputDirectory {
            path: parent.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(())
}

fn stderr_tail(stderr: &str) -> String {
    let trimmed = stderr.trim_end();
    if trimmed.len() <= STDERR_TAIL {
        return trimmed.to_string();
    }

    let mut start = trimmed.len() - STDERR_TAIL;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    trimmed[start..].to_string()
}
