use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::motion::{MotionSource, RandomMotion};
use super::timing::{distribute_timing, estimate_total_duration};
use crate::config::CompositionConfig;
use crate::effects::KenBurnsEffect;
use crate::error::{Result, ValidationError};
use crate::video::{ComposeVideoRequest, ComposeVideoResponse, Composer, ImageFrame, Validator};

/// Validates and enriches composition requests before rendering them
///
/// The pipeline for each request:
/// 1. Request structure - images, output path, narration
/// 2. Output settings - dimensions, frame rate, volumes
/// 3. Input files - every image and audio track through the [`Validator`]
/// 4. Timing - per-image durations when any are missing
/// 5. Motion - Ken Burns settings for images without them
/// 6. Rendering - delegated to the [`Composer`]
pub struct CompositionService {
    composer: Arc<dyn Composer>,
    validator: Arc<dyn Validator>,
    motion: Box<dyn MotionSource>,
    config: CompositionConfig,
}

impl CompositionService {
    /// Create a service with default heuristics and unseeded random motion
    pub fn new(composer: Arc<dyn Composer>, validator: Arc<dyn Validator>) -> Self {
        Self {
            composer,
            validator,
            motion: Box::new(RandomMotion::default()),
            config: CompositionConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CompositionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_motion(mut self, motion: Box<dyn MotionSource>) -> Self {
        self.motion = motion;
        self
    }

    /// Validate `request`, fill in timing and motion, then render it
    ///
    /// The first failing step aborts the pipeline; nothing is retried.
    pub async fn compose_video(&self, request: &ComposeVideoRequest) -> Result<ComposeVideoResponse> {
        info!(
            "🎬 Starting video composition: {} image(s) -> {:?}",
            request.images.len(),
            request.output_path
        );

        // Step 1: request structure
        validate_request(request).map_err(|e| e.context("invalid request"))?;

        // Step 2: output settings
        request
            .settings
            .validate()
            .map_err(|e| e.context("invalid video settings"))?;

        // Step 3: input files
        self.validate_input_files(request)
            .await
            .map_err(|e| e.context("input validation failed"))?;

        // Steps 4 and 5: timing and motion
        let images = self.prepare_images(request).await?;

        let prepared = ComposeVideoRequest {
            images,
            ..request.clone()
        };

        // Step 6: rendering
        let response = self
            .composer
            .compose_video(&prepared)
            .await
            .map_err(|e| e.context("video composition failed"))?;

        info!(
            "🎉 Video composition complete: {:?} ({:.2}s, {} bytes)",
            response.output_path,
            response.duration.as_secs_f64(),
            response.file_size
        );
        Ok(response)
    }

    async fn validate_input_files(&self, request: &ComposeVideoRequest) -> Result<()> {
        debug!("Validating {} image(s) and audio inputs", request.images.len());

        for (i, image) in request.images.iter().enumerate() {
            self.validator
                .validate_image_file(&image.path)
                .await
                .map_err(|e| e.context(format!("failed to validate image {} ({})", i, image.path.display())))?;
        }

        let narration = &request.narration_audio_path;
        self.validator
            .validate_audio_file(narration)
            .await
            .map_err(|e| e.context(format!("failed to validate narration audio ({})", narration.display())))?;

        if let Some(music) = &request.background_music_path {
            self.validator
                .validate_audio_file(music)
                .await
                .map_err(|e| e.context(format!("failed to validate background music ({})", music.display())))?;
        }

        Ok(())
    }

    async fn prepare_images(&self, request: &ComposeVideoRequest) -> Result<Vec<ImageFrame>> {
        let mut images = request.images.clone();

        if images.iter().any(|image| image.duration.is_zero()) {
            let total = self.total_duration(request).await;
            debug!(
                "Distributing {:.2}s across {} image(s)",
                total.as_secs_f64(),
                images.len()
            );
            distribute_timing(&mut images, total, request.transition_duration);
        }

        let ken_burns = KenBurnsEffect::new();
        let total_scenes = images.len();
        for (i, image) in images.iter_mut().enumerate() {
            let config = match image.ken_burns {
                Some(config) => config,
                None => {
                    let generated = self.motion.ken_burns_for(i, total_scenes);
                    debug!("Generated motion for image {}: {:?}", i, generated);
                    image.ken_burns = Some(generated);
                    generated
                }
            };

            ken_burns
                .calculate_parameters(&config, image.duration)
                .map_err(|e| e.context(format!("invalid Ken Burns settings for image {}", i)))?;
        }

        Ok(images)
    }

    /// Total video length to share between the images
    async fn total_duration(&self, request: &ComposeVideoRequest) -> Duration {
        let count = request.images.len();
        let gap = request.transition_duration;
        let gaps = gap * count.saturating_sub(1) as u32;

        if self.config.probe_narration {
            match self.composer.get_duration(&request.narration_audio_path).await {
                Ok(length) if length > gaps => {
                    debug!("Narration runs {:.2}s", length.as_secs_f64());
                    return length;
                }
                Ok(length) => warn!(
                    "Narration ({:.2}s) is shorter than the transitions, estimating instead",
                    length.as_secs_f64()
                ),
                Err(e) => warn!("Could not probe narration, estimating instead: {}", e),
            }
        }

        estimate_total_duration(count, self.config.seconds_per_image, gap)
    }
}

fn validate_request(request: &ComposeVideoRequest) -> Result<()> {
    if request.images.is_empty() {
        return Err(ValidationError::Required { field: "images" }.into());
    }

    if is_empty(&request.output_path) {
        return Err(ValidationError::Required { field: "output_path" }.into());
    }

    if is_empty(&request.narration_audio_path) {
        return Err(ValidationError::Required {
            field: "narration_audio_path",
        }
        .into());
    }

    let extension = request
        .output_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default();
    if extension != "mp4" {
        return Err(ValidationError::OutputExtension {
            path: request.output_path.clone(),
            extension,
        }
        .into());
    }

    Ok(())
}

fn is_empty(path: &Path) -> bool {
    path.as_os_str().is_empty()
}
