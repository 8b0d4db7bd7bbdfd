//! # Shorts-Compositor
//!
//! Turn a handful of stills, a narration track and optional background music
//! into a vertical short-form video with ffmpeg.
//!
//! This library provides the effect calculators that produce ffmpeg filter
//! expressions, a composition service that validates and completes requests,
//! and the ffmpeg-backed composer, validator and tool checker.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use shorts_compositor::{
//!     composition::{CompositionService, RandomMotion},
//!     config::Config,
//!     video::{
//!         ComposeVideoRequest, FfmpegComposer, ImageFrame, MediaValidator, ProcessRunner,
//!         VideoSettings,
//!     },
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let runner = Arc::new(ProcessRunner::with_timeout(config.tools.timeout()));
//!
//! let service = CompositionService::new(
//!     Arc::new(FfmpegComposer::from_config(&config)),
//!     Arc::new(MediaValidator::from_config(&config, runner)),
//! )
//! .with_motion(Box::new(RandomMotion::new(Some(7))))
//! .with_config(config.composition.clone());
//!
//! let request = ComposeVideoRequest {
//!     images: vec![ImageFrame::new("scene_1.jpg"), ImageFrame::new("scene_2.jpg")],
//!     narration_audio_path: "narration.mp3".into(),
//!     background_music_path: None,
//!     output_path: "story.mp4".into(),
//!     settings: VideoSettings::default(),
//!     transition_duration: std::time::Duration::ZERO,
//!     thumbnail: None,
//! };
//!
//! let response = service.compose_video(&request).await?;
//! println!("{:?} ({:?})", response.output_path, response.duration);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - [`effects`] - Ken Burns, transition, subtitle and watermark filter builders
//! - [`composition`] - Request validation, timing and default motion
//! - [`video`] - Request types and the ffmpeg adapters
//! - [`config`] - Configuration management
//! - [`error`] - Error taxonomy shared by every module

pub mod composition;
pub mod config;
pub mod effects;
pub mod error;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    composition::CompositionService,
    config::Config,
    effects::{EffectChain, VideoEffect},
    error::{CompositorError, ErrorKind, Result},
    video::{ComposeVideoRequest, ComposeVideoResponse, Composer, Validator},
};
