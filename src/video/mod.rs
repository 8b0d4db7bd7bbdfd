//! # Video Module
//!
//! Request/response types and the adapter to the ffmpeg toolchain: rendering,
//! probing, validation and tool discovery. Every external process goes
//! through a [`CommandRunner`], so the adapters can be exercised without
//! ffmpeg installed.

pub mod checker;
pub mod command;
pub mod composer;
pub mod probe;
pub mod runner;
pub mod types;
pub mod validator;

pub use checker::{derive_ffprobe_path, ToolChecker, ToolReport};
pub use composer::{Composer, FfmpegComposer};
pub use runner::{CommandRunner, Invocation, ProcessOutput, ProcessRunner};
pub use types::{
    ComposeVideoRequest, ComposeVideoResponse, ImageFrame, ThumbnailRequest, ValidationResult,
    VideoSettings,
};
pub use validator::{MediaValidator, Validator};
