use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the shorts compositor
#[derive(Error, Debug)]
pub enum CompositorError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Dependency unavailable: {0}")]
    Dependency(#[from] DependencyError),

    #[error("Composition failed: {0}")]
    Composition(#[from] CompositionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{role} not found: {}", path.display())]
    NotFound { role: FileRole, path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<CompositorError>,
    },
}

/// Malformed or out-of-range caller input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be greater than 0, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("output path must have .mp4 extension: {} (extension: {extension:?})", path.display())]
    OutputExtension { path: PathBuf, extension: String },

    #[error("invalid {role} extension {extension:?} for {} (allowed: {})", path.display(), allowed.join(", "))]
    InvalidExtension {
        role: FileRole,
        path: PathBuf,
        extension: String,
        allowed: Vec<&'static str>,
    },

    #[error("invalid {format} file signature: {}", path.display())]
    InvalidSignature { format: &'static str, path: PathBuf },

    #[error("image file too small: {} ({len} bytes)", path.display())]
    FileTooSmall { path: PathBuf, len: usize },

    #[error("{role} is unreadable or corrupted: {} ({reason})", path.display())]
    Unreadable {
        role: FileRole,
        path: PathBuf,
        reason: String,
    },

    #[error("unknown {kind}: {value:?}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("unknown effect type: {tag:?}")]
    UnknownEffect { tag: String },

    #[error("{effect} effect parameters are required")]
    MissingEffectParameters { effect: &'static str },
}

/// External binaries missing or non-functional
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DependencyError {
    #[error("{tool} binary not found or failed to execute at {}: {reason}", path.display())]
    Unavailable {
        tool: &'static str,
        path: PathBuf,
        reason: String,
    },

    #[error("{tool} binary found at {} but version check failed", path.display())]
    VersionUnparsed {
        tool: &'static str,
        path: PathBuf,
        output: String,
    },
}

/// The external process failed or its output could not be produced/read
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompositionError {
    #[error("{stage} failed for {} (exit code {code:?}): {stderr}", path.display())]
    ProcessFailed {
        stage: RenderStage,
        path: PathBuf,
        code: Option<i32>,
        stderr: String,
    },

    #[error("failed to launch {} for {stage}: {reason}", program.display())]
    Spawn {
        stage: RenderStage,
        program: PathBuf,
        reason: String,
    },

    #[error("{stage} timed out after {secs:.1}s")]
    TimedOut { stage: RenderStage, secs: f64 },

    #[error("failed to create output directory {}: {reason}", path.display())]
    OutputDirectory { path: PathBuf, reason: String },

    #[error("failed to read output file {}: {reason}", path.display())]
    OutputUnreadable { path: PathBuf, reason: String },

    #[error("failed to parse {what} from ffprobe output for {}", path.display())]
    ProbeParse { what: &'static str, path: PathBuf },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}: {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Which external invocation an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderStage {
    SingleImage,
    MultiImage,
    Thumbnail,
    DurationProbe,
    VideoProbe,
    AudioProbe,
    VersionCheck,
}

impl fmt::Display for RenderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SingleImage => "single-image render",
            Self::MultiImage => "multi-image render",
            Self::Thumbnail => "thumbnail extraction",
            Self::DurationProbe => "duration probe",
            Self::VideoProbe => "video probe",
            Self::AudioProbe => "audio probe",
            Self::VersionCheck => "version check",
        };
        f.write_str(name)
    }
}

/// The part a file plays in a composition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Image(usize),
    /// An image checked on its own, outside a request
    ImageFile,
    Narration,
    BackgroundMusic,
    Audio,
    Video,
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image(index) => write!(f, "image {}", index),
            Self::ImageFile => f.write_str("image file"),
            Self::Narration => f.write_str("narration audio"),
            Self::BackgroundMusic => f.write_str("background music"),
            Self::Audio => f.write_str("audio file"),
            Self::Video => f.write_str("video file"),
        }
    }
}

/// Coarse classification used by callers deciding how to react
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    DependencyUnavailable,
    CompositionFailed,
    NotFound,
    Config,
    Io,
}

/// Convenience type alias for Results using CompositorError
pub type Result<T> = std::result::Result<T, CompositorError>;

impl CompositorError {
    /// Wrap this error with a description of the step that failed
    pub fn context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, looking through any context wrappers
    pub fn root(&self) -> &CompositorError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Classify the error regardless of how many times it was wrapped
    pub fn kind(&self) -> ErrorKind {
        match self.root() {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Dependency(_) => ErrorKind::DependencyUnavailable,
            Self::Composition(_) => ErrorKind::CompositionFailed,
            Self::Config(_) => ErrorKind::Config,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Io(_) => ErrorKind::Io,
            Self::Context { .. } => unreachable!("root() never returns a context wrapper"),
        }
    }

    /// Check if retrying with different inputs could succeed
    ///
    /// Nothing inside this crate retries; this only informs the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.root(),
            Self::Composition(CompositionError::ProcessFailed { .. })
                | Self::Composition(CompositionError::TimedOut { .. })
                | Self::Io(_)
        )
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self.root() {
            Self::Dependency(DependencyError::Unavailable { tool, path, .. }) => {
                format!(
                    "Could not run {} at '{}'. Install it or point tools.{}_path at the binary.",
                    tool,
                    path.display(),
                    tool
                )
            }
            Self::NotFound { role, path } => {
                format!("The {} '{}' does not exist.", role, path.display())
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_survives_context_wrapping() {
        let err: CompositorError = ValidationError::Required {
            field: "narration_audio_path",
        }
        .into();
        let wrapped = err.context("invalid request").context("compose");

        assert_eq!(wrapped.kind(), ErrorKind::Validation);
        assert!(wrapped.to_string().starts_with("compose: invalid request: "));
    }

    #[test]
    fn test_not_found_message_names_role_and_path() {
        let err = CompositorError::NotFound {
            role: FileRole::Image(2),
            path: PathBuf::from("/tmp/scene_2.jpg"),
        };

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "image 2 not found: /tmp/scene_2.jpg");
        assert!(err.user_message().contains("scene_2.jpg"));
    }

    #[test]
    fn test_process_failures_are_recoverable() {
        let err: CompositorError = CompositionError::ProcessFailed {
            stage: RenderStage::MultiImage,
            path: PathBuf::from("out.mp4"),
            code: Some(1),
            stderr: "boom".to_string(),
        }
        .into();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("multi-image render"));

        let err: CompositorError = ValidationError::NotPositive {
            field: "width",
            value: 0.0,
        }
        .into();
        assert!(!err.is_recoverable());
    }
}
