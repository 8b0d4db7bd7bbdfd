use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use super::probe::parse_version;
use super::runner::{CommandRunner, Invocation};
use crate::config::Config;
use crate::error::{DependencyError, RenderStage, Result};

/// Versions of the external tools found on this machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolReport {
    pub ffmpeg_path: PathBuf,
    pub ffmpeg_version: String,
    pub ffprobe_path: PathBuf,
    pub ffprobe_version: String,
}

/// Derive the ffprobe location from an ffmpeg path
///
/// Only the file name is rewritten, so `/opt/ffmpeg/bin/ffmpeg` becomes
/// `/opt/ffmpeg/bin/ffprobe`.
pub fn derive_ffprobe_path(ffmpeg: &Path) -> PathBuf {
    match ffmpeg.file_name().and_then(|name| name.to_str()) {
        Some(name) if name.contains("ffmpeg") => ffmpeg.with_file_name(name.replacen("ffmpeg", "ffprobe", 1)),
        _ => PathBuf::from("ffprobe"),
    }
}

/// Confirms ffmpeg and ffprobe run and reports their versions
pub struct ToolChecker {
    runner: Arc<dyn CommandRunner>,
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl ToolChecker {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(runner: Arc<dyn CommandRunner>, ffmpeg: P, ffprobe: Q) -> Self {
        Self {
            runner,
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    pub fn from_config(config: &Config, runner: Arc<dyn CommandRunner>) -> Self {
        Self::new(runner, &config.tools.ffmpeg_path, config.tools.ffprobe_path())
    }

    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg
    }

    pub fn ffprobe_path(&self) -> &Path {
        &self.ffprobe
    }

    pub async fn check_ffmpeg(&self) -> Result<()> {
        self.ffmpeg_version().await.map(|_| ())
    }

    pub async fn check_ffprobe(&self) -> Result<()> {
        self.ffprobe_version().await.map(|_| ())
    }

    pub async fn ffmpeg_version(&self) -> Result<String> {
        self.version("ffmpeg", &self.ffmpeg).await
    }

    pub async fn ffprobe_version(&self) -> Result<String> {
        self.version("ffprobe", &self.ffprobe).await
    }

    /// Check both tools, ffmpeg first
    pub async fn check_all(&self) -> Result<ToolReport> {
        let ffmpeg_version = self
            .ffmpeg_version()
            .await
            .map_err(|e| e.context("ffmpeg check failed"))?;
        let ffprobe_version = self
            .ffprobe_version()
            .await
            .map_err(|e| e.context("ffprobe check failed"))?;

        info!("Found ffmpeg {} and ffprobe {}", ffmpeg_version, ffprobe_version);

        Ok(ToolReport {
            ffmpeg_path: self.ffmpeg.clone(),
            ffmpeg_version,
            ffprobe_path: self.ffprobe.clone(),
            ffprobe_version,
        })
    }

    async fn version(&self, tool: &'static str, path: &Path) -> Result<String> {
        debug!("Checking {} at {:?}", tool, path);

        let invocation = Invocation::new(path, vec!["-version".to_string()], RenderStage::VersionCheck);
        let output = self.runner.run(&invocation).await.map_err(|e| DependencyError::Unavailable {
            tool,
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if !output.success {
            return Err(DependencyError::Unavailable {
                tool,
                path: path.to_path_buf(),
                reason: format!("exited with {:?}: {}", output.code, output.stderr.trim()),
            }
            .into());
        }

        parse_version(&output.stdout, tool).ok_or_else(|| {
            DependencyError::VersionUnparsed {
                tool,
                path: path.to_path_buf(),
                output: output.stdout.clone(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CompositionError, CompositorError, ErrorKind};
    use crate::video::runner::fake::FakeRunner;
    use crate::video::runner::ProcessOutput;

    const FFMPEG_BANNER: &str = "ffmpeg version 6.1.1 Copyright (c) 2000-2023 the FFmpeg developers\n";
    const FFPROBE_BANNER: &str = "ffprobe version 6.1.1 Copyright (c) 2007-2023 the FFmpeg developers\n";

    #[test]
    fn test_ffprobe_path_derivation() {
        assert_eq!(derive_ffprobe_path(Path::new("ffmpeg")), PathBuf::from("ffprobe"));
        assert_eq!(
            derive_ffprobe_path(Path::new("/opt/ffmpeg/bin/ffmpeg")),
            PathBuf::from("/opt/ffmpeg/bin/ffprobe")
        );
        assert_eq!(
            derive_ffprobe_path(Path::new("C:/tools/ffmpeg.exe")),
            PathBuf::from("C:/tools/ffprobe.exe")
        );
        assert_eq!(derive_ffprobe_path(Path::new("/usr/bin/avconv")), PathBuf::from("ffprobe"));
    }

    #[tokio::test]
    async fn test_check_all_reports_versions() {
        let runner = Arc::new(
            FakeRunner::new()
                .respond(RenderStage::VersionCheck, ProcessOutput::ok(FFMPEG_BANNER))
                .respond(RenderStage::VersionCheck, ProcessOutput::ok(FFPROBE_BANNER)),
        );
        let checker = ToolChecker::new(runner.clone(), "/usr/bin/ffmpeg", "/usr/bin/ffprobe");

        let report = checker.check_all().await.unwrap();
        assert_eq!(report.ffmpeg_version, "6.1.1");
        assert_eq!(report.ffprobe_version, "6.1.1");

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].program, PathBuf::from("/usr/bin/ffmpeg"));
        assert_eq!(calls[0].args, vec!["-version".to_string()]);
        assert_eq!(calls[1].program, PathBuf::from("/usr/bin/ffprobe"));
    }

    #[tokio::test]
    async fn test_wrong_banner_is_unavailable() {
        let runner = Arc::new(FakeRunner::new().respond(RenderStage::VersionCheck, ProcessOutput::ok("avconv 12\n")));
        let checker = ToolChecker::new(runner, "ffmpeg", "ffprobe");

        let err = checker.check_ffmpeg().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DependencyUnavailable);
        assert!(matches!(
            err,
            CompositorError::Dependency(DependencyError::VersionUnparsed { tool: "ffmpeg", .. })
        ));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_unavailable() {
        let runner = Arc::new(FakeRunner::new().fail_with(
            RenderStage::VersionCheck,
            CompositionError::Spawn {
                stage: RenderStage::VersionCheck,
                program: PathBuf::from("ffmpeg"),
                reason: "No such file or directory".to_string(),
            }
            .into(),
        ));
        let checker = ToolChecker::new(runner, "ffmpeg", "ffprobe");

        let err = checker.check_all().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DependencyUnavailable);
        assert!(err.to_string().starts_with("ffmpeg check failed"));
        assert!(err.user_message().contains("tools.ffmpeg_path"));
    }

    #[tokio::test]
    async fn test_ffprobe_failure_after_ffmpeg_passes() {
        let runner = Arc::new(
            FakeRunner::new()
                .respond(RenderStage::VersionCheck, ProcessOutput::ok(FFMPEG_BANNER))
                .respond(RenderStage::VersionCheck, ProcessOutput::failed(127, "not found")),
        );
        let checker = ToolChecker::new(runner, "ffmpeg", "ffprobe");

        let err = checker.check_all().await.unwrap_err();
        assert!(err.to_string().starts_with("ffprobe check failed"));
        assert!(err.to_string().contains("127"));
    }
}
