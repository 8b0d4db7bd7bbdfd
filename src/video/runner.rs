use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{CompositionError, RenderStage, Result};

/// One external process call: program, arguments and what it is for
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub stage: RenderStage,
}

impl Invocation {
    pub fn new<P: Into<PathBuf>>(program: P, args: Vec<String>, stage: RenderStage) -> Self {
        Self {
            program: program.into(),
            args,
            stage,
        }
    }

    /// Command line for logs
    pub fn display(&self) -> String {
        format!("{} {}", self.program.display(), self.args.join(" "))
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn ok<S: Into<String>>(stdout: S) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed<S: Into<String>>(code: i32, stderr: S) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Executes external tools on behalf of the composer, validator and checker
///
/// A non-zero exit is reported through [`ProcessOutput`]; `Err` means the
/// process could not be run to completion at all.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput>;
}

/// Runs processes with `tokio::process`
///
/// Children are killed when the future running them is dropped, so cancelling
/// a composition also stops its ffmpeg.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound every process by `timeout`
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        debug!("Running {}: {}", invocation.stage, invocation.display());

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let spawn_error = |e: std::io::Error| CompositionError::Spawn {
            stage: invocation.stage,
            program: invocation.program.clone(),
            reason: e.to_string(),
        };

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, command.output()).await {
                Ok(result) => result.map_err(spawn_error)?,
                Err(_) => {
                    warn!("{} exceeded {:.1}s, killing it", invocation.stage, limit.as_secs_f64());
                    return Err(CompositionError::TimedOut {
                        stage: invocation.stage,
                        secs: limit.as_secs_f64(),
                    }
                    .into());
                }
            },
            None => command.output().await.map_err(spawn_error)?,
        };

        let result = ProcessOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.success {
            debug!("{} exited with {:?}", invocation.stage, result.code);
        }

        Ok(result)
    }
}
