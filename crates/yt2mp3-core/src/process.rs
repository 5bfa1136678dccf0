//! Bounded invocation of external tools (yt-dlp, ffmpeg)
//!
//! Every child is spawned with `kill_on_drop`, so when a timeout fires the
//! process is killed rather than left running in the background.

use std::ffi::OsStr;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn, Instrument};

#[derive(Error, Debug)]
pub enum RunError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {}s", .after.as_secs())]
    TimedOut { program: String, after: Duration },
}

/// Collected result of a finished tool invocation
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    /// Last few lines of stderr, for error messages.
    pub fn stderr_tail(&self) -> String {
        stderr_tail(&self.stderr, 5)
    }
}

fn stderr_tail(stderr: &str, lines: usize) -> String {
    let all: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}

fn program_name(program: &Path) -> String {
    program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string())
}

fn command<I, S>(program: &Path, args: I) -> Command
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// Run a tool to completion and capture its stdout/stderr.
pub async fn run_captured<I, S>(
    program: &Path,
    args: I,
    timeout: Duration,
) -> Result<ToolOutput, RunError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let name = program_name(program);
    let mut cmd = command(program, args);
    debug!("running {:?}", cmd.as_std());

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => return Err(RunError::Spawn { program: name, source }),
        Err(_) => {
            return Err(RunError::TimedOut {
                program: name,
                after: timeout,
            })
        }
    };

    Ok(ToolOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Run a tool while forwarding its output line by line to the log.
///
/// Used for long-running downloads where buffering everything is pointless.
pub async fn run_logged<I, S>(
    program: &Path,
    args: I,
    timeout: Duration,
) -> Result<ExitStatus, RunError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let name = program_name(program);
    let mut cmd = command(program, args);
    debug!("running {:?}", cmd.as_std());

    let mut child = cmd.spawn().map_err(|source| RunError::Spawn {
        program: name.clone(),
        source,
    })?;

    if let Some(stdout) = child.stdout.take() {
        let mut lines = BufReader::new(stdout).lines();
        let tag = name.clone();
        tokio::spawn(
            async move {
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("{}: {}", tag, line);
                }
            }
            .in_current_span(),
        );
    }

    if let Some(stderr) = child.stderr.take() {
        let mut lines = BufReader::new(stderr).lines();
        let tag = name.clone();
        tokio::spawn(
            async move {
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!("{} stderr: {}", tag, line);
                }
            }
            .in_current_span(),
        );
    }

    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => Ok(status),
        Ok(Err(source)) => Err(RunError::Spawn { program: name, source }),
        Err(_) => {
            if let Err(e) = child.kill().await {
                warn!("failed to kill {} after timeout: {}", name, e);
            }
            Err(RunError::TimedOut {
                program: name,
                after: timeout,
            })
        }
    }
}
