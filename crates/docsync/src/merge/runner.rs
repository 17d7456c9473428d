//! Bounded child-process execution.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command as TokioCommand};
use tracing::{debug, warn};

use super::error::RunError;

/// A fully resolved command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn display(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the child was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Stdout and stderr interleaved in arrival order, one line per line.
    pub combined_output: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs one child to completion or until `limit` elapses.
///
/// Implementations must not return while the child is still running: on
/// timeout the child is killed and reaped before [`RunError::TimedOut`] is
/// returned.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation, limit: Duration) -> Result<ProcessOutput, RunError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, invocation: &Invocation, limit: Duration) -> Result<ProcessOutput, RunError> {
        let mut cmd = TokioCommand::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &invocation.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| RunError::Spawn {
            program: invocation.program.display().to_string(),
            source,
        })?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            reap(&mut child, invocation).await;
            return Err(RunError::Io(std::io::Error::other(
                "child output was not captured",
            )));
        };

        let supervised = tokio::time::timeout(limit, async {
            let combined = read_merged(stdout, stderr).await?;
            let status = child.wait().await?;
            Ok::<_, RunError>(ProcessOutput {
                exit_code: status.code(),
                combined_output: combined,
            })
        })
        .await;

        match supervised {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => {
                warn!(
                    "Lost output of child {}: {}",
                    invocation.program.display(),
                    e
                );
                reap(&mut child, invocation).await;
                Err(e)
            }
            Err(_) => {
                warn!(
                    "Child {} exceeded {:?}, killing it",
                    invocation.program.display(),
                    limit
                );
                reap(&mut child, invocation).await;
                Err(RunError::TimedOut(limit))
            }
        }
    }
}

/// Kills the child if it is still running and waits for it to exit.
async fn reap(child: &mut Child, invocation: &Invocation) {
    if let Err(e) = child.kill().await {
        warn!(
            "Failed to kill child {}: {}",
            invocation.program.display(),
            e
        );
    }
}

/// Drains stdout and stderr into one text in arrival order. Bytes that are
/// not valid UTF-8 are replaced rather than rejected.
async fn read_merged(stdout: ChildStdout, stderr: ChildStderr) -> std::io::Result<String> {
    let mut out = BufReader::new(stdout);
    let mut err = BufReader::new(stderr);
    let (mut out_buf, mut err_buf) = (Vec::new(), Vec::new());
    let (mut out_open, mut err_open) = (true, true);
    let mut combined = String::new();

    while out_open || err_open {
        // read_until keeps partially read bytes in the buffer when the other
        // branch wins, so nothing is lost across iterations.
        tokio::select! {
            read = out.read_until(b'\n', &mut out_buf), if out_open => {
                out_open = read? > 0;
                push_line(&mut combined, &mut out_buf);
            }
            read = err.read_until(b'\n', &mut err_buf), if err_open => {
                err_open = read? > 0;
                push_line(&mut combined, &mut err_buf);
            }
        }
    }
    Ok(combined)
}

fn push_line(combined: &mut String, buf: &mut Vec<u8>) {
    if buf.is_empty() {
        return;
    }
    let line = String::from_utf8_lossy(buf);
    let line = line.trim_end_matches(['\n', '\r']);
    debug!("merge output: {}", line);
    combined.push_str(line);
    combined.push('\n');
    buf.clear();
}
