//! # Process Runner
//!
//! Spawns the droid binary and captures its output streams as they arrive.
//! Each invocation owns exactly one child process and resolves to exactly
//! one [`ExecOutcome`] on every exit path: normal exit, spawn failure, or
//! timeout kill.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Terminal result of one subprocess run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    /// Exit code 0. Stderr is discarded on this path.
    Success { stdout: String },
    /// The process never produced an exit code (missing binary, permission
    /// denied, wait failure).
    ProcessError { message: String },
    /// The process ran and exited abnormally. `code` is `None` when the
    /// child died to a signal, which is how a timeout kill surfaces.
    NonZeroExit {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

/// Run `program` with `args`, killing the child once `timeout` elapses.
///
/// Stdout and stderr are drained concurrently while the child runs, so a
/// chatty process cannot fill a pipe buffer and deadlock against `wait()`.
pub async fn run_with_timeout(program: &str, args: &[String], timeout: Duration) -> ExecOutcome {
    let mut child = match Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            return ExecOutcome::ProcessError {
                message: e.to_string(),
            };
        }
    };

    // Readers run until EOF. A kill closes the pipes too, so joining them
    // after wait() cannot hang.
    let stdout_task = drain(child.stdout.take());
    let stderr_task = drain(child.stderr.take());

    let status = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => Ok(status),
        Ok(Err(e)) => Err(format!("failed to wait for {}: {}", program, e)),
        Err(_) => {
            warn!(timeout_secs = timeout.as_secs(), "{} exceeded time budget, killing it", program);
            if let Err(e) = child.kill().await {
                warn!("failed to kill timed-out {}: {}", program, e);
            }
            match child.wait().await {
                Ok(status) => Ok(status),
                Err(e) => Err(format!("failed to reap timed-out {}: {}", program, e)),
            }
        }
    };

    let stdout = collect(stdout_task).await;
    let stderr = collect(stderr_task).await;

    match status {
        Err(message) => ExecOutcome::ProcessError { message },
        Ok(status) if status.success() => {
            debug!(bytes = stdout.len(), "{} completed", program);
            ExecOutcome::Success { stdout }
        }
        Ok(status) => ExecOutcome::NonZeroExit {
            code: status.code(),
            stdout,
            stderr,
        },
    }
}

/// Accumulate one output stream in the background, in arrival order.
fn drain<R>(stream: Option<R>) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut stream) = stream {
            let _ = stream.read_to_end(&mut buf).await;
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

async fn collect(task: JoinHandle<String>) -> String {
    task.await.unwrap_or_default()
}
