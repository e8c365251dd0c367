//! Single run lifecycle: spawn the command with stdin inherited and
//! stdout/stderr relayed through write trackers, wait for it, and report
//! what happened.
use crate::config::WatchConfig;
use crate::forwarder::{relay, WriteTracker};
use crate::outcome::{RunOutcome, RunReport};
use nix::sys::signal::Signal;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::Command;
use tokio::task::JoinHandle;

/// Ways a run can end without a usable exit status.
#[derive(Debug)]
pub enum SupervisorError {
    /// The command could not be started.
    Spawn {
        program: String,
        source: io::Error,
    },
    /// Waiting for the command failed.
    Wait { source: io::Error },
    /// The command was terminated without an exit status.
    Signaled { signal: Option<i32> },
    /// Relaying a child stream to its real destination failed.
    Relay {
        stream: &'static str,
        source: io::Error,
    },
}

impl std::fmt::Display for SupervisorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupervisorError::Spawn { program, source } => {
                write!(f, "failed to spawn {}: {}", program, source)
            }
            SupervisorError::Wait { source } => {
                write!(f, "failed to wait for command: {}", source)
            }
            SupervisorError::Signaled { signal: Some(sig) } => match Signal::try_from(*sig) {
                Ok(signal) => write!(f, "command terminated by {}", signal.as_str()),
                Err(_) => write!(f, "command terminated by signal {}", sig),
            },
            SupervisorError::Signaled { signal: None } => {
                write!(f, "command terminated without an exit status")
            }
            SupervisorError::Relay { stream, source } => {
                write!(f, "failed to relay {}: {}", stream, source)
            }
        }
    }
}

impl std::error::Error for SupervisorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SupervisorError::Spawn { source, .. } => Some(source),
            SupervisorError::Wait { source } => Some(source),
            SupervisorError::Signaled { .. } => None,
            SupervisorError::Relay { source, .. } => Some(source),
        }
    }
}

/// Run the command against the real stdout/stderr.
///
/// On abnormal termination a single diagnostic line goes straight to stderr,
/// bypassing the trackers.
pub async fn run(config: &WatchConfig) -> RunReport {
    let report = run_with(config, tokio::io::stdout(), tokio::io::stderr()).await;
    if let RunOutcome::SpawnOrWaitFailure(err) = &report.outcome {
        eprintln!("ifwr: {}", err);
    }
    report
}

/// Run the command, relaying its output into the given destinations.
pub async fn run_with<O, E>(config: &WatchConfig, stdout: O, stderr: E) -> RunReport
where
    O: AsyncWrite + Unpin + Send + 'static,
    E: AsyncWrite + Unpin + Send + 'static,
{
    match supervise(config, stdout, stderr).await {
        Ok(report) => report,
        Err(err) => {
            tracing::debug!(error = %err, "command did not complete normally");
            RunReport::failure(err)
        }
    }
}

async fn supervise<O, E>(
    config: &WatchConfig,
    stdout: O,
    stderr: E,
) -> Result<RunReport, SupervisorError>
where
    O: AsyncWrite + Unpin + Send + 'static,
    E: AsyncWrite + Unpin + Send + 'static,
{
    tracing::info!(
        program = %config.program(),
        args = ?config.args(),
        watch_stdout = config.fail_on_stdout_write,
        watch_stderr = config.fail_on_stderr_write,
        "spawning command"
    );

    let mut child = Command::new(config.program())
        .args(config.args())
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| SupervisorError::Spawn {
            program: config.program().to_string(),
            source: e,
        })?;

    let pid = child.id().unwrap_or(0);
    tracing::debug!(pid, "command started");

    let stdout_task = spawn_relay(
        "stdout",
        child.stdout.take(),
        WriteTracker::new(stdout, config.fail_on_stdout_write),
    );
    let stderr_task = spawn_relay(
        "stderr",
        child.stderr.take(),
        WriteTracker::new(stderr, config.fail_on_stderr_write),
    );

    let status = child
        .wait()
        .await
        .map_err(|e| SupervisorError::Wait { source: e })?;

    // Drain both streams before deciding anything.
    let stdout_failed = join_relay(stdout_task).await;
    let stderr_failed = join_relay(stderr_task).await;

    tracing::info!(pid, exit_code = ?status.code(), "command exited");

    let code = match status.code() {
        Some(code) => code,
        None => {
            return Err(SupervisorError::Signaled {
                signal: status.signal(),
            })
        }
    };

    if code != 0 {
        return Ok(RunReport::completed(
            code,
            matches!(stdout_failed, Ok(true)),
            matches!(stderr_failed, Ok(true)),
        ));
    }

    let stdout_failed = stdout_failed.map_err(|e| SupervisorError::Relay {
        stream: "stdout",
        source: e,
    })?;
    let stderr_failed = stderr_failed.map_err(|e| SupervisorError::Relay {
        stream: "stderr",
        source: e,
    })?;

    Ok(RunReport::completed(0, stdout_failed, stderr_failed))
}

/// Pump one child pipe through its tracker on a separate task.
fn spawn_relay<R, W>(
    stream: &'static str,
    pipe: Option<R>,
    tracker: WriteTracker<W>,
) -> JoinHandle<io::Result<bool>>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let Some(pipe) = pipe else {
            return Ok(tracker.failed());
        };
        let (tracker, bytes) = relay(pipe, tracker).await?;
        tracing::debug!(stream, bytes, wrote = tracker.wrote(), "stream closed");
        Ok(tracker.failed())
    })
}

async fn join_relay(task: JoinHandle<io::Result<bool>>) -> io::Result<bool> {
    match task.await {
        Ok(result) => result,
        Err(join_err) => Err(io::Error::other(join_err)),
    }
}
