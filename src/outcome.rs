use crate::supervisor::SupervisorError;

/// Child exited 0 and nothing watched was written.
pub const EXIT_OK: i32 = 0;
/// No command given, or the command line could not be parsed.
pub const EXIT_USAGE: i32 = 2;
/// The child could not be spawned, waited on, or gave no exit status.
pub const EXIT_UNKNOWN: i32 = 254;
/// The child exited 0 but wrote to a watched stream.
pub const EXIT_WROTE: i32 = 255;

/// How the child run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// The child exited normally with this status.
    Completed(i32),
    /// The child never started, or its termination could not be read as an
    /// exit status (signal death, wait error, output relay failure).
    SpawnOrWaitFailure(SupervisorError),
}

/// Everything the supervisor learned from one run.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// stdout was watched and written to.
    pub stdout_failed: bool,
    /// stderr was watched and written to.
    pub stderr_failed: bool,
}

impl RunReport {
    pub fn completed(status: i32, stdout_failed: bool, stderr_failed: bool) -> Self {
        Self {
            outcome: RunOutcome::Completed(status),
            stdout_failed,
            stderr_failed,
        }
    }

    pub fn failure(err: SupervisorError) -> Self {
        Self {
            outcome: RunOutcome::SpawnOrWaitFailure(err),
            stdout_failed: false,
            stderr_failed: false,
        }
    }

    /// Final process exit code.
    ///
    /// Precedence: abnormal termination (254), then the child's own non-zero
    /// status, then a watched write (255), then success.
    pub fn exit_code(&self) -> i32 {
        match self.outcome {
            RunOutcome::SpawnOrWaitFailure(_) => EXIT_UNKNOWN,
            RunOutcome::Completed(status) if status != 0 => status,
            RunOutcome::Completed(_) if self.stdout_failed || self.stderr_failed => EXIT_WROTE,
            RunOutcome::Completed(_) => EXIT_OK,
        }
    }
}
