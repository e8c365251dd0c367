/// Resolved watch policy for a single run.
///
/// Built once from the command line and handed to the supervisor by
/// reference; nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Exit 255 if the child exits 0 but wrote to stdout.
    pub fail_on_stdout_write: bool,
    /// Exit 255 if the child exits 0 but wrote to stderr.
    pub fail_on_stderr_write: bool,
    /// Program followed by its arguments. Never empty.
    command: Vec<String>,
}

/// Errors raised while building a `WatchConfig`.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// No program was given after the flags.
    NoCommand,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NoCommand => write!(f, "no command given"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl WatchConfig {
    /// Finalize a configuration.
    ///
    /// When neither stream is selected, stderr is watched implicitly.
    pub fn new(
        fail_on_stdout_write: bool,
        fail_on_stderr_write: bool,
        command: Vec<String>,
    ) -> Result<Self, ConfigError> {
        if command.is_empty() {
            return Err(ConfigError::NoCommand);
        }
        let fail_on_stderr_write = fail_on_stderr_write || !fail_on_stdout_write;
        Ok(Self {
            fail_on_stdout_write,
            fail_on_stderr_write,
            command,
        })
    }

    /// The executable to spawn.
    pub fn program(&self) -> &str {
        &self.command[0]
    }

    /// Arguments passed to the executable.
    pub fn args(&self) -> &[String] {
        &self.command[1..]
    }
}
