mod config;
mod forwarder;
mod logging;
mod outcome;
mod supervisor;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use config::WatchConfig;
use outcome::EXIT_USAGE;

const AFTER_HELP: &str = "\
Both -1 and -2 may be set. If neither are specified, -2 is set implicitly.

Exit codes:
  0    command exited 0 and no watched stream was written
  2    usage error
  254  command could not be run or died without an exit status
  255  command exited 0 but wrote to a watched stream
  n    the command's own non-zero exit status";

/// Run a command and fail if it writes to stdout or stderr.
///
/// Output is still passed through untouched and the command always runs to
/// completion.
#[derive(Parser, Debug)]
#[command(name = "ifwr", version, about, after_help = AFTER_HELP)]
pub struct Cli {
    /// Fail if stdout is written
    #[arg(short = '1')]
    stdout: bool,

    /// Fail if stderr is written
    #[arg(short = '2')]
    stderr: bool,

    /// Debug logging on stderr (IFWR_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,

    /// Command to run, followed by its arguments
    #[arg(value_name = "CMD", trailing_var_arg = true, num_args = 1..)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init_logging(cli.verbose);
    tracing::debug!(?cli, "parsed CLI arguments");

    let config = match WatchConfig::new(cli.stdout, cli.stderr, cli.command) {
        Ok(config) => config,
        Err(err) => {
            let _ = Cli::command()
                .error(ErrorKind::MissingRequiredArgument, err)
                .print();
            std::process::exit(EXIT_USAGE);
        }
    };

    let report = supervisor::run(&config).await;
    let code = report.exit_code();
    tracing::debug!(
        code,
        stdout_failed = report.stdout_failed,
        stderr_failed = report.stderr_failed,
        "exiting"
    );
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ifwr").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_before_command() {
        let cli = parse(&["-1", "-2", "echo", "hello"]);
        assert!(cli.stdout);
        assert!(cli.stderr);
        assert_eq!(cli.command, vec!["echo", "hello"]);
    }

    #[test]
    fn test_double_dash_separator() {
        let cli = parse(&["-1", "--", "echo", "hi"]);
        assert!(cli.stdout);
        assert!(!cli.stderr);
        assert_eq!(cli.command, vec!["echo", "hi"]);
    }

    #[test]
    fn test_command_flags_are_not_ours() {
        let cli = parse(&["sh", "-c", "exit 3", "-1"]);
        assert!(!cli.stdout);
        assert_eq!(cli.command, vec!["sh", "-c", "exit 3", "-1"]);
    }

    #[test]
    fn test_combined_short_flags() {
        let cli = parse(&["-12", "true"]);
        assert!(cli.stdout);
        assert!(cli.stderr);
    }

    #[test]
    fn test_no_command_parses_empty() {
        let cli = parse(&["-1"]);
        assert!(cli.command.is_empty());
        assert!(WatchConfig::new(cli.stdout, cli.stderr, cli.command).is_err());
    }

    #[test]
    fn test_unknown_flag_is_usage_error() {
        let err = Cli::try_parse_from(["ifwr", "-x", "true"]).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_USAGE);
    }
}
