mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "flamingo",
    version,
    about = "Talk to a Flamingo microscope controller"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr). RUST_LOG takes precedence when set.
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "flamingo",
            "send",
            "10.0.0.5",
            "--code",
            "24580",
            "--params",
            "1,0,0",
            "--value",
            "-2.5",
        ])
        .expect("send args should parse");

        let Command::Send(args) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(args.target.host, "10.0.0.5");
        assert_eq!(args.target.port, cmd::DEFAULT_COMMAND_PORT);
        assert_eq!(args.code.code, Some(24580));
        assert_eq!(args.params, vec![1, 0, 0]);
        assert_eq!(args.value, Some(-2.5));
    }

    #[test]
    fn rejects_code_and_command_together() {
        let err = Cli::try_parse_from([
            "flamingo",
            "send",
            "10.0.0.5",
            "--code",
            "1",
            "--command",
            "STAGE_POSITION_SET",
            "--catalog",
            "commands.txt",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn command_name_requires_catalog() {
        let err = Cli::try_parse_from([
            "flamingo",
            "send",
            "10.0.0.5",
            "--command",
            "STAGE_POSITION_SET",
        ])
        .expect_err("--command without --catalog should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_workflow_subcommand() {
        let cli = Cli::try_parse_from([
            "flamingo",
            "workflow",
            "10.0.0.5",
            "--port",
            "6000",
            "--code",
            "0x3004",
            "--file",
            "zstack.txt",
            "--wait",
        ])
        .expect("workflow args should parse");

        let Command::Workflow(args) = cli.command else {
            panic!("expected workflow");
        };
        assert_eq!(args.target.port, 6000);
        assert_eq!(args.code.code, Some(0x3004));
        assert!(args.wait);
    }

    #[test]
    fn parses_stream_and_mock_subcommands() {
        let cli = Cli::try_parse_from([
            "flamingo", "stream", "10.0.0.5", "--live-port", "6001", "--count", "3",
        ])
        .expect("stream args should parse");
        assert!(matches!(cli.command, Command::Stream(_)));

        let cli = Cli::try_parse_from(["flamingo", "mock", "127.0.0.1:0", "--images", "2"])
            .expect("mock args should parse");
        let Command::Mock(args) = cli.command else {
            panic!("expected mock");
        };
        assert_eq!(args.images, 2);
        assert_eq!(args.bind, "127.0.0.1:0");
    }
}
