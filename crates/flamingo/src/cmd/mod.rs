use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use flamingo_channel::{ChannelConfig, ConnectionTarget};
use flamingo_frame::CommandCatalog;

use crate::exit::{catalog_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod mock;
pub mod send;
pub mod stream;
pub mod version;

/// Command port the NUC listens on out of the box.
pub const DEFAULT_COMMAND_PORT: u16 = 53717;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send a parameterized command.
    Send(SendArgs),
    /// Send a workflow-start command with a workflow file attached.
    Workflow(WorkflowArgs),
    /// Read images from the live port.
    Stream(StreamArgs),
    /// Run a controller simulator.
    Mock(MockArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format),
        Command::Workflow(args) => send::run_workflow(args, format),
        Command::Stream(args) => stream::run(args, format),
        Command::Mock(args) => mock::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct TargetArgs {
    /// NUC host name or address.
    #[arg(env = "FLAMINGO_HOST")]
    pub host: String,
    /// Command port.
    #[arg(long, short = 'p', env = "FLAMINGO_PORT", default_value_t = DEFAULT_COMMAND_PORT)]
    pub port: u16,
    /// Connection timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub connect_timeout: String,
}

impl TargetArgs {
    pub fn target(&self) -> ConnectionTarget {
        ConnectionTarget::new(self.host.clone(), self.port)
    }

    pub fn channel_config(&self) -> CliResult<ChannelConfig> {
        Ok(ChannelConfig {
            connect_timeout: Some(parse_duration(&self.connect_timeout)?),
            ..ChannelConfig::default()
        })
    }
}

/// Picks the command code, either directly or by catalog name.
#[derive(Args, Debug)]
pub struct CodeArgs {
    /// Numeric command code (decimal or 0x hex).
    #[arg(long, value_parser = parse_code, required_unless_present = "command")]
    pub code: Option<u32>,
    /// Command name to look up in --catalog.
    #[arg(long, conflicts_with = "code", requires = "catalog")]
    pub command: Option<String>,
    /// Command catalog file (`NAME = CODE` per line).
    #[arg(long, env = "FLAMINGO_CATALOG", value_name = "FILE")]
    pub catalog: Option<PathBuf>,
}

impl CodeArgs {
    /// Resolve to `(code, name)`. The name comes from the catalog when one is
    /// given, even if the code was passed numerically.
    pub fn resolve(&self) -> CliResult<(u32, Option<String>)> {
        let catalog = match &self.catalog {
            Some(path) => Some(CommandCatalog::load(path).map_err(catalog_error)?),
            None => None,
        };

        match (&self.command, self.code) {
            (Some(name), _) => {
                let code = catalog
                    .as_ref()
                    .and_then(|c| c.code(name))
                    .ok_or_else(|| CliError::new(USAGE, format!("unknown command name: {name}")))?;
                Ok((code, Some(name.clone())))
            }
            (None, Some(code)) => {
                let name = catalog.as_ref().and_then(|c| c.name(code)).map(str::to_string);
                Ok((code, name))
            }
            (None, None) => Err(CliError::new(USAGE, "either --code or --command is required")),
        }
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    #[command(flatten)]
    pub code: CodeArgs,
    /// Up to three integer parameters (comma-separated).
    #[arg(long, value_delimiter = ',', num_args = 1..=3, allow_negative_numbers = true)]
    pub params: Vec<i32>,
    /// Floating-point parameter.
    #[arg(long, allow_negative_numbers = true)]
    pub value: Option<f64>,
    /// Flag bits (decimal or 0x hex).
    #[arg(long, value_parser = parse_code)]
    pub bits: Option<u32>,
    /// Wait for one response frame and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the response when --wait is set.
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct WorkflowArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    #[command(flatten)]
    pub code: CodeArgs,
    /// Workflow file sent after the frame.
    #[arg(long, short = 'f')]
    pub file: PathBuf,
    /// Wait for one response frame and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the response when --wait is set.
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct StreamArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    /// Live port. Defaults to the command port + 1.
    #[arg(long, env = "FLAMINGO_LIVE_PORT")]
    pub live_port: Option<u16>,
    /// Exit after receiving N images.
    #[arg(long)]
    pub count: Option<u64>,
    /// Write each image's pixels to DIR as raw little-endian `.u16` files.
    #[arg(long, value_name = "DIR")]
    pub save: Option<PathBuf>,
    /// Give up if no image arrives within this time (e.g. 30s).
    #[arg(long)]
    pub idle_timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct MockArgs {
    /// Address for the command port. The live port is bound on the next port
    /// up, or on any free port when this one is 0.
    #[arg(default_value = "127.0.0.1:53717")]
    pub bind: String,
    /// Live port override.
    #[arg(long)]
    pub live_port: Option<u16>,
    /// Images to stream to each live client before closing it.
    #[arg(long, default_value_t = 10)]
    pub images: u32,
    /// Synthetic image width.
    #[arg(long, default_value_t = 64)]
    pub width: u32,
    /// Synthetic image height.
    #[arg(long, default_value_t = 64)]
    pub height: u32,
    /// Delay between images (e.g. 50ms).
    #[arg(long, default_value = "10ms")]
    pub interval: String,
    /// Status code written into every acknowledgement.
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub status: i32,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_code(input: &str) -> Result<u32, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|err| format!("invalid code `{input}`: {err}"))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn parse_code_accepts_hex() {
        assert_eq!(parse_code("12292"), Ok(12292));
        assert_eq!(parse_code("0x3004"), Ok(0x3004));
        assert!(parse_code("-1").is_err());
    }

    #[test]
    fn resolve_by_name_and_by_code() {
        let path = std::env::temp_dir().join(format!("flamingo-cmd-{}.txt", std::process::id()));
        std::fs::write(&path, "STAGE_POSITION_SET = 24580\n").unwrap();

        let by_name = CodeArgs {
            code: None,
            command: Some("STAGE_POSITION_SET".to_string()),
            catalog: Some(path.clone()),
        };
        assert_eq!(
            by_name.resolve().unwrap(),
            (24580, Some("STAGE_POSITION_SET".to_string()))
        );

        let by_code = CodeArgs {
            code: Some(24580),
            command: None,
            catalog: Some(path.clone()),
        };
        assert_eq!(by_code.resolve().unwrap().1.as_deref(), Some("STAGE_POSITION_SET"));

        let unknown = CodeArgs {
            code: None,
            command: Some("NOPE".to_string()),
            catalog: Some(path.clone()),
        };
        assert_eq!(unknown.resolve().unwrap_err().code, USAGE);

        let _ = std::fs::remove_file(&path);
    }
}
