use std::fs;

use flamingo_channel::{ChannelConfig, CommandChannel, ConnectionTarget};
use flamingo_frame::{CommandFrame, FrameConfig};
use tracing::info;

use crate::cmd::{parse_duration, SendArgs, WorkflowArgs};
use crate::exit::{channel_error, io_error, CliResult, SUCCESS};
use crate::output::{print_response, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let (code, name) = args.code.resolve()?;
    let frame = build_frame(code, &args.params, args.value, args.bits);

    let config = response_config(args.target.channel_config()?, args.wait, &args.wait_timeout)?;
    let mut channel = open(&args.target.target(), &config)?;

    channel
        .send_command(&frame)
        .map_err(|err| channel_error("send failed", err))?;
    info!(code, name = name.as_deref(), "command sent");

    finish(&mut channel, args.wait, name.as_deref(), format)
}

pub fn run_workflow(args: WorkflowArgs, format: OutputFormat) -> CliResult<i32> {
    let (code, name) = args.code.resolve()?;
    let workflow = fs::read(&args.file).map_err(|err| {
        io_error(&format!("failed reading {}", args.file.display()), err)
    })?;

    let config = response_config(args.target.channel_config()?, args.wait, &args.wait_timeout)?;
    let mut channel = open(&args.target.target(), &config)?;

    channel
        .send_workflow(&CommandFrame::new(code), &workflow)
        .map_err(|err| channel_error("send failed", err))?;
    info!(code, bytes = workflow.len(), "workflow sent");

    finish(&mut channel, args.wait, name.as_deref(), format)
}

/// Parameters fill the int slots left to right; missing ones stay zero.
fn build_frame(code: u32, params: &[i32], value: Option<f64>, bits: Option<u32>) -> CommandFrame {
    let mut int_data = [0i32; 3];
    for (slot, param) in int_data.iter_mut().zip(params) {
        *slot = *param;
    }

    let mut frame = CommandFrame::new(code).with_params(int_data);
    if let Some(value) = value {
        frame = frame.with_value(value);
    }
    if let Some(bits) = bits {
        frame = frame.with_bits(bits);
    }
    frame
}

fn response_config(
    mut config: ChannelConfig,
    wait: bool,
    wait_timeout: &str,
) -> CliResult<ChannelConfig> {
    if wait {
        config.frame = FrameConfig {
            read_timeout: Some(parse_duration(wait_timeout)?),
            ..config.frame
        };
    }
    Ok(config)
}

fn open(target: &ConnectionTarget, config: &ChannelConfig) -> CliResult<CommandChannel> {
    CommandChannel::connect_with_config(target.command_addr(), config)
        .map_err(|err| channel_error("connect failed", err))
}

fn finish(
    channel: &mut CommandChannel,
    wait: bool,
    name: Option<&str>,
    format: OutputFormat,
) -> CliResult<i32> {
    if wait {
        let response = channel
            .receive()
            .map_err(|err| channel_error("receive failed", err))?;
        print_response(&response, name, format);
    }
    channel.disconnect();
    Ok(SUCCESS)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn params_fill_from_the_left() {
        let frame = build_frame(24580, &[1], Some(2.5), None);
        assert_eq!(frame.command, 24580);
        assert_eq!(frame.int_data, [1, 0, 0]);
        assert_eq!(frame.double_data, 2.5);
        assert_eq!(frame.data_bits, 0);
        assert_eq!(frame.additional_data_bytes, 0);

        let frame = build_frame(7, &[-1, 2, 3], None, Some(0x10));
        assert_eq!(frame.int_data, [-1, 2, 3]);
        assert_eq!(frame.data_bits, 0x10);
    }

    #[test]
    fn wait_sets_read_timeout() {
        let config = response_config(ChannelConfig::default(), true, "250ms").unwrap();
        assert_eq!(config.frame.read_timeout, Some(Duration::from_millis(250)));

        let config = response_config(ChannelConfig::default(), false, "bogus").unwrap();
        assert_eq!(config.frame.read_timeout, None);
    }
}
