use std::fmt::Debug;
use std::net::{SocketAddr, ToSocketAddrs};

use flamingo_transport::{NucStream, TcpTransport};
use tracing::info;

use crate::command::CommandChannel;
use crate::config::{ChannelConfig, ConnectionTarget};
use crate::error::Result;
use crate::live::LiveImageChannel;

/// Open both channels to a NUC with default configuration.
pub fn connect(target: &ConnectionTarget) -> Result<(CommandChannel, LiveImageChannel)> {
    connect_with_config(target, &ChannelConfig::default())
}

/// Open both channels with explicit configuration.
///
/// The command channel is opened first. If the live channel then fails, the
/// command channel is dropped (and closed) before the error is returned.
pub fn connect_with_config(
    target: &ConnectionTarget,
    config: &ChannelConfig,
) -> Result<(CommandChannel, LiveImageChannel)> {
    let command = CommandChannel::connect_with_config(target.command_addr(), config)?;
    let live = LiveImageChannel::connect_with_config(target.live_addr(), config)?;
    info!(host = %target.host, command_port = target.command_port, live_port = target.live_port, "connected to nuc");
    Ok((command, live))
}

/// Connect one socket and apply the socket options from `config`.
pub(crate) fn open_stream(
    addr: impl ToSocketAddrs + Debug,
    config: &ChannelConfig,
) -> Result<(NucStream, SocketAddr)> {
    let stream = TcpTransport::connect_timeout(addr, config.connect_timeout)?;
    stream.set_nodelay(config.nodelay)?;
    let peer = stream.peer_addr()?;
    Ok((stream, peer))
}
