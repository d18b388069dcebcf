//! Controller side of both channels.
//!
//! Used by the `flamingo mock` simulator and by tests that need something to
//! talk to. Sessions are deliberately thin: they read and write whole frames
//! and leave all command semantics to the caller.

use std::fmt::Debug;
use std::net::{SocketAddr, ToSocketAddrs};

use flamingo_frame::{
    CommandFrame, CommandReader, CommandWriter, FrameConfig, ImageFrame, ImageWriter, Response,
};
use flamingo_transport::{NucStream, TcpTransport};
use tracing::{debug, info};

use crate::error::{ChannelError, Result};

/// Listens for client connections on one port.
pub struct NucListener {
    transport: TcpTransport,
    config: FrameConfig,
}

impl NucListener {
    /// Bind to `addr`. Port 0 picks a free port; see [`NucListener::local_addr`].
    pub fn bind(addr: impl ToSocketAddrs + Debug) -> Result<Self> {
        let transport = TcpTransport::bind(addr)?;
        Ok(Self {
            transport,
            config: FrameConfig::default(),
        })
    }

    /// Override frame limits and timeouts applied to accepted sessions.
    pub fn with_config(mut self, config: FrameConfig) -> Self {
        self.config = config;
        self
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    /// Accept the next client as a command session.
    pub fn accept_command(&self) -> Result<CommandSession> {
        let (stream, peer) = self.accept_stream()?;
        let reader_stream = stream.try_clone()?;
        let reader = CommandReader::with_config_nuc(reader_stream, self.config.clone())
            .map_err(ChannelError::Io)?;
        let writer =
            CommandWriter::with_config_nuc(stream, self.config.clone()).map_err(ChannelError::Io)?;

        info!(%peer, "command session accepted");
        Ok(CommandSession {
            reader,
            writer,
            peer,
        })
    }

    /// Accept the next client as a live image session.
    pub fn accept_live(&self) -> Result<LiveSession> {
        let (stream, peer) = self.accept_stream()?;
        stream.set_write_timeout(self.config.write_timeout)?;

        info!(%peer, "live session accepted");
        Ok(LiveSession {
            writer: ImageWriter::new(stream),
            peer,
            sent: 0,
        })
    }

    fn accept_stream(&self) -> Result<(NucStream, SocketAddr)> {
        let stream = self.transport.accept()?;
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        Ok((stream, peer))
    }
}

impl std::fmt::Debug for NucListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NucListener")
            .field("local_addr", &self.local_addr())
            .finish()
    }
}

/// One accepted command-channel client.
pub struct CommandSession {
    reader: CommandReader<NucStream>,
    writer: CommandWriter<NucStream>,
    peer: SocketAddr,
}

impl CommandSession {
    /// Block until the client sends a frame (and its trailing payload).
    ///
    /// A client that hangs up between frames yields
    /// `ChannelError::Io(FrameError::ConnectionClosed)`.
    pub fn recv(&mut self) -> Result<Response> {
        let response = self.reader.read_frame()?;
        debug!(
            peer = %self.peer,
            command = response.frame.command,
            payload = response.payload.len(),
            "command received"
        );
        Ok(response)
    }

    /// Send a frame followed by `payload`. The frame must declare
    /// `payload.len()` additional bytes.
    pub fn reply(&mut self, frame: &CommandFrame, payload: &[u8]) -> Result<()> {
        self.writer
            .write_with_payload(frame, payload)
            .map_err(ChannelError::from_send)
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Close both directions.
    pub fn close(self) {
        let _ = self.writer.get_ref().shutdown();
        debug!(peer = %self.peer, "command session closed");
    }
}

/// One accepted live-channel client.
pub struct LiveSession {
    writer: ImageWriter<NucStream>,
    peer: SocketAddr,
    sent: u64,
}

impl LiveSession {
    pub fn send_image(&mut self, image: &ImageFrame) -> Result<()> {
        self.writer
            .write_image(image)
            .map_err(ChannelError::from_send)?;
        self.sent += 1;
        Ok(())
    }

    /// Send bytes verbatim, for simulating truncated or corrupt images.
    pub fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_raw(bytes).map_err(ChannelError::from_send)
    }

    pub fn images_sent(&self) -> u64 {
        self.sent
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Close both directions.
    pub fn close(self) {
        let _ = self.writer.get_ref().shutdown();
        debug!(peer = %self.peer, images = self.sent, "live session closed");
    }
}
