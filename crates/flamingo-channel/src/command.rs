use std::fmt::Debug;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use flamingo_frame::{CommandFrame, CommandReader, CommandWriter, FrameError, Response};
use flamingo_transport::NucStream;
use tracing::{debug, info, warn};

use crate::cancel::CancelHandle;
use crate::config::ChannelConfig;
use crate::connector::open_stream;
use crate::error::{ChannelError, Result};

struct Connection {
    reader: CommandReader<NucStream>,
    writer: CommandWriter<NucStream>,
    control: Arc<NucStream>,
}

/// Request/response exchange of command frames over one long-lived socket.
///
/// The socket stays open across commands. A protocol desync or an I/O
/// failure ends the session: the socket is closed and further calls return
/// [`ChannelError::NotConnected`] until [`CommandChannel::reconnect`].
pub struct CommandChannel {
    conn: Option<Connection>,
    peer: SocketAddr,
    config: ChannelConfig,
}

impl CommandChannel {
    /// Connect to the NUC command port with default configuration.
    pub fn connect(addr: impl ToSocketAddrs + Debug) -> Result<Self> {
        Self::connect_with_config(addr, &ChannelConfig::default())
    }

    /// Connect with explicit configuration.
    pub fn connect_with_config(
        addr: impl ToSocketAddrs + Debug,
        config: &ChannelConfig,
    ) -> Result<Self> {
        let (conn, peer) = Self::open(addr, config)?;
        info!(%peer, "command channel connected");
        Ok(Self {
            conn: Some(conn),
            peer,
            config: config.clone(),
        })
    }

    fn open(
        addr: impl ToSocketAddrs + Debug,
        config: &ChannelConfig,
    ) -> Result<(Connection, SocketAddr)> {
        let (stream, peer) = open_stream(addr, config)?;
        let control = Arc::new(stream.try_clone()?);
        let reader_stream = stream.try_clone()?;

        let reader = CommandReader::with_config_nuc(reader_stream, config.frame.clone())
            .map_err(ChannelError::Io)?;
        let writer =
            CommandWriter::with_config_nuc(stream, config.frame.clone()).map_err(ChannelError::Io)?;

        Ok((
            Connection {
                reader,
                writer,
                control,
            },
            peer,
        ))
    }

    /// Close any current socket and connect again to the same address.
    pub fn reconnect(&mut self) -> Result<()> {
        self.disconnect();
        let (conn, peer) = Self::open(self.peer, &self.config)?;
        info!(%peer, "command channel reconnected");
        self.conn = Some(conn);
        Ok(())
    }

    /// Send a command frame with no trailing payload.
    ///
    /// `additional_data_bytes` is sent as 0 whatever the frame says. Does not
    /// wait for a reply; call [`CommandChannel::receive`] for that.
    pub fn send_command(&mut self, frame: &CommandFrame) -> Result<()> {
        let frame = frame.with_additional_bytes(0);
        let conn = self.conn.as_mut().ok_or(ChannelError::NotConnected)?;
        let result = conn.writer.write_frame(&frame);
        self.finish_send(result)?;
        debug!(command = frame.command, "sent command");
        Ok(())
    }

    /// Send a workflow-start frame immediately followed by the workflow file
    /// body, as one logical transmission.
    ///
    /// The frame's `additional_data_bytes` is set to `workflow.len()`.
    pub fn send_workflow(&mut self, frame: &CommandFrame, workflow: &[u8]) -> Result<()> {
        let declared = u32::try_from(workflow.len()).map_err(|_| {
            ChannelError::Rejected(FrameError::PayloadTooLarge {
                size: workflow.len(),
                max: u32::MAX as usize,
            })
        })?;
        let frame = frame.with_additional_bytes(declared);
        let conn = self.conn.as_mut().ok_or(ChannelError::NotConnected)?;
        let result = conn.writer.write_with_payload(&frame, workflow);
        self.finish_send(result)?;
        info!(
            command = frame.command,
            bytes = workflow.len(),
            "sent workflow"
        );
        Ok(())
    }

    /// Block until one complete frame, and its trailing payload if any, has
    /// arrived.
    pub fn receive(&mut self) -> Result<Response> {
        let conn = self.conn.as_mut().ok_or(ChannelError::NotConnected)?;
        match conn.reader.read_frame() {
            Ok(response) => Ok(response),
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Send a command and wait for the next frame from the NUC.
    pub fn request(&mut self, frame: &CommandFrame) -> Result<Response> {
        self.send_command(frame)?;
        self.receive()
    }

    /// Close the socket. Does nothing if already closed.
    pub fn disconnect(&mut self) {
        if let Some(conn) = self.conn.take() {
            let _ = conn.control.shutdown();
            info!(peer = %self.peer, "command channel disconnected");
        }
    }

    /// Handle for closing this channel's socket from another thread.
    pub fn cancel_handle(&self) -> Result<CancelHandle> {
        let conn = self.conn.as_ref().ok_or(ChannelError::NotConnected)?;
        Ok(CancelHandle::new(Arc::clone(&conn.control)))
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Address of the NUC command port.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    fn finish_send(&mut self, result: std::result::Result<(), FrameError>) -> Result<()> {
        match result {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail(ChannelError::from_send(err))),
        }
    }

    fn fail(&mut self, err: ChannelError) -> ChannelError {
        if err.is_session_fatal() {
            warn!(peer = %self.peer, error = %err, "closing command channel");
            self.disconnect();
        }
        err
    }
}

impl Drop for CommandChannel {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl std::fmt::Debug for CommandChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandChannel")
            .field("peer", &self.peer)
            .field("connected", &self.is_connected())
            .finish()
    }
}
