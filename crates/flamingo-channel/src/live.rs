use std::fmt::Debug;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use flamingo_frame::{FrameError, ImageFrame, ImageReader};
use flamingo_transport::NucStream;
use tracing::{debug, info, warn};

use crate::cancel::CancelHandle;
use crate::config::ChannelConfig;
use crate::connector::open_stream;
use crate::error::{ChannelError, Result};

struct LiveConnection {
    reader: ImageReader<NucStream>,
    control: Arc<NucStream>,
}

/// Pulls images off the NUC's live data port.
///
/// The channel makes no assumption about how many images will arrive; loop on
/// [`LiveImageChannel::read_next_image`] (or [`LiveImageChannel::images`])
/// until done or an error ends the session.
pub struct LiveImageChannel {
    conn: Option<LiveConnection>,
    peer: SocketAddr,
    received: u64,
}

impl LiveImageChannel {
    /// Connect to the NUC live port with default configuration.
    pub fn connect(addr: impl ToSocketAddrs + Debug) -> Result<Self> {
        Self::connect_with_config(addr, &ChannelConfig::default())
    }

    /// Connect with explicit configuration.
    pub fn connect_with_config(
        addr: impl ToSocketAddrs + Debug,
        config: &ChannelConfig,
    ) -> Result<Self> {
        let (stream, peer) = open_stream(addr, config)?;
        let control = Arc::new(stream.try_clone()?);
        let reader =
            ImageReader::with_config_nuc(stream, config.frame.clone()).map_err(ChannelError::Io)?;

        info!(%peer, "live image channel connected");
        Ok(Self {
            conn: Some(LiveConnection { reader, control }),
            peer,
            received: 0,
        })
    }

    /// Block until the next complete image has arrived.
    ///
    /// A header whose payload size disagrees with its dimensions is reported
    /// as [`ChannelError::Decode`] but leaves the session open: its payload
    /// has been drained and the next call starts on a fresh header. Any other
    /// failure closes the channel.
    pub fn read_next_image(&mut self) -> Result<ImageFrame> {
        let conn = self.conn.as_mut().ok_or(ChannelError::NotConnected)?;
        match conn.reader.read_image() {
            Ok(image) => {
                self.received += 1;
                Ok(image)
            }
            Err(err @ FrameError::ImageSizeMismatch { .. }) => {
                warn!(peer = %self.peer, error = %err, "skipping malformed image");
                Err(ChannelError::Decode(err))
            }
            Err(err) => {
                let err = ChannelError::from(err);
                warn!(peer = %self.peer, error = %err, "closing live image channel");
                self.disconnect();
                Err(err)
            }
        }
    }

    /// Iterate over incoming images. The iterator ends after yielding the
    /// first error.
    pub fn images(&mut self) -> Images<'_> {
        Images {
            channel: self,
            done: false,
        }
    }

    /// Close the socket. Does nothing if already closed.
    pub fn disconnect(&mut self) {
        if let Some(conn) = self.conn.take() {
            let _ = conn.control.shutdown();
            info!(peer = %self.peer, images = self.received, "live image channel disconnected");
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

    /// Address of the NUC live port.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Images read successfully on this channel so far.
    pub fn images_received(&self) -> u64 {
        self.received
    }
}

impl Drop for LiveImageChannel {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl std::fmt::Debug for LiveImageChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveImageChannel")
            .field("peer", &self.peer)
            .field("connected", &self.is_connected())
            .field("received", &self.received)
            .finish()
    }
}

/// Iterator returned by [`LiveImageChannel::images`].
pub struct Images<'a> {
    channel: &'a mut LiveImageChannel,
    done: bool,
}

impl Iterator for Images<'_> {
    type Item = Result<ImageFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.channel.read_next_image();
        if item.is_err() {
            debug!("image iterator finished");
            self.done = true;
        }
        Some(item)
    }
}
