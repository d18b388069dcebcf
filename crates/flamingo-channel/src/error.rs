use flamingo_frame::FrameError;
use flamingo_transport::TransportError;

/// Errors that can occur in channel operations.
///
/// Every variant reaches the caller unchanged; channels never retry.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The socket could not be established.
    #[error("connection failed: {0}")]
    Connection(#[from] TransportError),

    /// Markers or sizes did not match the protocol. The session is closed;
    /// reconnect rather than trying to resynchronize.
    #[error("protocol desync: {0}")]
    Decode(#[source] FrameError),

    /// Short read/write, peer reset, timeout or close before a frame was
    /// complete.
    #[error("channel I/O error: {0}")]
    Io(#[source] FrameError),

    /// The frame was refused before anything was written.
    #[error("frame rejected: {0}")]
    Rejected(#[source] FrameError),

    /// The channel has no open socket.
    #[error("channel not connected")]
    NotConnected,

    /// A connection target could not be loaded.
    #[error("invalid connection target: {0}")]
    Config(String),
}

impl ChannelError {
    /// Classify an error raised while writing. Validation failures leave the
    /// stream untouched.
    pub(crate) fn from_send(err: FrameError) -> Self {
        match err {
            FrameError::PayloadLengthMismatch { .. } | FrameError::PayloadTooLarge { .. } => {
                ChannelError::Rejected(err)
            }
            other => ChannelError::Io(other),
        }
    }

    /// True if the session that produced this error can no longer be used.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, ChannelError::Decode(_) | ChannelError::Io(_))
    }
}

impl From<FrameError> for ChannelError {
    fn from(err: FrameError) -> Self {
        if err.is_decode() {
            ChannelError::Decode(err)
        } else {
            ChannelError::Io(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;
