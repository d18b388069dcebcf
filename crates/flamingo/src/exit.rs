use std::fmt;
use std::io;

use flamingo_channel::ChannelError;
use flamingo_frame::{CatalogError, FrameError};
use flamingo_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_error(context, source),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::ConnectionClosed
        | FrameError::IncompleteHeader { .. }
        | FrameError::IncompleteImage { .. } => CliError::new(FAILURE, format!("{context}: {err}")),
        other if other.is_decode() => CliError::new(DATA_INVALID, format!("{context}: {other}")),
        FrameError::PayloadLengthMismatch { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn channel_error(context: &str, err: ChannelError) -> CliError {
    match err {
        ChannelError::Connection(err) => transport_error(context, err),
        ChannelError::Decode(err) | ChannelError::Io(err) | ChannelError::Rejected(err) => {
            frame_error(context, err)
        }
        ChannelError::NotConnected => CliError::new(FAILURE, format!("{context}: {err}")),
        ChannelError::Config(_) => CliError::new(USAGE, format!("{context}: {err}")),
    }
}

pub fn catalog_error(err: CatalogError) -> CliError {
    match err {
        CatalogError::Read { path, source } => {
            io_error(&format!("failed reading catalog {}", path.display()), source)
        }
        other => CliError::new(USAGE, format!("invalid catalog: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_map_to_124() {
        let err = channel_error(
            "receive failed",
            ChannelError::Io(FrameError::Io(io::Error::from(io::ErrorKind::WouldBlock))),
        );
        assert_eq!(err.code, TIMEOUT);
        assert!(err.message.starts_with("receive failed: "));
    }

    #[test]
    fn desync_maps_to_data_invalid() {
        let err = channel_error(
            "receive failed",
            ChannelError::Decode(FrameError::InvalidEndMarker(0)),
        );
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn refused_connection_is_failure() {
        let err = channel_error(
            "connect failed",
            ChannelError::Connection(TransportError::Connect {
                addr: "127.0.0.1:1".to_string(),
                source: io::Error::from(io::ErrorKind::ConnectionRefused),
            }),
        );
        assert_eq!(err.code, FAILURE);
    }

    #[test]
    fn malformed_catalog_is_usage() {
        let err = catalog_error(CatalogError::Malformed { line: 4 });
        assert_eq!(err.code, USAGE);
        assert!(err.message.contains("line 4"));
    }
}
