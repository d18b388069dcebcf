use std::path::Path;
use std::time::Duration;

use flamingo_frame::FrameConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ChannelError, Result};

/// Per-channel connection behavior.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Maximum time to establish the TCP connection. `None` uses the OS default.
    pub connect_timeout: Option<Duration>,
    /// Disable Nagle's algorithm on the socket.
    pub nodelay: bool,
    /// Payload limits and read/write timeouts for framing.
    pub frame: FrameConfig,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Some(Duration::from_secs(5)),
            nodelay: true,
            frame: FrameConfig::default(),
        }
    }
}

/// Where the NUC listens.
///
/// The live image port conventionally sits one above the command port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTarget {
    pub host: String,
    pub command_port: u16,
    pub live_port: u16,
}

impl ConnectionTarget {
    /// Target with the live port at `command_port + 1`.
    pub fn new(host: impl Into<String>, command_port: u16) -> Self {
        Self {
            host: host.into(),
            command_port,
            live_port: command_port.saturating_add(1),
        }
    }

    /// Override the live image port.
    pub fn with_live_port(mut self, live_port: u16) -> Self {
        self.live_port = live_port;
        self
    }

    /// Address of the command port.
    pub fn command_addr(&self) -> (&str, u16) {
        (self.host.as_str(), self.command_port)
    }

    /// Address of the live image port.
    pub fn live_addr(&self) -> (&str, u16) {
        (self.host.as_str(), self.live_port)
    }

    /// Load a target from a JSON file.
    ///
    /// `live_port` may be omitted, in which case it follows the command port.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        #[derive(Deserialize)]
        struct Raw {
            host: String,
            command_port: u16,
            live_port: Option<u16>,
        }

        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| ChannelError::Config(format!("{}: {err}", path.display())))?;
        let raw: Raw = serde_json::from_str(&text)
            .map_err(|err| ChannelError::Config(format!("{}: {err}", path.display())))?;

        let target = Self::new(raw.host, raw.command_port);
        Ok(match raw.live_port {
            Some(port) => target.with_live_port(port),
            None => target,
        })
    }
}
