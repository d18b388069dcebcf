use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::NucStream;

/// TCP transport.
///
/// Provides bind/accept for the controller side and connect for the client
/// side. The NUC serves commands and live images on separate ports; each
/// call here produces exactly one socket.
pub struct TcpTransport {
    listener: TcpListener,
    addr: SocketAddr,
}

impl TcpTransport {
    /// Bind and listen on `addr`. Use port 0 to let the OS pick one.
    pub fn bind(addr: impl ToSocketAddrs + std::fmt::Debug) -> Result<Self> {
        let display = format!("{addr:?}");
        let listener = TcpListener::bind(&addr).map_err(|e| TransportError::Bind {
            addr: display.clone(),
            source: e,
        })?;
        let addr = listener.local_addr().map_err(|e| TransportError::Bind {
            addr: display,
            source: e,
        })?;

        info!(%addr, "listening on tcp socket");

        Ok(Self { listener, addr })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<NucStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted connection");
        Ok(NucStream::from_tcp(stream))
    }

    /// Connect to a listening NUC port (blocking, OS default timeout).
    pub fn connect(addr: impl ToSocketAddrs + std::fmt::Debug) -> Result<NucStream> {
        Self::connect_timeout(addr, None)
    }

    /// Connect with an explicit timeout applied to each resolved address.
    ///
    /// Every resolved address is tried in order; the last failure is returned
    /// if none accepts.
    pub fn connect_timeout(
        addr: impl ToSocketAddrs + std::fmt::Debug,
        timeout: Option<Duration>,
    ) -> Result<NucStream> {
        let target = format!("{addr:?}");
        let candidates: Vec<SocketAddr> = addr
            .to_socket_addrs()
            .map_err(|e| TransportError::Resolve {
                target: target.clone(),
                source: e,
            })?
            .collect();

        let mut last_err = None;
        for candidate in candidates {
            let attempt = match timeout {
                Some(timeout) => TcpStream::connect_timeout(&candidate, timeout),
                None => TcpStream::connect(candidate),
            };
            match attempt {
                Ok(stream) => {
                    debug!(addr = %candidate, "connected to tcp socket");
                    return Ok(NucStream::from_tcp(stream));
                }
                Err(err) => {
                    debug!(addr = %candidate, error = %err, "connect attempt failed");
                    last_err = Some(TransportError::Connect {
                        addr: candidate.to_string(),
                        source: err,
                    });
                }
            }
        }

        Err(last_err.unwrap_or(TransportError::NoAddress(target)))
    }

    /// Async variant of [`TcpTransport::connect`].
    #[cfg(feature = "async")]
    pub async fn connect_async(addr: &str) -> Result<tokio::net::TcpStream> {
        let stream = tokio::net::TcpStream::connect(addr)
            .await
            .map_err(|e| TransportError::Connect {
                addr: addr.to_string(),
                source: e,
            })?;
        debug!(addr, "connected to tcp socket (async)");
        Ok(stream)
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}
