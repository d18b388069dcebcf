use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use crate::error::Result;

/// A connected stream to or from the NUC. Implements `Read` and `Write`.
///
/// This is the fundamental I/O type returned by transport operations. It
/// wraps a TCP stream; clones made with [`NucStream::try_clone`] share the
/// same socket, so [`NucStream::shutdown`] on any clone unblocks readers on
/// all of them.
pub struct NucStream {
    inner: TcpStream,
}

impl Read for NucStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for NucStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl NucStream {
    /// Wrap an already connected TCP stream.
    pub fn from_tcp(stream: TcpStream) -> Self {
        Self { inner: stream }
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_write_timeout(timeout).map_err(Into::into)
    }

    /// Disable Nagle's algorithm. Command frames are small and latency bound.
    pub fn set_nodelay(&self, nodelay: bool) -> Result<()> {
        self.inner.set_nodelay(nodelay).map_err(Into::into)
    }

    /// Try to clone this stream (creates a new file descriptor on the same socket).
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.inner.try_clone()?;
        Ok(Self::from_tcp(cloned))
    }

    /// Hard-close both directions of the socket.
    ///
    /// Any thread blocked reading this socket (or a clone of it) wakes up
    /// with EOF or an error. Closing an already closed socket is not an error.
    pub fn shutdown(&self) -> Result<()> {
        match self.inner.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Address of the remote end.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        self.inner.peer_addr().map_err(Into::into)
    }

    /// Address of the local end.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.inner.local_addr().map_err(Into::into)
    }
}

impl std::fmt::Debug for NucStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("NucStream");
        s.field("type", &"tcp");
        if let Ok(peer) = self.inner.peer_addr() {
            s.field("peer", &peer);
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;

    fn pair() -> (NucStream, NucStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (server, _) = listener.accept().unwrap();
        (NucStream::from_tcp(client), NucStream::from_tcp(server))
    }

    #[test]
    fn read_write_roundtrip() {
        let (mut client, mut server) = pair();
        client.write_all(b"hello").unwrap();

        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn shutdown_unblocks_reader_on_clone() {
        let (client, _server) = pair();
        let mut reader = client.try_clone().unwrap();

        let handle = std::thread::spawn(move || {
            let mut buf = [0u8; 16];
            reader.read(&mut buf)
        });

        std::thread::sleep(Duration::from_millis(50));
        client.shutdown().unwrap();

        let result = handle.join().unwrap();
        assert!(matches!(result, Ok(0) | Err(_)));
    }

    #[test]
    fn shutdown_twice_is_ok() {
        let (client, _server) = pair();
        client.shutdown().unwrap();
        client.shutdown().unwrap();
    }

    #[test]
    fn timeouts_apply() {
        let (client, _server) = pair();
        client
            .set_read_timeout(Some(Duration::from_millis(10)))
            .unwrap();
        client
            .set_write_timeout(Some(Duration::from_millis(10)))
            .unwrap();
        client.set_nodelay(true).unwrap();
    }

    #[test]
    fn debug_includes_peer() {
        let (client, server) = pair();
        let text = format!("{client:?}");
        assert!(text.contains("tcp"));
        assert!(text.contains(&server.local_addr().unwrap().to_string()));
    }
}
