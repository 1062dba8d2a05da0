use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use crate::error::Result;
use crate::runtime::TransportRuntime;

/// Which half of a connection to shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
    Both,
}

impl From<Direction> for Shutdown {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Read => Shutdown::Read,
            Direction::Write => Shutdown::Write,
            Direction::Both => Shutdown::Both,
        }
    }
}

/// A connected TCP stream implementing Read + Write.
///
/// Holds a runtime handle so the socket library outlives the socket.
pub struct Connection {
    stream: TcpStream,
    peer: Option<SocketAddr>,
    runtime: TransportRuntime,
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.stream.flush()
    }
}

impl Connection {
    pub(crate) fn from_tcp(stream: TcpStream, runtime: TransportRuntime) -> Self {
        let peer = stream.peer_addr().ok();
        Self {
            stream,
            peer,
            runtime,
        }
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.stream.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.stream.set_write_timeout(timeout).map_err(Into::into)
    }

    /// Disable Nagle's algorithm so small values are sent immediately.
    pub fn set_nodelay(&self, nodelay: bool) -> Result<()> {
        self.stream.set_nodelay(nodelay).map_err(Into::into)
    }

    /// Try to clone this stream (creates a new socket handle).
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.stream.try_clone()?;
        Ok(Self {
            stream: cloned,
            peer: self.peer,
            runtime: self.runtime.clone(),
        })
    }

    /// Address of the remote end, if the OS reported one at connect time.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Address of the local end.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.stream.local_addr().map_err(Into::into)
    }

    /// Shut down one or both halves of the connection.
    pub fn shutdown(&self, direction: Direction) -> Result<()> {
        self.stream.shutdown(direction.into()).map_err(Into::into)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("type", &"tcp")
            .field("peer", &self.peer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (Connection, Connection) {
        let runtime = TransportRuntime::initialize().unwrap();
        let listener = runtime.bind("127.0.0.1:0").unwrap();
        let client = runtime.connect(listener.local_addr()).unwrap();
        let server = listener.accept().unwrap();
        (client, server)
    }

    #[test]
    fn shutdown_write_signals_eof() {
        let (mut client, mut server) = pair();
        client.write_all(b"bye").unwrap();
        client.shutdown(Direction::Write).unwrap();

        let mut received = Vec::new();
        server.read_to_end(&mut received).unwrap();
        assert_eq!(received, b"bye");
    }

    #[test]
    fn clone_shares_socket() {
        let (client, mut server) = pair();
        let mut writer = client.try_clone().unwrap();
        assert_eq!(writer.peer_addr(), client.peer_addr());

        writer.write_all(b"x").unwrap();
        let mut buf = [0u8; 1];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"x");
    }

    #[test]
    fn read_timeout_expires() {
        let (_client, mut server) = pair();
        server
            .set_read_timeout(Some(Duration::from_millis(20)))
            .unwrap();
        server.set_nodelay(true).unwrap();

        let mut buf = [0u8; 1];
        let err = server.read(&mut buf).unwrap_err();
        assert!(matches!(
            err.kind(),
            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
        ));
    }

    #[test]
    fn local_and_peer_addrs_mirror() {
        let (client, server) = pair();
        assert_eq!(client.local_addr().unwrap(), server.peer_addr().unwrap());
        assert!(format!("{client:?}").contains("tcp"));
    }
}
