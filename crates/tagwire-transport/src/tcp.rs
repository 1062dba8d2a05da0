use std::fmt;
use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::connection::Connection;
use crate::error::{Result, TransportError};
use crate::runtime::TransportRuntime;

/// Longest sleep between accept attempts in [`TcpTransport::accept_timeout`].
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// TCP listener transport.
///
/// Created through [`TransportRuntime::bind`]; keeps the runtime alive until
/// dropped.
pub struct TcpTransport {
    listener: TcpListener,
    local_addr: SocketAddr,
    runtime: TransportRuntime,
}

impl TcpTransport {
    pub(crate) fn bind<A>(runtime: TransportRuntime, addr: A) -> Result<Self>
    where
        A: ToSocketAddrs + fmt::Display,
    {
        let listener = TcpListener::bind(&addr).map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;
        let local_addr = listener.local_addr().map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;

        info!(%local_addr, "listening on tcp");

        Ok(Self {
            listener,
            local_addr,
            runtime,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<Connection> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        Ok(self.accepted(stream, peer))
    }

    /// Accept an incoming connection, waiting at most `timeout`.
    ///
    /// Returns `Ok(None)` if nobody connected in time, so an accept loop can
    /// check a stop condition between calls. The listener is put back into
    /// blocking mode before returning and the connection is always blocking.
    /// Do not call this while another thread is blocked in [`accept`](Self::accept).
    pub fn accept_timeout(&self, timeout: Duration) -> Result<Option<Connection>> {
        self.listener.set_nonblocking(true)?;
        let accepted = self.poll_accept(timeout);
        let restored = self.listener.set_nonblocking(false);
        let accepted = accepted?;
        restored?;
        Ok(accepted)
    }

    fn poll_accept(&self, timeout: Duration) -> Result<Option<Connection>> {
        let deadline = Instant::now().checked_add(timeout);
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    // Some platforms hand out sockets that inherit the
                    // listener's non-blocking flag.
                    stream
                        .set_nonblocking(false)
                        .map_err(TransportError::Accept)?;
                    return Ok(Some(self.accepted(stream, peer)));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    let remaining = match deadline {
                        Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                        None => ACCEPT_POLL_INTERVAL,
                    };
                    if remaining.is_zero() {
                        return Ok(None);
                    }
                    thread::sleep(remaining.min(ACCEPT_POLL_INTERVAL));
                }
                Err(err) => return Err(TransportError::Accept(err)),
            }
        }
    }

    fn accepted(&self, stream: TcpStream, peer: SocketAddr) -> Connection {
        debug!(%peer, "accepted connection");
        Connection::from_tcp(stream, self.runtime.clone())
    }

    /// The address this listener is bound to, with any wildcard port resolved.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "tcp"
    }
}

impl fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpTransport")
            .field("local_addr", &self.local_addr)
            .finish()
    }
}
