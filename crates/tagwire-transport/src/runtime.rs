//! Explicit process-wide socket runtime.
//!
//! The platform socket library is started when the first
//! [`TransportRuntime`] is initialized and torn down when the last handle,
//! including those held by listeners and connections, is dropped. Nothing
//! happens at static-construction time.

use std::fmt;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::connection::Connection;
use crate::error::{Result, TransportError};
use crate::tcp::TcpTransport;

/// Number of live `initialize` calls whose handles have not all dropped.
static ACTIVE: Mutex<usize> = Mutex::new(0);

#[derive(Debug)]
struct RuntimeHandle;

impl Drop for RuntimeHandle {
    fn drop(&mut self) {
        let mut active = ACTIVE.lock().unwrap_or_else(PoisonError::into_inner);
        *active = active.saturating_sub(1);
        if *active == 0 {
            platform::cleanup();
            debug!("socket runtime torn down");
        }
    }
}

/// Handle to the initialized socket runtime.
///
/// All sockets are created through a runtime handle, so the socket library
/// is guaranteed to be up for as long as any socket exists. Clones share one
/// registration.
#[derive(Debug, Clone)]
pub struct TransportRuntime {
    // Never read; dropping the last clone releases the registration.
    _handle: Arc<RuntimeHandle>,
}

impl TransportRuntime {
    /// Start the socket runtime, or join the one already running.
    pub fn initialize() -> Result<Self> {
        let mut active = ACTIVE.lock().unwrap_or_else(PoisonError::into_inner);
        if *active == 0 {
            platform::startup()?;
            debug!("socket runtime started");
        }
        *active += 1;
        Ok(Self {
            _handle: Arc::new(RuntimeHandle),
        })
    }

    /// Whether any runtime handle is currently alive.
    pub fn is_initialized() -> bool {
        *ACTIVE.lock().unwrap_or_else(PoisonError::into_inner) > 0
    }

    /// Bind a TCP listener.
    pub fn bind<A>(&self, addr: A) -> Result<TcpTransport>
    where
        A: ToSocketAddrs + fmt::Display,
    {
        TcpTransport::bind(self.clone(), addr)
    }

    /// Connect to a TCP listener (blocking).
    pub fn connect<A>(&self, addr: A) -> Result<Connection>
    where
        A: ToSocketAddrs + fmt::Display,
    {
        let stream = TcpStream::connect(&addr).map_err(|e| TransportError::Connect {
            addr: addr.to_string(),
            source: e,
        })?;
        debug!(%addr, "connected");
        Ok(Connection::from_tcp(stream, self.clone()))
    }

    /// Connect with a bound on how long each resolved address may take.
    pub fn connect_timeout<A>(&self, addr: A, timeout: Duration) -> Result<Connection>
    where
        A: ToSocketAddrs + fmt::Display,
    {
        let connect_err = |source: std::io::Error| TransportError::Connect {
            addr: addr.to_string(),
            source,
        };
        let candidates: Vec<SocketAddr> = addr.to_socket_addrs().map_err(connect_err)?.collect();

        let mut last_err = std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "address resolved to nothing",
        );
        for candidate in candidates {
            match TcpStream::connect_timeout(&candidate, timeout) {
                Ok(stream) => {
                    debug!(%candidate, "connected");
                    return Ok(Connection::from_tcp(stream, self.clone()));
                }
                Err(err) => last_err = err,
            }
        }
        Err(connect_err(last_err))
    }
}

#[cfg(windows)]
mod platform {
    use windows_sys::Win32::Networking::WinSock::{WSACleanup, WSAStartup, WSADATA};

    use crate::error::{Result, TransportError};

    const WINSOCK_VERSION: u16 = 0x0202;

    pub(super) fn startup() -> Result<()> {
        let mut data = std::mem::MaybeUninit::<WSADATA>::zeroed();
        // SAFETY: `data` is a valid writable WSADATA buffer for the duration of the call.
        let rc = unsafe { WSAStartup(WINSOCK_VERSION, data.as_mut_ptr()) };
        if rc != 0 {
            return Err(TransportError::Startup(rc));
        }
        Ok(())
    }

    pub(super) fn cleanup() {
        // SAFETY: only called once per successful `startup`, when the last handle drops.
        unsafe {
            WSACleanup();
        }
    }
}

#[cfg(not(windows))]
mod platform {
    use crate::error::Result;

    pub(super) fn startup() -> Result<()> {
        Ok(())
    }

    pub(super) fn cleanup() {}
}
