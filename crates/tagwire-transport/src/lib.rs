//! TCP transport for tagwire.
//!
//! Every socket is created through a [`TransportRuntime`], the explicit
//! init/teardown point for the platform socket library. This is the lowest
//! layer of tagwire; the codec's stream adapters build on the
//! [`Connection`] type provided here.

pub mod connection;
pub mod error;
pub mod runtime;
pub mod tcp;

pub use connection::{Connection, Direction};
pub use error::{Result, TransportError};
pub use runtime::TransportRuntime;
pub use tcp::TcpTransport;
