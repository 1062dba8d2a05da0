use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use tagwire_transport::Connection;
use tagwire_value::Variant;

use crate::codec::{encode_value, CodecConfig};
use crate::error::{CodecError, Result};
use crate::reader::transport_to_codec_error;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete variants to any `Write` stream.
pub struct VariantWriter<T> {
    inner: T,
    buf: BytesMut,
    config: CodecConfig,
}

impl<T: Write> VariantWriter<T> {
    /// Create a new variant writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, CodecConfig::default())
    }

    /// Create a new variant writer with explicit configuration.
    pub fn with_config(inner: T, config: CodecConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Encode and send one value (blocking).
    ///
    /// An expired write timeout surfaces as `CodecError::Io` with kind
    /// `WouldBlock` or `TimedOut`. Part of the value may already be on the
    /// wire by then, so the stream should not be reused.
    pub fn send(&mut self, value: &Variant) -> Result<()> {
        self.buf.clear();
        encode_value(value, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(CodecError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(CodecError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(CodecError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current writer configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }
}

impl VariantWriter<Connection> {
    /// Create a variant writer for a TCP `Connection` and apply write timeout from config.
    pub fn with_config_tcp(inner: Connection, config: CodecConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_codec_error)?;
        Ok(Self::with_config(inner, config))
    }
}
