use std::io::{ErrorKind, Read};

use tagwire_transport::Connection;
use tagwire_value::Variant;
use tracing::trace;

use crate::codec::{CodecConfig, VariantCodec};
use crate::error::{CodecError, Result};
use crate::scan::{ScanStatus, ValueScan};

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete variants from any `Read` stream.
///
/// Encoded variants are self-delimiting, so values are read back-to-back
/// with no extra framing. Partial reads are buffered internally; callers
/// always get complete values.
pub struct VariantReader<T> {
    inner: T,
    codec: VariantCodec,
    scan: ValueScan,
}

impl<T: Read> VariantReader<T> {
    /// Create a new variant reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, CodecConfig::default())
    }

    /// Create a new variant reader with explicit configuration.
    pub fn with_config(inner: T, config: CodecConfig) -> Self {
        Self {
            inner,
            codec: VariantCodec::with_config(config),
            scan: ValueScan::default(),
        }
    }

    /// Read the next complete value (blocking).
    ///
    /// Returns `Err(CodecError::ConnectionClosed)` when EOF is reached, either
    /// cleanly between values or in the middle of one.
    ///
    /// Decoding is attempted only once the buffered bytes hold a whole value
    /// (or bytes the decoder will reject), so a value split across many reads
    /// costs one decode.
    pub fn read_value(&mut self) -> Result<Variant> {
        loop {
            let unread = &self.codec.byte_buffer().as_slice()[self.codec.position()..];
            match self.scan.advance(unread, self.codec.config()) {
                ScanStatus::Incomplete => {}
                ScanStatus::Complete | ScanStatus::Invalid => match self.codec.pop_value() {
                    Ok(value) => {
                        self.scan = ValueScan::default();
                        self.codec.compact();
                        return Ok(value);
                    }
                    Err(err) if err.is_incomplete() => {}
                    Err(err) => {
                        self.scan = ValueScan::default();
                        return Err(err);
                    }
                },
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(CodecError::Io(err)),
            };

            if read == 0 {
                trace!(buffered = self.codec.available(), "end of stream");
                return Err(CodecError::ConnectionClosed);
            }

            self.codec.extend_from_slice(&chunk[..read]);
        }
    }

    /// Bytes received but not yet returned as a value.
    pub fn buffered(&self) -> usize {
        self.codec.available()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &CodecConfig {
        self.codec.config()
    }
}

impl VariantReader<Connection> {
    /// Create a variant reader for a TCP `Connection` and apply read timeout from config.
    pub fn with_config_tcp(inner: Connection, config: CodecConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_codec_error)?;
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_codec_error(err: tagwire_transport::TransportError) -> CodecError {
    match err {
        tagwire_transport::TransportError::Io(io)
        | tagwire_transport::TransportError::Accept(io) => CodecError::Io(io),
        tagwire_transport::TransportError::Bind { source, .. }
        | tagwire_transport::TransportError::Connect { source, .. } => CodecError::Io(source),
        other => CodecError::Io(std::io::Error::other(other.to_string())),
    }
}
