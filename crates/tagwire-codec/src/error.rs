use tagwire_value::VariantType;

/// Errors that can occur during variant encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Fewer bytes are available than the value being decoded declares.
    ///
    /// This is the only retryable error: append more bytes and decode again.
    #[error("truncated input (need {needed} bytes, {available} available)")]
    TruncatedInput { needed: usize, available: usize },

    /// The signature byte does not name any variant type.
    #[error("unknown type signature 0x{0:02x}")]
    UnknownTypeSignature(u8),

    /// A map key decoded as something other than a String.
    #[error("map key must be a String, found {0}")]
    MapKeyTypeMismatch(VariantType),

    /// Lists and maps are nested deeper than the configured limit.
    #[error("nesting deeper than {max} levels")]
    NestingTooDeep { max: usize },

    /// A declared string length or element count exceeds the configured maximum.
    #[error("payload too large ({size}, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A string or container is too long for the 32-bit length field.
    #[error("length {len} does not fit the 32-bit wire field")]
    LengthOverflow { len: usize },

    /// An I/O error occurred while reading or writing values.
    #[error("codec I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete value was received.
    #[error("connection closed (incomplete value)")]
    ConnectionClosed,
}

impl CodecError {
    /// True when the input simply ended early and more bytes may complete it.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, CodecError::TruncatedInput { .. })
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
