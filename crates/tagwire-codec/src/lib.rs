//! Binary encoding of [`Variant`](tagwire_value::Variant) values.
//!
//! Every value is written as:
//! - A 1-byte type signature (`X N B I R S L M`)
//! - A fixed-width little-endian scalar, or a 4-byte little-endian
//!   length/count followed by bytes or nested values
//!
//! Decoding never reads past the end of its input and never moves the read
//! cursor on failure, so a truncated buffer can be topped up and retried.

pub mod buffer;
pub mod codec;
pub mod error;
#[cfg(feature = "async")]
pub mod framed;
pub mod reader;
mod scan;
pub mod writer;

pub use buffer::ByteBuffer;
pub use codec::{
    decode_value, encode_value, encoded_len, CodecConfig, VariantCodec, DEFAULT_MAX_DEPTH,
    DEFAULT_MAX_PAYLOAD,
};
pub use error::{CodecError, Result};
#[cfg(feature = "async")]
pub use framed::VariantFrameCodec;
pub use reader::VariantReader;
pub use writer::VariantWriter;
