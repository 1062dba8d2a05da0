//! Tagged variant values with a compact binary wire format.
//!
//! tagwire encodes dynamically-typed values (null, booleans, integers,
//! reals, byte strings, lists and string-keyed maps) into self-delimiting
//! binary records, decodes them from partially received buffers without
//! losing its place, and hands decoded values between threads.
//!
//! # Crate Structure
//!
//! - [`value`]: the `Variant` value model
//! - [`codec`]: binary encode/decode, `ByteBuffer`, stream reader/writer
//! - [`queue`]: blocking FIFO for producer/consumer hand-off
//! - [`transport`]: TCP listener/connection with explicit runtime init

/// Re-export value types.
pub mod value {
    pub use tagwire_value::*;
}

/// Re-export codec types.
pub mod codec {
    pub use tagwire_codec::*;
}

/// Re-export queue types.
pub mod queue {
    pub use tagwire_queue::*;
}

/// Re-export transport types.
pub mod transport {
    pub use tagwire_transport::*;
}

pub use tagwire_codec::{decode_value, encode_value, CodecError, VariantCodec};
pub use tagwire_queue::BlockingQueue;
pub use tagwire_value::{Variant, VariantType};
