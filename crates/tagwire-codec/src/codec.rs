use std::time::Duration;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tagwire_value::{Variant, VariantList, VariantMap, VariantType};

use crate::buffer::ByteBuffer;
use crate::error::{CodecError, Result};

/// Width of every length and count field (u32 LE).
pub const LENGTH_SIZE: usize = 4;

/// Width of a Boolean payload.
pub const BOOLEAN_SIZE: usize = 1;

/// Width of an Integer payload (i32 LE).
pub const INTEGER_SIZE: usize = 4;

/// Width of a Real payload (f64 LE).
pub const REAL_SIZE: usize = 8;

/// Default maximum nesting of lists and maps.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default maximum declared string length or element count: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// Configuration for the variant codec.
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Maximum nesting of lists and maps. Default: 64.
    pub max_depth: usize,
    /// Maximum declared string length or element count. Default: 16 MiB.
    pub max_payload_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<Duration>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

/// Encode a value into the wire format, appending to `dst`.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────────────────────────────────────┐
/// │ Sig (1B)     │ Payload                                      │
/// ├──────────────┼──────────────────────────────────────────────┤
/// │ 'X' / 'N'    │ none                                         │
/// │ 'B'          │ 1B (0 or 1)                                  │
/// │ 'I'          │ 4B LE i32                                    │
/// │ 'R'          │ 8B LE f64                                    │
/// │ 'S'          │ 4B LE length, then raw bytes                 │
/// │ 'L'          │ 4B LE count, then values                     │
/// │ 'M'          │ 4B LE count, then (String key, value) pairs  │
/// └──────────────┴──────────────────────────────────────────────┘
/// ```
///
/// Map pairs are written in ascending key order. On error nothing is
/// appended.
pub fn encode_value(value: &Variant, dst: &mut BytesMut) -> Result<()> {
    let start = dst.len();
    let result = write_value(value, dst);
    if result.is_err() {
        dst.truncate(start);
    }
    result
}

/// Number of bytes `encode_value` produces for `value`.
pub fn encoded_len(value: &Variant) -> usize {
    1 + match value {
        Variant::Invalid | Variant::Null => 0,
        Variant::Boolean(_) => BOOLEAN_SIZE,
        Variant::Integer(_) => INTEGER_SIZE,
        Variant::Real(_) => REAL_SIZE,
        Variant::String(bytes) => LENGTH_SIZE + bytes.len(),
        Variant::List(items) => LENGTH_SIZE + items.iter().map(encoded_len).sum::<usize>(),
        Variant::Map(map) => {
            LENGTH_SIZE
                + map
                    .iter()
                    .map(|(key, value)| 1 + LENGTH_SIZE + key.len() + encoded_len(value))
                    .sum::<usize>()
        }
    }
}

fn write_value(value: &Variant, dst: &mut BytesMut) -> Result<()> {
    dst.put_u8(value.variant_type().signature());
    match value {
        Variant::Invalid | Variant::Null => {}
        Variant::Boolean(flag) => dst.put_u8(u8::from(*flag)),
        Variant::Integer(number) => dst.put_i32_le(*number),
        Variant::Real(number) => dst.put_f64_le(*number),
        Variant::String(bytes) => write_string(bytes, dst)?,
        Variant::List(items) => {
            dst.put_u32_le(wire_len(items.len())?);
            for item in items {
                write_value(item, dst)?;
            }
        }
        Variant::Map(map) => {
            dst.put_u32_le(wire_len(map.len())?);
            for (key, item) in map {
                dst.put_u8(VariantType::String.signature());
                write_string(key, dst)?;
                write_value(item, dst)?;
            }
        }
    }
    Ok(())
}

fn write_string(bytes: &[u8], dst: &mut BytesMut) -> Result<()> {
    dst.put_u32_le(wire_len(bytes.len())?);
    dst.put_slice(bytes);
    Ok(())
}

fn wire_len(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| CodecError::LengthOverflow { len })
}

/// Decode one value from the front of `src`.
///
/// Returns the value and the number of bytes it occupied. `src` is never
/// read past its end; an incomplete value yields
/// [`CodecError::TruncatedInput`].
pub fn decode_value(src: &[u8], config: &CodecConfig) -> Result<(Variant, usize)> {
    let mut decoder = Decoder {
        src,
        config,
        depth: 0,
    };
    let value = decoder.read_value()?;
    Ok((value, src.len() - decoder.src.remaining()))
}

struct Decoder<'a> {
    src: &'a [u8],
    config: &'a CodecConfig,
    depth: usize,
}

impl Decoder<'_> {
    fn require(&self, needed: usize) -> Result<()> {
        let available = self.src.remaining();
        if available < needed {
            return Err(CodecError::TruncatedInput { needed, available });
        }
        Ok(())
    }

    fn read_value(&mut self) -> Result<Variant> {
        self.require(1)?;
        let signature = self.src.get_u8();
        let ty = VariantType::from_signature(signature)
            .ok_or(CodecError::UnknownTypeSignature(signature))?;

        match ty {
            VariantType::Invalid => Ok(Variant::Invalid),
            VariantType::Null => Ok(Variant::Null),
            VariantType::Boolean => {
                self.require(BOOLEAN_SIZE)?;
                Ok(Variant::Boolean(self.src.get_u8() != 0))
            }
            VariantType::Integer => {
                self.require(INTEGER_SIZE)?;
                Ok(Variant::Integer(self.src.get_i32_le()))
            }
            VariantType::Real => {
                self.require(REAL_SIZE)?;
                Ok(Variant::Real(self.src.get_f64_le()))
            }
            VariantType::String => self.read_string().map(Variant::String),
            VariantType::List => self.read_list().map(Variant::List),
            VariantType::Map => self.read_map().map(Variant::Map),
        }
    }

    fn read_length(&mut self) -> Result<usize> {
        self.require(LENGTH_SIZE)?;
        let len = self.src.get_u32_le() as usize;
        if len > self.config.max_payload_size {
            return Err(CodecError::PayloadTooLarge {
                size: len,
                max: self.config.max_payload_size,
            });
        }
        Ok(len)
    }

    fn read_string(&mut self) -> Result<Bytes> {
        let len = self.read_length()?;
        self.require(len)?;
        let bytes = Bytes::copy_from_slice(&self.src[..len]);
        self.src.advance(len);
        Ok(bytes)
    }

    fn read_list(&mut self) -> Result<VariantList> {
        let count = self.read_length()?;
        // Every element takes at least its signature byte.
        self.require(count)?;
        self.enter()?;

        let mut items = VariantList::with_capacity(count);
        for _ in 0..count {
            items.push(self.read_value()?);
        }

        self.depth -= 1;
        Ok(items)
    }

    fn read_map(&mut self) -> Result<VariantMap> {
        let count = self.read_length()?;
        // Every pair takes at least a key signature and a value signature.
        self.require(count.saturating_mul(2))?;
        self.enter()?;

        let mut map = VariantMap::new();
        for _ in 0..count {
            let key = match self.read_value()? {
                Variant::String(key) => key,
                other => return Err(CodecError::MapKeyTypeMismatch(other.variant_type())),
            };
            let value = self.read_value()?;
            map.insert(key, value);
        }

        self.depth -= 1;
        Ok(map)
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.config.max_depth {
            return Err(CodecError::NestingTooDeep {
                max: self.config.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }
}

/// Stateful codec over one [`ByteBuffer`] with a read cursor.
///
/// `push_value` appends encoded values; `pop_value` decodes from the cursor.
/// A failed `pop_value` never moves the cursor, including failures nested
/// deep inside a list or map, so a streaming caller can append more bytes
/// and call it again.
///
/// Not internally synchronised: share across threads behind a lock held for
/// each whole call.
#[derive(Debug, Clone, Default)]
pub struct VariantCodec {
    buf: ByteBuffer,
    cursor: usize,
    config: CodecConfig,
}

impl VariantCodec {
    /// Create an empty codec with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty codec with explicit configuration.
    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            buf: ByteBuffer::new(),
            cursor: 0,
            config,
        }
    }

    /// Create a codec that decodes from existing bytes.
    pub fn from_bytes(bytes: impl Into<ByteBuffer>) -> Self {
        let mut codec = Self::new();
        codec.init_with(bytes);
        codec
    }

    /// Replace the buffer contents and rewind the cursor.
    pub fn init_with(&mut self, bytes: impl Into<ByteBuffer>) {
        self.buf = bytes.into();
        self.reset();
    }

    /// Encode `value` at the end of the buffer.
    pub fn push_value(&mut self, value: &Variant) -> Result<()> {
        encode_value(value, self.buf.as_bytes_mut())
    }

    /// Decode the value at the cursor and advance past it.
    pub fn pop_value(&mut self) -> Result<Variant> {
        let (value, consumed) = decode_value(&self.buf.as_slice()[self.cursor..], &self.config)?;
        self.cursor += consumed;
        Ok(value)
    }

    /// Rewind the read cursor to the start. Written bytes are kept.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Bytes between the cursor and the end of the buffer.
    pub fn available(&self) -> usize {
        self.buf.len() - self.cursor
    }

    /// Current read cursor.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Append received bytes for later decoding.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.buf.append_slice(bytes);
    }

    /// Discard bytes already consumed by `pop_value`.
    pub fn compact(&mut self) {
        self.buf.discard(self.cursor);
        self.cursor = 0;
    }

    /// The underlying buffer.
    pub fn byte_buffer(&self) -> &ByteBuffer {
        &self.buf
    }

    /// Consume the codec and return the buffer.
    pub fn into_buffer(self) -> ByteBuffer {
        self.buf
    }

    /// Current codec configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &Variant) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_value(value, &mut buf).unwrap();
        buf.to_vec()
    }

    fn decode(bytes: &[u8]) -> Result<Variant> {
        decode_value(bytes, &CodecConfig::default()).map(|(value, _)| value)
    }

    fn scalars() -> Vec<Variant> {
        vec![
            Variant::Invalid,
            Variant::Null,
            Variant::Boolean(true),
            Variant::Boolean(false),
            Variant::Integer(0),
            Variant::Integer(i32::MIN),
            Variant::Integer(i32::MAX),
            Variant::Real(-0.25),
            Variant::Real(f64::INFINITY),
            Variant::from(""),
            Variant::from("hello"),
            Variant::from(vec![0x00u8, 0xFF, 0x80]),
        ]
    }

    /// A map/list tower `depth` levels deep with every scalar at each level.
    fn nested(depth: usize) -> Variant {
        let mut value = Variant::list(scalars());
        for level in 0..depth {
            value = if level % 2 == 0 {
                Variant::map([
                    ("inner", value),
                    ("level", Variant::Integer(level as i32)),
                    ("", Variant::Null),
                ])
            } else {
                Variant::list([value, Variant::from("tail")])
            };
        }
        value
    }

    #[test]
    fn integer_wire_bytes() {
        assert_eq!(encode(&Variant::Integer(42)), vec![b'I', 0x2A, 0x00, 0x00, 0x00]);
        assert_eq!(encode(&Variant::Integer(-1)), vec![b'I', 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn string_wire_bytes() {
        assert_eq!(
            encode(&Variant::from("hi")),
            vec![b'S', 0x02, 0x00, 0x00, 0x00, b'h', b'i']
        );
    }

    #[test]
    fn scalar_wire_bytes() {
        assert_eq!(encode(&Variant::Invalid), vec![b'X']);
        assert_eq!(encode(&Variant::Null), vec![b'N']);
        assert_eq!(encode(&Variant::Boolean(true)), vec![b'B', 0x01]);
        assert_eq!(
            encode(&Variant::Real(1.0)),
            vec![b'R', 0, 0, 0, 0, 0, 0, 0xF0, 0x3F]
        );
    }

    #[test]
    fn container_wire_bytes() {
        assert_eq!(
            encode(&Variant::list([Variant::Null, Variant::Boolean(false)])),
            vec![b'L', 2, 0, 0, 0, b'N', b'B', 0]
        );
        assert_eq!(
            encode(&Variant::map([("k", Variant::Null)])),
            vec![b'M', 1, 0, 0, 0, b'S', 1, 0, 0, 0, b'k', b'N']
        );
    }

    #[test]
    fn map_encoding_is_canonical() {
        let first = Variant::map([("b", 1), ("a", 2)]);
        let second = Variant::map([("a", 2), ("b", 1)]);
        assert_eq!(encode(&first), encode(&second));
    }

    #[test]
    fn scalar_roundtrip() {
        for value in scalars() {
            assert_eq!(decode(&encode(&value)).unwrap(), value);
        }
    }

    #[test]
    fn nested_roundtrip() {
        for depth in 0..8 {
            let value = nested(depth);
            let bytes = encode(&value);
            let (decoded, consumed) = decode_value(&bytes, &CodecConfig::default()).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(consumed, bytes.len());
            assert_eq!(encoded_len(&value), bytes.len());
        }
    }

    #[test]
    fn every_strict_prefix_is_truncated() {
        let bytes = encode(&nested(6));
        for end in 0..bytes.len() {
            let err = decode(&bytes[..end]).unwrap_err();
            assert!(err.is_incomplete(), "prefix {end}: {err}");
        }
    }

    #[test]
    fn unknown_signature_is_rejected() {
        for byte in [0u8, b'Z', b'x', 0xFF] {
            let err = decode(&[byte, 0, 0, 0, 0]).unwrap_err();
            assert!(matches!(err, CodecError::UnknownTypeSignature(b) if b == byte));
        }
    }

    #[test]
    fn empty_input_is_truncated() {
        let err = decode(&[]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::TruncatedInput {
                needed: 1,
                available: 0
            }
        ));
    }

    #[test]
    fn oversized_string_length_does_not_overread() {
        let bytes = [b'S', 0xFF, 0xFF, 0x00, 0x00, b'a', b'b'];
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(
            err,
            CodecError::TruncatedInput {
                needed: 0xFFFF,
                available: 2
            }
        ));
    }

    #[test]
    fn huge_container_count_fails_fast() {
        let bytes = [b'L', 0xFF, 0xFF, 0xFF, 0x00, b'N'];
        assert!(decode(&bytes).unwrap_err().is_incomplete());
    }

    #[test]
    fn payload_limit_is_enforced() {
        let config = CodecConfig {
            max_payload_size: 4,
            ..CodecConfig::default()
        };
        let bytes = encode(&Variant::from("too long"));
        let err = decode_value(&bytes, &config).unwrap_err();
        assert!(matches!(err, CodecError::PayloadTooLarge { size: 8, max: 4 }));
        assert!(!err.is_incomplete());
    }

    #[test]
    fn depth_limit_is_enforced() {
        let config = CodecConfig {
            max_depth: 2,
            ..CodecConfig::default()
        };
        let two = Variant::list([Variant::list([1])]);
        let three = Variant::list([two.clone()]);

        assert_eq!(decode_value(&encode(&two), &config).unwrap().0, two);
        assert!(matches!(
            decode_value(&encode(&three), &config),
            Err(CodecError::NestingTooDeep { max: 2 })
        ));
    }

    #[test]
    fn non_string_map_key_is_rejected() {
        let bytes = [b'M', 1, 0, 0, 0, b'I', 1, 0, 0, 0, b'N'];
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(
            err,
            CodecError::MapKeyTypeMismatch(VariantType::Integer)
        ));
    }

    #[test]
    fn nonzero_boolean_byte_is_true() {
        assert_eq!(decode(&[b'B', 0x7F]).unwrap(), Variant::Boolean(true));
        assert_eq!(decode(&[b'B', 0x00]).unwrap(), Variant::Boolean(false));
    }

    #[test]
    fn codec_loopback_with_reset() {
        let mut codec = VariantCodec::new();
        codec.push_value(&Variant::Integer(7)).unwrap();
        codec.push_value(&Variant::from("two")).unwrap();
        codec.push_value(&nested(5)).unwrap();

        assert_eq!(codec.pop_value().unwrap(), Variant::Integer(7));
        assert_eq!(codec.pop_value().unwrap(), Variant::from("two"));
        assert_eq!(codec.pop_value().unwrap(), nested(5));
        assert_eq!(codec.available(), 0);
        assert!(codec.pop_value().unwrap_err().is_incomplete());

        codec.reset();
        assert_eq!(codec.position(), 0);
        assert_eq!(codec.pop_value().unwrap(), Variant::Integer(7));
    }

    #[test]
    fn failed_pop_rolls_back_cursor() {
        let bytes = encode(&nested(5));
        let split = bytes.len() - 3;

        let mut codec = VariantCodec::new();
        codec.push_value(&Variant::Null).unwrap();
        codec.extend_from_slice(&bytes[..split]);

        assert_eq!(codec.pop_value().unwrap(), Variant::Null);
        let before = codec.position();
        let available = codec.available();

        assert!(codec.pop_value().unwrap_err().is_incomplete());
        assert_eq!(codec.position(), before);
        assert_eq!(codec.available(), available);

        codec.extend_from_slice(&bytes[split..]);
        assert_eq!(codec.pop_value().unwrap(), nested(5));
    }

    #[test]
    fn unknown_signature_does_not_move_cursor() {
        let mut codec = VariantCodec::from_bytes(vec![b'?']);
        assert!(codec.pop_value().is_err());
        assert_eq!(codec.position(), 0);
        assert_eq!(codec.available(), 1);
    }

    #[test]
    fn compact_discards_consumed_bytes() {
        let mut codec = VariantCodec::new();
        codec.push_value(&Variant::Integer(1)).unwrap();
        codec.push_value(&Variant::Integer(2)).unwrap();

        codec.pop_value().unwrap();
        codec.compact();

        assert_eq!(codec.position(), 0);
        assert_eq!(codec.byte_buffer().len(), 1 + INTEGER_SIZE);
        assert_eq!(codec.pop_value().unwrap(), Variant::Integer(2));
    }

    #[test]
    fn init_with_replaces_contents() {
        let mut codec = VariantCodec::new();
        codec.push_value(&Variant::Null).unwrap();
        codec.init_with(encode(&Variant::Boolean(true)));

        assert_eq!(codec.pop_value().unwrap(), Variant::Boolean(true));
        assert_eq!(codec.into_buffer().len(), 2);
    }
}
