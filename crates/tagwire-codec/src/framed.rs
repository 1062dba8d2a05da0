//! `tokio_util::codec` adapter for async streams.

use bytes::{Buf, BytesMut};
use tagwire_value::Variant;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_value, encode_value, CodecConfig};
use crate::error::CodecError;
use crate::scan::{ScanStatus, ValueScan};

/// Decodes and encodes back-to-back variants on an async byte stream.
///
/// Truncated input yields `Ok(None)` so `FramedRead` waits for more bytes.
#[derive(Debug, Clone, Default)]
pub struct VariantFrameCodec {
    config: CodecConfig,
    scan: ValueScan,
}

impl VariantFrameCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self {
            config,
            scan: ValueScan::default(),
        }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }
}

impl Decoder for VariantFrameCodec {
    type Item = Variant;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Variant>, CodecError> {
        if self.scan.advance(src, &self.config) == ScanStatus::Incomplete {
            return Ok(None);
        }
        match decode_value(src, &self.config) {
            Ok((value, consumed)) => {
                self.scan = ValueScan::default();
                src.advance(consumed);
                Ok(Some(value))
            }
            Err(err) if err.is_incomplete() => Ok(None),
            Err(err) => {
                self.scan = ValueScan::default();
                Err(err)
            }
        }
    }
}

impl Encoder<Variant> for VariantFrameCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Variant, dst: &mut BytesMut) -> Result<(), CodecError> {
        encode_value(&item, dst)
    }
}

impl Encoder<&Variant> for VariantFrameCodec {
    type Error = CodecError;

    fn encode(&mut self, item: &Variant, dst: &mut BytesMut) -> Result<(), CodecError> {
        encode_value(item, dst)
    }
}
