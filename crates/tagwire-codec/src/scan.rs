//! Resumable completeness check for a value arriving in pieces.
//!
//! Stream adapters call [`ValueScan::advance`] each time bytes arrive and
//! only run the real decoder once the scan reports the value complete. The
//! scan remembers how far it got, so every byte is examined once no matter
//! how many reads the value is split across.

use tagwire_value::VariantType;

use crate::codec::{CodecConfig, BOOLEAN_SIZE, INTEGER_SIZE, LENGTH_SIZE, REAL_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanStatus {
    /// A whole value is buffered.
    Complete,
    /// More bytes are needed.
    Incomplete,
    /// The bytes cannot form a value; decode now to get the precise error.
    Invalid,
}

/// Progress through the value at the front of a growing buffer.
#[derive(Debug, Clone, Default)]
pub(crate) struct ValueScan {
    /// Bytes of fully-seen items.
    offset: usize,
    /// Items still expected by each open container, innermost last.
    pending: Vec<usize>,
    started: bool,
}

impl ValueScan {
    /// Continue scanning `src`, which must start where the previous call's
    /// `src` started and be at least as long.
    pub(crate) fn advance(&mut self, src: &[u8], config: &CodecConfig) -> ScanStatus {
        loop {
            if self.started && self.pending.is_empty() {
                return ScanStatus::Complete;
            }

            let rest = src.get(self.offset..).unwrap_or_default();
            let Some(&signature) = rest.first() else {
                return ScanStatus::Incomplete;
            };
            let Some(ty) = VariantType::from_signature(signature) else {
                return ScanStatus::Invalid;
            };

            let (item_len, children) = match ty {
                VariantType::Invalid | VariantType::Null => (1, 0),
                VariantType::Boolean => (1 + BOOLEAN_SIZE, 0),
                VariantType::Integer => (1 + INTEGER_SIZE, 0),
                VariantType::Real => (1 + REAL_SIZE, 0),
                VariantType::String | VariantType::List | VariantType::Map => {
                    let Some(raw) = rest.get(1..1 + LENGTH_SIZE) else {
                        return ScanStatus::Incomplete;
                    };
                    let mut len_bytes = [0u8; LENGTH_SIZE];
                    len_bytes.copy_from_slice(raw);
                    let len = u32::from_le_bytes(len_bytes) as usize;
                    if len > config.max_payload_size {
                        return ScanStatus::Invalid;
                    }
                    match ty {
                        VariantType::String => (1 + LENGTH_SIZE + len, 0),
                        VariantType::List => (1 + LENGTH_SIZE, len),
                        _ => (1 + LENGTH_SIZE, len.saturating_mul(2)),
                    }
                }
            };

            if rest.len() < item_len {
                return ScanStatus::Incomplete;
            }
            if children > 0 && self.pending.len() >= config.max_depth {
                return ScanStatus::Invalid;
            }

            self.offset += item_len;
            self.started = true;
            if let Some(remaining) = self.pending.last_mut() {
                *remaining -= 1;
            }
            if children > 0 {
                self.pending.push(children);
            }
            while self.pending.last() == Some(&0) {
                self.pending.pop();
            }
        }
    }
}
